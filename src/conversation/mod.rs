use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::classifier::MoodClassifier;
use crate::error::MoodError;
use crate::responses::ResponseTables;
use crate::session::{Exchange, Session};

/// Result of the "finish" action.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Diagnosis {
        label: String,
        closing: String,
        strategies: Vec<String>,
    },
}

pub fn validate_input(name: &str, text: &str) -> Result<(), MoodError> {
    if name.trim().is_empty() || text.trim().is_empty() {
        return Err(MoodError::MissingInput);
    }
    Ok(())
}

/// Classifies `text`, answers it and appends the exchange to `session`.
///
/// Blank `name` or `text` is rejected before the classifier is called.
pub fn submit<R: Rng + ?Sized>(
    session: &mut Session,
    name: &str,
    text: &str,
    classifier: &dyn MoodClassifier,
    tables: &ResponseTables,
    rng: &mut R,
) -> Result<Exchange, MoodError> {
    validate_input(name, text)?;
    let label = classifier.classify(text)?;
    session.set_name(name);
    Ok(respond(session, text, label, tables, rng))
}

/// Second half of [`submit`] for callers that ran the classifier themselves.
pub fn respond<R: Rng + ?Sized>(
    session: &mut Session,
    text: &str,
    label: String,
    tables: &ResponseTables,
    rng: &mut R,
) -> Exchange {
    let exchange = Exchange {
        utterance: text.to_string(),
        reply: tables.reply(&label, rng).to_string(),
        follow_up: tables.follow_up(&label, rng).to_string(),
        label,
        ts: chrono::Utc::now().timestamp(),
    };
    session.record(exchange.clone());
    info!(
        label = exchange.label.as_str(),
        chars = text.chars().count(),
        turns = session.transcript().len(),
        "recorded exchange"
    );
    exchange
}

pub fn finish<R: Rng + ?Sized>(session: &Session, tables: &ResponseTables, rng: &mut R) -> Summary {
    let Some(label) = session.most_common() else {
        return Summary::NoData;
    };
    info!(label, turns = session.diagnoses().len(), "conversation summarized");
    Summary::Diagnosis {
        label: label.to_string(),
        closing: tables.closing(label, rng).to_string(),
        strategies: tables.strategies(label).to_vec(),
    }
}

pub fn clear(session: &mut Session) {
    session.clear();
}
