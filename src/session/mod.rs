mod store;

pub use store::{SessionId, SessionStore};

use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

/// One submitted utterance and what we answered.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Exchange {
    pub utterance: String,
    pub reply: String,
    pub follow_up: String,
    pub label: String,
    pub ts: i64,
}

impl Exchange {
    pub fn is_crisis(&self, high_risk_label: &str) -> bool {
        self.label == high_risk_label
    }
}

/// State of one browser session.
///
/// `diagnoses` mirrors the labels of `transcript` one to one; both only
/// change through [`Session::record`] and [`Session::clear`].
#[derive(Debug)]
pub struct Session {
    name: Option<String>,
    transcript: Vec<Exchange>,
    diagnoses: Vec<String>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            name: None,
            transcript: Vec::new(),
            diagnoses: Vec::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn record(&mut self, exchange: Exchange) {
        self.diagnoses.push(exchange.label.clone());
        self.transcript.push(exchange);
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
        self.diagnoses.clear();
    }

    pub fn transcript(&self) -> &[Exchange] {
        &self.transcript
    }

    pub fn diagnoses(&self) -> &[String] {
        &self.diagnoses
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            self.name = Some(trimmed.to_string());
        }
    }

    /// Most frequent diagnosis, `None` when nothing was recorded.
    pub fn most_common(&self) -> Option<&str> {
        most_common(&self.diagnoses)
    }

    pub(crate) fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub(crate) fn last_seen(&self) -> Instant {
        self.last_seen
    }
}

/// Mode of `labels`; ties go to whichever label appeared first.
pub fn most_common<S: AsRef<str>>(labels: &[S]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for label in labels {
        let label = label.as_ref();
        let count = counts.entry(label).or_insert(0);
        if *count == 0 {
            order.push(label);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for label in order {
        let count = counts[label];
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}
