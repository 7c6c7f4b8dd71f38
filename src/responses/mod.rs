use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Deserialize)]
struct ResponseFile {
    fallback: Fallbacks,
    replies: HashMap<String, Vec<String>>,
    closings: HashMap<String, Vec<String>>,
    strategies: HashMap<String, Vec<String>>,
    follow_ups: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct Fallbacks {
    reply: String,
    follow_up: String,
    closing: String,
    #[serde(default)]
    strategies: Vec<String>,
}

/// Canned text keyed by mood label.
///
/// Every lookup has a fallback, so an unknown label never fails. Random picks
/// go through the caller's `Rng`.
pub struct ResponseTables {
    replies: HashMap<String, Vec<String>>,
    closings: HashMap<String, Vec<String>>,
    strategies: HashMap<String, Vec<String>>,
    follow_ups: HashMap<String, Vec<String>>,
    fallback: Fallbacks,
}

macro_rules! responses_file {
    ($lang:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/lang/",
            $lang,
            "/responses.json"
        ))
    };
}

static EN_RESPONSES: Lazy<ResponseTables> = Lazy::new(|| {
    ResponseTables::from_json(responses_file!("en")).expect("invalid bundled response tables")
});

impl ResponseTables {
    pub fn bundled() -> &'static ResponseTables {
        &EN_RESPONSES
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: ResponseFile =
            serde_json::from_str(raw).context("response tables are not valid JSON")?;
        Ok(Self {
            replies: parsed.replies,
            closings: parsed.closings,
            strategies: parsed.strategies,
            follow_ups: parsed.follow_ups,
            fallback: parsed.fallback,
        })
    }

    pub fn reply<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> &str {
        pick(&self.replies, label, rng).unwrap_or(self.fallback.reply.as_str())
    }

    pub fn follow_up<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> &str {
        pick(&self.follow_ups, label, rng).unwrap_or(self.fallback.follow_up.as_str())
    }

    /// Drawn fresh on every call.
    pub fn closing<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> &str {
        pick(&self.closings, label, rng).unwrap_or(self.fallback.closing.as_str())
    }

    /// All strategies for `label`, in table order. Empty when none apply.
    pub fn strategies(&self, label: &str) -> &[String] {
        self.strategies
            .get(label)
            .filter(|list| !list.is_empty())
            .unwrap_or(&self.fallback.strategies)
    }

    pub fn reply_candidates(&self, label: &str) -> &[String] {
        candidates(&self.replies, label)
    }

    pub fn follow_up_candidates(&self, label: &str) -> &[String] {
        candidates(&self.follow_ups, label)
    }

    pub fn closing_candidates(&self, label: &str) -> &[String] {
        candidates(&self.closings, label)
    }
}

fn candidates<'a>(table: &'a HashMap<String, Vec<String>>, label: &str) -> &'a [String] {
    table.get(label).map(Vec::as_slice).unwrap_or(&[])
}

fn pick<'a, R: Rng + ?Sized>(
    table: &'a HashMap<String, Vec<String>>,
    label: &str,
    rng: &mut R,
) -> Option<&'a str> {
    table
        .get(label)
        .and_then(|options| options.choose(rng))
        .map(String::as_str)
}
