use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::conversation::Summary;
use crate::session::Exchange;

const PAGE_TEMPLATE: &str = "index.html";

static PAGE_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template(
        PAGE_TEMPLATE,
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/index.html")),
    )
    .unwrap_or_else(|err| panic!("failed to compile page template: {err}"));
    env
});

#[derive(Debug, Serialize)]
pub struct ExchangeView<'a> {
    pub utterance: &'a str,
    pub reply: &'a str,
    pub follow_up: &'a str,
    pub label: &'a str,
    pub crisis: bool,
}

#[derive(Debug, Serialize, Default)]
pub struct PageView<'a> {
    pub name: &'a str,
    pub draft: &'a str,
    pub transcript: Vec<ExchangeView<'a>>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub summary: Option<&'a Summary>,
    pub crisis_url: &'a str,
}

impl<'a> PageView<'a> {
    pub fn new(
        name: &'a str,
        transcript: &'a [Exchange],
        high_risk_label: &str,
        crisis_url: &'a str,
    ) -> Self {
        Self {
            name,
            transcript: transcript
                .iter()
                .map(|e| ExchangeView {
                    utterance: &e.utterance,
                    reply: &e.reply,
                    follow_up: &e.follow_up,
                    label: &e.label,
                    crisis: e.is_crisis(high_risk_label),
                })
                .collect(),
            crisis_url,
            ..Default::default()
        }
    }
}

pub fn render(view: &PageView<'_>) -> Result<String, minijinja::Error> {
    PAGE_ENV.get_template(PAGE_TEMPLATE)?.render(view)
}
