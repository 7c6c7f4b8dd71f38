use axum::{
    routing::{get, post},
    Router,
};
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

use crate::classifier::MoodClassifier;
use crate::config::AppConfig;
use crate::responses::ResponseTables;
use crate::session::SessionStore;

pub mod handlers;
pub mod page;

use handlers::{clear, finish, healthz, index, submit};

pub const SESSION_COOKIE: &str = "mentoria_session";

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn MoodClassifier>,
    pub tables: &'static ResponseTables,
    pub sessions: Arc<SessionStore>,
    pub rng: Arc<Mutex<StdRng>>,
    pub high_risk_label: Arc<str>,
    pub crisis_url: Arc<str>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn MoodClassifier>, cfg: &AppConfig, rng: StdRng) -> Self {
        Self {
            classifier,
            tables: ResponseTables::bundled(),
            sessions: Arc::new(SessionStore::new(cfg.session_idle)),
            rng: Arc::new(Mutex::new(rng)),
            high_risk_label: Arc::from(cfg.high_risk_label.as_str()),
            crisis_url: Arc::from(cfg.crisis_url.as_str()),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/finish", post(finish))
        .route("/clear", post(clear))
        .route("/healthz", get(healthz))
}
