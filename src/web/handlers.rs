use anyhow::anyhow;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::PoisonError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::conversation::{self, Summary};
use crate::error::MoodError;
use crate::session::SessionId;
use crate::web::{page, AppState, SESSION_COOKIE};

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
}

const MISSING_INPUT_WARNING: &str = "Please enter both your name and how you're feeling.";
const SESSION_RESTARTED_WARNING: &str =
    "Your previous session expired, so this conversation started over.";
const INFERENCE_FAILED: &str = "Sorry, something went wrong while analyzing your message. Please try again.";

/// Everything a page render needs beyond the session snapshot.
#[derive(Default)]
struct Outcome {
    draft: String,
    warning: Option<String>,
    error: Option<String>,
    summary: Option<Summary>,
    status: Option<StatusCode>,
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// A page load ends the previous session and starts a fresh one.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(old) = session_id(&jar) {
        state.sessions.destroy(old).await;
    }
    let id = state.sessions.create().await;
    render_page(&state, jar, id, "", Outcome::default()).await
}

pub async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let id = state.sessions.open(session_id(&jar)).await;

    if let Err(err) = conversation::validate_input(&form.name, &form.text) {
        let outcome = Outcome {
            draft: form.text.clone(),
            warning: Some(MISSING_INPUT_WARNING.to_string()),
            ..Default::default()
        };
        info!(session_id = %id, reason = %err, "submission rejected");
        return render_page(&state, jar, id, &form.name, outcome).await;
    }

    let label = match classify(&state, form.text.clone()).await {
        Ok(label) => label,
        Err(err) => {
            error!(session_id = %id, error = %err, "classification failed");
            let outcome = Outcome {
                draft: form.text.clone(),
                error: Some(error_banner(&err)),
                status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                ..Default::default()
            };
            return render_page(&state, jar, id, &form.name, outcome).await;
        }
    };

    let (exchange, restarted) = state
        .sessions
        .with_session_or_restart(id, |session| {
            session.set_name(&form.name);
            let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
            conversation::respond(session, &form.text, label, state.tables, &mut *rng)
        })
        .await;

    if exchange.is_crisis(&state.high_risk_label) {
        warn!(session_id = %id, label = exchange.label.as_str(), "high-risk label predicted");
    }

    let outcome = Outcome {
        warning: restarted.then(|| SESSION_RESTARTED_WARNING.to_string()),
        ..Default::default()
    };
    render_page(&state, jar, id, &form.name, outcome).await
}

pub async fn finish(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let id = state.sessions.open(session_id(&jar)).await;
    let (summary, restarted) = state
        .sessions
        .with_session_or_restart(id, |session| {
            session.set_name(&form.name);
            let mut rng = state.rng.lock().unwrap_or_else(PoisonError::into_inner);
            conversation::finish(session, state.tables, &mut *rng)
        })
        .await;

    let outcome = Outcome {
        draft: form.text.clone(),
        warning: restarted.then(|| SESSION_RESTARTED_WARNING.to_string()),
        summary: Some(summary),
        ..Default::default()
    };
    render_page(&state, jar, id, &form.name, outcome).await
}

pub async fn clear(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let id = state.sessions.open(session_id(&jar)).await;
    state
        .sessions
        .with_session_or_restart(id, conversation::clear)
        .await;
    info!(session_id = %id, "session cleared");
    render_page(&state, jar, id, &form.name, Outcome::default()).await
}

async fn classify(state: &AppState, text: String) -> Result<String, MoodError> {
    let classifier = state.classifier.clone();
    tokio::task::spawn_blocking(move || classifier.classify(&text))
        .await
        .map_err(|e| MoodError::Inference(anyhow!("classifier task failed: {e}")))?
}

/// Decode failures keep their own message; inference internals stay in the log.
fn error_banner(err: &MoodError) -> String {
    match err {
        MoodError::Inference(_) => INFERENCE_FAILED.to_string(),
        other => other.to_string(),
    }
}

fn session_id(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

fn session_cookie(id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn render_page(
    state: &AppState,
    jar: CookieJar,
    id: SessionId,
    form_name: &str,
    outcome: Outcome,
) -> Response {
    let (stored_name, transcript) = state
        .sessions
        .with_session(id, |s| (s.name().map(str::to_string), s.transcript().to_vec()))
        .await
        .unwrap_or_default();

    let name = if form_name.trim().is_empty() {
        stored_name.unwrap_or_default()
    } else {
        form_name.trim().to_string()
    };

    let mut view =
        page::PageView::new(&name, &transcript, &state.high_risk_label, &state.crisis_url);
    view.draft = &outcome.draft;
    view.warning = outcome.warning;
    view.error = outcome.error;
    view.summary = outcome.summary.as_ref();

    let jar = jar.add(session_cookie(id));
    match page::render(&view) {
        Ok(html) => (
            outcome.status.unwrap_or(StatusCode::OK),
            jar,
            Html(html),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "page render failed").into_response()
        }
    }
}
