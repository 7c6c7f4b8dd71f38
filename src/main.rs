use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mentoria::{
    web::{self, AppState},
    AppConfig, MoodClassifier, MoodPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 Starting Mentoria mood chat...");

    // -----------------------------
    // Config + model (missing artifacts abort startup)
    // -----------------------------
    let cfg = AppConfig::from_env()?;
    info!(
        model_dir = %cfg.model_dir.display(),
        label_encoder = %cfg.label_encoder.display(),
        device = cfg.device.as_str(),
        max_seq_len = cfg.max_seq_len,
        "loading classifier"
    );

    let pipeline = tokio::task::spawn_blocking({
        let cfg = cfg.clone();
        move || MoodPipeline::load(&cfg)
    })
    .await??;
    info!(classes = pipeline.encoder().len(), "classifier ready");

    let classifier: Arc<dyn MoodClassifier> = Arc::new(pipeline);
    let state = AppState::new(classifier, &cfg, StdRng::from_entropy());

    // -----------------------------
    // Router
    // -----------------------------
    let app = web::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    println!("🌐 HTTP listening on http://{}", cfg.bind);

    let listener = TcpListener::bind(&cfg.bind).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
