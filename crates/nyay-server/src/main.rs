mod logging;
mod routes;

use std::{collections::VecDeque, sync::Arc, time::Instant};

use nyay_agent::{GeminiBackend, OllamaBackend};
use nyay_core::{
    agent::CompletionBackend,
    config::{BackendKind, Config},
    Trial,
};
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::logging::{BroadcastLayer, LogRing, LOG_RING_CAPACITY};

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub trial: Trial,
    pub start_time: Instant,
    pub log_tx: broadcast::Sender<String>,
    pub log_ring: LogRing,
}

fn build_backend(config: &Config) -> Arc<dyn CompletionBackend> {
    match config.backend {
        BackendKind::Gemini => {
            if config.gemini_api_key.is_empty() {
                error!("GEMINI_API_KEY is not set; every courtroom battle will fail");
            }
            Arc::new(
                GeminiBackend::new(config.gemini_api_key.clone(), config.gemini_models.clone())
                    .with_base_url(config.gemini_base_url.clone())
                    .with_timeout(config.agent_timeout_s),
            )
        },
        BackendKind::Ollama => Arc::new(
            OllamaBackend::new(config.ollama_url.clone(), config.ollama_model.clone())
                .with_timeout(config.agent_timeout_s),
        ),
    }
}

// ── main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (log_tx, _) = broadcast::channel::<String>(1024);
    let log_ring: LogRing = Arc::new(std::sync::Mutex::new(VecDeque::with_capacity(
        LOG_RING_CAPACITY,
    )));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "nyay_server=info,nyay_core=info,nyay_agent=info,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .with(BroadcastLayer {
            tx: log_tx.clone(),
            ring: log_ring.clone(),
        })
        .init();

    let config = Config::from_env()?;
    let backend = build_backend(&config);

    info!(
        backend = %backend.name(),
        models = ?config.gemini_models,
        max_case_chars = config.max_case_chars,
        "courtroom ready"
    );

    let state = Arc::new(AppState {
        trial: Trial::new(backend).with_max_case_chars(config.max_case_chars),
        start_time: Instant::now(),
        log_tx,
        log_ring,
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.web_bind, config.web_port);
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
