//! Riskline HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use riskline::config::{AppConfig, Config};
use riskline::embedding::{BertTextEncoder, TextEncoder, TextEncoderConfig};
use riskline::gateway::{HandlerState, create_router_with_state};
use riskline::service::RiskService;
use riskline::store::InMemoryPredictionStore;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        config_path = %config.config_path.display(),
        "Riskline starting"
    );

    let app_config = AppConfig::load(&config.config_path)?;
    let (model_id, model) = app_config.active(config.active_model.as_deref())?;

    let encoder_config = if let Some(path) = &config.encoder_path {
        TextEncoderConfig::new(path.clone())
    } else {
        tracing::warn!("No RISKLINE_ENCODER_PATH configured, running text encoder in stub mode");
        TextEncoderConfig::stub()
    };
    let encoder: Arc<dyn TextEncoder> = Arc::new(BertTextEncoder::load(encoder_config)?);

    let service = Arc::new(RiskService::from_config(
        &app_config,
        model_id,
        model,
        encoder,
    )?);

    let store = InMemoryPredictionStore::new();
    let state = HandlerState::with_max_batch(service, store, config.max_batch);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, model = model_id, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Riskline shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("RISKLINE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/health", port);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(_) => return 1,
    };

    rt.block_on(async {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        {
            Ok(client) => client,
            Err(_) => return 1,
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
