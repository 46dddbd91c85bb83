mod api;
mod middleware;

use std::sync::Arc;

use seglens_engine::EngineClient;
use seglens_store::{SessionStore, UploadStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = seglens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let engine = match &config.engine_base_url {
        Some(base_url) => {
            let client = EngineClient::new(
                base_url,
                config.engine_api_token.clone(),
                config.engine_timeout_secs,
            )
            .map_err(|e| anyhow::anyhow!("engine client configuration: {e}"))?;
            tracing::info!(engine = %base_url, "remote analysis engine configured");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("no analysis engine configured, all jobs will run in demo mode");
            None
        }
    };

    let app = build_app(AppState {
        sessions: SessionStore::new(),
        uploads: UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes),
        engine,
        max_upload_bytes: config.max_upload_bytes,
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
