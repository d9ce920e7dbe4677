use crate::arr::{MovieCatalog, RadarrClient, SeriesCatalog, SonarrClient};
use crate::config::Config;
use crate::mirror::MirrorTarget;
use crate::monitor::{InMemoryRegistry, MonitorSettings, RequestRegistry};
use crate::placeholder::Provisioner;
use crate::plex::{MediaServer, PlexClient};
use crate::tautulli::{PlaybackSessions, TautulliClient};
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod routes_arr;
pub mod routes_webhook;

/// Secondary Radarr instance imported movies are mirrored into
#[derive(Clone)]
pub struct MirrorContext {
    pub catalog: Arc<dyn MovieCatalog>,
    pub target: MirrorTarget,
}

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub registry: Arc<dyn RequestRegistry>,
    pub movies: Arc<dyn MovieCatalog>,
    pub series: Arc<dyn SeriesCatalog>,
    pub mirror: Option<MirrorContext>,
    pub media_server: Arc<dyn MediaServer>,
    pub sessions: Arc<dyn PlaybackSessions>,
    pub provisioner: Arc<Provisioner>,
    pub monitor: MonitorSettings,
}

impl AppContext {
    /// Wire up the real upstream clients
    pub fn from_config(config: Config) -> Self {
        let mirror = config.radarr_4k.as_ref().and_then(|secondary| {
            let target = MirrorTarget::from_config(secondary, config.placeholder.naming.clone())?;
            Some(MirrorContext {
                catalog: Arc::new(RadarrClient::secondary(secondary)) as Arc<dyn MovieCatalog>,
                target,
            })
        });

        Self {
            registry: Arc::new(InMemoryRegistry::new()),
            movies: Arc::new(RadarrClient::new(&config.radarr)),
            series: Arc::new(SonarrClient::new(&config.sonarr)),
            mirror,
            media_server: Arc::new(PlexClient::new(&config.plex)),
            sessions: Arc::new(TautulliClient::new(&config.tautulli)),
            provisioner: Arc::new(Provisioner::from_config(&config.placeholder)),
            monitor: MonitorSettings::default(),
            config: Arc::new(config),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(routes_webhook::handle_playback))
        .route("/radarr-webhook", post(routes_arr::handle_radarr))
        .route("/sonarr-webhook", post(routes_arr::handle_sonarr))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Body for requests that were understood but need no action
pub(crate) fn ignored(reason: impl Into<String>) -> Json<serde_json::Value> {
    let reason = reason.into();
    tracing::debug!(reason = %reason, "Ignoring webhook");
    Json(serde_json::json!({
        "status": "ignored",
        "reason": reason
    }))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::from_config(config);
    if ctx.mirror.is_some() {
        tracing::info!("Mirroring imported movies to secondary Radarr");
    }

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received; abandoning in-flight monitors");
}
