use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, PortalConfig};
use service::{PortalService, Store};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::metrics;
use crate::routes::{self, AppState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Create the store and the bootstrap administrator. This is the only privileged
/// mutation performed at startup and it happens before any listener is bound.
pub fn build_state(portal: &PortalConfig) -> Result<AppState, StartupError> {
    portal.validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let store = Arc::new(Store::new());
    let admin = store
        .bootstrap_admin(&portal.admin_name, &portal.admin_email, &portal.admin_secret_code)
        .map_err(|e| StartupError::Bootstrap(e.to_string()))?;
    info!(admin_id = admin.id, email = %admin.email, "default admin created");

    let state = AppState { portal: PortalService::new(store) };
    metrics::observe(state.portal.stats());
    Ok(state)
}

pub fn build_app(state: AppState) -> Router {
    routes::build_router(state, build_cors())
}

/// Serve `app` on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg.portal)?;
    let app = build_app(state);

    if let Some(metrics_addr) = cfg.server.metrics_addr.as_deref() {
        common::admin_http::spawn_admin_server(metrics_addr, metrics::encode_metrics).await?;
    }

    let addr: SocketAddr = cfg.bind_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "complaint portal listening");
    serve(listener, app).await
}
