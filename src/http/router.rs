//! HTTP router and handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::{Config, IssuanceConfig};
use crate::pki::{Issuance, IssuerProfile, PemBundle, issue_hierarchy, persist_issuance};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Identity and validity policy
    pub profile: IssuerProfile,
    /// Common name, persistence switch and output directory
    pub issuance: IssuanceConfig,
    /// Upper bound on one issuance
    pub request_timeout: Duration,
}

impl AppState {
    /// Build state from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            profile: config.profile.clone(),
            issuance: config.issuance.clone(),
            request_timeout: config.server.request_timeout,
        }
    }
}

/// Body of a successful `GET /generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Root certificate authority material
    #[serde(rename = "caPEM")]
    pub ca: PemBundle,
    /// Server-auth leaf material
    #[serde(rename = "serverPEM")]
    pub server: PemBundle,
    /// Client-auth leaf material
    #[serde(rename = "clientPEM")]
    pub client: PemBundle,
}

impl From<&Issuance> for GenerateResponse {
    fn from(issuance: &Issuance) -> Self {
        Self {
            ca: issuance.root.pem.clone(),
            server: issuance.server.pem.clone(),
            client: issuance.client.pem.clone(),
        }
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/generate", get(generate_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}

/// GET / - banner
async fn index_handler() -> &'static str {
    concat!(
        "pki-issuer v",
        env!("CARGO_PKG_VERSION"),
        " - GET /generate issues a root CA plus server and client certificates\n"
    )
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /generate - issue a fresh hierarchy and return its PEM material
async fn generate_handler(State(state): State<Arc<AppState>>) -> Response {
    let profile = state.profile.clone();
    let common_name = state.issuance.common_name.clone();
    let task = tokio::task::spawn_blocking(move || issue_hierarchy(&profile, &common_name));

    let issuance = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(Ok(issuance))) => issuance,
        Ok(Ok(Err(e))) => {
            error!(error = %e, "Issuance failed");
            return error_response(e.status_code(), &e.to_string());
        }
        Ok(Err(e)) => {
            error!(error = %e, "Issuance task aborted");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Issuance task aborted");
        }
        Err(_) => {
            error!(timeout = ?state.request_timeout, "Issuance timed out");
            return error_response(StatusCode::GATEWAY_TIMEOUT, "Issuance timed out");
        }
    };

    if state.issuance.persist {
        persist(&state.issuance, &issuance).await;
    }

    info!(common_name = %state.issuance.common_name, "Issued hierarchy returned");
    (StatusCode::OK, Json(GenerateResponse::from(&issuance))).into_response()
}

/// Write material to disk; failures are logged and never reach the client.
async fn persist(config: &IssuanceConfig, issuance: &Issuance) {
    let dir = config.output_dir.clone();
    let issuance = issuance.clone();
    let written = tokio::task::spawn_blocking(move || persist_issuance(&dir, &issuance)).await;
    if let Err(e) = written {
        error!(error = %e, "Persistence task aborted");
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
