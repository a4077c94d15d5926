use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use shared::{domain::Address, error::ApiError, protocol::WalletAddressRequest};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

const MAX_BODY_BYTES: usize = 16 * 1024;
const ADDRESS_REQUIRED: &str = "Wallet address is required";
const SERVER_ERROR: &str = "Server error while processing wallet connection";

#[derive(Clone)]
struct AppState {
    http: reqwest::Client,
    backend_url: String,
}

impl AppState {
    fn new(backend_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            backend_url: backend_url.into(),
        }
    }

    fn wallet_url(&self) -> String {
        format!("{}/api/wallet", self.backend_url.trim_end_matches('/'))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let app = build_router(Arc::new(AppState::new(settings.backend_url.clone())));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, backend = %settings.backend_url, "wallet proxy listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/wallet", post(connect_wallet))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn server_error(reason: impl std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    error!(%reason, "wallet connection proxy failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(SERVER_ERROR)),
    )
}

/// Forwards `{address}` to the backend and relays its status and JSON body
/// unchanged.
async fn connect_wallet(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<ApiError>)> {
    let payload: Value = serde_json::from_slice(&body).map_err(server_error)?;
    let address = payload
        .get("address")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(ADDRESS_REQUIRED)),
            )
        })?;

    let forwarded = WalletAddressRequest {
        address: Address::from(address),
    };
    let response = state
        .http
        .post(state.wallet_url())
        .json(&forwarded)
        .send()
        .await
        .map_err(server_error)?;
    let status = response.status();
    let relayed: Value = response.json().await.map_err(server_error)?;

    info!(address = %forwarded.address.short(), status = status.as_u16(), "wallet connection forwarded");
    Ok((status, Json(relayed)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
