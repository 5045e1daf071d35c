use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use kopibot_db::UserRepository;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    users: Arc<dyn UserRepository>,
    storage: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub fn router(users: Arc<dyn UserRepository>, storage: &'static str) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { users, storage })
}

/// Binds the app-mode webserver on `0.0.0.0:port` and serves it in the background.
pub async fn spawn(
    port: u16,
    users: Arc<dyn UserRepository>,
    storage: &'static str,
) -> std::io::Result<()> {
    let address = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "webserver listening"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(users, storage)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "webserver terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = storage_check(state.users.as_ref(), state.storage).await;
    let ready = storage.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck { status: "ready", detail: "kopibot runtime initialized".to_string() },
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn storage_check(users: &dyn UserRepository, label: &str) -> HealthCheck {
    match users.ping().await {
        Ok(()) => HealthCheck { status: "ready", detail: format!("{label} store reachable") },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("{label} store unavailable: {error}"),
        },
    }
}
