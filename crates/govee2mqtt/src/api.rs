use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::engine::BridgeState;
use crate::engine::CommandSender;
use crate::engine::QueuedCommand;
use crate::hass::EntityKind;
use crate::hass::Power;

/// Response for the /v1/ping endpoint
#[derive(Serialize)]
struct PingResponse {
    status: String,
}

/// Response for the /v1/info endpoint
#[derive(Serialize)]
struct InfoResponse {
    version: String,
    hostname: String,
    devices: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared application state
struct AppState {
    version: &'static str,
    status: watch::Receiver<BridgeState>,
    commands: CommandSender,
}

#[derive(Debug)]
enum HttpError {
    NotFound(String),
    BadRequest(String),
    Unavailable,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "bridge is shutting down".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Handler for GET /v1/ping
#[tracing::instrument]
async fn ping() -> impl IntoResponse {
    tracing::debug!("Handling /v1/ping request");
    (
        StatusCode::OK,
        Json(PingResponse {
            status: "ok".to_string(),
        }),
    )
}

/// Handler for GET /v1/info
#[tracing::instrument(skip(state))]
async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::debug!("Handling /v1/info request");

    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());

    (
        StatusCode::OK,
        Json(InfoResponse {
            version: state.version.to_string(),
            hostname,
            devices: state.status.borrow().devices.len(),
        }),
    )
}

/// Handler for GET /v1/devices
#[tracing::instrument(skip(state))]
async fn devices(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.status.borrow().clone();
    (StatusCode::OK, Json(snapshot))
}

/// Handler for POST /v1/devices/:slug/power/:state
///
/// Queues the same command an MQTT client would send; the poll loop applies
/// it at its next drain.
#[tracing::instrument(skip(state))]
async fn set_power(
    State(state): State<Arc<AppState>>,
    Path((slug, power)): Path<(String, String)>,
) -> Result<StatusCode, HttpError> {
    let power = match power.to_ascii_lowercase().as_str() {
        "on" => Power::On,
        "off" => Power::Off,
        _ => return Err(HttpError::BadRequest(format!("invalid power state {power}"))),
    };

    let (entity, payload) = {
        let status = state.status.borrow();
        let device = status
            .devices
            .get(&slug)
            .ok_or_else(|| HttpError::NotFound(format!("unknown device {slug}")))?;

        if device.has(EntityKind::Light) {
            let payload = serde_json::json!({ "state": power }).to_string();
            (EntityKind::Light, payload)
        } else if device.has(EntityKind::Switch) {
            (EntityKind::Switch, power.to_string())
        } else {
            return Err(HttpError::BadRequest(format!(
                "device {slug} has no power control"
            )));
        }
    };

    state
        .commands
        .send(QueuedCommand {
            device_slug: slug,
            entity_kind: entity.to_string(),
            raw_payload: payload,
        })
        .map_err(|_| HttpError::Unavailable)?;

    Ok(StatusCode::ACCEPTED)
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/ping", get(ping))
        .route("/v1/info", get(info))
        .route("/v1/devices", get(devices))
        .route("/v1/devices/:slug/power/:state", post(set_power))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
///
/// Runs until `shutdown` becomes `true` (or its sender is dropped).
pub async fn serve(
    addr: SocketAddr,
    status: watch::Receiver<BridgeState>,
    commands: CommandSender,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let state = Arc::new(AppState {
        version: env!("CARGO_PKG_VERSION"),
        status,
        commands,
    });
    let app = create_router(state);

    tracing::info!("Starting HTTP API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("HTTP API server shutting down gracefully");
        })
        .await
}
