//! HTTP boundary
//!
//! Routes:
//! - `POST /predict`: encoded features, as an array in schema order or an
//!   object keyed by column name
//! - `POST /predict/record`: raw customer attributes, encoded server-side
//! - `GET /health`, `GET /schema`, `GET /version`
//!
//! Every failure is returned as `{"error": <message>}`.

use crate::context::{ModelState, SharedContext};
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use churn_core::{ChurnError, FeaturePayload, RawRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Largest accepted request body; larger bodies get `413 {"error": ..}`
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a core error: caller mistakes are 400, a missing model uses the
    /// configured status, everything else is 500.
    pub fn from_churn(err: ChurnError, unavailable_status: StatusCode) -> Self {
        match err {
            ChurnError::ModelUnavailable(_) => Self::new(unavailable_status, err.to_string()),
            err if err.is_client_error() => Self::bad_request(err.to_string()),
            err => Self::internal(err.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    prediction: u8,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_key: Option<String>,
    schema_version: Option<u32>,
    schema_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    uptime_secs: u64,
    req_total: u64,
}

#[derive(Debug, Serialize)]
struct SchemaResponse {
    version: u32,
    hash: String,
    columns: Vec<String>,
}

#[derive(Debug, Serialize)]
struct VersionResponse {
    version: &'static str,
    core_version: &'static str,
}

pub async fn start_server(ctx: SharedContext, addr: &str) -> Result<()> {
    let app = build_router(ctx);
    let listener = bind_listener(addr).await?;
    info!("listening on {}", listener.local_addr().context("listener has no local address")?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind listener on {addr}"))
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to install Ctrl-C handler: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub fn build_router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/predict", post(handle_predict))
        .route("/predict/record", post(handle_predict_record))
        .route("/health", get(handle_health))
        .route("/schema", get(handle_schema))
        .route("/version", get(handle_version))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(ctx)
}

/// Parse a JSON body ourselves so that malformed input still gets the
/// `{"error": ..}` shape.
fn parse_body<T: DeserializeOwned>(body: Result<Bytes, BytesRejection>) -> Result<T, ApiError> {
    let body = body.map_err(|rejection| {
        debug!("failed to read request body: {}", rejection.body_text());
        ApiError::new(rejection.status(), rejection.body_text())
    })?;
    if body.is_empty() {
        return Err(ApiError::bad_request("Malformed request body: empty body"));
    }
    serde_json::from_slice(&body).map_err(|err| {
        debug!("rejecting request body: {err}");
        ApiError::bad_request(format!("Malformed request body: {err}"))
    })
}

async fn handle_predict(
    State(ctx): State<SharedContext>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    ctx.record_request();
    let status = ctx.unavailable_status();
    ctx.artifact().map_err(|err| ApiError::from_churn(err, status))?;

    let payload: FeaturePayload = parse_body(body)?;
    let prediction = ctx
        .predict_payload(&payload)
        .map_err(|err| ApiError::from_churn(err, status))?;

    Ok(Json(PredictionResponse { prediction }))
}

async fn handle_predict_record(
    State(ctx): State<SharedContext>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    ctx.record_request();
    let status = ctx.unavailable_status();
    ctx.artifact().map_err(|err| ApiError::from_churn(err, status))?;

    let record: RawRecord = parse_body(body)?;
    let prediction = ctx
        .predict_record(&record)
        .map_err(|err| ApiError::from_churn(err, status))?;

    Ok(Json(PredictionResponse { prediction }))
}

async fn handle_health(State(ctx): State<SharedContext>) -> Json<HealthResponse> {
    let req_total = ctx.record_request();

    let response = match ctx.model() {
        ModelState::Ready(artifact) => HealthResponse {
            status: "ok",
            model_loaded: true,
            model_key: Some(artifact.key.clone()),
            schema_version: Some(artifact.schema.version()),
            schema_hash: Some(artifact.schema.hash().to_string()),
            reason: None,
            uptime_secs: ctx.uptime_seconds(),
            req_total,
        },
        ModelState::Unavailable(reason) => HealthResponse {
            status: "degraded",
            model_loaded: false,
            model_key: None,
            schema_version: None,
            schema_hash: None,
            reason: Some(reason.clone()),
            uptime_secs: ctx.uptime_seconds(),
            req_total,
        },
    };

    Json(response)
}

async fn handle_schema(State(ctx): State<SharedContext>) -> Result<Json<SchemaResponse>, ApiError> {
    ctx.record_request();
    let artifact = ctx
        .artifact()
        .map_err(|err| ApiError::from_churn(err, ctx.unavailable_status()))?;

    Ok(Json(SchemaResponse {
        version: artifact.schema.version(),
        hash: artifact.schema.hash().to_string(),
        columns: artifact.schema.columns().to_vec(),
    }))
}

async fn handle_version(State(ctx): State<SharedContext>) -> Json<VersionResponse> {
    ctx.record_request();
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        core_version: churn_core::VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let unavailable = StatusCode::SERVICE_UNAVAILABLE;

        let err = ApiError::from_churn(ChurnError::ModelUnavailable("x".into()), unavailable);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from_churn(
            ChurnError::SchemaMismatch {
                expected: 37,
                actual: 2,
            },
            unavailable,
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from_churn(ChurnError::IntegrityFailure("bad hash".into()), unavailable);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = parse_body::<FeaturePayload>(Ok(Bytes::from_static(b"{not json"))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(parse_body::<FeaturePayload>(Ok(Bytes::new())).is_err());
        assert!(parse_body::<FeaturePayload>(Ok(Bytes::from_static(b"42"))).is_err());
    }
}
