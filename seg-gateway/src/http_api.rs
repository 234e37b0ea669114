use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::GatewayError;
use crate::orchestrator::Orchestrator;
use crate::probe::{self, ProbeReport};
use seg_core::{ComparisonResult, ModelVariant, SegmentRequest, SegmentationResult};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub probe_client: reqwest::Client,
    pub backend_origin: String,
}

impl AppState {
    pub fn new(config: &Config, orchestrator: Arc<Orchestrator>) -> crate::error::Result<Self> {
        // Probes get their own short-timeout client so a hung backend
        // cannot stall the status endpoint for the full inference timeout.
        let probe_client = reqwest::Client::builder()
            .connect_timeout(config.probe_timeout)
            .timeout(config.probe_timeout)
            .build()?;
        Ok(Self {
            orchestrator,
            probe_client,
            backend_origin: config.backend_origin.clone(),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/segment", post(segment))
        .route("/api/compare", post(compare))
        .route("/api/status", get(status))
        // Base64 uploads get large; let the client timeout bound the request.
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(bind: &str, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(bind, "gateway API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Wrapper mapping the error taxonomy onto HTTP statuses: validation 400,
/// backend failure 502, everything else 500.
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body): (StatusCode, Value) = match &self.0 {
            GatewayError::Validation { .. } | GatewayError::UnsupportedFormat { .. } => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.0.to_string() }))
            }
            GatewayError::Backend { status, details } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": format!("Backend error: {status}"),
                    "details": details,
                }),
            ),
            _ => {
                error!(error = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": self.0.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn require(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ApiError(GatewayError::Validation { field }))
}

async fn segment(
    State(state): State<AppState>,
    Json(request): Json<SegmentRequest>,
) -> Result<Json<SegmentationResult>, ApiError> {
    let image = require(request.image, "image")?;
    let model = require(request.model, "model")?;
    let variant = ModelVariant::parse(&model);
    let result = state.orchestrator.single(&image, variant).await?;
    Ok(Json(result))
}

async fn compare(
    State(state): State<AppState>,
    Json(request): Json<SegmentRequest>,
) -> Result<Json<ComparisonResult>, ApiError> {
    let image = require(request.image, "image")?;
    let paired = state.orchestrator.compare(&image).await?;
    Ok(Json(paired))
}

async fn status(State(state): State<AppState>) -> Json<ProbeReport> {
    Json(probe::probe_backend(&state.probe_client, &state.backend_origin).await)
}
