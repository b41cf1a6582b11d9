//! HTTP API for predictions, training, health checks and Prometheus metrics

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};
use waittime_lib::{
    HealthResponse, ModelType, PeopleCounter, PredictionRequest, PredictionResult, PredictorError,
    PredictorMetrics, TrainingReport, WaitTimePredictor,
};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<WaitTimePredictor>,
    pub people_counter: Option<Arc<dyn PeopleCounter>>,
    pub metrics: PredictorMetrics,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        predictor: Arc<WaitTimePredictor>,
        people_counter: Option<Arc<dyn PeopleCounter>>,
        metrics: PredictorMetrics,
    ) -> Self {
        Self {
            predictor,
            people_counter,
            metrics,
            started_at: Utc::now(),
        }
    }
}

/// Error body: `{"error": <kind>, "message": <text>}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// A library error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(PredictorError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PredictorError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            PredictorError::Storage { .. } | PredictorError::TrainingFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            PredictorError::ModelUnavailable(_) | PredictorError::PeopleCountFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            PredictorError::TrainingTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PredictorError::invalid(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(PredictorError::invalid(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(kind = self.0.kind(), error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Query parameters for `/predict/image`
#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub avg_service_time: f64,
    pub arrival_rate: Option<f64>,
}

/// Query parameters for `/train`
#[derive(Debug, Deserialize)]
pub struct TrainQuery {
    pub model_type: Option<String>,
}

/// Service info and endpoint list
async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": "Wait Time Predictor API",
        "version": SERVICE_VERSION,
        "started_at": state.started_at.to_rfc3339(),
        "endpoints": {
            "/predict": "POST - Predict wait time",
            "/predict/image": "POST - Predict wait time from an image of the queue",
            "/train": "POST - Retrain model",
            "/health": "GET - Health check",
            "/metrics": "GET - Prometheus metrics"
        }
    }))
}

/// Always 200; the body says whether a model is loaded
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(state.predictor.health().await)
}

async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload?;
    let result = state.predictor.predict(request).await?;
    Ok(Json(result))
}

async fn predict_image(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ImageQuery>, QueryRejection>,
    image: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let Query(query) = query?;
    let Some(counter) = state.people_counter.as_ref() else {
        state.metrics.inc_prediction_errors();
        let err = PredictorError::PeopleCountFailed("no people counter is configured".to_string());
        return Err(err.into());
    };

    let result = state
        .predictor
        .predict_from_image(
            counter.as_ref(),
            &image,
            query.avg_service_time,
            query.arrival_rate,
        )
        .await?;
    Ok(Json(result))
}

async fn train(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TrainQuery>, QueryRejection>,
) -> Result<Json<TrainingReport>, ApiError> {
    let Query(query) = query?;
    let model_type = query
        .model_type
        .unwrap_or_else(|| ModelType::default().to_string());

    info!(model_type = %model_type, "Training requested");
    let report = state.predictor.train(&model_type).await?;
    Ok(Json(report))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/image", post(predict_image))
        .route("/train", post(train))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
