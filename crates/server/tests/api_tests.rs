//! Integration tests for the prediction API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use waittime_lib::{
    predictor::FixedPeopleCounter,
    training::{ForestParams, TrainerConfig},
    PeopleCounter, PredictorConfig, PredictorMetrics, WaitTimePredictor,
};
use waittime_server::api::{create_router, AppState};

fn setup_test_app(dir: &TempDir, people_counter: Option<Arc<dyn PeopleCounter>>) -> (Router, Arc<AppState>) {
    let config = PredictorConfig {
        trainer: TrainerConfig {
            data_path: dir.path().join("data").join("queue_data.csv"),
            model_path: dir.path().join("models").join("wait_time_model.json"),
            forest: ForestParams {
                n_trees: 10,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let predictor = Arc::new(WaitTimePredictor::new(config));
    let state = Arc::new(AppState::new(predictor, people_counter, PredictorMetrics::new()));
    let router = create_router(state.clone());

    (router, state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_bytes(uri: &str, bytes: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir, None);

    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Wait Time Predictor API");
    assert!(body["endpoints"]["/predict"].is_string());
    assert!(body["endpoints"]["/train"].is_string());
    assert!(body["endpoints"]["/health"].is_string());
}

#[tokio::test]
async fn test_first_predict_trains_and_flips_health() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir, None);

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["model_loaded"], false);

    let (status, prediction) = send(
        &app,
        post_json("/predict", r#"{"queue_size": 10, "avg_service_time": 60.0, "arrival_rate": 2.0}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction["queue_size"], 10);
    assert_eq!(prediction["arrival_rate"], 2.0);
    let minutes = prediction["predicted_wait_time_minutes"].as_f64().unwrap();
    assert!(minutes > 8.0 && minutes < 12.0, "predicted {} minutes", minutes);

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model_loaded"], true);

    send(
        &app,
        post_json("/predict", r#"{"queue_size": 3, "avg_service_time": 120.0}"#),
    )
    .await;
    assert_eq!(state.predictor.stats().training_runs, 1);
}

#[tokio::test]
async fn test_missing_arrival_rate_defaults() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir, None);

    let (status, prediction) = send(
        &app,
        post_json("/predict", r#"{"avg_service_time": 45.0, "queue_size": 4}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction["arrival_rate"], 2.0);
}

#[tokio::test]
async fn test_non_positive_queue_size_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir, None);

    for body in [
        r#"{"queue_size": 0, "avg_service_time": 60.0}"#,
        r#"{"queue_size": -4, "avg_service_time": 60.0}"#,
    ] {
        let (status, error) = send(&app, post_json("/predict", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "invalid_argument");
        assert!(error["message"].as_str().unwrap().contains("queue_size"));
    }
    assert_eq!(state.predictor.stats().training_runs, 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir, None);

    for body in [
        r#"{"queue_size": 5}"#,
        r#"{"queue_size": "five", "avg_service_time": 60.0}"#,
        "not json",
    ] {
        let (status, error) = send(&app, post_json("/predict", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"], "invalid_argument");
    }
}

#[tokio::test]
async fn test_train_random_forest() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir, None);

    let request = Request::builder()
        .method("POST")
        .uri("/train?model_type=random_forest")
        .body(Body::empty())
        .unwrap();
    let (status, report) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "success");
    assert_eq!(report["model_type"], "random_forest");
    assert!(report["r2_score"].as_f64().unwrap().is_finite());
    assert!(report["mse"].as_f64().unwrap().is_finite());
    assert!(state.predictor.health().await.model_loaded);
}

#[tokio::test]
async fn test_train_defaults_to_linear() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir, None);

    let request = Request::builder()
        .method("POST")
        .uri("/train")
        .body(Body::empty())
        .unwrap();
    let (status, report) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["model_type"], "linear");
}

#[tokio::test]
async fn test_train_bogus_is_bad_request_and_keeps_model() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir, None);
    state.predictor.train("linear").await.unwrap();
    let model_path = dir.path().join("models").join("wait_time_model.json");
    let before = std::fs::read(&model_path).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/train?model_type=bogus")
        .body(Body::empty())
        .unwrap();
    let (status, error) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "invalid_argument");
    assert_eq!(std::fs::read(&model_path).unwrap(), before);
}

#[tokio::test]
async fn test_image_prediction_uses_people_count() {
    let dir = TempDir::new().unwrap();
    let counter: Arc<dyn PeopleCounter> = Arc::new(FixedPeopleCounter::new(6));
    let (app, _state) = setup_test_app(&dir, Some(counter));

    let (status, prediction) = send(
        &app,
        post_bytes("/predict/image?avg_service_time=60&arrival_rate=1.5", b"\xff\xd8\xff\xe0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction["queue_size"], 6);
    assert_eq!(prediction["arrival_rate"], 1.5);
    assert!(prediction["predicted_wait_time_seconds"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_image_prediction_without_counter_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let (app, state) = setup_test_app(&dir, None);
    let errors_before = state.metrics.prediction_errors();

    let (status, error) = send(
        &app,
        post_bytes("/predict/image?avg_service_time=60", b"\x89PNG"),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error["error"], "people_count_failed");
    // Counter is process-wide, other tests may bump it too
    assert!(state.metrics.prediction_errors() > errors_before);
}

#[tokio::test]
async fn test_image_prediction_requires_service_time() {
    let dir = TempDir::new().unwrap();
    let counter: Arc<dyn PeopleCounter> = Arc::new(FixedPeopleCounter::new(6));
    let (app, _state) = setup_test_app(&dir, Some(counter));

    let (status, error) = send(&app, post_bytes("/predict/image", b"\x89PNG")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "invalid_argument");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_test_app(&dir, None);

    send(
        &app,
        post_json("/predict", r#"{"queue_size": 8, "avg_service_time": 30.0}"#),
    )
    .await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("wait_time_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("wait_time_training_duration_seconds_count"));
    assert!(metrics_text.contains("wait_time_predictions_total"));
    assert!(metrics_text.contains("wait_time_model_info"));
}
