use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::time::Duration;

/// Serve a router on an ephemeral local port, returning the origin.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Mock inference backend. Payloads embed the requested model id so tests
/// can check variant pairing; `slow_model` delays one variant to force a
/// completion order, `fail_model` makes one variant return a 500.
pub fn mock_backend(fail_model: Option<&'static str>, slow_model: Option<&'static str>) -> Router {
    Router::new().route(
        "/predict",
        post(move |Json(body): Json<Value>| async move {
            let model = body["model"].as_str().unwrap_or("").to_string();
            if slow_model.is_some_and(|m| m == model) {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            if fail_model.is_some_and(|m| m == model) {
                return (StatusCode::INTERNAL_SERVER_ERROR, "model exploded").into_response();
            }
            Json(json!({
                "segmented_image": format!("{model}-overlay"),
                "mask_image": format!("{model}-mask"),
                "metrics": { "iou": 0.8, "dice": 0.85, "pixel_accuracy": 0.9 },
                "processing_time": 0.5,
            }))
            .into_response()
        }),
    )
}
