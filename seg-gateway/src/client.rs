use crate::codec;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use seg_core::{Metrics, ModelVariant, SegmentationResult};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// One network call per inference. No retries: a failed attempt is reported
/// to the caller immediately.
pub struct InferenceClient {
    http: reqwest::Client,
    origin: String,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            origin: config.backend_origin.clone(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Submit one segmentation request and normalize the response.
    pub async fn infer(&self, image: &str, variant: ModelVariant) -> Result<SegmentationResult> {
        let payload = codec::strip_data_url(image);
        let body = json!({
            "image": payload,
            "model": variant.backend_id(),
        });

        debug!(
            model = variant.backend_id(),
            payload_len = payload.len(),
            "submitting inference request"
        );

        let response = self
            .http
            .post(format!("{}/predict", self.origin))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model = variant.backend_id(), "backend rejected request");
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                details,
            });
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(format!("body is not JSON: {e}")))?;
        normalize_response(image, &raw)
    }
}

/// Fold the backend's semi-structured response into the normalized result.
///
/// The response shape is not contractually fixed, so each field is read
/// through an ordered list of fallbacks rather than a typed deserialize.
pub fn normalize_response(original: &str, raw: &Value) -> Result<SegmentationResult> {
    let segmented = raw.get("segmented_image").and_then(Value::as_str);
    let mask = raw.get("mask_image").and_then(Value::as_str);
    let (segmented, mask) = match (segmented, mask) {
        (Some(s), Some(m)) => (s, m),
        _ => {
            return Err(GatewayError::MalformedResponse(
                "segmented_image and mask_image are required".into(),
            ))
        }
    };

    Ok(SegmentationResult {
        original_image: codec::ensure_data_url(original, "image/png"),
        segmented_image: codec::ensure_data_url(segmented, "image/png"),
        mask_image: codec::ensure_data_url(mask, "image/png"),
        metrics: Metrics {
            iou: extract_metric(raw, "iou"),
            dice: extract_metric(raw, "dice"),
            pixel_accuracy: extract_metric(raw, "pixel_accuracy"),
        },
        processing_time: extract_number(raw, &["processing_time", "time"]).max(0.0),
    })
}

/// Metric lookup order: nested `metrics.<key>`, then top-level `<key>`,
/// then 0. Values are clamped to the documented [0, 1] range.
fn extract_metric(raw: &Value, key: &str) -> f64 {
    raw.get("metrics")
        .and_then(|m| m.get(key))
        .or_else(|| raw.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

fn extract_number(raw: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_f64))
        .unwrap_or(0.0)
}
