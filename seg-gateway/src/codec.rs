use crate::error::{GatewayError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

const DATA_URL_MARKER: &str = "data:";

/// Media type for an image file, judged by extension. `None` means the file
/// does not declare an image type we can transport.
fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Read an image file fully and wrap it in a self-describing data URL.
pub fn encode_image_file(path: &Path) -> Result<String> {
    let media_type = media_type_for(path).ok_or_else(|| GatewayError::UnsupportedFormat {
        media_type: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    })?;
    let bytes = std::fs::read(path)?;
    Ok(format!(
        "data:{media_type};base64,{}",
        STANDARD.encode(&bytes)
    ))
}

/// Drop the `data:<mime>;base64,` segment up to the first comma, if present.
/// Idempotent: a bare base64 payload contains no comma.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    }
}

/// Normalize a backend-supplied image value into a displayable data URL.
/// The backend may return either a bare payload or an already-prefixed one.
pub fn ensure_data_url(candidate: &str, default_media_type: &str) -> String {
    if candidate.starts_with(DATA_URL_MARKER) {
        candidate.to_string()
    } else {
        format!("data:{default_media_type};base64,{candidate}")
    }
}

/// Decode a (possibly prefixed) payload back to raw bytes.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(strip_data_url(payload))?)
}
