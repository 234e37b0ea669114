use thiserror::Error;

/// Central error type for the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{field} is required")]
    Validation { field: &'static str },

    #[error("unsupported upload format {media_type:?}, expected an image file")]
    UnsupportedFormat { media_type: String },

    #[error("backend error: {status}")]
    Backend { status: u16, details: String },

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("run superseded by a newer request")]
    Superseded,

    #[error("invalid base64 image payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
