use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the capture layer.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Interface enumeration failed on every available source
    #[error("interface enumeration failed: {0}")]
    Enumeration(String),

    /// Bad or unknown interface name, rejected before the backend is touched
    #[error("invalid interface: {0}")]
    InvalidArgument(String),

    /// Capture device open/read/close failure
    #[error("capture device error: {0}")]
    Device(String),

    /// A bounded start/stop operation did not complete in time
    #[error("capture operation timed out: {0}")]
    Timeout(String),
}

impl From<pcap::Error> for CaptureError {
    fn from(e: pcap::Error) -> Self {
        CaptureError::Device(e.to_string())
    }
}

impl actix_web::ResponseError for CaptureError {
    fn status_code(&self) -> StatusCode {
        match self {
            CaptureError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CaptureError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CaptureError::Enumeration(_) | CaptureError::Device(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "status": "error",
            "message": self.to_string(),
        }))
    }
}

/// Result type for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;
