//! Error taxonomy for upstream fetches and analysis

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DetectorError>;

/// Errors surfaced by the gateway and orchestrator.
///
/// Cache read/write failures are deliberately absent: they are logged and
/// degrade to a miss, never propagated.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// 403 - the API key lacks access to this resource
    #[error("upstream refused access to {endpoint}")]
    UpstreamAuth { endpoint: String },

    /// 404 - player or match does not exist
    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    /// 429 - the caller must back off
    #[error("rate limited by upstream on {endpoint}")]
    RateLimited { endpoint: String },

    /// Network failure, 5xx, or an unparseable payload
    #[error("upstream unavailable on {endpoint}: {detail}")]
    UpstreamUnavailable { endpoint: String, detail: String },

    /// Missing or malformed caller input
    #[error("{0}")]
    Validation(String),

    /// Zero valid matches after fetch and filtering
    #[error("{0}")]
    InsufficientData(String),
}

impl DetectorError {
    /// Map an upstream HTTP status to the matching error variant.
    pub fn from_status(status: u16, endpoint: &str) -> Self {
        let endpoint = endpoint.to_string();
        match status {
            403 => Self::UpstreamAuth { endpoint },
            404 => Self::NotFound { endpoint },
            429 => Self::RateLimited { endpoint },
            _ => Self::UpstreamUnavailable {
                endpoint,
                detail: format!("status {status}"),
            },
        }
    }

    /// HTTP-equivalent status for route handlers layered above the core.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::UpstreamAuth { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::RateLimited { .. } => 429,
            Self::UpstreamUnavailable { .. } => 502,
            Self::Validation(_) => 400,
            Self::InsufficientData(_) => 404,
        }
    }
}
