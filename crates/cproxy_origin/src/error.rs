use thiserror::Error;

/// Failure to obtain any response from the origin.
///
/// Connect errors, timeouts, malformed URLs and truncated bodies all collapse
/// into this one variant; an origin that answers with a 4xx/5xx is not an
/// error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OriginError {
    #[error("origin unavailable: {reason}")]
    Unavailable { reason: String },
}

impl OriginError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        OriginError::Unavailable {
            reason: reason.into(),
        }
    }
}
