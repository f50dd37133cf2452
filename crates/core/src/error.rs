use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignozError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("API call failed with status {}: {message}", status_label(.status))]
    Backend {
        status: Option<u16>,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SignozError {
    pub fn backend(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Backend {
            status,
            message: message.into(),
        }
    }

    /// True for 401/403 responses, which mean the API key was rejected.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend {
                status: Some(401 | 403),
                ..
            }
        )
    }
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "N/A".to_string(), |s| s.to_string())
}

pub type Result<T> = std::result::Result<T, SignozError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_display() {
        let err = SignozError::backend(Some(500), "boom");
        assert_eq!(err.to_string(), "API call failed with status 500: boom");

        let err = SignozError::backend(None, "timed out");
        assert_eq!(err.to_string(), "API call failed with status N/A: timed out");
    }

    #[test]
    fn auth_failures() {
        assert!(SignozError::backend(Some(401), "x").is_auth_failure());
        assert!(SignozError::backend(Some(403), "x").is_auth_failure());
        assert!(!SignozError::backend(Some(404), "x").is_auth_failure());
        assert!(!SignozError::Internal("x".into()).is_auth_failure());
    }
}
