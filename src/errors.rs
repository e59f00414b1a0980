use thiserror::Error;

/// Typed error hierarchy for linecrab.
///
/// Used at module boundaries (messaging API calls, webhook processing).
/// Internal/leaf functions can continue using `anyhow::Result`; the
/// `Internal` variant allows seamless conversion via the `?` operator.
#[derive(Debug, Error)]
pub enum LinecrabError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("messaging API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LinecrabError {
    /// Whether the platform rejected the request itself (e.g. an expired
    /// reply token), as opposed to a local or transport failure.
    pub fn is_api_rejection(&self) -> bool {
        matches!(self, LinecrabError::Api { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = LinecrabError::Config("missing secret".into());
        assert_eq!(err.to_string(), "configuration error: missing secret");
    }

    #[test]
    fn api_error_display() {
        let err = LinecrabError::Api {
            status: 400,
            message: "Invalid reply token".into(),
        };
        assert_eq!(
            err.to_string(),
            "messaging API error (status 400): Invalid reply token"
        );
        assert!(err.is_api_rejection());
    }

    #[test]
    fn internal_from_anyhow() {
        let err: LinecrabError = anyhow::anyhow!("something broke").into();
        assert!(matches!(err, LinecrabError::Internal(_)));
        assert!(!err.is_api_rejection());
    }
}
