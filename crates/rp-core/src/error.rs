use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty completion from {0}")]
    EmptyCompletion(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimit(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Map a transport failure from reqwest, keeping timeouts distinct.
    pub fn from_transport(err: &dyn std::fmt::Display, is_timeout: bool) -> Self {
        if is_timeout {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::RateLimit(_) | Error::Timeout(_)
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failure of a best-effort stage (sources, images, charts).
///
/// These never abort the pipeline; callers log them and fall back to an
/// empty collection. The variants exist so the cause survives into logs
/// and tests.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("provider error: {0}")]
    Provider(#[from] Error),

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl StageError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short machine-friendly label used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::MissingCredential(_) => "missing_credential",
            StageError::Provider(_) => "provider",
            StageError::Parse(_) => "parse",
            StageError::Validation(_) => "validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::api(400, "Bad request");
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("Bad request"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::network("connection reset").is_retryable());
        assert!(Error::rate_limit("too many requests").is_retryable());
        assert!(Error::timeout("60s elapsed").is_retryable());
        assert!(!Error::auth("invalid key").is_retryable());
        assert!(!Error::config("missing key").is_retryable());
    }

    #[test]
    fn test_from_transport() {
        assert!(matches!(Error::from_transport(&"slow", true), Error::Timeout(_)));
        assert!(matches!(Error::from_transport(&"refused", false), Error::Network(_)));
    }

    #[test]
    fn test_stage_error_kind() {
        assert_eq!(StageError::MissingCredential("search").kind(), "missing_credential");
        assert_eq!(StageError::from(Error::network("down")).kind(), "provider");
        assert_eq!(StageError::parse("bad xml").kind(), "parse");
        assert_eq!(StageError::validation("pie").kind(), "validation");
    }
}
