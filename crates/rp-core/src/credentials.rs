//! Request-scoped credentials.
//!
//! Keys are handed to every stage call explicitly; nothing in the workspace
//! stores a credential on a long-lived client.

use std::fmt;

use crate::error::{Error, StageError};

/// An API key whose `Debug` and `Display` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key. Blank strings yield `None`.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw secret, for building request headers and query strings only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// The keys for one pipeline invocation.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// LLM and image-synthesis provider key
    pub llm: Option<ApiKey>,
    /// Web search provider key
    pub search: Option<ApiKey>,
}

impl Credentials {
    pub fn new(llm: Option<String>, search: Option<String>) -> Self {
        Self {
            llm: llm.and_then(ApiKey::new),
            search: search.and_then(ApiKey::new),
        }
    }

    pub fn with_llm(mut self, key: impl Into<String>) -> Self {
        self.llm = ApiKey::new(key);
        self
    }

    pub fn with_search(mut self, key: impl Into<String>) -> Self {
        self.search = ApiKey::new(key);
        self
    }

    /// LLM key for a mandatory stage; absence is a configuration error.
    pub fn require_llm(&self, stage: &str) -> Result<&ApiKey, Error> {
        self.llm.as_ref().ok_or_else(|| {
            Error::config(format!("LLM API key is required by the {} stage", stage))
        })
    }

    /// LLM key for a best-effort stage.
    pub fn llm_for_stage(&self) -> Result<&ApiKey, StageError> {
        self.llm
            .as_ref()
            .ok_or(StageError::MissingCredential("llm"))
    }

    /// Search key for a best-effort stage.
    pub fn search_for_stage(&self) -> Result<&ApiKey, StageError> {
        self.search
            .as_ref()
            .ok_or(StageError::MissingCredential("search"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_redacted() {
        let key = ApiKey::new("sk-secret").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "sk-secret");

        let creds = Credentials::default().with_llm("sk-secret");
        assert!(!format!("{:?}", creds).contains("sk-secret"));
    }

    #[test]
    fn test_blank_key_is_none() {
        assert!(ApiKey::new("   ").is_none());
        let creds = Credentials::new(Some(String::new()), None);
        assert!(creds.llm.is_none());
    }

    #[test]
    fn test_require_llm() {
        let creds = Credentials::default();
        let err = creds.require_llm("summary").unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("summary"));

        assert!(matches!(
            creds.search_for_stage(),
            Err(StageError::MissingCredential("search"))
        ));
    }
}
