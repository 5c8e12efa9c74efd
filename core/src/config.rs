//! Adapter configuration.
//!
//! # Design
//! Configuration is a plain serde struct with defaults for every field so a
//! host can pass a partial JSON object (or nothing). Requests hold it behind
//! an `Rc`, so fluent copies share one config instead of cloning it.

use serde::{Deserialize, Serialize};

use crate::error::AdapterResult;

/// Protocol version reported by adapters that were not told otherwise.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.1";

/// Knobs that change how an adapter interprets its state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Methods whose params are routed to the parsed-body store. Compared
    /// case-insensitively.
    pub body_methods: Vec<String>,

    /// Initial protocol version of newly built adapters.
    pub protocol_version: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            body_methods: ["POST", "PUT", "PATCH", "DELETE"]
                .into_iter()
                .map(String::from)
                .collect(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Parse a config from JSON. Missing fields take their default.
    pub fn from_json(raw: &str) -> AdapterResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Whether params of a request with `method` live in the body store.
    pub fn is_body_method(&self, method: &str) -> bool {
        self.body_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use assert_matches::assert_matches;

    #[test]
    fn default_body_methods() {
        let config = AdapterConfig::default();
        assert!(config.is_body_method("POST"));
        assert!(config.is_body_method("patch"));
        assert!(!config.is_body_method("GET"));
        assert!(!config.is_body_method(""));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AdapterConfig::from_json(r#"{"body_methods":["POST"]}"#).unwrap();
        assert_eq!(config.body_methods, vec!["POST".to_string()]);
        assert_eq!(config.protocol_version, DEFAULT_PROTOCOL_VERSION);
        assert!(!config.is_body_method("PUT"));
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(AdapterConfig::from_json("{}").unwrap(), AdapterConfig::default());
    }

    #[test]
    fn bad_json_is_an_error() {
        assert_matches!(
            AdapterConfig::from_json("not json"),
            Err(AdapterError::InvalidNative(_))
        );
        assert_matches!(
            AdapterConfig::from_json(r#"{"body_methods":"POST"}"#),
            Err(AdapterError::InvalidNative(_))
        );
    }
}
