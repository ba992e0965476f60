//! Preview configuration
//!
//! Everything site-specific that is not code: transport limits, identifier
//! patterns and catalog URL templates. Every field has a default, so a
//! config file only needs the parts it changes.

use serde::{Deserialize, Serialize};

use crate::catalog::SourceUrls;
use crate::client::ClientConfig;
use crate::error::{PreviewError, Result};
use crate::matcher::{default_patterns, PatternConfig};

/// Top-level configuration for a [`HoverController`](crate::controller::HoverController)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// HTTP transport settings
    pub client: ClientConfig,
    /// Identifier patterns, tried in order
    pub patterns: Vec<PatternConfig>,
    /// Catalog URL templates
    pub sources: SourceUrls,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            patterns: default_patterns(),
            sources: SourceUrls::default(),
        }
    }
}

impl PreviewConfig {
    /// Parse a JSON configuration document.
    ///
    /// # Errors
    /// Returns `PreviewError::InvalidConfig` if the JSON is malformed or has
    /// fields of the wrong type.
    ///
    /// # Example
    /// ```
    /// use nyaa_preview_core::PreviewConfig;
    ///
    /// let config = PreviewConfig::from_json(r#"{"client": {"timeout_secs": 5}}"#).unwrap();
    /// assert_eq!(config.client.timeout_secs, 5);
    /// assert_eq!(config.patterns.len(), 2);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PreviewError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SourceKind;

    #[test]
    fn test_default_config() {
        let config = PreviewConfig::default();
        assert_eq!(config.patterns, default_patterns());
        assert_eq!(config.sources, SourceUrls::default());
        assert_eq!(config.client, ClientConfig::default());
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(PreviewConfig::from_json("{}").unwrap(), PreviewConfig::default());
    }

    #[test]
    fn test_custom_patterns_replace_defaults() {
        let config = PreviewConfig::from_json(
            r#"{
                "patterns": [
                    {"name": "general", "pattern": "\\s([A-Z]{3,4}-[0-9]{3,4})\\s", "source": "miss-av"}
                ],
                "sources": {"miss_av": "https://missav.ws/__VIDEO_ID__"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.patterns.len(), 1);
        assert_eq!(config.patterns[0].source, SourceKind::MissAv);
        assert_eq!(config.sources.miss_av, "https://missav.ws/__VIDEO_ID__");
        assert_eq!(config.sources.fc2_ppv, SourceUrls::default().fc2_ppv);
    }

    #[test]
    fn test_invalid_json() {
        match PreviewConfig::from_json(r#"{"patterns": 3}"#) {
            Err(PreviewError::InvalidConfig(msg)) => assert!(!msg.is_empty()),
            _ => panic!("Expected InvalidConfig error"),
        }
    }
}
