//! Identifier pattern matching
//!
//! Maps hovered link text to a catalog: patterns are tried in order and the
//! first whose regex matches selects the [`SourceKind`] and yields the raw id.

use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{SourceKind, SourceRegistry};
use crate::error::{PreviewError, Result};
use crate::source::DataSource;

/// A pattern as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Label used in logs
    pub name: String,
    /// Regex; capture group 1 (or the whole match) is the raw id
    pub pattern: String,
    /// Catalog queried for matching ids
    pub source: SourceKind,
}

impl PatternConfig {
    pub fn new(name: &str, pattern: &str, source: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            source,
        }
    }
}

/// Built-in patterns, most specific catalog first
pub fn default_patterns() -> Vec<PatternConfig> {
    vec![
        PatternConfig::new(
            "jav-database",
            r"\s([A-Z]{2,}-[0-9]{3,6})\s",
            SourceKind::JavDatabase,
        ),
        PatternConfig::new(
            "fc2ppv",
            r"\s(FC2-?PPV-?([0-9]{5,7}))\s",
            SourceKind::Fc2Ppv,
        ),
    ]
}

/// A compiled pattern
pub struct SearchPattern {
    name: String,
    regex: Regex,
    source: SourceKind,
}

impl SearchPattern {
    /// Compile a configured pattern.
    ///
    /// # Errors
    /// Returns `PreviewError::InvalidPattern` if the regex does not compile.
    pub fn compile(config: &PatternConfig) -> Result<Self> {
        let regex = Regex::new(&config.pattern).map_err(|e| PreviewError::InvalidPattern {
            name: config.name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            name: config.name.clone(),
            regex,
            source: config.source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// The raw id in `text`, if this pattern matches.
    pub fn extract(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        caps.get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
    }
}

impl fmt::Debug for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchPattern")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .field("source", &self.source)
            .finish()
    }
}

/// A successful match of hovered text
#[derive(Clone)]
pub struct PatternMatch {
    /// Name of the pattern that matched
    pub pattern: String,
    /// Raw id as captured from the text
    pub video_id: String,
    /// Singleton source for the pattern's catalog
    pub source: Arc<dyn DataSource>,
}

impl fmt::Debug for PatternMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternMatch")
            .field("pattern", &self.pattern)
            .field("video_id", &self.video_id)
            .field("source", &self.source.name())
            .finish()
    }
}

/// Ordered patterns plus the sources they resolve to
pub struct PatternMatcher {
    patterns: Vec<SearchPattern>,
    registry: SourceRegistry,
}

impl PatternMatcher {
    /// Compile `configs` in order.
    ///
    /// # Errors
    /// Returns `PreviewError::InvalidPattern` for the first pattern that fails to compile.
    pub fn new(configs: &[PatternConfig], registry: SourceRegistry) -> Result<Self> {
        let patterns = configs
            .iter()
            .map(SearchPattern::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns, registry })
    }

    pub fn patterns(&self) -> &[SearchPattern] {
        &self.patterns
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// First pattern matching `text`. No match is not an error.
    pub fn find(&self, text: &str) -> Option<PatternMatch> {
        self.patterns.iter().find_map(|pattern| {
            let video_id = pattern.extract(text)?;
            Some(PatternMatch {
                pattern: pattern.name.clone(),
                video_id,
                source: self.registry.get(pattern.source),
            })
        })
    }
}
