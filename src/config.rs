//! Replacement policy configuration

use serde::{Deserialize, Serialize};

/// How malformed UTF-8 in the source is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Fail the stream with [`crate::Error::InvalidInput`]
    Strict,
    /// Silently skip the malformed bytes and continue
    #[default]
    Lenient,
}

/// Settings fixed for the lifetime of one [`crate::Replacer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacerConfig {
    /// Character emitted in place of every unrepresentable character
    pub replacement: char,
    /// Malformed input policy
    pub strictness: Strictness,
}

impl Default for ReplacerConfig {
    fn default() -> Self {
        Self {
            replacement: '?',
            strictness: Strictness::default(),
        }
    }
}

impl ReplacerConfig {
    /// Lenient configuration with the given replacement
    pub fn new(replacement: char) -> Self {
        Self {
            replacement,
            ..Self::default()
        }
    }

    /// Override the malformed input policy
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }
}
