//! Engine limits.

use serde::Deserialize;

/// Ceilings applied before and during parsing.
///
/// Deserializes with every field optional, so a host can load a partial
/// settings object and keep the defaults for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Templates larger than this are rejected without being tokenized.
    pub max_template_bytes: usize,
    /// Maximum depth of nested blocks.
    pub max_nesting_depth: usize,
}

pub const DEFAULT_MAX_TEMPLATE_BYTES: usize = 100 * 1024;
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_template_bytes: DEFAULT_MAX_TEMPLATE_BYTES,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl EngineOptions {
    pub fn with_max_template_bytes(mut self, bytes: usize) -> Self {
        self.max_template_bytes = bytes;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_ceilings() {
        let options = EngineOptions::default();
        assert_eq!(options.max_template_bytes, 102_400);
        assert_eq!(options.max_nesting_depth, 64);
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let options: EngineOptions =
            serde_json::from_str(r#"{ "maxNestingDepth": 8 }"#).unwrap();
        assert_eq!(options.max_nesting_depth, 8);
        assert_eq!(options.max_template_bytes, DEFAULT_MAX_TEMPLATE_BYTES);
    }
}
