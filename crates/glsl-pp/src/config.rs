//! Preprocessor configuration

use indexmap::IndexMap;

/// Default limit on nested macro expansion.
pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 256;

/// Configuration for a [`Preprocessor`](crate::Preprocessor) run.
///
/// # Example
///
/// ```
/// use glsl_pp::PreprocessorConfig;
///
/// let config = PreprocessorConfig::new()
///     .with_define("USE_FOG", "1")
///     .with_max_expansion_depth(64);
/// assert_eq!(config.defines["USE_FOG"], "1");
/// ```
#[derive(Debug, Clone)]
pub struct PreprocessorConfig {
    /// Maximum nesting of macro expansions before giving up
    pub max_expansion_depth: usize,

    /// Object-like macros defined before the source is read.
    /// Values are lexed as the macro body.
    pub defines: IndexMap<String, String>,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
            defines: IndexMap::new(),
        }
    }
}

impl PreprocessorConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the macro expansion depth limit.
    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    /// Predefine an object-like macro.
    pub fn with_define(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.defines.insert(name.into(), body.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreprocessorConfig::default();
        assert_eq!(config.max_expansion_depth, DEFAULT_MAX_EXPANSION_DEPTH);
        assert!(config.defines.is_empty());
    }

    #[test]
    fn test_defines_keep_order_and_last_value() {
        let config = PreprocessorConfig::new()
            .with_define("B", "2")
            .with_define("A", "1")
            .with_define("B", "3");
        let names: Vec<_> = config.defines.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(config.defines["B"], "3");
    }
}
