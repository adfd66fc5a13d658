//! Optimization switches.
//!
//! The configuration is a flat map from key to boolean read from a
//! properties file:
//!
//! ```text
//! # comment
//! constant.arithmetic = false
//! constant.unary: true
//! defaults false
//! ```
//!
//! Keys that are not set read as `false`, except the default-enabled
//! set below, which is merged first unless the file sets
//! `defaults=false`.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Fold `+` between constant strings (and constants of other types).
pub const CONSTANT_STRING_CONCAT: &str = "constant.string.concat";
/// Fold arithmetic, bitwise and shift operators on constant numbers.
pub const CONSTANT_ARITHMETIC: &str = "constant.arithmetic";
/// Fold unary `-`, `~` and `!` on constants.
pub const CONSTANT_UNARY: &str = "constant.unary";

const DEFAULTS_KEY: &str = "defaults";
const DEFAULT_ENABLED: [&str; 3] = [CONSTANT_STRING_CONCAT, CONSTANT_ARITHMETIC, CONSTANT_UNARY];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read optimization file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which optional optimizations are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizationConfig {
    flags: FxHashMap<String, bool>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        let mut config = Self::empty();
        config.merge_defaults();
        config
    }
}

impl OptimizationConfig {
    /// A configuration with every optimization disabled.
    pub fn empty() -> Self {
        Self {
            flags: FxHashMap::default(),
        }
    }

    fn merge_defaults(&mut self) {
        for key in DEFAULT_ENABLED {
            self.flags.insert(key.to_string(), true);
        }
    }

    /// Parse a properties document.
    pub fn parse(text: &str) -> Self {
        let entries: Vec<(String, bool)> = text.lines().filter_map(parse_line).collect();

        let use_defaults = entries
            .iter()
            .rev()
            .find(|(key, _)| key == DEFAULTS_KEY)
            .map(|(_, value)| *value)
            .unwrap_or(true);

        let mut config = Self::empty();
        if use_defaults {
            config.merge_defaults();
        }
        for (key, value) in entries {
            if key != DEFAULTS_KEY {
                config.flags.insert(key, value);
            }
        }
        config
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text);
        tracing::debug!(path = %path.display(), ?config, "loaded optimization config");
        Ok(config)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: impl Into<String>, enabled: bool) {
        self.flags.insert(key.into(), enabled);
    }
}

/// One `key=value`, `key:value` or `key value` line.
fn parse_line(line: &str) -> Option<(String, bool)> {
    let line = line.trim_start();
    if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
        return None;
    }
    let split = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let key = line[..split].trim_end();
    let mut value = line[split..].trim_start();
    if let Some(rest) = value.strip_prefix(['=', ':']) {
        value = rest.trim_start();
    }
    Some((key.to_string(), value.trim_end().eq_ignore_ascii_case("true")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enabled_and_the_rest_is_off() {
        let config = OptimizationConfig::default();
        assert!(config.is_enabled(CONSTANT_ARITHMETIC));
        assert!(config.is_enabled(CONSTANT_STRING_CONCAT));
        assert!(config.is_enabled(CONSTANT_UNARY));
        assert!(!config.is_enabled("inline.everything"));
    }

    #[test]
    fn file_overrides_win() {
        let config = OptimizationConfig::parse("# folding\nconstant.arithmetic=false\nextra : TRUE\n");
        assert!(!config.is_enabled(CONSTANT_ARITHMETIC));
        assert!(config.is_enabled(CONSTANT_UNARY));
        assert!(config.is_enabled("extra"));
    }

    #[test]
    fn defaults_can_be_switched_off() {
        let config = OptimizationConfig::parse("defaults false\nconstant.unary = true");
        assert!(!config.is_enabled(CONSTANT_ARITHMETIC));
        assert!(!config.is_enabled(CONSTANT_STRING_CONCAT));
        assert!(config.is_enabled(CONSTANT_UNARY));
    }

    #[test]
    fn values_other_than_true_are_false() {
        let config = OptimizationConfig::parse("a=yes\nb\n! bang comment\nc=True");
        assert!(!config.is_enabled("a"));
        assert!(!config.is_enabled("b"));
        assert!(config.is_enabled("c"));
    }

    #[test]
    fn load_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.properties");
        let err = OptimizationConfig::load(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.properties"));

        let present = dir.path().join("opt.properties");
        std::fs::write(&present, "constant.arithmetic=false").unwrap();
        assert!(!OptimizationConfig::load(&present).unwrap().is_enabled(CONSTANT_ARITHMETIC));
    }
}
