use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use logsieve_types::Severity;

use crate::error::{ConfigError, PatternError};
use crate::pattern::BlockedPattern;

/// Persisted filter settings
///
/// This is the record the configuration store reads and writes, using the
/// store's key names. Missing keys fall back to disabled/empty. Compile it
/// into a [`FilterConfig`](crate::FilterConfig) before filtering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Master switch
    pub enabled: bool,

    /// Severities allowed through (empty = all)
    pub log_levels: Vec<Severity>,

    /// Channels to suppress
    pub message_types: Vec<String>,

    /// Delimited regex patterns matched against rendered messages
    pub patterns: Vec<String>,
}

impl FilterSettings {
    /// Build settings from the admin form fields
    ///
    /// Channels and patterns arrive as newline-separated text. Each line is
    /// trimmed and blank lines are dropped. Checked levels are de-duplicated
    /// and stored in syslog code order.
    pub fn from_form(
        enabled: bool,
        checked_levels: impl IntoIterator<Item = Severity>,
        message_types: &str,
        patterns: &str,
    ) -> Self {
        let levels: BTreeSet<Severity> = checked_levels.into_iter().collect();
        Self {
            enabled,
            log_levels: levels.into_iter().collect(),
            message_types: split_lines(message_types),
            patterns: split_lines(patterns),
        }
    }

    /// Parse settings from TOML
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Parse settings from JSON
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load settings from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let parse: fn(&str) -> Result<Self, ConfigError> =
            match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => Self::from_toml_str,
                Some("json") => Self::from_json_str,
                _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
            };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&content)
    }

    /// Check every pattern, collecting all failures
    ///
    /// Call this before saving so bad patterns are rejected up front
    /// instead of being skipped while logging.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compile_patterns().map(|_| ())
    }

    pub(crate) fn compile_patterns(&self) -> Result<Vec<BlockedPattern>, ConfigError> {
        let mut compiled = Vec::with_capacity(self.patterns.len());
        let mut errors = Vec::new();

        for (index, pattern) in self.patterns.iter().enumerate() {
            match BlockedPattern::parse(pattern) {
                Ok(p) => compiled.push(p),
                Err(source) => errors.push(PatternError {
                    index,
                    pattern: pattern.clone(),
                    source,
                }),
            }
        }

        if errors.is_empty() {
            Ok(compiled)
        } else {
            Err(ConfigError::InvalidPatterns(errors))
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_form_normalises_text() {
        let settings = FilterSettings::from_form(
            true,
            [Severity::Warning, Severity::Error, Severity::Warning],
            "php\r\n  page not found  \n\n",
            "/deprecated/i\n\n   \n/^SkipMe:/\n",
        );

        assert!(settings.enabled);
        assert_eq!(settings.log_levels, vec![Severity::Error, Severity::Warning]);
        assert_eq!(settings.message_types, vec!["php", "page not found"]);
        assert_eq!(settings.patterns, vec!["/deprecated/i", "/^SkipMe:/"]);
    }

    #[test]
    fn test_from_toml() {
        let settings = FilterSettings::from_toml_str(
            r#"
            enabled = true
            log_levels = [3, "warning"]
            message_types = ["cron"]
            patterns = ['/AccessDeniedHttpException/i']
            "#,
        )
        .unwrap();

        assert!(settings.enabled);
        assert_eq!(settings.log_levels, vec![Severity::Error, Severity::Warning]);
        assert_eq!(settings.message_types, vec!["cron"]);
        assert_eq!(settings.patterns, vec!["/AccessDeniedHttpException/i"]);
    }

    #[test]
    fn test_missing_keys_default() {
        let settings = FilterSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, FilterSettings::default());
        assert!(!settings.enabled);
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(FilterSettings::from_json_str(r#"{"log_levels": [9]}"#).is_err());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let settings = FilterSettings {
            patterns: vec!["/ok/".into(), "/(/".into(), "/fine/i".into(), "/x/z".into()],
            ..Default::default()
        };

        match settings.validate() {
            Err(ConfigError::InvalidPatterns(errors)) => {
                let indexes: Vec<usize> = errors.iter().map(|e| e.index).collect();
                assert_eq!(indexes, vec![1, 3]);
                assert_eq!(errors[0].pattern, "/(/");
            }
            other => panic!("expected invalid patterns, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = FilterSettings::load(Path::new("settings.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));

        let err = FilterSettings::load(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
