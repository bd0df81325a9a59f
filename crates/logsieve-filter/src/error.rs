use std::path::PathBuf;

use thiserror::Error;

/// Why a single pattern string could not be compiled
#[derive(Debug, Error)]
pub enum PatternSyntaxError {
    #[error("pattern is empty")]
    Empty,

    #[error("no ending delimiter '{0}' found")]
    MissingDelimiter(char),

    #[error("unknown modifier '{0}'")]
    UnsupportedFlag(char),

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A rejected entry in the configured pattern list
#[derive(Debug, Error)]
#[error("pattern #{index} '{pattern}': {source}")]
pub struct PatternError {
    /// Position in the configured list
    pub index: usize,
    pub pattern: String,
    #[source]
    pub source: PatternSyntaxError,
}

/// Errors raised while loading or saving filter settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} invalid pattern(s): {}", .0.len(), join_errors(.0))]
    InvalidPatterns(Vec<PatternError>),

    #[error("failed to read settings from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported settings format for {} (expected .toml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),
}

fn join_errors(errors: &[PatternError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
