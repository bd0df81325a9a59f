//! Log filtering for logsieve
//!
//! This crate decides whether a log event is noise and provides the sink
//! decorator that drops it before it is persisted.

mod config;
mod engine;
mod error;
mod logger;
mod pattern;
mod settings;
mod sink;
mod store;

pub use config::FilterConfig;
pub use engine::{
    Decision, Reason, channel_blocked, evaluate, level_blocked, pattern_blocked, should_suppress,
};
pub use error::{ConfigError, PatternError, PatternSyntaxError};
pub use logger::{FilteredLogger, StatsSnapshot, SuppressionStats};
pub use pattern::BlockedPattern;
pub use settings::FilterSettings;
pub use sink::{JsonLinesSink, LogSink, MemorySink};
pub use store::{ConfigSource, SharedConfig};

// Re-export types used in our public API
pub use logsieve_render::{Emphasis, Renderer};
pub use logsieve_types::{Context, LogEvent, Severity};
