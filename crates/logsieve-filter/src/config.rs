use std::collections::HashSet;

use tracing::warn;

use logsieve_render::Renderer;
use logsieve_types::Severity;

use crate::error::{ConfigError, PatternSyntaxError};
use crate::pattern::BlockedPattern;
use crate::settings::FilterSettings;

/// Immutable filter configuration snapshot
///
/// Built once per settings load and shared behind an `Arc`; it is never
/// mutated after construction, so a decision always sees one consistent
/// version.
#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    /// Master switch
    enabled: bool,

    /// Severities allowed through (empty = all)
    allowed_levels: HashSet<Severity>,

    /// Channels to suppress (exact, case-sensitive)
    blocked_channels: HashSet<String>,

    /// Patterns tried in order against the rendered message
    blocked_patterns: Vec<BlockedPattern>,

    /// Renderer producing the text patterns are matched against
    renderer: Renderer,
}

impl FilterConfig {
    /// Create an empty configuration
    ///
    /// With no criteria added nothing is suppressed, even when enabled.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Compile settings, rejecting any invalid pattern
    pub fn from_settings(settings: &FilterSettings) -> Result<Self, ConfigError> {
        let blocked_patterns = settings.compile_patterns()?;
        Ok(Self::with_patterns(settings, blocked_patterns))
    }

    /// Compile settings, keeping invalid patterns as inert entries
    ///
    /// For settings that bypassed validation. Each bad pattern is reported
    /// once here and then never matches.
    pub fn from_settings_lenient(settings: &FilterSettings) -> Self {
        let blocked_patterns = settings
            .patterns
            .iter()
            .enumerate()
            .map(|(index, source)| {
                BlockedPattern::parse(source).unwrap_or_else(|e| {
                    warn!(index, pattern = %source, error = %e, "Skipping invalid log filter pattern");
                    BlockedPattern::inert(source)
                })
            })
            .collect();
        Self::with_patterns(settings, blocked_patterns)
    }

    fn with_patterns(settings: &FilterSettings, blocked_patterns: Vec<BlockedPattern>) -> Self {
        Self {
            enabled: settings.enabled,
            allowed_levels: settings.log_levels.iter().copied().collect(),
            blocked_channels: settings.message_types.iter().cloned().collect(),
            blocked_patterns,
            renderer: Renderer::default(),
        }
    }

    /// Set the severities allowed through
    pub fn with_levels(mut self, levels: impl IntoIterator<Item = Severity>) -> Self {
        self.allowed_levels = levels.into_iter().collect();
        self
    }

    /// Set the channels to suppress
    pub fn with_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Append a blocked pattern
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, PatternSyntaxError> {
        self.blocked_patterns.push(BlockedPattern::parse(pattern)?);
        Ok(self)
    }

    /// Render messages with a custom renderer before pattern checks
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allowed_levels(&self) -> &HashSet<Severity> {
        &self.allowed_levels
    }

    pub fn blocked_channels(&self) -> &HashSet<String> {
        &self.blocked_channels
    }

    pub fn blocked_patterns(&self) -> &[BlockedPattern] {
        &self.blocked_patterns
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }
}
