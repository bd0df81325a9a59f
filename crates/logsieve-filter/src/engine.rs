//! Suppression decisions
//!
//! Each rule is an independent predicate. [`evaluate`] runs them cheapest
//! first and stops at the first that fires:
//!
//! 1. filtering disabled: pass
//! 2. severity not in a non-empty allow-list: suppress
//! 3. channel present and blocked: suppress
//! 4. rendered message matches a blocked pattern: suppress
//! 5. otherwise pass

use logsieve_types::{Context, LogEvent, Severity, channel_of};

use crate::config::FilterConfig;

/// Which rule suppressed an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reason {
    Level,
    Channel,
    /// Index into the configured pattern list
    Pattern { index: usize },
}

/// Outcome of filtering one event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Suppress(Reason),
}

impl Decision {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppress(_))
    }
}

/// Severity is outside a non-empty allow-list
///
/// Membership only: allowing `Warning` does not allow `Error`.
pub fn level_blocked(config: &FilterConfig, severity: Severity) -> bool {
    let allowed = config.allowed_levels();
    !allowed.is_empty() && !allowed.contains(&severity)
}

/// Event carries a channel that is blocked
pub fn channel_blocked(config: &FilterConfig, context: &Context) -> bool {
    let channels = config.blocked_channels();
    if channels.is_empty() {
        return false;
    }
    channel_of(context).is_some_and(|channel| channels.contains(&*channel))
}

/// Index of the first pattern matching the rendered message
pub fn pattern_blocked(config: &FilterConfig, rendered: &str) -> Option<usize> {
    config
        .blocked_patterns()
        .iter()
        .position(|pattern| pattern.is_match(rendered))
}

/// Decide whether an event is suppressed and why
pub fn evaluate(
    config: &FilterConfig,
    severity: Severity,
    template: &str,
    context: &Context,
) -> Decision {
    if !config.is_enabled() {
        return Decision::Pass;
    }

    if level_blocked(config, severity) {
        return Decision::Suppress(Reason::Level);
    }

    if channel_blocked(config, context) {
        return Decision::Suppress(Reason::Channel);
    }

    if !config.blocked_patterns().is_empty() {
        let rendered = config.renderer().render(template, context);
        if let Some(index) = pattern_blocked(config, &rendered) {
            return Decision::Suppress(Reason::Pattern { index });
        }
    }

    Decision::Pass
}

/// Return `true` if the event should be dropped
pub fn should_suppress(config: &FilterConfig, event: &LogEvent) -> bool {
    evaluate(config, event.severity, &event.template, &event.context).is_suppressed()
}
