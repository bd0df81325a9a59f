use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use logsieve_types::{Context, Severity};

use crate::engine::{Decision, Reason, evaluate};
use crate::sink::LogSink;
use crate::store::ConfigSource;

/// Sink decorator that drops noisy events before they reach `inner`
///
/// Implements [`LogSink`] itself, so it can stand in wherever the wrapped
/// sink is expected. Passing events are forwarded with their original
/// template and context; suppressed events vanish without error.
#[derive(Debug)]
pub struct FilteredLogger<S, C> {
    inner: S,
    config: C,
    stats: SuppressionStats,
}

impl<S, C> FilteredLogger<S, C>
where
    S: LogSink,
    C: ConfigSource,
{
    pub fn new(inner: S, config: C) -> Self {
        Self {
            inner,
            config,
            stats: SuppressionStats::default(),
        }
    }

    /// Decide without forwarding or counting
    pub fn decide(&self, severity: Severity, template: &str, context: &Context) -> Decision {
        let config = self.config.current_config();
        evaluate(&config, severity, template, context)
    }

    pub fn stats(&self) -> &SuppressionStats {
        &self.stats
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, C> LogSink for FilteredLogger<S, C>
where
    S: LogSink,
    C: ConfigSource,
{
    type Error = S::Error;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error> {
        match self.decide(severity, template, context) {
            Decision::Pass => {
                self.stats.record_pass();
                self.inner.log(severity, template, context)
            }
            Decision::Suppress(reason) => {
                self.stats.record_suppressed(reason);
                trace!(%severity, ?reason, template, "Suppressed log event");
                Ok(())
            }
        }
    }
}

/// Counters of filtering outcomes
#[derive(Debug, Default)]
pub struct SuppressionStats {
    passed: AtomicU64,
    level: AtomicU64,
    channel: AtomicU64,
    pattern: AtomicU64,
}

impl SuppressionStats {
    fn record_pass(&self) {
        self.passed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_suppressed(&self, reason: Reason) {
        let counter = match reason {
            Reason::Level => &self.level,
            Reason::Channel => &self.channel,
            Reason::Pattern { .. } => &self.pattern,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            passed: self.passed.load(Ordering::Relaxed),
            level: self.level.load(Ordering::Relaxed),
            channel: self.channel.load(Ordering::Relaxed),
            pattern: self.pattern.load(Ordering::Relaxed),
        }
    }
}

/// Counts per outcome
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub passed: u64,
    pub level: u64,
    pub channel: u64,
    pub pattern: u64,
}

impl StatsSnapshot {
    pub fn suppressed(&self) -> u64 {
        self.level + self.channel + self.pattern
    }

    pub fn total(&self) -> u64 {
        self.passed + self.suppressed()
    }
}
