//! Shared types for logsieve
//!
//! This crate contains the value types passed between the renderer, the
//! filter engine and the sinks it decorates.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Severity
// ============================================================================

/// Syslog severity level (RFC 5424)
///
/// The numeric value is the syslog code, so `Emergency` is 0 and `Debug` is 7.
/// Filtering treats severities as set members; the ordering derived here is
/// only used for stable iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// All severities in syslog code order
    pub const ALL: [Severity; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// Look up a severity by its syslog code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Emergency),
            1 => Some(Self::Alert),
            2 => Some(Self::Critical),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Syslog code
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a severity name or code is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity '{0}'")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    /// Parse a syslog code or a common level name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Self::from_code(code).ok_or_else(|| ParseSeverityError(s.to_string()));
        }
        match trimmed.to_lowercase().as_str() {
            "emergency" | "emerg" => Ok(Self::Emergency),
            "alert" => Ok(Self::Alert),
            "critical" | "crit" => Ok(Self::Critical),
            "error" | "err" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            "info" | "informational" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Severity {
    /// Accepts either the syslog code or a level name
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeverityVisitor;

        impl Visitor<'_> for SeverityVisitor {
            type Value = Severity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a syslog severity code (0-7) or level name")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Severity, E> {
                Severity::from_code(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Severity, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(Severity::from_code)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Severity, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

// ============================================================================
// Log Events
// ============================================================================

/// Placeholder values keyed by name
///
/// A `BTreeMap` keeps iteration order independent of hashing so rendering
/// stays deterministic.
pub type Context = BTreeMap<String, Value>;

/// Context key carrying the channel (subsystem) of an event
pub const CHANNEL_KEY: &str = "channel";

/// A single log call: severity, message template and placeholder context
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    pub severity: Severity,

    /// Message template, possibly containing `@`, `%` or `!` placeholders
    pub template: String,

    #[serde(default)]
    pub context: Context,
}

impl LogEvent {
    /// Create an event with an empty context
    pub fn new(severity: Severity, template: impl Into<String>) -> Self {
        Self {
            severity,
            template: template.into(),
            context: Context::new(),
        }
    }

    /// Add a context value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Add a context value from anything that can be displayed
    pub fn with_display(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with(key, value.to_string())
    }

    /// Set the channel of this event
    pub fn with_channel(self, channel: impl Into<String>) -> Self {
        self.with(CHANNEL_KEY, channel.into())
    }

    /// Channel of this event, if one is set
    pub fn channel(&self) -> Option<Cow<'_, str>> {
        channel_of(&self.context)
    }
}

/// Read the channel out of a context
///
/// Missing keys, `null` and values that stringify to the empty string all
/// count as "no channel".
pub fn channel_of(context: &Context) -> Option<Cow<'_, str>> {
    let value = context.get(CHANNEL_KEY)?;
    let text = display_value(value);
    if text.is_empty() { None } else { Some(text) }
}

/// Convert a context value to the text that appears in a rendered message
///
/// Booleans follow the platform's string casts: `true` becomes `"1"` and
/// `false` becomes `""`.
pub fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("1"),
        Value::Bool(false) => Cow::Borrowed(""),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_codes() {
        for (code, severity) in Severity::ALL.iter().enumerate() {
            assert_eq!(severity.code() as usize, code);
            assert_eq!(Severity::from_code(code as i64), Some(*severity));
        }
        assert_eq!(Severity::from_code(8), None);
        assert_eq!(Severity::from_code(-1), None);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("warn".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("3".parse::<Severity>(), Ok(Severity::Error));
        assert!("verbose".parse::<Severity>().is_err());
        assert!("9".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_deserialize() {
        let levels: Vec<Severity> = serde_json::from_value(json!([3, "warning", "debug"])).unwrap();
        assert_eq!(
            levels,
            vec![Severity::Error, Severity::Warning, Severity::Debug]
        );
        assert!(serde_json::from_value::<Severity>(json!(12)).is_err());
        assert_eq!(serde_json::to_value(Severity::Notice).unwrap(), json!(5));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(117)), "117");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!(true)), "1");
        assert_eq!(display_value(&json!(false)), "");
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn test_channel_absent_or_empty() {
        let event = LogEvent::new(Severity::Info, "msg");
        assert_eq!(event.channel(), None);

        let event = event.with_channel("");
        assert_eq!(event.channel(), None);

        let event = LogEvent::new(Severity::Info, "msg").with_channel("cron");
        assert_eq!(event.channel().as_deref(), Some("cron"));
    }

    #[test]
    fn test_event_deserialize_defaults_context() {
        let event: LogEvent =
            serde_json::from_value(json!({"severity": "info", "template": "hi"})).unwrap();
        assert_eq!(event, LogEvent::new(Severity::Info, "hi"));
    }
}
