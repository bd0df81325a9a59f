use std::convert::Infallible;
use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use logsieve_types::{Context, LogEvent, Severity};

/// Capability to persist a log call
///
/// Receives the raw template and context; rendering for display is the
/// sink's own business. Errors propagate to the original call site.
pub trait LogSink {
    type Error;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error>;
}

impl<S: LogSink + ?Sized> LogSink for &S {
    type Error = S::Error;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error> {
        (**self).log(severity, template, context)
    }
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    type Error = S::Error;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error> {
        (**self).log(severity, template, context)
    }
}

/// Sink that keeps every call in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded events (cloned)
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    type Error = Infallible;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error> {
        self.events.lock().push(LogEvent {
            severity,
            template: template.to_string(),
            context: context.clone(),
        });
        Ok(())
    }
}

#[derive(Serialize)]
struct Record<'a> {
    severity: Severity,
    template: &'a str,
    context: &'a Context,
}

/// Sink writing one JSON object per line
///
/// Lines use the same shape as [`LogEvent`], so the output can be read
/// back as events.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> LogSink for JsonLinesSink<W> {
    type Error = io::Error;

    fn log(&self, severity: Severity, template: &str, context: &Context) -> Result<(), Self::Error> {
        let record = Record {
            severity,
            template,
            context,
        };
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, &record)?;
        writer.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_calls() {
        let sink = MemorySink::new();
        let event = LogEvent::new(Severity::Notice, "@a").with("a", "b");
        sink.log(event.severity, &event.template, &event.context).unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events(), vec![event]);
    }

    #[test]
    fn test_json_lines_round_trip() {
        let sink = JsonLinesSink::new(Vec::new());
        let event = LogEvent::new(Severity::Error, "@type: @message")
            .with("type", "Path")
            .with("line", 117);
        sink.log(event.severity, &event.template, &event.context).unwrap();
        sink.log(Severity::Debug, "second", &Context::new()).unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: LogEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, event);
    }
}
