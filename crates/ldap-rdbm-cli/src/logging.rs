//! Log setup: human-facing log on stderr plus an optional diagnostic file.
//!
//! The diagnostic file records every event at DEBUG and above with a
//! timestamp, whatever `--verbosity` says, so failed imports can be traced
//! after the fact.

use std::fmt::Write as FmtWrite;
use std::fs::{File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::Path;
use std::sync::Mutex;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, Layer, Registry};

/// A tracing layer that appends formatted log lines to a file.
pub struct DiagnosticLogLayer {
    file: Mutex<File>,
}

impl DiagnosticLogLayer {
    /// Open (or create) `path` for appending.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S> Layer<S> for DiagnosticLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = String::new();

        let now = chrono::Local::now();
        let _ = write!(line, "{} ", now.format("%Y-%m-%d %H:%M:%S%.3f"));

        let level = event.metadata().level();
        let _ = write!(line, "[{:5}] ", level);

        let target = event.metadata().target();
        if !target.is_empty() {
            let _ = write!(line, "{}: ", target);
        }

        let mut visitor = MessageVisitor::new();
        event.record(&mut visitor);
        line.push_str(&visitor.message);

        // A failed write must not take the command down with it.
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// Visitor for extracting the message from a tracing event.
struct MessageVisitor {
    message: String,
}

impl MessageVisitor {
    fn new() -> Self {
        Self {
            message: String::new(),
        }
    }

    fn push_field(&mut self, name: &str, value: impl std::fmt::Display) {
        if !self.message.is_empty() {
            self.message.push(' ');
        }
        let _ = write!(self.message, "{}={}", name, value);
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), value);
        }
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push_field(field.name(), value);
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push_field(field.name(), value);
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push_field(field.name(), value);
    }
}

fn parse_level(verbosity: &str) -> Level {
    match verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global subscriber.
pub fn setup_logging(
    verbosity: &str,
    format: &str,
    diagnostic_log: Option<&Path>,
) -> Result<(), String> {
    let level = LevelFilter::from_level(parse_level(verbosity));

    let stderr: Box<dyn Layer<Registry> + Send + Sync> = if format == "json" {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let diagnostic = match diagnostic_log {
        Some(path) => Some(
            DiagnosticLogLayer::open(path)
                .map_err(|e| format!("cannot open {}: {}", path.display(), e))?
                .with_filter(LevelFilter::DEBUG),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr.with_filter(level))
        .with(diagnostic)
        .try_init()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("chatty"), Level::INFO);
    }

    #[test]
    fn test_diagnostic_layer_writes_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diag.log");
        let layer = DiagnosticLogLayer::open(&path).unwrap();

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(table = "jansClnt", "Reflected table");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[DEBUG]"));
        assert!(content.contains("Reflected table table=jansClnt"));
    }
}
