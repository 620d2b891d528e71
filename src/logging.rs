//! Logging setup
//!
//! Every event is rendered as `YYYY-MM-DD HH:MM:SS - LEVEL - message` to both
//! stdout and the configured log file. An event with an empty message is
//! written as a bare newline, which separates consecutive runs in the log file.

use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Event formatter producing `timestamp - LEVEL - message` lines
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparatorFormat;

impl<S, N> FormatEvent<S, N> for SeparatorFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        if visitor.is_blank() {
            return writeln!(writer);
        }

        write!(
            writer,
            "{} - {} - ",
            Local::now().format(TIMESTAMP_FORMAT),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Collects the `message` field and notes whether any other field was recorded
#[derive(Default)]
struct MessageVisitor {
    message: String,
    has_other_fields: bool,
}

impl MessageVisitor {
    fn is_blank(&self) -> bool {
        !self.has_other_fields && self.message.trim().is_empty()
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.has_other_fields = true;
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.has_other_fields = true;
        }
    }
}

/// Builds the level filter from the command-line verbosity flags
pub fn build_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("club_harvest=info,warn"),
            1 => EnvFilter::new("club_harvest=debug,info"),
            2 => EnvFilter::new("club_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    }
}

/// Sets up the logging/tracing subscriber
///
/// Events go to stdout and are appended to `log_path` (created if missing).
pub fn init_logging(verbose: u8, quiet: bool, log_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(SeparatorFormat)
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .event_format(SeparatorFormat)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(build_filter(verbose, quiet))
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Emits a blank separator line
pub fn log_separator() {
    tracing::info!("");
}
