//! Console logging and panic reporting.
//!
//! The layout logs through `tracing` and never installs a subscriber on its own.
//! Applications that do not bring their own can call [`install_tracing`], and
//! [`install_panic_hook`] to have panics reported through the same channel.

use std::backtrace::Backtrace;
use std::io::{self, Write};
use std::panic;
use std::str::FromStr;
use std::sync::{Arc, Mutex, Once, OnceLock, PoisonError};
use std::thread;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, filter};

use crate::error::panic_message;

const TRACING_PREFIX: &str = "[tideline]";
const MAX_PANIC_LINES: usize = 8;

// ============================================================================
// Global State
// ============================================================================

static PANIC_HOOK_INSTALLED: Once = Once::new();
static TRACING_INSTALLED: Once = Once::new();
static LOG_LEVEL: OnceLock<Arc<Mutex<LevelFilter>>> = OnceLock::new();

fn log_level_handle() -> Arc<Mutex<LevelFilter>> {
    LOG_LEVEL
        .get_or_init(|| Arc::new(Mutex::new(LevelFilter::TRACE)))
        .clone()
}

fn current_log_level() -> LevelFilter {
    *log_level_handle()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Restricts console output to `level` and above.
///
/// Applies on top of the `RUST_LOG` filter. Unknown levels fall back to `info`.
pub fn set_log_level(level: &str) {
    let parsed = LevelFilter::from_str(level).unwrap_or(LevelFilter::INFO);
    *log_level_handle()
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = parsed;
}

// ============================================================================
// Installation
// ============================================================================

/// Installs a console subscriber (idempotent).
///
/// Reads its filter from `RUST_LOG`, defaulting to `info`. Every line is prefixed with
/// `[tideline]`.
pub fn install_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let level_filter =
            filter::filter_fn(|metadata| level_allows(current_log_level(), *metadata.level()));

        let console = fmt::layer()
            .event_format(PanicAwareFormatter)
            .with_writer(PrefixedWriter)
            .with_ansi(false)
            .with_filter(env_filter)
            .with_filter(level_filter);

        if tracing_subscriber::registry().with(console).try_init().is_err() {
            eprintln!("{TRACING_PREFIX} a global tracing subscriber is already installed");
        }
    });
}

/// Reports panics through `tracing` before running the previous hook (idempotent).
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let message = panic_message(info.payload());
            let thread_name = thread::current().name().unwrap_or("unnamed").to_string();
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()))
                .unwrap_or_default();
            let backtrace = Backtrace::force_capture().to_string();

            tracing::error!(
                target: "tideline::panic",
                message = %message,
                thread = %thread_name,
                location = %location,
                backtrace = %backtrace
            );
            previous(info);
        }));
    });
}

const fn level_allows(filter: LevelFilter, level: Level) -> bool {
    match filter {
        LevelFilter::OFF => false,
        LevelFilter::ERROR => matches!(level, Level::ERROR),
        LevelFilter::WARN => matches!(level, Level::ERROR | Level::WARN),
        LevelFilter::INFO => matches!(level, Level::ERROR | Level::WARN | Level::INFO),
        LevelFilter::DEBUG => matches!(
            level,
            Level::ERROR | Level::WARN | Level::INFO | Level::DEBUG
        ),
        LevelFilter::TRACE => true,
    }
}

// ============================================================================
// Console Output
// ============================================================================

#[derive(Clone, Copy, Default)]
struct PrefixedWriter;

impl<'a> MakeWriter<'a> for PrefixedWriter {
    type Writer = PrefixedWriterInner<io::Stderr>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixedWriterInner {
            inner: io::stderr(),
            wrote_prefix: false,
        }
    }
}

struct PrefixedWriterInner<W> {
    inner: W,
    wrote_prefix: bool,
}

impl<W: Write> Write for PrefixedWriterInner<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_prefix {
            self.inner.write_all(TRACING_PREFIX.as_bytes())?;
            self.inner.write_all(b" ")?;
            self.wrote_prefix = true;
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Clone, Copy, Default)]
struct PanicAwareFormatter;

impl<S, N> FormatEvent<S, N> for PanicAwareFormatter
where
    S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let target = event.metadata().target();

        if target == "tideline::panic" {
            let mut visitor = PanicFieldVisitor::default();
            event.record(&mut visitor);

            let message = visitor.message.as_deref().unwrap_or("panic");
            write!(writer, "PANIC: {message}")?;
            if let Some(location) = visitor.location.as_deref().filter(|l| !l.is_empty()) {
                write!(writer, " at {location}")?;
            }

            if let Some(backtrace) = visitor.backtrace.as_deref() {
                write!(writer, "\nStack:")?;
                for line in backtrace.lines().take(MAX_PANIC_LINES) {
                    write!(writer, "\n  {line}")?;
                }
                if backtrace.lines().count() > MAX_PANIC_LINES {
                    write!(writer, "\n  ... (truncated)")?;
                }
            }
            writeln!(writer)
        } else {
            let level = event.metadata().level();
            write!(writer, "{level} {target}: ")?;
            ctx.field_format().format_fields(writer.by_ref(), event)?;
            writeln!(writer)
        }
    }
}

#[derive(Default)]
struct PanicFieldVisitor {
    message: Option<String>,
    location: Option<String>,
    backtrace: Option<String>,
}

impl tracing::field::Visit for PanicFieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "location" => self.location = Some(value.to_string()),
            "backtrace" => self.backtrace = Some(value.to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_filter_orders_levels() {
        assert!(level_allows(LevelFilter::INFO, Level::WARN));
        assert!(!level_allows(LevelFilter::INFO, Level::DEBUG));
        assert!(!level_allows(LevelFilter::OFF, Level::ERROR));
        assert!(level_allows(LevelFilter::TRACE, Level::TRACE));
    }

    #[test]
    fn writer_prefixes_each_line_once() {
        let mut writer = PrefixedWriterInner {
            inner: Vec::new(),
            wrote_prefix: false,
        };
        writer.write_all(b"INFO a: ").unwrap();
        writer.write_all(b"hello\n").unwrap();
        assert_eq!(String::from_utf8(writer.inner).unwrap(), "[tideline] INFO a: hello\n");
    }

    #[test]
    fn install_is_idempotent() {
        install_tracing();
        install_tracing();
        set_log_level("not-a-level");
        assert_eq!(current_log_level(), LevelFilter::INFO);
        set_log_level("trace");
        assert_eq!(current_log_level(), LevelFilter::TRACE);
    }
}
