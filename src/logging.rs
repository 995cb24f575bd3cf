//! Structured logging backend, concretely implementing the Core-to-log
//! contract on top of `tracing`/`tracing-subscriber`. Only a leveled
//! `log!(level, "...")` surface is exposed — no structured fields, to
//! match the line-oriented contract the core expects.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::layer::SubscriberExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn to_tracing(self) -> tracing::Level {
        match self {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone)]
struct SharedWriter(Arc<Mutex<Box<dyn io::Write + Send>>>);

impl io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap().flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedWriter {
    type Writer = SharedWriter;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install the global tracing subscriber. `sink` is a path, or `"stderr"`
/// for standard error. Idempotent: a second call (as happens after
/// `fork()`, since the child re-enters the same startup path) is a no-op
/// rather than a panic.
pub fn log_init(sink: &str, level: Level) {
    let writer: Box<dyn io::Write + Send> = if sink == "stderr" {
        Box::new(io::stderr())
    } else {
        match OpenOptions::new().create(true).append(true).open(sink) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(io::stderr()),
        }
    };
    let writer = SharedWriter(Arc::new(Mutex::new(writer)));

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing().to_string()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .try_init();
}

/// Emit one leveled, formatted log line. Thin dispatch over
/// `tracing::event!`, kept as a function (rather than a macro) so call
/// sites read like the plain `log(level, "...")` contract the core
/// documents.
pub fn log(level: Level, target: &str, message: std::fmt::Arguments<'_>) {
    match level {
        Level::Debug => tracing::debug!(target: "proton", %target, "{}", message),
        Level::Info => tracing::info!(target: "proton", %target, "{}", message),
        Level::Warn => tracing::warn!(target: "proton", %target, "{}", message),
        Level::Error => tracing::error!(target: "proton", %target, "{}", message),
    }
}

/// Flush is implicit: the `fmt` layer writes synchronously through
/// `SharedWriter`, so there is nothing buffered to drain. Kept as an
/// explicit call site so shutdown sequencing matches the documented
/// log-init/log-close pairing.
pub fn log_close() {}

#[macro_export]
macro_rules! logf {
    ($level:expr, $target:expr, $($arg:tt)*) => {
        $crate::logging::log($level, $target, format_args!($($arg)*))
    };
}
