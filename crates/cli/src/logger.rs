//! Minimal stderr backend for the `log` facade.

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", label(record.level()), record.args());
        }
    }

    fn flush(&self) {}
}

fn label(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "error",
        log::Level::Warn => "warning",
        log::Level::Info => "note",
        log::Level::Debug | log::Level::Trace => "debug",
    }
}

/// Install the logger. Library warnings duplicate the diagnostics the
/// CLI prints itself, so the quiet level is `Error`.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Error };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
