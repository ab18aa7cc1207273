#![cfg(feature = "std")]

use std::env;
use std::sync::OnceLock;

use log::{self, LevelFilter, Metadata, Record};

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;
static INSTALLED: OnceLock<LevelFilter> = OnceLock::new();

/// Install the stderr logger at the level named by `NAVAL_LOG`, defaulting
/// to `info` when unset or unparsable. Later calls keep the first level.
pub fn init_logging() -> LevelFilter {
    *INSTALLED.get_or_init(|| {
        let level = env::var("NAVAL_LOG")
            .ok()
            .and_then(|lvl| lvl.parse().ok())
            .unwrap_or(LevelFilter::Info);
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
        level
    })
}
