extern crate log;

use {
    std::sync::Once,
    log::{Log, Record, LevelFilter, Metadata},
};

static INIT: Once = Once::new();

/// Initialize the logging infrastructure.
///
/// Reads `RUST_LOG` for the level. Safe to call more than once (e.g. from
/// every test in a binary); only the first call installs the logger.
pub fn init() {
    INIT.call_once(|| {
        if let Ok(s) = std::env::var("RUST_LOG") {
            let lvl = match s.as_str() {
                "none" => {
                    return; // disabled
                },
                "info" => LevelFilter::Info,
                "error" => LevelFilter::Error,
                "warn" => LevelFilter::Warn,
                "debug" => LevelFilter::Debug,
                "trace" => LevelFilter::Trace,
                s => {
                    eprintln!("unknown logging level {:?}", s);
                    return;
                },
            };
            let logger = Logger(lvl);
            log::set_max_level(lvl);
            if log::set_boxed_logger(Box::new(logger)).is_err() {
                eprintln!("logger already installed");
            }
        }
    });
}

/// Logger implementation.
struct Logger(LevelFilter);

impl Log for Logger {
    #[inline(always)]
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.0
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let path = record.module_path().unwrap_or("<>");
            eprintln!("[{} {}] {}", record.level(), path, record.args());
        }
    }

    fn flush(&self) {}
}
