//! Explicit logging handle.
//!
//! `main` builds one `Reporter` and lends it to the validator and dispatcher;
//! nothing in the crate installs or reads a global logger.

use log::{Level, Log, Record};
use std::fmt::Display;
use std::io::Write;

pub const LOG_TARGET: &str = "cacao-run";

/// `2026-10-19T08:15:02Z` -> `2026-10-19 08:15:02` (UTC).
fn wall_clock(rfc3339: &str) -> String {
    rfc3339.trim_end_matches('Z').replacen('T', " ", 1)
}

/// Level names as the run logs have always spelled them.
fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug | Level::Trace => "DEBUG",
    }
}

pub struct Reporter {
    sink: Box<dyn Log>,
}

impl Reporter {
    pub fn new(sink: Box<dyn Log>) -> Self {
        Self { sink }
    }

    /// env_logger on stderr, `info` unless RUST_LOG says otherwise.
    pub fn from_env() -> Self {
        let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Stderr)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} - {} - {} - {}",
                    wall_clock(&buf.timestamp_seconds().to_string()),
                    record.target(),
                    level_name(record.level()),
                    record.args()
                )
            })
            .build();
        Self::new(Box::new(logger))
    }

    fn emit(&self, level: Level, msg: impl Display) {
        self.sink.log(
            &Record::builder()
                .args(format_args!("{msg}"))
                .level(level)
                .target(LOG_TARGET)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn debug(&self, msg: impl Display) {
        self.emit(Level::Debug, msg);
    }

    pub fn info(&self, msg: impl Display) {
        self.emit(Level::Info, msg);
    }

    pub fn warn(&self, msg: impl Display) {
        self.emit(Level::Warn, msg);
    }

    pub fn error(&self, msg: impl Display) {
        self.emit(Level::Error, msg);
    }

    /// Report a fatal error, framed by blank lines so it stands out in the run log.
    pub fn fail(&self, msg: impl Display) {
        self.error("");
        self.error(msg);
        self.error("");
        self.sink.flush();
    }
}

#[cfg(test)]
pub(crate) mod capture {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// In-memory sink for asserting on what was logged.
    #[derive(Clone, Default)]
    pub struct Capture(pub Arc<Mutex<Vec<(Level, String)>>>);

    impl Log for Capture {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &Record) {
            self.0
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
        fn flush(&self) {}
    }

    impl Capture {
        pub fn reporter(&self) -> Reporter {
            Reporter::new(Box::new(self.clone()))
        }

        pub fn messages(&self) -> Vec<(Level, String)> {
            self.0.lock().unwrap().clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::capture::Capture;
    use super::*;

    #[test]
    fn line_prefix_matches_run_log_format() {
        assert_eq!(wall_clock("2026-10-19T08:15:02Z"), "2026-10-19 08:15:02");
        assert_eq!(level_name(Level::Warn), "WARNING");
        assert_eq!(level_name(Level::Info), "INFO");
        assert_eq!(level_name(Level::Error), "ERROR");
    }

    #[test]
    fn fail_frames_message() {
        let cap = Capture::default();
        let log = cap.reporter();
        log.info("Start");
        log.fail("bad things");
        let msgs = cap.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0], (Level::Info, "Start".to_string()));
        assert_eq!(msgs[2], (Level::Error, "bad things".to_string()));
        assert_eq!(msgs[3].1, "");
    }
}
