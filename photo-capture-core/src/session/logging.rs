use std::fmt;
use std::sync::Arc;

use log::{Level, Log, Record};

pub const DEFAULT_TARGET: &str = "photo_capture";

/// Logger handed to a capture session at construction.
///
/// Forwards records to an injected [`log::Log`] sink, or to whatever logger
/// the process installed through the `log` facade when no sink is given.
#[derive(Clone)]
pub struct SessionLogger {
    sink: Option<Arc<dyn Log>>,
    target: String,
}

impl SessionLogger {
    /// Logs through the process-wide `log` facade.
    pub fn new() -> Self {
        Self {
            sink: None,
            target: DEFAULT_TARGET.to_string(),
        }
    }

    pub fn with_sink(sink: Arc<dyn Log>) -> Self {
        Self {
            sink: Some(sink),
            target: DEFAULT_TARGET.to_string(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let record = Record::builder()
            .args(args)
            .level(level)
            .target(&self.target)
            .module_path_static(Some(module_path!()))
            .build();

        match &self.sink {
            Some(sink) => {
                if sink.enabled(record.metadata()) {
                    sink.log(&record);
                }
            }
            None => {
                if level <= log::max_level() {
                    log::logger().log(&record);
                }
            }
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}

impl Default for SessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionLogger")
            .field("target", &self.target)
            .field("injected_sink", &self.sink.is_some())
            .finish()
    }
}

/// In-memory sink for asserting on log output in tests.
#[cfg(test)]
pub(crate) mod capture {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct CapturedLog {
        pub records: Mutex<Vec<(Level, String, String)>>,
    }

    impl CapturedLog {
        pub fn messages_at(&self, level: Level) -> Vec<String> {
            self.records
                .lock()
                .iter()
                .filter(|(l, _, _)| *l == level)
                .map(|(_, _, message)| message.clone())
                .collect()
        }
    }

    impl Log for CapturedLog {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= Level::Debug
        }

        fn log(&self, record: &Record<'_>) {
            self.records.lock().push((
                record.level(),
                record.target().to_string(),
                record.args().to_string(),
            ));
        }

        fn flush(&self) {}
    }
}

#[cfg(test)]
mod tests {
    use super::capture::CapturedLog;
    use super::*;

    #[test]
    fn records_go_to_injected_sink_with_target() {
        let sink = Arc::new(CapturedLog::default());
        let logger = SessionLogger::with_sink(sink.clone()).with_target("camera");

        logger.warn(format_args!("focus lock failed: {}", 7));
        logger.log(Level::Trace, format_args!("filtered out"));

        let records = sink.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, Level::Warn);
        assert_eq!(records[0].1, "camera");
        assert_eq!(records[0].2, "focus lock failed: 7");
    }

    #[test]
    fn default_logger_uses_facade_target() {
        let logger = SessionLogger::default();
        assert_eq!(logger.target(), DEFAULT_TARGET);
        // No logger installed: must not panic.
        logger.error(format_args!("nobody listens"));
    }
}
