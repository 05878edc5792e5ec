//! Log sink.
//!
//! The host process owns no Rust logger, so the shim ships its own
//! implementation of the `log` facade: timestamped single-line records to
//! a file (or stdout/stderr) chosen by configuration, flushed per record,
//! and silent on every write failure.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Local;
use log::{Log, Metadata, Record};

use crate::config::ShimConfig;

enum Sink {
    Stderr,
    Stdout,
    File(File),
}

pub struct ShimLogger {
    sink: Mutex<Sink>,
}

impl ShimLogger {
    fn from_config(cfg: &ShimConfig) -> ShimLogger {
        let sink = match cfg.log_file.as_str() {
            "stderr" => Sink::Stderr,
            "stdout" => Sink::Stdout,
            path => match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Sink::File(file),
                Err(err) => {
                    eprintln!("db_interpose: failed to open log file {path}: {err}; using stderr");
                    Sink::Stderr
                }
            },
        };
        ShimLogger {
            sink: Mutex::new(sink),
        }
    }
}

impl Log for ShimLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        );
        let mut sink = match self.sink.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A failed write is one missing diagnostic, nothing more.
        let _ = match &mut *sink {
            Sink::Stderr => io::stderr().write_all(line.as_bytes()),
            Sink::Stdout => io::stdout().write_all(line.as_bytes()),
            Sink::File(file) => file.write_all(line.as_bytes()).and_then(|()| file.flush()),
        };
    }

    fn flush(&self) {}
}

/// Install the sink as the process logger. A second call (or a host that
/// installed its own logger first) is a no-op.
pub fn init(cfg: &ShimConfig) {
    let logger = ShimLogger::from_config(cfg);
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(cfg.level_filter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn config_with_log_file(path: &str) -> ShimConfig {
        ShimConfig {
            log_file: path.to_string(),
            ..ShimConfig::default()
        }
    }

    #[test]
    fn test_file_sink_writes_single_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shim.log");
        let cfg = config_with_log_file(path.to_str().expect("utf-8 path"));
        let logger = ShimLogger::from_config(&cfg);

        logger.log(
            &Record::builder()
                .args(format_args!("exception #1 type=\"x\" (trace suppressed)"))
                .level(log::Level::Error)
                .build(),
        );

        let mut contents = String::new();
        File::open(&path)
            .expect("log file created")
            .read_to_string(&mut contents)
            .expect("read log");
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("[ERROR]"));
        assert!(contents.contains("(trace suppressed)"));
    }

    #[test]
    fn test_unopenable_path_falls_back_to_stderr() {
        let cfg = config_with_log_file("/nonexistent-dir/shim.log");
        let logger = ShimLogger::from_config(&cfg);
        // Must not panic when writing to the fallback sink.
        logger.log(
            &Record::builder()
                .args(format_args!("fallback check"))
                .level(log::Level::Info)
                .build(),
        );
    }
}
