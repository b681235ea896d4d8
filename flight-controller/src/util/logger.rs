//! Process log backend for the `log` facade.

use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::time::process_start;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// UTC wall clock, `HH:MM:SS.ffffff`.
    #[default]
    Clock,
    /// Seconds since the process started.
    Elapsed,
    Off,
}

impl TimestampFormat {
    fn render(self, now: SystemTime, since_start: Duration) -> Option<String> {
        match self {
            TimestampFormat::Clock => {
                let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
                let seconds = since_epoch.as_secs() % SECONDS_PER_DAY;
                Some(format!(
                    "{:02}:{:02}:{:02}.{:06}",
                    seconds / 3600,
                    (seconds / 60) % 60,
                    seconds % 60,
                    since_epoch.subsec_micros()
                ))
            }
            TimestampFormat::Elapsed => Some(format!("{:>12.6}", since_start.as_secs_f64())),
            TimestampFormat::Off => None,
        }
    }
}

pub struct FirmwareLogger {
    level: LevelFilter,
    time_format: TimestampFormat,
}

impl FirmwareLogger {
    pub fn new(level: LevelFilter, time_format: TimestampFormat) -> Self {
        FirmwareLogger { level, time_format }
    }

    fn format_line(&self, record: &Record, now: SystemTime, since_start: Duration) -> String {
        let message = format!("[{:<5}] {}: {}", record.level(), record.target(), record.args());
        match self.time_format.render(now, since_start) {
            Some(timestamp) => format!("{timestamp} {message}"),
            None => message,
        }
    }
}

impl Log for FirmwareLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format_line(record, SystemTime::now(), process_start().elapsed());
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

pub fn parse_level(level: &str) -> Result<LevelFilter, ConfigError> {
    level
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("unknown log level: {level}")))
}

/// Installs the firmware logger as the process-wide `log` backend.
pub fn initialize(level: LevelFilter, time_format: TimestampFormat) -> Result<(), SetLoggerError> {
    process_start();
    log::set_boxed_logger(Box::new(FirmwareLogger::new(level, time_format)))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(logger: &FirmwareLogger, now: SystemTime, since_start: Duration) -> String {
        logger.format_line(
            &Record::builder()
                .level(log::Level::Info)
                .target("navboard")
                .args(format_args!("opened tty={}", "/dev/ttyO1"))
                .build(),
            now,
            since_start,
        )
    }

    #[test]
    fn clock_timestamp_uses_time_of_day() {
        let logger = FirmwareLogger::new(LevelFilter::Debug, TimestampFormat::Clock);
        let now = UNIX_EPOCH + Duration::from_micros((2 * 86_400 + 3661) * 1_000_000 + 123);
        assert_eq!(
            render(&logger, now, Duration::ZERO),
            "01:01:01.000123 [INFO ] navboard: opened tty=/dev/ttyO1"
        );
    }

    #[test]
    fn elapsed_and_disabled_timestamps() {
        let elapsed = FirmwareLogger::new(LevelFilter::Debug, TimestampFormat::Elapsed);
        let line = render(&elapsed, UNIX_EPOCH, Duration::from_millis(1500));
        assert!(line.trim_start().starts_with("1.500000 [INFO ]"), "{line}");

        let off = FirmwareLogger::new(LevelFilter::Debug, TimestampFormat::Off);
        assert_eq!(
            render(&off, UNIX_EPOCH, Duration::ZERO),
            "[INFO ] navboard: opened tty=/dev/ttyO1"
        );
    }

    #[test]
    fn filters_by_level() {
        let logger = FirmwareLogger::new(LevelFilter::Warn, TimestampFormat::Off);
        let debug = Metadata::builder().level(log::Level::Debug).build();
        let error = Metadata::builder().level(log::Level::Error).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&error));
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert!(parse_level("loud").is_err());
    }
}
