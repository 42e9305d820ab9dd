#[cfg(feature = "color")]
use colored::*;
use log::{Level, Log, Metadata, Record, SetLoggerError};
use std::io::{Error, ErrorKind};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use xch_history_core::config::LoggingConfig;

const TIMESTAMP_FORMAT_LOCAL: &[FormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");
const TIMESTAMP_FORMAT_UTC: &[FormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]Z");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    Local,
    UTC,
    Relative,
}
impl FromStr for TimestampFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(TimestampFormat::Local),
            "utc" => Ok(TimestampFormat::UTC),
            "relative" => Ok(TimestampFormat::Relative),
            _ => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unknown timestamp format: {s}, expected local, utc or relative"),
            )),
        }
    }
}

pub struct HistoryLogger {
    use_colors: bool,
    show_timestamp: bool,
    show_target: bool,
    current_level: Level,
    timestamp_format: TimestampFormat,
    target_levels: Vec<(String, Level)>,
    start_instant: Instant,
    local_offset_failed: AtomicBool,
}

pub struct HistoryLoggerBuilder {
    use_colors: bool,
    show_timestamp: bool,
    show_target: bool,
    current_level: Level,
    timestamp_format: TimestampFormat,
    target_levels: Vec<(String, Level)>,
}

impl Default for HistoryLoggerBuilder {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_timestamp: true,
            show_target: true,
            timestamp_format: TimestampFormat::Local,
            current_level: Level::Info,
            target_levels: vec![],
        }
    }
}

pub fn parse_level(level: &str) -> Result<Level, Error> {
    match level.to_lowercase().as_str() {
        "warning" => Ok(Level::Warn),
        other => Level::from_str(other).map_err(|_| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("Unknown log level: {level}"),
            )
        }),
    }
}

impl HistoryLoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn from_config(config: &LoggingConfig) -> Result<Self, Error> {
        let mut builder = Self::new()
            .current_level(parse_level(&config.level)?)
            .show_target(config.show_target)
            .show_timestamp(config.show_timestamp)
            .use_colors(config.use_colors)
            .timestamp_format(TimestampFormat::from_str(&config.timestamp_format)?);
        for (target, level) in &config.targets {
            builder = builder.with_target_level(target, parse_level(level)?);
        }
        Ok(builder)
    }
    pub fn use_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
    pub fn show_timestamp(mut self, show_timestamp: bool) -> Self {
        self.show_timestamp = show_timestamp;
        self
    }
    pub fn show_target(mut self, show_target: bool) -> Self {
        self.show_target = show_target;
        self
    }
    pub fn timestamp_format(mut self, timestamp_format: TimestampFormat) -> Self {
        self.timestamp_format = timestamp_format;
        self
    }
    pub fn current_level(mut self, current_level: Level) -> Self {
        self.current_level = current_level;
        self
    }
    pub fn with_target_level(mut self, target: &str, level: Level) -> Self {
        self.target_levels.push((target.to_string(), level));
        self
    }
    pub fn build(mut self) -> HistoryLogger {
        // Longest prefix first so the most specific target wins.
        self.target_levels
            .sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        HistoryLogger {
            use_colors: self.use_colors,
            show_timestamp: self.show_timestamp,
            show_target: self.show_target,
            current_level: self.current_level,
            timestamp_format: self.timestamp_format,
            target_levels: self.target_levels,
            start_instant: Instant::now(),
            local_offset_failed: AtomicBool::new(false),
        }
    }
    pub fn init(self) -> Result<Arc<HistoryLogger>, SetLoggerError> {
        self.build().init()
    }
}

impl HistoryLogger {
    pub fn builder() -> HistoryLoggerBuilder {
        HistoryLoggerBuilder::new()
    }
    pub fn init(self) -> Result<Arc<Self>, SetLoggerError> {
        let logger = Arc::new(self);
        let max_level = logger
            .target_levels
            .iter()
            .map(|(_, l)| *l)
            .chain(std::iter::once(logger.current_level))
            .max()
            .unwrap_or(Level::Info);
        log::set_boxed_logger(Box::new(SharedLogger(logger.clone()))).map(|_| {
            log::set_max_level(max_level.to_level_filter());
            logger
        })
    }
    fn level_for(&self, target: &str) -> Level {
        self.target_levels
            .iter()
            .find(|(pattern, _)| target.starts_with(pattern))
            .map(|(_, level)| *level)
            .unwrap_or(self.current_level)
    }
    fn now(&self) -> OffsetDateTime {
        match self.timestamp_format {
            TimestampFormat::Local => OffsetDateTime::now_local().unwrap_or_else(|_| {
                self.local_offset_failed.store(true, Ordering::Relaxed);
                OffsetDateTime::now_utc()
            }),
            _ => OffsetDateTime::now_utc(),
        }
    }
    fn format_timestamp(&self, timestamp: &OffsetDateTime) -> String {
        let formatted = match self.timestamp_format {
            TimestampFormat::Local if !self.local_offset_failed.load(Ordering::Relaxed) => {
                timestamp.format(&TIMESTAMP_FORMAT_LOCAL)
            }
            TimestampFormat::Local | TimestampFormat::UTC => {
                timestamp.format(&TIMESTAMP_FORMAT_UTC)
            }
            TimestampFormat::Relative => {
                let duration = Instant::now().duration_since(self.start_instant);
                let total_seconds = duration.as_secs();
                return format!(
                    "{:02}:{:02}:{:02}.{:03}",
                    total_seconds / 3600,
                    (total_seconds % 3600) / 60,
                    total_seconds % 60,
                    duration.subsec_millis()
                );
            }
        };
        formatted.unwrap_or_default()
    }
    fn format_level(&self, level: Level) -> String {
        let level_str = format!("{:<5}", level.to_string());
        #[cfg(feature = "color")]
        if self.use_colors {
            return match level {
                Level::Error => level_str.red().to_string(),
                Level::Warn => level_str.yellow().to_string(),
                Level::Info => level_str.cyan().to_string(),
                Level::Debug => level_str.purple().to_string(),
                Level::Trace => level_str.magenta().to_string(),
            };
        }
        level_str
    }
    pub fn format_event(&self, event: &LogEvent) -> String {
        let mut line = String::new();
        if self.show_timestamp {
            line.push_str(&self.format_timestamp(&event.timestamp));
            line.push(' ');
        }
        line.push_str(&self.format_level(event.level));
        if self.show_target {
            line.push_str(&format!(" [{}]", event.target));
        }
        line.push(' ');
        line.push_str(&event.message);
        line
    }
}

struct SharedLogger(Arc<HistoryLogger>);

impl Log for SharedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.0.enabled(metadata)
    }
    fn log(&self, record: &Record) {
        self.0.log(record)
    }
    fn flush(&self) {
        self.0.flush()
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub timestamp: OffsetDateTime,
}

impl Log for HistoryLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let event = LogEvent {
            level: record.level(),
            target: if record.target().is_empty() {
                record.module_path().unwrap_or_default()
            } else {
                record.target()
            }
            .to_string(),
            message: record.args().to_string(),
            timestamp: self.now(),
        };
        println!("{}", self.format_event(&event));
    }

    fn flush(&self) {}
}
