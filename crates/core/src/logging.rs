//! Centralized logging for the settings bridge and system wrappers.
//!
//! # Architecture
//!
//! - **LogConfig**: global configuration stored in atomics
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: Catalog, Settings, Ports, Layers, Native
//! - **log()**: lazily formatted, rate-limited output to stderr or a log file
//!
//! Silent recoveries in the accessor layer (out-of-range numbers, unknown enum
//! choices, dropped port writes) report here at `Debug`, so they cost nothing
//! unless someone asks for them.
//!
//! # Usage
//!
//! ```rust
//! use emu_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Settings, LogLevel::Debug, || {
//!     format!("Settings: `{}` reset", "pce.slstart")
//! });
//! ```

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const CATEGORY_COUNT: usize = 5;

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse log level from string (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the parts of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Schema discovery and catalog validation
    Catalog,
    /// Scalar setting conversion and override normalization
    Settings,
    /// Port device bindings
    Ports,
    /// Display layer toggles
    Layers,
    /// Calls into the native core
    Native,
}

impl LogCategory {
    pub const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Catalog,
        LogCategory::Settings,
        LogCategory::Ports,
        LogCategory::Layers,
        LogCategory::Native,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Catalog => 0,
            LogCategory::Settings => 1,
            LogCategory::Ports => 2,
            LogCategory::Layers => 3,
            LogCategory::Native => 4,
        }
    }

    /// Parse a category name (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "catalog" => Some(LogCategory::Catalog),
            "settings" => Some(LogCategory::Settings),
            "ports" => Some(LogCategory::Ports),
            "layers" => Some(LogCategory::Layers),
            "native" => Some(LogCategory::Native),
            _ => None,
        }
    }
}

/// Sliding-window limiter, one window per category
struct RateLimiter {
    max_logs_per_second: AtomicUsize,
    window_duration: Duration,
    windows: Mutex<[VecDeque<Instant>; CATEGORY_COUNT]>,
    dropped_counts: Mutex<[usize; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_logs_per_second: usize) -> Self {
        Self {
            max_logs_per_second: AtomicUsize::new(max_logs_per_second),
            window_duration: Duration::from_secs(1),
            windows: Mutex::new(Default::default()),
            dropped_counts: Mutex::new([0; CATEGORY_COUNT]),
        }
    }

    /// Returns (allowed, dropped_count); dropped_count is Some(n) when n
    /// messages were dropped since the last allowed one
    fn should_allow(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let idx = category.index();
        let max_logs = self.max_logs_per_second.load(Ordering::Relaxed);

        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut dropped_counts = match self.dropped_counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = &mut windows[idx];
        while let Some(&front) = window.front() {
            if now.duration_since(front) > self.window_duration {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < max_logs {
            window.push_back(now);
            let dropped = std::mem::take(&mut dropped_counts[idx]);
            (true, (dropped > 0).then_some(dropped))
        } else {
            dropped_counts[idx] += 1;
            (false, None)
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    /// Per-category levels; Off means "use the global level"
    levels: [AtomicU8; CATEGORY_COUNT],
    log_sender: Mutex<Option<Sender<String>>>,
    file_logging_enabled: AtomicBool,
    rate_limiter: RateLimiter,
}

impl LogConfig {
    /// All logging disabled, 60 messages per second per category
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            levels: Default::default(),
            log_sender: Mutex::new(None),
            file_logging_enabled: AtomicBool::new(false),
            rate_limiter: RateLimiter::new(60),
        }
    }

    /// Get the global singleton instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn get_level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category-specific level wins; otherwise the global level decides
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        let category_level = self.get_level(category);
        if category_level != LogLevel::Off {
            level <= category_level
        } else {
            level <= self.get_global_level()
        }
    }

    /// Reset all logging to Off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    pub fn set_rate_limit(&self, max_logs_per_second: usize) {
        self.rate_limiter
            .max_logs_per_second
            .store(max_logs_per_second, Ordering::Relaxed);
    }

    pub fn get_rate_limit(&self) -> usize {
        self.rate_limiter.max_logs_per_second.load(Ordering::Relaxed)
    }

    /// Send output to `path` through a background writer thread
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || {
                let mut file = file;
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                    let _ = file.flush();
                }
            })?;

        if let Ok(mut log_sender) = self.log_sender.lock() {
            *log_sender = Some(sender);
        }
        self.file_logging_enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Stop logging to file; the writer thread exits when the sender drops
    pub fn clear_log_file(&self) {
        if let Ok(mut log_sender) = self.log_sender.lock() {
            *log_sender = None;
        }
        self.file_logging_enabled.store(false, Ordering::Relaxed);
    }

    fn write_message(&self, message: String) {
        if self.file_logging_enabled.load(Ordering::Relaxed) {
            if let Ok(log_sender) = self.log_sender.lock() {
                if let Some(sender) = log_sender.as_ref() {
                    if let Err(err) = sender.send(message) {
                        eprintln!("{}", err.0);
                    }
                    return;
                }
            }
        }
        eprintln!("{}", message);
    }
}

/// Log a message with the specified category and level
///
/// The closure only runs when the category and level are enabled and the
/// category is under its rate limit.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    let config = LogConfig::global();
    if !config.should_log(category, level) {
        return;
    }

    let (allowed, dropped) = config.rate_limiter.should_allow(category);
    if let Some(count) = dropped {
        config.write_message(format!(
            "[{:?}] WARNING: Rate limit exceeded, {} log message(s) dropped",
            category, count
        ));
    }
    if allowed {
        config.write_message(message_fn());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("off"), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_str("ERR"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("3"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("invalid"), None);
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(LogCategory::from_name("Ports"), Some(LogCategory::Ports));
        assert_eq!(LogCategory::from_name("native"), Some(LogCategory::Native));
        assert_eq!(LogCategory::from_name("cpu"), None);
    }

    #[test]
    fn test_should_log_with_category_level() {
        let config = LogConfig::new();
        config.set_level(LogCategory::Settings, LogLevel::Info);

        assert!(config.should_log(LogCategory::Settings, LogLevel::Error));
        assert!(config.should_log(LogCategory::Settings, LogLevel::Info));
        assert!(!config.should_log(LogCategory::Settings, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::Settings, LogLevel::Off));
    }

    #[test]
    fn test_category_level_overrides_global() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Error);
        config.set_level(LogCategory::Ports, LogLevel::Debug);

        assert!(config.should_log(LogCategory::Ports, LogLevel::Debug));
        assert!(!config.should_log(LogCategory::Layers, LogLevel::Warn));
        assert!(config.should_log(LogCategory::Layers, LogLevel::Error));
    }

    #[test]
    fn test_reset() {
        let config = LogConfig::new();
        config.set_global_level(LogLevel::Trace);
        config.set_level(LogCategory::Catalog, LogLevel::Debug);
        config.reset();

        assert_eq!(config.get_global_level(), LogLevel::Off);
        assert_eq!(config.get_level(LogCategory::Catalog), LogLevel::Off);
    }

    #[test]
    fn test_rate_limiter_per_category() {
        let limiter = RateLimiter::new(5);
        for _ in 0..5 {
            assert!(limiter.should_allow(LogCategory::Settings).0);
        }
        assert!(!limiter.should_allow(LogCategory::Settings).0);
        assert!(limiter.should_allow(LogCategory::Ports).0);
    }

    #[test]
    fn test_rate_limiter_reports_dropped_count() {
        let limiter = RateLimiter::new(2);
        limiter.should_allow(LogCategory::Native);
        limiter.should_allow(LogCategory::Native);
        for _ in 0..3 {
            limiter.should_allow(LogCategory::Native);
        }

        std::thread::sleep(Duration::from_millis(1100));

        let (allowed, dropped) = limiter.should_allow(LogCategory::Native);
        assert!(allowed);
        assert_eq!(dropped, Some(3));
    }
}
