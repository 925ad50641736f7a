use crate::errors::ToolError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn from_env() -> Self {
        let raw = std::env::var("WPMAINT_LOG_LEVEL")
            .or_else(|_| std::env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| "info".to_string());
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }

    fn allows(self, other: LogLevel) -> bool {
        other.rank() <= self.rank()
    }

    fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    error: u64,
    warn: u64,
    info: u64,
    debug: u64,
}

/// Line logger shared by every component of a run.
///
/// Lines go to stdout and, once [`Logger::attach_file`] has been called, are
/// appended to the run's log file as well. Children share counters and the
/// file sink with their parent.
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
    counters: Arc<Mutex<Counters>>,
    sink: Arc<Mutex<Option<File>>>,
    echo: bool,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
            counters: Arc::new(Mutex::new(Counters::default())),
            sink: Arc::new(Mutex::new(None)),
            echo: true,
        }
    }

    /// A logger that only counts and writes to an attached file.
    pub fn quiet(context: &str) -> Self {
        Self {
            echo: false,
            ..Self::new(context)
        }
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
            counters: self.counters.clone(),
            sink: self.sink.clone(),
            echo: self.echo,
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    pub fn attach_file(&self, path: &Path) -> Result<(), ToolError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                ToolError::io(format!(
                    "Failed to open log file {}: {}",
                    path.display(),
                    err
                ))
            })?;
        let mut sink = self.sink.lock().unwrap_or_else(|err| err.into_inner());
        *sink = Some(file);
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&serde_json::Value>) {
        if !self.level.allows(level) {
            return;
        }
        if let Ok(mut counters) = self.counters.lock() {
            match level {
                LogLevel::Error => counters.error += 1,
                LogLevel::Warn => counters.warn += 1,
                LogLevel::Info => counters.info += 1,
                LogLevel::Debug => counters.debug += 1,
            }
        }
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        let meta_suffix = meta
            .and_then(|m| if m.is_null() { None } else { Some(m) })
            .map(|m| format!(" {}", m))
            .unwrap_or_default();
        let line = format!(
            "{} [{}] [{}] {}{}",
            timestamp,
            level.label(),
            self.context,
            message,
            meta_suffix
        );
        if self.echo {
            println!("{}", line);
        }
        if let Ok(mut sink) = self.sink.lock() {
            if let Some(file) = sink.as_mut() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    pub fn error(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&serde_json::Value>) {
        self.log(LogLevel::Debug, message, meta);
    }

    pub fn error_count(&self) -> u64 {
        self.counters
            .lock()
            .map(|counters| counters.error)
            .unwrap_or_default()
    }

    pub fn stats(&self) -> serde_json::Value {
        let counters = self.counters.lock().unwrap_or_else(|err| err.into_inner());
        serde_json::json!({
            "level": format!("{:?}", self.level).to_lowercase(),
            "context": self.context,
            "error": counters.error,
            "warn": counters.warn,
            "info": counters.info,
            "debug": counters.debug,
        })
    }
}
