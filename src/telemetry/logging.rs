//! Logging
//!
//! Structured logging for token lifecycle operations.
//!
//! Messages and context never carry token values or decrypted state.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Token log context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenLogContext {
    /// Token kind.
    pub token_kind: Option<String>,
    /// Operation name.
    pub operation: Option<String>,
    /// Request ID for correlation.
    pub request_id: Option<String>,
    /// Additional context.
    pub extra: BTreeMap<String, String>,
}

impl TokenLogContext {
    /// Create new log context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set token kind.
    pub fn token_kind(mut self, kind: impl Into<String>) -> Self {
        self.token_kind = Some(kind.into());
        self
    }

    /// Set operation.
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set request ID.
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Add extra context.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn extra_fields(&self) -> String {
        self.extra
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Logger interface.
pub trait Logger: Send + Sync {
    fn trace(&self, message: &str, context: &TokenLogContext);
    fn debug(&self, message: &str, context: &TokenLogContext);
    fn info(&self, message: &str, context: &TokenLogContext);
    fn warn(&self, message: &str, context: &TokenLogContext);
    fn error(&self, message: &str, context: &TokenLogContext);

    /// Check if a log level is enabled.
    fn is_enabled(&self, level: LogLevel) -> bool;
}

/// No-op logger implementation.
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn trace(&self, _message: &str, _context: &TokenLogContext) {}
    fn debug(&self, _message: &str, _context: &TokenLogContext) {}
    fn info(&self, _message: &str, _context: &TokenLogContext) {}
    fn warn(&self, _message: &str, _context: &TokenLogContext) {}
    fn error(&self, _message: &str, _context: &TokenLogContext) {}
    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Create no-op logger.
pub fn no_op_logger() -> NoOpLogger {
    NoOpLogger
}

/// Log entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: TokenLogContext,
    pub timestamp: u64,
}

/// In-memory logger for testing.
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
    min_level: LogLevel,
}

impl InMemoryLogger {
    /// Create new in-memory logger.
    pub fn new() -> Self {
        Self::with_level(LogLevel::Trace)
    }

    /// Create in-memory logger with minimum level.
    pub fn with_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Get all log entries.
    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Get entries by level.
    pub fn get_entries_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// True if any entry's message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.message.contains(needle))
    }

    fn log(&self, level: LogLevel, message: &str, context: &TokenLogContext) {
        if level >= self.min_level {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            self.entries.lock().unwrap().push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
                timestamp: now,
            });
        }
    }
}

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for InMemoryLogger {
    fn trace(&self, message: &str, context: &TokenLogContext) {
        self.log(LogLevel::Trace, message, context);
    }

    fn debug(&self, message: &str, context: &TokenLogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &TokenLogContext) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &TokenLogContext) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &TokenLogContext) {
        self.log(LogLevel::Error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

/// Logger forwarding to the `tracing` crate.
///
/// Filtering is left to the installed subscriber.
#[derive(Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! forward {
    ($macro:ident, $message:expr, $context:expr) => {
        tracing::$macro!(
            token_kind = $context.token_kind.as_deref().unwrap_or(""),
            operation = $context.operation.as_deref().unwrap_or(""),
            request_id = $context.request_id.as_deref().unwrap_or(""),
            extra = %$context.extra_fields(),
            "{}",
            $message
        )
    };
}

impl Logger for TracingLogger {
    fn trace(&self, message: &str, context: &TokenLogContext) {
        forward!(trace, message, context);
    }

    fn debug(&self, message: &str, context: &TokenLogContext) {
        forward!(debug, message, context);
    }

    fn info(&self, message: &str, context: &TokenLogContext) {
        forward!(info, message, context);
    }

    fn warn(&self, message: &str, context: &TokenLogContext) {
        forward!(warn, message, context);
    }

    fn error(&self, message: &str, context: &TokenLogContext) {
        forward!(error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }
}

/// Create in-memory logger.
pub fn create_in_memory_logger() -> InMemoryLogger {
    InMemoryLogger::new()
}

/// Create logger forwarding to `tracing`.
pub fn create_tracing_logger() -> TracingLogger {
    TracingLogger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warn);
        assert!(LogLevel::Warn > LogLevel::Info);
        assert!(LogLevel::Info > LogLevel::Debug);
        assert!(LogLevel::Debug > LogLevel::Trace);
    }

    #[test]
    fn test_in_memory_logger() {
        let logger = create_in_memory_logger();
        let context = TokenLogContext::new()
            .token_kind("MicrosoftGraph")
            .operation("acquire_token");

        logger.info("Token acquired", &context);
        logger.warn("State cookie missing", &context);

        assert_eq!(logger.get_entries().len(), 2);
        assert_eq!(logger.get_entries_by_level(LogLevel::Warn).len(), 1);
        assert!(logger.contains("State cookie"));
    }

    #[test]
    fn test_min_level_filtering() {
        let logger = InMemoryLogger::with_level(LogLevel::Warn);
        let context = TokenLogContext::new();

        logger.debug("debug", &context);
        logger.info("info", &context);
        logger.warn("warn", &context);
        logger.error("error", &context);

        assert_eq!(logger.get_entries().len(), 2);
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = create_tracing_logger();
        let context = TokenLogContext::new().extra("reason", "missing_state");
        logger.info("no subscriber installed", &context);
        assert!(!logger.is_enabled(LogLevel::Trace));
    }

    #[test]
    fn test_log_context_builder() {
        let context = TokenLogContext::new()
            .token_kind("MicrosoftGraph")
            .request_id("req-1")
            .extra("b", "2")
            .extra("a", "1");

        assert_eq!(context.request_id, Some("req-1".to_string()));
        assert_eq!(context.extra_fields(), "a=1 b=2");
    }
}
