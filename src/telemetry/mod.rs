//! Telemetry
//!
//! Structured logging for token lifecycle operations.

pub mod logging;

pub use logging::{
    create_in_memory_logger, create_tracing_logger, no_op_logger, InMemoryLogger, LogEntry,
    LogLevel, Logger, NoOpLogger, TokenLogContext, TracingLogger,
};
