//! Structured logging: tracing subscriber setup and ndjson audit lines.

mod format;

pub use format::{LogEvent, StructuredLogger};
