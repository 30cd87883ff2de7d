//! Downstream consumer implementations
//!
//! - [`LoggingConsumer`] - logs a summary line per batch
//! - [`JsonlFileConsumer`] - appends events to a JSON-lines file

pub mod jsonl;
pub mod logging;

pub use jsonl::JsonlFileConsumer;
pub use logging::LoggingConsumer;
