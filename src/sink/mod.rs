//! Persistence sinks for crawled data

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;
pub use traits::{Sink, SinkError, SinkResult};
