//! Memory pipeline and backends for Mnemos.

pub mod in_memory;
pub mod pipeline;

pub use in_memory::InMemoryBackend;
pub use pipeline::{MemoryPipeline, Recall};
