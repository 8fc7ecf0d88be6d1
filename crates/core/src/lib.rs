//! # Mnemos Core
//!
//! Pre-retrieval normalization for a conversational agent's long-term memory.
//!
//! - [`query`] collapses repeated reminder boilerplate and bounds query length
//! - [`persona`] parses persona files into a fixed eight-section record
//! - [`memory`] defines the boundary trait to the retrieval engine
//!
//! Configuration validation lives in `mnemos-config`; the façade that wires
//! everything together lives in `mnemos-memory`.

pub mod error;
pub mod memory;
pub mod persona;
pub mod query;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, PersonaError, Result};
pub use memory::{MemoryBackend, MemoryEntry, MemoryQuery};
pub use persona::{PersonaRecord, PersonaSection};
pub use query::{MAX_LENGTH, OptimizedQuery, QueryOptimizer, optimize};
