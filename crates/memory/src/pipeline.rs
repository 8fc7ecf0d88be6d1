//! Memory pipeline façade.
//!
//! Wires the normalization steps in front of a retrieval backend:
//!
//! 1. Construction takes a [`StartupConfig`], which only exists once both
//!    configuration documents passed validation.
//! 2. The persona named by the project config is loaded once, up front.
//! 3. Every [`MemoryPipeline::recall`] runs the query optimizer before the
//!    backend sees the query.

use std::sync::Arc;

use mnemos_config::StartupConfig;
use mnemos_core::error::MemoryError;
use mnemos_core::memory::{MemoryBackend, MemoryEntry, MemoryQuery};
use mnemos_core::persona::PersonaRecord;
use mnemos_core::query::{OptimizedQuery, QueryOptimizer};
use tracing::{debug, info};

/// Results of one recall, with the query actually sent to the backend.
#[derive(Debug, Clone)]
pub struct Recall {
    pub query: OptimizedQuery,
    pub memories: Vec<MemoryEntry>,
}

pub struct MemoryPipeline {
    config: StartupConfig,
    backend: Arc<dyn MemoryBackend>,
    optimizer: QueryOptimizer,
    persona: PersonaRecord,
}

impl MemoryPipeline {
    pub fn new(config: StartupConfig, backend: Arc<dyn MemoryBackend>) -> Self {
        let optimizer =
            QueryOptimizer::new().with_max_length(config.project().memory.max_query_length);
        let persona = config
            .persona_path()
            .map(|path| PersonaRecord::load(&path))
            .unwrap_or_default();

        info!(
            project = %config.project().name,
            backend = backend.name(),
            embedding_model = %config.embedding().model,
            persona_sections = persona.populated().count(),
            "Memory pipeline ready"
        );

        Self {
            config,
            backend,
            optimizer,
            persona,
        }
    }

    /// Replace the optimizer, e.g. to register extra marker patterns.
    /// The configured `memory.max_query_length` still applies.
    pub fn with_optimizer(mut self, optimizer: QueryOptimizer) -> Self {
        self.optimizer =
            optimizer.with_max_length(self.config.project().memory.max_query_length);
        self
    }

    /// Optimize `raw_query` and retrieve up to `limit` memories for it.
    pub async fn recall(&self, raw_query: &str, limit: usize) -> Result<Recall, MemoryError> {
        let query = self.optimizer.optimize(raw_query);
        if query.is_empty() {
            debug!("Empty query after optimization, skipping retrieval");
            return Ok(Recall {
                query,
                memories: vec![],
            });
        }

        let memories = self
            .backend
            .search(MemoryQuery::new(query.as_str()).with_limit(limit))
            .await?;

        debug!(
            query_chars = query.as_str().chars().count(),
            truncated = query.was_truncated(),
            results = memories.len(),
            "Recall complete"
        );

        Ok(Recall { query, memories })
    }

    /// Store a memory.
    pub async fn remember(
        &self,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<String, MemoryError> {
        let entry = MemoryEntry::new(content).with_tags(tags);
        self.backend.store(entry).await
    }

    pub fn persona(&self) -> &PersonaRecord {
        &self.persona
    }

    pub fn optimizer(&self) -> &QueryOptimizer {
        &self.optimizer
    }

    pub fn config(&self) -> &StartupConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn MemoryBackend> {
        &self.backend
    }
}
