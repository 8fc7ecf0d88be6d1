//! `mnemos recall` — Run a query through the memory pipeline.

use mnemos_config::StartupConfig;
use mnemos_memory::{InMemoryBackend, MemoryPipeline};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(
    query: &str,
    limit: usize,
    memory: Option<PathBuf>,
    embedding: Option<PathBuf>,
    project: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (embedding, project) = super::config_paths(embedding, project);
    let config = StartupConfig::load(&embedding, &project)?;

    let pipeline = MemoryPipeline::new(config, Arc::new(InMemoryBackend::new()));

    if let Some(path) = memory {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read memories from {}: {e}", path.display()))?;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            pipeline.remember(line, vec![]).await?;
        }
    }

    let recall = pipeline.recall(query, limit).await?;

    println!("🔍 Query: \"{}\"", recall.query);
    if recall.query.was_truncated() {
        println!("   (truncated to {} characters)", pipeline.optimizer().max_length());
    }
    println!();

    if recall.memories.is_empty() {
        println!("   No memories found.");
    } else {
        for (i, entry) in recall.memories.iter().enumerate() {
            let preview: String = entry.content.chars().take(80).collect();
            println!("  {:>2}. [score: {:.2}] {preview}", i + 1, entry.score);
        }
    }

    Ok(())
}
