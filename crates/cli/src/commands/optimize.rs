//! `mnemos optimize` — Normalize a query before retrieval.

use mnemos_core::QueryOptimizer;
use std::io::Read;

pub async fn run(query: Option<String>, max_length: usize) -> Result<(), Box<dyn std::error::Error>> {
    let query = match query {
        Some(q) => q,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let optimized = QueryOptimizer::new()
        .with_max_length(max_length)
        .optimize(&query);
    if optimized.was_truncated() {
        tracing::info!(max_length, "Query truncated");
    }
    println!("{optimized}");
    Ok(())
}
