//! `mnemos validate` — Validate both configuration documents, or one
//! document against a custom schema file.

use mnemos_config::{
    ConfigDocument, ConfigValidationResult, EmbeddingConfig, ProjectConfig,
    validate_with_schema_file,
};
use std::path::{Path, PathBuf};

pub async fn run(
    embedding: Option<PathBuf>,
    project: Option<PathBuf>,
    custom: Option<(PathBuf, PathBuf)>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");
    let results = match custom {
        Some((schema, document)) => {
            let result = validate_with_schema_file(&document, &schema)?;
            vec![(document, result)]
        }
        None => {
            let (embedding, project) = super::config_paths(embedding, project);
            let embedding_result = EmbeddingConfig::check(&embedding);
            let project_result = ProjectConfig::check(&project);
            vec![(embedding, embedding_result), (project, project_result)]
        }
    };

    let mut total = 0;
    for (path, result) in &results {
        report(path, result);
        total += result.problems().len();
    }

    println!();
    if total == 0 {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ⚠️  {total} problem(s) found. Fix them before starting the pipeline.");
        Err(format!("configuration invalid ({total} problem(s))").into())
    }
}

fn report(path: &Path, result: &ConfigValidationResult) {
    match result {
        ConfigValidationResult::Valid => println!("   ✅ {}", path.display()),
        ConfigValidationResult::Invalid { reason, problems } => {
            println!("   ❌ {} — {reason}", path.display());
            for problem in problems {
                println!("      - {problem}");
            }
        }
    }
}
