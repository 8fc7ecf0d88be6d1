//! `mnemos doctor` — Diagnose configuration health.

use mnemos_config::{StartupConfig, config_dir};
use mnemos_core::PersonaRecord;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Mnemos Doctor — Configuration Diagnostics");
    println!("============================================\n");

    let mut issues = 0;

    let dir = config_dir();
    if dir.is_dir() {
        println!("  ✅ Config directory: {}", dir.display());
    } else {
        println!("  ❌ No config directory at {}", dir.display());
        issues += 1;
    }

    match StartupConfig::load_default() {
        Ok(config) => {
            println!("  ✅ Embedding and project configs valid");

            let embedding = config.embedding();
            if embedding.api_key().is_some() {
                println!("  ✅ API key found in ${}", embedding.api_key_env);
            } else {
                println!("  ⚠️  ${} is not set — the embedding provider may reject requests", embedding.api_key_env);
                issues += 1;
            }

            match config.persona_path() {
                Some(path) => match PersonaRecord::try_load(&path) {
                    Ok(persona) if persona.is_empty() => {
                        println!("  ⚠️  Persona {} has no recognized sections", path.display());
                        issues += 1;
                    }
                    Ok(persona) => {
                        println!(
                            "  ✅ Persona loaded ({} section(s))",
                            persona.populated().count()
                        );
                    }
                    Err(e) => {
                        println!("  ❌ {e}");
                        issues += 1;
                    }
                },
                None => println!("  ✅ No persona configured"),
            }
        }
        Err(e) => {
            for problem in e.problems() {
                println!("  ❌ {problem}");
            }
            issues += e.problems().len().max(1);
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
