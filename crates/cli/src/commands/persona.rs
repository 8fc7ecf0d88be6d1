//! `mnemos persona` — Parse a persona file.

use mnemos_core::PersonaRecord;
use std::path::Path;

pub async fn run(path: &Path, prompt: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Total by contract: an unreadable file prints an empty record.
    let record = PersonaRecord::load(path);

    if prompt {
        print!("{}", record.to_prompt());
    } else {
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}
