//! Search forms stored as JSON files, run one by one against the API.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct NamedForm {
    /// File name, e.g. "clips.json".
    pub name: String,
    pub form: Value,
}

/// Reads every `*.json` file in `dir`, sorted by file name.
pub fn load_forms(dir: &Path) -> Result<Vec<NamedForm>> {
    let mut forms = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read form directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read form {}", path.display()))?;
        let form = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse form {}", path.display()))?;
        forms.push(NamedForm { name, form });
    }
    forms.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(forms)
}
