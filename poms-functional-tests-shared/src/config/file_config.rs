use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{normalize_key, Env};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub env: Option<String>,
    pub relaxed_https: Option<bool>,

    // One section per deployed system
    pub npo_api: Option<SectionConfig>,
    pub npo_backend_api: Option<SectionConfig>,
    pub poms: Option<SectionConfig>,
    pub images: Option<SectionConfig>,
    pub selenium: Option<SectionConfig>,
}

/// Options of one section. Scalar values apply to every environment,
/// sub-tables named after an environment override them for that one.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(transparent)]
pub struct SectionConfig(pub toml::Table);

impl SectionConfig {
    pub fn options(&self, env: Env) -> BTreeMap<String, String> {
        let mut options = BTreeMap::new();
        for (key, value) in &self.0 {
            if let Some(value) = scalar(value) {
                options.insert(normalize_key(key), value);
            }
        }
        let per_env = self
            .0
            .iter()
            .find(|(key, _)| key.parse::<Env>().ok() == Some(env))
            .and_then(|(_, value)| value.as_table());
        if let Some(table) = per_env {
            for (key, value) in table {
                if let Some(value) = scalar(value) {
                    options.insert(normalize_key(key), value);
                }
            }
        }
        options
    }
}

fn scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
