//! Dataset configuration

use serde::{Deserialize, Deserializer, Serialize};

/// Dataset configuration returned by the node service
///
/// An immutable snapshot fetched once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub source: String,
    pub destination: String,
    /// Ordered field names
    #[serde(default)]
    pub schema: Vec<String>,
    /// Partition keys, deduplicated in order of first appearance
    #[serde(default, deserialize_with = "unique_keys")]
    pub partitions: Vec<String>,
}

impl DatasetConfig {
    /// Checks the fields the pipeline depends on
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("dataset config has an empty name".to_string());
        }
        if self.source.trim().is_empty() {
            return Err(format!("dataset '{}' has an empty source", self.name));
        }
        if self.destination.trim().is_empty() {
            return Err(format!("dataset '{}' has an empty destination", self.name));
        }
        Ok(())
    }
}

fn unique_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let keys = Vec::<String>::deserialize(deserializer)?;
    let mut unique = Vec::with_capacity(keys.len());
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    Ok(unique)
}
