//! Highlight record list over a key-value store
//!
//! The whole list lives under one key as a JSON array in insertion order.
//! Entries are kept as raw JSON so that a malformed entry is never lost by an
//! unrelated write; readers decode per entry and skip what does not decode.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::highlight::color::{normalize_color, palette_color, palette_index};
use crate::highlight::HighlightRecord;

use super::{KeyValueStore, StoreError};

/// Key holding the record list
pub const HIGHLIGHTS_KEY: &str = "highlighter_data";
/// Key holding the default colour preference
pub const DEFAULT_COLOR_KEY: &str = "defaultColor";

/// Record-list operations against a [`KeyValueStore`]
#[derive(Clone)]
pub struct HighlightStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    color_key: String,
}

impl HighlightStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(kv, HIGHLIGHTS_KEY)
    }

    /// Use a custom key for the record list
    pub fn with_key(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            color_key: DEFAULT_COLOR_KEY.to_string(),
        }
    }

    async fn read_entries(&self) -> Result<Vec<Value>, StoreError> {
        match self.kv.get(&self.key).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => {
                tracing::warn!(key = %self.key, "Stored highlight list is not an array, treating it as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_entries(&self, entries: Vec<Value>) -> Result<(), StoreError> {
        self.kv.set(&self.key, Value::Array(entries)).await
    }

    /// Append a record; no de-duplication by id
    pub async fn append(&self, record: &HighlightRecord) -> Result<(), StoreError> {
        let mut entries = self.read_entries().await?;
        let mut entry = serde_json::to_value(record)?;
        normalize_entry_color(&mut entry);
        entries.push(entry);
        self.write_entries(entries).await?;

        tracing::debug!(id = %record.id, url = %record.url, "Saved highlight");
        Ok(())
    }

    /// Set the colour of every entry with `id`; returns how many matched
    pub async fn update_color(&self, id: &str, color: &str) -> Result<usize, StoreError> {
        let color = normalize_color(color);
        let mut entries = self.read_entries().await?;

        let mut updated = 0;
        for entry in entries.iter_mut() {
            if entry_id(entry) != Some(id) {
                continue;
            }
            if let Some(fields) = entry.as_object_mut() {
                fields.insert("color".to_string(), Value::String(color.clone()));
                updated += 1;
            }
        }

        if updated > 0 {
            self.write_entries(entries).await?;
        }
        Ok(updated)
    }

    /// Drop every entry with `id`; returns how many were removed
    pub async fn remove(&self, id: &str) -> Result<usize, StoreError> {
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        entries.retain(|entry| entry_id(entry) != Some(id));
        let removed = before - entries.len();

        if removed > 0 {
            self.write_entries(entries).await?;
            tracing::debug!(id, "Removed highlight");
        }
        Ok(removed)
    }

    /// Every decodable record, in insertion order
    pub async fn list_all(&self) -> Result<Vec<HighlightRecord>, StoreError> {
        Ok(decode_entries(self.read_entries().await?))
    }

    /// Records whose url equals `url` exactly
    pub async fn list_for_url(&self, url: &str) -> Result<Vec<HighlightRecord>, StoreError> {
        let entries = self
            .read_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.get("url").and_then(Value::as_str) == Some(url))
            .collect();
        Ok(decode_entries(entries))
    }

    /// Records whose text or url contains `query`, case-insensitively
    pub async fn search(&self, query: &str) -> Result<Vec<HighlightRecord>, StoreError> {
        let records = self.list_all().await?;
        if query.trim().is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|record| record.matches_query(query))
            .collect())
    }

    /// Number of stored entries
    pub async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read_entries().await?.len())
    }

    /// Remove every entry
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.write_entries(Vec::new()).await?;
        tracing::info!("Cleared all highlights");
        Ok(())
    }

    /// Append the imported entries whose id is not already stored; returns
    /// how many were added
    ///
    /// Applying the same import twice adds nothing the second time.
    pub async fn import_merge(&self, imported: Vec<Value>) -> Result<usize, StoreError> {
        let mut entries = self.read_entries().await?;
        let existing: HashSet<Option<String>> = entries
            .iter()
            .map(|entry| entry_id(entry).map(str::to_string))
            .collect();

        let fresh: Vec<Value> = imported
            .into_iter()
            .filter(|entry| !existing.contains(&entry_id(entry).map(str::to_string)))
            .map(|mut entry| {
                normalize_entry_color(&mut entry);
                entry
            })
            .collect();
        let added = fresh.len();

        if added > 0 {
            entries.extend(fresh);
            self.write_entries(entries).await?;
        }
        tracing::info!(added, "Imported highlights");
        Ok(added)
    }

    /// The full list as pretty-printed JSON, the export format
    pub async fn export_json(&self) -> Result<String, StoreError> {
        let entries = self.read_entries().await?;
        Ok(serde_json::to_string_pretty(&Value::Array(entries))?)
    }

    /// Parse an export payload and merge it
    ///
    /// Anything other than a JSON array is rejected with
    /// [`StoreError::InvalidData`] and leaves the store unchanged.
    pub async fn import_json(&self, payload: &str) -> Result<usize, StoreError> {
        let parsed: Value = serde_json::from_str(payload.trim())
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        match parsed {
            Value::Array(imported) => self.import_merge(imported).await,
            _ => Err(StoreError::InvalidData("expected a JSON array".to_string())),
        }
    }

    /// The stored default colour, when it is a palette entry
    pub async fn default_color(&self) -> Result<Option<String>, StoreError> {
        let stored = self.kv.get(&self.color_key).await?;
        Ok(stored
            .as_ref()
            .and_then(Value::as_str)
            .and_then(palette_index)
            .map(palette_color))
    }

    /// Persist a new default colour; only palette colours are accepted
    pub async fn set_default_color(&self, color: &str) -> Result<String, StoreError> {
        let index = palette_index(color).ok_or_else(|| StoreError::UnknownColor(color.to_string()))?;
        let canonical = palette_color(index);
        self.kv
            .set(&self.color_key, Value::String(canonical.clone()))
            .await?;
        Ok(canonical)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

/// Rewrite a string `color` field into canonical form, leaving anything else
fn normalize_entry_color(entry: &mut Value) {
    let Some(color) = entry.get_mut("color") else {
        return;
    };
    if let Some(raw) = color.as_str() {
        *color = Value::String(normalize_color(raw));
    }
}

fn decode_entries(entries: Vec<Value>) -> Vec<HighlightRecord> {
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<HighlightRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed highlight record: {}", e);
                None
            }
        })
        .collect()
}
