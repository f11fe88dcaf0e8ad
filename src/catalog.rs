//! Store catalog: aisles, their category labels and known items, plus the
//! blacklist of terms that never resolve to a location.
//!
//! A `Catalog` is validated once at construction and is read-only afterwards,
//! so it can be shared behind an `Arc` by any number of concurrent resolutions.

use crate::error::{AisleError, Result};
use crate::normalize::normalize;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// JSON representation of the catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogJson {
    /// Keyed by aisle id, in document order
    pub aisles: IndexMap<String, AisleJson>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AisleJson {
    pub category: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub aisle_id: String,
    pub category_label: String,
    /// Items as entered by the catalog author
    items: Vec<String>,
    /// normalized item -> index into `items`
    item_index: HashMap<String, usize>,
}

impl CatalogEntry {
    pub fn new(
        aisle_id: impl Into<String>,
        category_label: impl Into<String>,
        items: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let aisle_id = aisle_id.into();
        let mut stored: Vec<String> = Vec::new();
        let mut item_index = HashMap::new();
        for item in items {
            let item: String = item.into();
            let key = normalize(&item);
            if key.is_empty() {
                warn!("Aisle '{}' lists an empty item; skipping it", aisle_id);
                continue;
            }
            if let Some(&idx) = item_index.get(&key) {
                warn!(
                    "Aisle '{}' lists '{}' more than once (first as '{}'); keeping the first",
                    aisle_id, item, stored[idx]
                );
                continue;
            }
            item_index.insert(key, stored.len());
            stored.push(item);
        }

        Self {
            aisle_id,
            category_label: category_label.into(),
            items: stored,
            item_index,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Stored spelling of the item whose normalized form is `normalized`
    pub fn find_item(&self, normalized: &str) -> Option<&str> {
        self.item_index
            .get(normalized)
            .map(|&idx| self.items[idx].as_str())
    }
}

/// An item listed under more than one aisle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateItem {
    pub item: String,
    pub aisles: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    blacklist: Vec<String>,
    blacklist_index: HashSet<String>,
}

impl Catalog {
    /// Validates aisle ids and category labels; category labels must be
    /// unique ignoring case since they form the classification vocabulary.
    pub fn new(entries: Vec<CatalogEntry>, blacklist: Vec<String>) -> Result<Self> {
        let mut seen_aisles = HashSet::new();
        let mut seen_labels = HashSet::new();

        for entry in &entries {
            if entry.aisle_id.trim().is_empty() {
                return Err(AisleError::Catalog("aisle id must not be empty".to_string()));
            }
            if entry.category_label.trim().is_empty() {
                return Err(AisleError::Catalog(format!(
                    "aisle '{}' has an empty category label",
                    entry.aisle_id
                )));
            }
            if !seen_aisles.insert(entry.aisle_id.clone()) {
                return Err(AisleError::Catalog(format!("duplicate aisle id '{}'", entry.aisle_id)));
            }
            if !seen_labels.insert(normalize(&entry.category_label)) {
                return Err(AisleError::Catalog(format!(
                    "category label '{}' is used by more than one aisle",
                    entry.category_label
                )));
            }
        }

        let blacklist_index = blacklist
            .iter()
            .map(|term| normalize(term))
            .filter(|term| !term.is_empty())
            .collect();

        Ok(Self {
            entries,
            blacklist,
            blacklist_index,
        })
    }

    pub fn from_json(json: CatalogJson) -> Result<Self> {
        let entries = json
            .aisles
            .into_iter()
            .map(|(aisle_id, aisle)| CatalogEntry::new(aisle_id, aisle.category, aisle.items))
            .collect();
        Self::new(entries, json.blacklist)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let json: CatalogJson = serde_json::from_str(raw)?;
        Self::from_json(json)
    }

    /// Load a catalog file and warn about items listed under several aisles
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AisleError::Catalog(format!("failed to read catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&raw)?;

        for duplicate in catalog.duplicate_items() {
            warn!(
                "Item '{}' is listed under several aisles ({}); the first one wins",
                duplicate.item,
                duplicate.aisles.join(", ")
            );
        }
        info!(
            "Loaded catalog from {}: {} aisles, {} blacklisted terms",
            path.display(),
            catalog.entries.len(),
            catalog.blacklist_index.len()
        );

        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    /// True when the already-normalized term is blacklisted
    pub fn blacklist_contains(&self, normalized: &str) -> bool {
        self.blacklist_index.contains(normalized)
    }

    /// Distinct category labels sorted case-insensitively, so every request
    /// carries the same vocabulary ordering.
    pub fn category_labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.category_label.clone())
            .unique_by(|label| normalize(label))
            .sorted_by(|a, b| normalize(a).cmp(&normalize(b)).then_with(|| a.cmp(b)))
            .collect()
    }

    pub fn entry_for_category(&self, label: &str) -> Option<&CatalogEntry> {
        let wanted = normalize(label);
        self.entries
            .iter()
            .find(|entry| normalize(&entry.category_label) == wanted)
    }

    /// Items that appear (ignoring case) under more than one aisle, in
    /// catalog order of first appearance.
    pub fn duplicate_items(&self) -> Vec<DuplicateItem> {
        let mut owners: IndexMap<&str, (&str, Vec<String>)> = IndexMap::new();
        for entry in &self.entries {
            for (key, &idx) in entry.item_index.iter().sorted_by_key(|(_, idx)| **idx) {
                owners
                    .entry(key.as_str())
                    .or_insert_with(|| (entry.items[idx].as_str(), Vec::new()))
                    .1
                    .push(entry.aisle_id.clone());
            }
        }

        owners
            .into_values()
            .filter(|(_, aisles)| aisles.len() > 1)
            .map(|(item, aisles)| DuplicateItem {
                item: item.to_string(),
                aisles,
            })
            .collect()
    }
}
