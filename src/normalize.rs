//! Input normalization and the two catalog checks that run before any
//! remote call: blacklist filtering and direct item matching.

use crate::catalog::Catalog;

/// Lower-case and trim; the only comparison form used against the catalog
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Exact match against the blacklist, never substring: "gun" does not
/// reject "gunpowder".
pub fn is_blacklisted(normalized_text: &str, catalog: &Catalog) -> bool {
    catalog.blacklist_contains(&normalize(normalized_text))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectMatch {
    pub aisle_id: String,
    /// Spelling stored in the catalog, not the user's
    pub matched_item: String,
    pub category_label: String,
}

/// First entry in catalog order whose items contain the input
pub fn match_direct(normalized_text: &str, catalog: &Catalog) -> Option<DirectMatch> {
    let key = normalize(normalized_text);
    catalog.entries().iter().find_map(|entry| {
        entry.find_item(&key).map(|item| DirectMatch {
            aisle_id: entry.aisle_id.clone(),
            matched_item: item.to_string(),
            category_label: entry.category_label.clone(),
        })
    })
}
