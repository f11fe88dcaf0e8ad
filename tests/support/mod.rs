#![allow(dead_code)]

use aisle_finder::catalog::{Catalog, CatalogEntry};
use aisle_finder::llm::{ClassificationOutcome, Classifier};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Aisle "A1" / "Paper" / {"copy paper"}, blacklist {"gun"}
pub fn paper_catalog() -> Catalog {
    Catalog::new(
        vec![
            CatalogEntry::new("A1", "Paper", ["copy paper"]),
            CatalogEntry::new("A2", "Snacks", ["chips", "pretzels"]),
        ],
        vec!["gun".to_string()],
    )
    .unwrap()
}

/// Classifier returning canned outcomes per item and recording every call
pub struct MockClassifier {
    answers: HashMap<String, ClassificationOutcome>,
    calls: AtomicUsize,
    last_labels: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: AtomicUsize::new(0),
            last_labels: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, item: &str, outcome: ClassificationOutcome) -> Self {
        self.answers.insert(item.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_labels(&self) -> Vec<String> {
        self.last_labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        raw_text: &str,
        category_labels: &[String],
        _blacklist: &[String],
    ) -> ClassificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_labels.lock().unwrap() = category_labels.to_vec();
        self.answers
            .get(raw_text)
            .cloned()
            .unwrap_or(ClassificationOutcome::NotFound)
    }
}
