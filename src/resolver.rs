//! Item resolution pipeline.
//!
//! Order of checks per query: empty input, blacklist and direct catalog match
//! (in the configured precedence), then remote classification and the
//! category-to-aisle lookup. Every path ends in a `ResolutionResult`; the
//! resolver never returns an error and never retries.

use crate::catalog::Catalog;
use crate::config::{Precedence, ResolverPolicy};
use crate::llm::{ClassificationOutcome, Classifier};
use crate::normalize::{is_blacklisted, match_direct, normalize};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    EmptyInput,
    Blacklisted,
    NotInCatalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ServiceError,
    InconsistentCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResolutionResult {
    DirectHit {
        aisle_id: String,
        matched_item: String,
        category_label: String,
    },
    CategoryHit {
        aisle_id: String,
        category_label: String,
    },
    NotFound {
        reason: NotFoundReason,
    },
    Failure {
        kind: FailureKind,
        detail: String,
    },
}

impl ResolutionResult {
    pub fn aisle_id(&self) -> Option<&str> {
        match self {
            Self::DirectHit { aisle_id, .. } | Self::CategoryHit { aisle_id, .. } => Some(aisle_id),
            _ => None,
        }
    }

    /// Expected "not sold here" outcomes, shown politely to the user
    pub fn is_user_facing_miss(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Backend or configuration faults operators need to see
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

pub struct Resolver {
    catalog: Arc<Catalog>,
    classifier: Arc<dyn Classifier>,
    policy: ResolverPolicy,
    /// Computed once; the catalog never changes under a resolver
    category_labels: Vec<String>,
}

impl Resolver {
    pub fn new(catalog: Arc<Catalog>, classifier: Arc<dyn Classifier>) -> Self {
        Self::with_policy(catalog, classifier, ResolverPolicy::default())
    }

    pub fn with_policy(
        catalog: Arc<Catalog>,
        classifier: Arc<dyn Classifier>,
        policy: ResolverPolicy,
    ) -> Self {
        let category_labels = catalog.category_labels();
        Self {
            catalog,
            classifier,
            policy,
            category_labels,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn policy(&self) -> ResolverPolicy {
        self.policy
    }

    pub async fn resolve(&self, raw_text: &str) -> ResolutionResult {
        let normalized = normalize(raw_text);
        if normalized.is_empty() {
            debug!("Empty query");
            return ResolutionResult::NotFound {
                reason: NotFoundReason::EmptyInput,
            };
        }

        if let Some(result) = self.resolve_locally(&normalized) {
            return result;
        }

        info!("No direct match for '{}', asking the classifier", normalized);
        let outcome = self
            .classifier
            .classify(raw_text, &self.category_labels, self.catalog.blacklist())
            .await;
        debug!("Classifier outcome for '{}': {:?}", normalized, outcome);

        match outcome {
            ClassificationOutcome::Category { label } => match self.catalog.entry_for_category(&label) {
                Some(entry) => ResolutionResult::CategoryHit {
                    aisle_id: entry.aisle_id.clone(),
                    category_label: entry.category_label.clone(),
                },
                None => {
                    warn!("Classifier label '{}' has no aisle in the catalog", label);
                    ResolutionResult::Failure {
                        kind: FailureKind::InconsistentCatalog,
                        detail: label,
                    }
                }
            },
            ClassificationOutcome::NotFound => ResolutionResult::NotFound {
                reason: NotFoundReason::NotInCatalog,
            },
            ClassificationOutcome::ServiceError(err) => ResolutionResult::Failure {
                kind: FailureKind::ServiceError,
                detail: err.detail,
            },
        }
    }

    /// Blacklist and direct-match checks in policy order; `None` means the
    /// query needs the classifier.
    fn resolve_locally(&self, normalized: &str) -> Option<ResolutionResult> {
        let blacklisted = || {
            is_blacklisted(normalized, &self.catalog).then(|| {
                info!("'{}' is blacklisted", normalized);
                ResolutionResult::NotFound {
                    reason: NotFoundReason::Blacklisted,
                }
            })
        };
        let direct = || {
            match_direct(normalized, &self.catalog).map(|hit| {
                info!("Direct match for '{}' in {}", normalized, hit.aisle_id);
                ResolutionResult::DirectHit {
                    aisle_id: hit.aisle_id,
                    matched_item: hit.matched_item,
                    category_label: hit.category_label,
                }
            })
        };

        match self.policy.precedence {
            Precedence::BlacklistFirst => blacklisted().or_else(direct),
            Precedence::CatalogFirst => direct().or_else(blacklisted),
        }
    }
}
