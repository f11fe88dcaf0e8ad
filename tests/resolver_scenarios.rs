mod support;

use aisle_finder::config::{Precedence, ResolverPolicy};
use aisle_finder::llm::{ClassificationOutcome, ServiceError};
use aisle_finder::resolver::{FailureKind, NotFoundReason, ResolutionResult, Resolver};
use std::sync::Arc;
use support::{paper_catalog, MockClassifier};

fn resolver_with(mock: MockClassifier) -> (Resolver, Arc<MockClassifier>) {
    let mock = Arc::new(mock);
    let resolver = Resolver::new(Arc::new(paper_catalog()), mock.clone());
    (resolver, mock)
}

#[tokio::test]
async fn scenario_a_direct_hit_ignores_case() {
    let (resolver, mock) = resolver_with(MockClassifier::new());

    let result = resolver.resolve("Copy Paper").await;

    assert_eq!(
        result,
        ResolutionResult::DirectHit {
            aisle_id: "A1".to_string(),
            matched_item: "copy paper".to_string(),
            category_label: "Paper".to_string(),
        }
    );
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn scenario_b_blacklisted() {
    let (resolver, mock) = resolver_with(MockClassifier::new());

    for query in ["gun", "GUN", "  Gun  "] {
        assert_eq!(
            resolver.resolve(query).await,
            ResolutionResult::NotFound { reason: NotFoundReason::Blacklisted }
        );
    }
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn scenario_c_category_hit() {
    let (resolver, mock) = resolver_with(
        MockClassifier::new().answer("legal pad", ClassificationOutcome::Category { label: "Paper".to_string() }),
    );

    assert_eq!(
        resolver.resolve("legal pad").await,
        ResolutionResult::CategoryHit {
            aisle_id: "A1".to_string(),
            category_label: "Paper".to_string(),
        }
    );
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn scenario_d_not_in_catalog() {
    let (resolver, _) = resolver_with(MockClassifier::new().answer("toyota", ClassificationOutcome::NotFound));

    assert_eq!(
        resolver.resolve("toyota").await,
        ResolutionResult::NotFound { reason: NotFoundReason::NotInCatalog }
    );
}

#[tokio::test]
async fn scenario_e_timeout_is_service_failure() {
    let (resolver, _) = resolver_with(MockClassifier::new().answer(
        "widget",
        ClassificationOutcome::ServiceError(ServiceError::transient("operation timed out")),
    ));

    match resolver.resolve("widget").await {
        ResolutionResult::Failure { kind, .. } => assert_eq!(kind, FailureKind::ServiceError),
        other => panic!("expected a service failure, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_and_whitespace_never_reach_the_classifier() {
    let (resolver, mock) = resolver_with(MockClassifier::new());

    for query in ["", "   ", "\t\n"] {
        assert_eq!(
            resolver.resolve(query).await,
            ResolutionResult::NotFound { reason: NotFoundReason::EmptyInput }
        );
    }
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn invalid_label_from_service_is_not_passed_through() {
    let (resolver, _) = resolver_with(MockClassifier::new().answer(
        "widget",
        ClassificationOutcome::ServiceError(ServiceError::permanent("invalid category returned")),
    ));

    assert_eq!(
        resolver.resolve("widget").await,
        ResolutionResult::Failure {
            kind: FailureKind::ServiceError,
            detail: "invalid category returned".to_string(),
        }
    );
}

#[tokio::test]
async fn direct_hits_are_repeatable() {
    let (resolver, mock) = resolver_with(MockClassifier::new());

    let first = resolver.resolve("PRETZELS").await;
    for _ in 0..5 {
        assert_eq!(resolver.resolve("pretzels ").await, first);
    }
    assert_eq!(first.aisle_id(), Some("A2"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn vocabulary_is_sent_in_stable_order() {
    let (resolver, mock) = resolver_with(MockClassifier::new());

    resolver.resolve("stapler").await;
    let first = mock.last_labels();
    resolver.resolve("crackers").await;

    assert_eq!(first, vec!["Paper".to_string(), "Snacks".to_string()]);
    assert_eq!(mock.last_labels(), first);
}

#[tokio::test]
async fn catalog_first_policy_lets_items_through_the_blacklist() {
    let catalog = aisle_finder::catalog::Catalog::new(
        vec![aisle_finder::catalog::CatalogEntry::new("A9", "Hardware", ["nail gun"])],
        vec!["nail gun".to_string()],
    )
    .unwrap();
    let mock = Arc::new(MockClassifier::new());

    let strict = Resolver::new(Arc::new(catalog.clone()), mock.clone());
    let lenient = Resolver::with_policy(
        Arc::new(catalog),
        mock.clone(),
        ResolverPolicy { precedence: Precedence::CatalogFirst },
    );

    assert!(strict.resolve("Nail Gun").await.is_user_facing_miss());
    assert_eq!(lenient.resolve("Nail Gun").await.aisle_id(), Some("A9"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn concurrent_resolutions_share_the_catalog() {
    let (resolver, mock) = resolver_with(
        MockClassifier::new().answer("legal pad", ClassificationOutcome::Category { label: "paper".to_string() }),
    );
    let resolver = Arc::new(resolver);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let query = if i % 2 == 0 { "copy paper" } else { "legal pad" };
                resolver.resolve(query).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().aisle_id(), Some("A1"));
    }
    assert_eq!(mock.calls(), 8);
}
