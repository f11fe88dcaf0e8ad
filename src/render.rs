use crate::resolver::{FailureKind, ResolutionResult};

/// One-line message for the user who asked about `query`
pub fn render(result: &ResolutionResult, query: &str) -> String {
    let query = query.trim();
    match result {
        ResolutionResult::DirectHit {
            aisle_id,
            matched_item,
            category_label,
        } => format!("✅ {} is in {} ({}).", matched_item, aisle_id, category_label),
        ResolutionResult::CategoryHit {
            aisle_id,
            category_label,
        } => format!("✅ {} is in {} ({}).", query, aisle_id, category_label),
        ResolutionResult::NotFound { .. } => {
            format!("❌ '{}' is not sold in this store.", query)
        }
        ResolutionResult::Failure {
            kind: FailureKind::ServiceError,
            detail,
        } => format!("⚠️ Could not classify '{}': {}", query, detail),
        ResolutionResult::Failure {
            kind: FailureKind::InconsistentCatalog,
            detail,
        } => format!("⚠️ Catalog configuration error: category '{}' has no aisle.", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NotFoundReason;

    #[test]
    fn test_render_direct_hit_names_item() {
        let result = ResolutionResult::DirectHit {
            aisle_id: "A1".to_string(),
            matched_item: "copy paper".to_string(),
            category_label: "Paper".to_string(),
        };
        assert_eq!(render(&result, "Copy Paper"), "✅ copy paper is in A1 (Paper).");
    }

    #[test]
    fn test_render_misses_are_polite() {
        for reason in [
            NotFoundReason::EmptyInput,
            NotFoundReason::Blacklisted,
            NotFoundReason::NotInCatalog,
        ] {
            let line = render(&ResolutionResult::NotFound { reason }, " toyota ");
            assert_eq!(line, "❌ 'toyota' is not sold in this store.");
        }
    }

    #[test]
    fn test_render_failures_are_distinct() {
        let service = render(
            &ResolutionResult::Failure {
                kind: FailureKind::ServiceError,
                detail: "timed out".to_string(),
            },
            "widget",
        );
        let config = render(
            &ResolutionResult::Failure {
                kind: FailureKind::InconsistentCatalog,
                detail: "Automotive".to_string(),
            },
            "widget",
        );
        assert!(service.contains("timed out"));
        assert!(config.contains("Automotive"));
        assert_ne!(service, config);
    }
}
