pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod render;
pub mod resolver;
pub mod retry;

pub use catalog::{Catalog, CatalogEntry};
pub use config::{ClassifierConfig, Precedence, ResolverPolicy, RetryPolicy};
pub use error::{AisleError, Result};
pub use llm::{ClassificationOutcome, Classifier, LlmClassifier, ServiceError};
pub use resolver::{FailureKind, NotFoundReason, ResolutionResult, Resolver};
