//! Opt-in exponential backoff around any [`Classifier`].
//!
//! Only transient service errors are retried. Category and not-found answers,
//! validation failures and other permanent errors are returned immediately.

use crate::config::RetryPolicy;
use crate::llm::{ClassificationOutcome, Classifier};
use async_trait::async_trait;
use rand::Rng;
use tracing::{info, warn};

pub struct RetryingClassifier<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C: Classifier> RetryingClassifier<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Classifier> Classifier for RetryingClassifier<C> {
    async fn classify(
        &self,
        raw_text: &str,
        category_labels: &[String],
        blacklist: &[String],
    ) -> ClassificationOutcome {
        let max_attempts = self.policy.attempt_limit();
        let mut attempt = 1;

        loop {
            let outcome = self.inner.classify(raw_text, category_labels, blacklist).await;
            let err = match &outcome {
                ClassificationOutcome::ServiceError(err) if err.transient => err,
                _ => return outcome,
            };

            if attempt >= max_attempts {
                warn!(
                    "Giving up on '{}' after {} attempts: {}",
                    raw_text, attempt, err.detail
                );
                return outcome;
            }

            // up to 10% jitter so concurrent callers don't retry in lockstep
            let base = self.policy.backoff_for(attempt);
            let jitter = rand::thread_rng().gen_range(0.0..=0.1);
            let delay = base.mul_f64(1.0 + jitter);
            info!(
                "Attempt {}/{} for '{}' failed ({}); retrying in {:?}",
                attempt, max_attempts, raw_text, err.detail, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
