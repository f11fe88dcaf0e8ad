//! Remote classification through an OpenAI-compatible chat-completions endpoint.
//!
//! The model is asked to pick exactly one category label for an item, or to
//! answer with the `Item Not Found` sentinel. Its reply is never trusted as-is:
//! anything that is not one of the candidate labels or the sentinel becomes a
//! `ServiceError`, so the aisle lookup only ever sees known vocabulary.

use crate::config::ClassifierConfig;
use crate::error::{AisleError, Result};
use crate::normalize::normalize;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Reply the model gives when no category applies
pub const NOT_FOUND_SENTINEL: &str = "Item Not Found";

lazy_static! {
    // Quotes, backticks, markdown emphasis and a trailing period around a bare label
    static ref REPLY_DECORATION: Regex = Regex::new(r#"^[\s"'`*]+|[\s"'`*.]+$"#).unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceError {
    pub detail: String,
    /// Timeouts, connection failures, 429 and 5xx; safe to retry
    pub transient: bool,
}

impl ServiceError {
    pub fn transient(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            transient: true,
        }
    }

    pub fn permanent(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            transient: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// Always one of the candidate labels, in the candidate's spelling
    Category { label: String },
    NotFound,
    ServiceError(ServiceError),
}

/// Anything that can map an item name onto one of a set of category labels.
///
/// Results may differ between identical calls; callers must not assume
/// repeatability.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        raw_text: &str,
        category_labels: &[String],
        blacklist: &[String],
    ) -> ClassificationOutcome;
}

pub struct LlmClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl LlmClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AisleError::Llm(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Use a caller-built client; its own timeout settings apply
    pub fn with_client(config: ClassifierConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    async fn call_llm(&self, api_key: &str, prompt: &str) -> std::result::Result<String, ServiceError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(&self.config.endpoint_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let detail = format!("LLM API call failed: {}", e);
                if e.is_timeout() || e.is_connect() {
                    ServiceError::transient(detail)
                } else {
                    ServiceError::permanent(detail)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let detail = format!("LLM API error ({}): {}", status, error_text.trim());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                ServiceError::transient(detail)
            } else {
                ServiceError::permanent(detail)
            });
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::transient(format!("LLM API call failed: {}", e))
            } else {
                ServiceError::permanent(format!("Failed to parse LLM response: {}", e))
            }
        })?;
        debug!("LLM response: {}", response_json);

        if let Some(error) = response_json.get("error") {
            return Err(ServiceError::permanent(format!("LLM API error: {}", error)));
        }

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| ServiceError::permanent("No content in LLM response"))?;

        Ok(content.to_string())
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(
        &self,
        raw_text: &str,
        category_labels: &[String],
        blacklist: &[String],
    ) -> ClassificationOutcome {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return ClassificationOutcome::ServiceError(ServiceError::permanent("missing API key"));
        };

        let prompt = build_prompt(raw_text, category_labels, blacklist);
        match self.call_llm(api_key, &prompt).await {
            Ok(reply) => validate_reply(&reply, category_labels),
            Err(err) => {
                warn!("Classification of '{}' failed: {}", raw_text, err.detail);
                ClassificationOutcome::ServiceError(err)
            }
        }
    }
}

pub fn build_prompt(raw_text: &str, category_labels: &[String], blacklist: &[String]) -> String {
    let avoid = if blacklist.is_empty() {
        String::new()
    } else {
        format!(
            "\nItems such as {} are never sold here; answer \"{}\" for them.",
            blacklist.join(", "),
            NOT_FOUND_SENTINEL
        )
    };

    format!(
        r#"Classify the item '{item}' into one of these store categories:
{labels}.

Only return the category name. Do NOT explain your reasoning.
If the item is NOT sold in this store, return: "{sentinel}".{avoid}

Example Outputs:
- "{first}" (for an item that belongs to {first})
- "{sentinel}" (for Toyota)"#,
        item = raw_text.trim(),
        labels = category_labels.join(", "),
        sentinel = NOT_FOUND_SENTINEL,
        avoid = avoid,
        first = category_labels.first().map(String::as_str).unwrap_or("Category"),
    )
}

fn strip_decoration(text: &str) -> String {
    normalize(&REPLY_DECORATION.replace_all(text, ""))
}

/// Map a raw model reply onto the candidate vocabulary
pub fn validate_reply(reply: &str, category_labels: &[String]) -> ClassificationOutcome {
    let raw_key = normalize(reply);
    let key = strip_decoration(reply);

    // Labels may carry their own punctuation ("Misc."), so try the reply
    // verbatim before comparing decoration-free forms on both sides.
    let label = category_labels
        .iter()
        .find(|label| normalize(label) == raw_key)
        .or_else(|| category_labels.iter().find(|label| strip_decoration(label) == key));
    if let Some(label) = label {
        return ClassificationOutcome::Category {
            label: label.clone(),
        };
    }

    if key.contains(&normalize(NOT_FOUND_SENTINEL)) {
        return ClassificationOutcome::NotFound;
    }

    warn!("LLM returned a label outside the catalog vocabulary: {:?}", reply);
    ClassificationOutcome::ServiceError(ServiceError::permanent("invalid category returned"))
}
