//! AI-assisted product enrichment backed by hosted LLM APIs
//!
//! Providers only implement [`AiService::complete`]; prompt construction and
//! response parsing are shared default methods so both providers behave the same.

pub mod gemini;
pub mod openai;
pub mod parse;
pub mod prompts;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;

pub use gemini::GeminiService;
pub use openai::OpenAiService;

/// Which hosted model backs the AI endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(AiProvider::Gemini),
            "openai" | "gpt" => Ok(AiProvider::OpenAi),
            other => Err(format!("unknown AI provider: {}", other)),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::Gemini => write!(f, "gemini"),
            AiProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Ask the provider for a JSON-only answer when it supports that
    pub json: bool,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// What the model is told about a product
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContext {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Price range proposed by the model. All fields empty when nothing parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSuggestion {
    #[serde(default)]
    pub suggested_price: Option<Decimal>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// Auto-fill data for a new product. Empty when nothing parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEnrichment {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub suggested_price: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ProductEnrichment {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Product row extracted from free-form inventory text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// AI provider errors
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{provider} API error (status {status}): {body}")]
    Api {
        provider: AiProvider,
        status: u16,
        body: String,
    },

    #[error("{0} returned no text")]
    EmptyResponse(AiProvider),
}

/// Common interface of the LLM-backed providers
#[async_trait]
pub trait AiService: Send + Sync {
    fn provider(&self) -> AiProvider;

    /// Send one prompt and return the raw text answer
    async fn complete(&self, prompt: &Prompt) -> Result<String, AiError>;

    /// Marketing description for a product
    async fn generate_description(&self, product: &ProductContext) -> Result<String, AiError> {
        let text = self.complete(&prompts::description(product)).await?;
        Ok(parse::clean_text(&text))
    }

    /// Suggested selling price; empty suggestion when the answer has no usable number
    async fn suggest_price(
        &self,
        product: &ProductContext,
        currency: &str,
    ) -> Result<PriceSuggestion, AiError> {
        let text = self.complete(&prompts::price(product, currency)).await?;
        let suggestion = parse::price_suggestion(&text);
        if suggestion.suggested_price.is_none() {
            warn!(provider = %self.provider(), product = %product.name, "no price in model response");
        }
        Ok(suggestion)
    }

    /// Fill in missing product fields from a name and optional hints
    async fn auto_fill(
        &self,
        product: &ProductContext,
        fields: &[String],
    ) -> Result<ProductEnrichment, AiError> {
        let text = self.complete(&prompts::auto_fill(product, fields)).await?;
        let enrichment = parse::enrichment(&text);
        if enrichment.is_empty() {
            warn!(provider = %self.provider(), product = %product.name, "could not parse auto-fill response");
        }
        Ok(enrichment)
    }

    /// Turn pasted inventory text (lists, notes, invoices) into product rows
    async fn extract_products(&self, text: &str) -> Result<Vec<ProductDraft>, AiError> {
        let answer = self.complete(&prompts::extract_products(text)).await?;
        Ok(parse::product_rows(&answer))
    }
}

/// Build the configured provider, or `None` when its API key is missing
pub fn from_config(config: &Config) -> Option<Arc<dyn AiService>> {
    let api_key = config.ai_api_key()?.to_string();
    let service: Arc<dyn AiService> = match config.ai_provider {
        AiProvider::Gemini => Arc::new(GeminiService::new(api_key, config.gemini_model.clone())),
        AiProvider::OpenAi => Arc::new(OpenAiService::new(api_key, config.openai_model.clone())),
    };
    Some(service)
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Replays canned answers, or fails every call when given none
    pub struct ScriptedAi {
        answers: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<Prompt>>,
    }

    impl ScriptedAi {
        pub fn answering(answers: &[&str]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().rev().map(|a| a.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self::answering(&[])
        }
    }

    #[async_trait]
    impl AiService for ScriptedAi {
        fn provider(&self) -> AiProvider {
            AiProvider::Gemini
        }

        async fn complete(&self, prompt: &Prompt) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.answers
                .lock()
                .unwrap()
                .pop()
                .ok_or(AiError::EmptyResponse(AiProvider::Gemini))
        }
    }
}
