// src/classify/client.rs
//! Tier-2 classifier client: provider abstraction over an LLM that picks one
//! category name for a headline. "Unavailable" is a first-class state
//! (`DisabledClassifier`), not a null check at call sites.

use std::fs;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Trait object used by the pipeline and tests.
pub trait ClassifierClient: Send + Sync {
    /// Classify a headline against the candidate category names. Returns the
    /// raw (sanitized) answer; membership validation happens in the caller.
    /// Any failure maps to `None`.
    fn classify<'a>(
        &'a self,
        headline: &'a str,
        category_names: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
    /// Whether calls can possibly succeed (false for the disabled client).
    fn is_available(&self) -> bool {
        true
    }
}

pub type DynClassifier = Arc<dyn ClassifierClient>;

/// Config loaded from `config/classifier.json`. Missing or malformed file
/// means classification is disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub enabled: bool,
    /// "openai" for now.
    pub provider: Option<String>,
    /// Model override; defaults to gpt-4o-mini.
    pub model: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: None,
            model: None,
        }
    }
}

pub fn load_classifier_config() -> ClassifierConfig {
    let path = Path::new("config/classifier.json");
    match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => ClassifierConfig::default(),
    }
}

/// Factory: build a client according to config and environment.
///
/// * If `CLASSIFIER_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled == false`, returns a disabled client.
/// * Else builds the configured provider.
pub fn build_client_from_config(config: &ClassifierConfig) -> DynClassifier {
    if std::env::var("CLASSIFIER_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockClassifier {
            fixed: Some("OTHER".to_string()),
        });
    }

    if !config.enabled {
        return Arc::new(DisabledClassifier);
    }

    match config.provider.as_deref() {
        Some("openai") => Arc::new(OpenAiClassifier::new(config.model.as_deref())),
        _ => Arc::new(DisabledClassifier),
    }
}

/// Returns `None` always; used when no classifier is configured.
pub struct DisabledClassifier;

impl ClassifierClient for DisabledClassifier {
    fn classify<'a>(
        &'a self,
        _headline: &'a str,
        _category_names: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
    fn is_available(&self) -> bool {
        false
    }
}

/// Fixed-answer client for tests and local runs.
#[derive(Clone)]
pub struct MockClassifier {
    pub fixed: Option<String>,
}

impl ClassifierClient for MockClassifier {
    fn classify<'a>(
        &'a self,
        _headline: &'a str,
        _category_names: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// OpenAI provider (Chat Completions API). Requires `OPENAI_API_KEY`; an
/// empty key behaves as unavailable. Timeouts are independent of the feed
/// fetch client, so a stuck classifier cannot stall a source fetch.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(model_override: Option<&str>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("newsvibe/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Self {
            http,
            api_key,
            model,
        }
    }

    async fn classify_impl(&self, headline: &str, category_names: &[String]) -> Option<String> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let category_list = category_names.join(", ");
        let prompt = format!(
            "Categorize this news headline into ONE of the following: {category_list}. \
             If it doesn't fit, respond 'OTHER'.\n\nHeadline: {headline}\n\n\
             Respond with ONLY the category name ({category_list}) or 'OTHER'."
        );
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
            temperature: 0.0,
            max_tokens: 20,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .ok()?;

        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "classifier call failed");
            return None;
        }
        let body: Resp = resp.json().await.ok()?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        let cleaned = sanitize_answer(content);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

impl ClassifierClient for OpenAiClassifier {
    fn classify<'a>(
        &'a self,
        headline: &'a str,
        category_names: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(self.classify_impl(headline, category_names))
    }
    fn provider_name(&self) -> &'static str {
        "openai"
    }
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Trim and strip formatting markers models like to wrap answers in.
pub fn sanitize_answer(input: &str) -> String {
    input
        .trim()
        .trim_matches(|c| matches!(c, '*' | '`' | '"' | '\''))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_markers() {
        assert_eq!(sanitize_answer("**AI**"), "AI");
        assert_eq!(sanitize_answer(" `US Politics` "), "US Politics");
        assert_eq!(sanitize_answer("\"OTHER\"\n"), "OTHER");
        assert_eq!(sanitize_answer("  "), "");
    }

    #[test]
    fn disabled_client_reports_unavailable() {
        assert!(!DisabledClassifier.is_available());
        assert_eq!(DisabledClassifier.provider_name(), "disabled");
    }
}
