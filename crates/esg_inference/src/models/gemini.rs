use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use esg_core::{
    Analysis, Article, ClassificationOracle, EmbeddingOracle, Error, Oracle, QuickFilterOracle, Result,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::prompts::{classification_prompt, parse_analysis, parse_indices, quick_filter_prompt};
use crate::{InferenceConfig, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GEMINI_URL};

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

fn content(text: &str) -> Content {
    Content {
        parts: vec![Part { text: text.to_string() }],
    }
}

pub struct GeminiModel {
    client: Arc<Client>,
    api_key: Option<String>,
    base_url: Url,
    chat_model: String,
    embedding_model: String,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url.as_str())
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl GeminiModel {
    pub fn new(api_key: Option<String>, config: &InferenceConfig) -> Result<Self> {
        let raw_url = config.model_url.as_deref().unwrap_or(DEFAULT_GEMINI_URL);
        let base_url = Url::parse(raw_url)
            .map_err(|e| Error::Config(format!("Invalid model URL '{}': {}", raw_url, e)))?;

        Ok(Self {
            client: Arc::new(Client::new()),
            api_key,
            base_url,
            chat_model: config.chat_model.clone().unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            embedding_model: config
                .embedding_model
                .clone()
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Unavailable("Gemini API key is required".to_string()))
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.as_str().trim_end_matches('/'),
            model,
            method
        )
    }

    async fn generate(&self, prompt: String) -> Result<String> {
        let api_key = self.api_key()?;
        let request = GenerateRequest {
            contents: vec![content(&prompt)],
        };

        let response = self
            .client
            .post(self.endpoint(&self.chat_model, "generateContent"))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::MalformedResponse("Gemini returned no candidate text".to_string()));
        }
        tracing::debug!("Gemini reply: {}", text);
        Ok(text)
    }
}

impl Oracle for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }
}

#[async_trait]
impl EmbeddingOracle for GeminiModel {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self.api_key()?;
        let request = EmbedRequest {
            model: format!("models/{}", self.embedding_model),
            content: content(text),
        };

        let response = self
            .client
            .post(self.endpoint(&self.embedding_model, "embedContent"))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbedResponse>()
            .await?;

        if response.embedding.values.is_empty() {
            return Err(Error::MalformedResponse("Gemini returned an empty embedding".to_string()));
        }
        Ok(response.embedding.values)
    }
}

#[async_trait]
impl ClassificationOracle for GeminiModel {
    async fn classify(&self, article: &Article) -> Result<Analysis> {
        let reply = self.generate(classification_prompt(article)).await?;
        parse_analysis(&reply)
    }
}

#[async_trait]
impl QuickFilterOracle for GeminiModel {
    async fn relevant_indices(&self, titles: &[String]) -> Result<Vec<usize>> {
        let reply = self.generate(quick_filter_prompt(titles)).await?;
        parse_indices(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_endpoint_uses_configured_models() {
        let config = InferenceConfig {
            model_url: Some("http://localhost:8080/v1beta/".to_string()),
            chat_model: Some("gemini-test".to_string()),
            embedding_model: None,
        };
        let model = GeminiModel::new(Some("key".to_string()), &config).unwrap();
        assert_eq!(
            model.endpoint(model.chat_model(), "generateContent"),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(model.embedding_model(), DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_invalid_url_is_a_config_error() {
        let config = InferenceConfig {
            model_url: Some("not a url".to_string()),
            ..InferenceConfig::default()
        };
        assert!(matches!(GeminiModel::new(None, &config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_calls_without_key_are_unavailable() {
        let model = GeminiModel::new(None, &InferenceConfig::default()).unwrap();
        let article = Article {
            title: "t".to_string(),
            snippet: "s".to_string(),
            link: "https://news.example.com".to_string(),
            original_link: None,
            publish_date: Utc::now(),
        };
        assert!(matches!(model.embed("text").await, Err(Error::Unavailable(_))));
        assert!(matches!(model.classify(&article).await, Err(Error::Unavailable(_))));
        assert!(matches!(
            model.relevant_indices(&["t".to_string()]).await,
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let model = GeminiModel::new(Some("top-secret".to_string()), &InferenceConfig::default()).unwrap();
        assert!(!format!("{:?}", model).contains("top-secret"));
    }
}
