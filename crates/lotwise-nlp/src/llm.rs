//! LLM-backed parser
//!
//! Uses the OpenAI chat-completions API to route questions the rule parser
//! cannot. Address extraction still tries the regex patterns first; the
//! model is only asked when they come up empty.

use crate::{ParsedQuery, QueryParser, RuleParser};
use async_trait::async_trait;
use lotwise_core::{CoreError, LlmConfig, QueryKind, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

const ROUTING_PROMPT: &str = "You are an assistant that maps natural language queries to query \
kinds for a real estate lookup service.\n\nAvailable kinds:\n\
- 'assessment': assessed value, property value\n\
- 'lot_info': lot size, year built, property type\n\
- 'zoning': zoning designation, permitted uses\n\
- 'nearby_schools': schools near a property\n\
- 'school_catchment': school catchment area\n\
- 'nearest_transit': nearby transit, bus stops, skytrain stations\n\
- 'demographics': neighbourhood population, income, age\n\
- 'nearby_amenities': parks, community centres, recreation\n\
- 'neighbourhood_assessment': average assessed value in the neighbourhood\n\
- 'transit_routes_downtown': transit routes to downtown\n\
- 'unsupported': any other query type\n\n\
Respond ONLY with the kind name from the list above. Do not include any \
explanation or extra text.";

pub struct LlmParser {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    rules: RuleParser,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

impl LlmParser {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CoreError::LlmError(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            max_tokens,
            temperature,
            rules: RuleParser::new(),
        })
    }

    /// Create from config; `None` when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = &config.openai_api_key else {
            return Ok(None);
        };

        let mut parser = Self::new(
            api_key,
            &config.model,
            config.max_tokens,
            config.temperature,
            config.timeout_secs,
        )?;

        if let Some(url) = &config.openai_base_url {
            parser.base_url = url.clone();
        }

        Ok(Some(parser))
    }

    /// Set custom base URL (for Azure or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn complete(&self, system: &str, user: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CoreError::LlmError(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CoreError::LlmError(format!("OpenAI error: {error_text}")));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::LlmError(format!("Invalid response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| CoreError::LlmError("Empty completion".to_string()))
    }

    async fn route(&self, text: &str) -> Result<QueryKind> {
        let answer = self
            .complete(
                ROUTING_PROMPT,
                format!("User query: {text}\n\nWhich kind?"),
            )
            .await?;

        let name = answer.to_lowercase();
        tracing::debug!(question = text, kind = %name, "llm routed question");

        QueryKind::from_str(&name).map_err(|_| {
            CoreError::ValidationError(format!(
                "Unsupported question (classified as '{name}'). Currently available: \
                 schools, transit, parks, zoning, demographics, assessment value."
            ))
        })
    }

    async fn extract_address(&self, text: &str) -> Result<String> {
        // Regex first; the model only sees questions the patterns miss.
        let address = self.rules.extract_address(text);
        if !address.is_empty() {
            return Ok(address);
        }

        self.complete(
            "You are a real estate assistant. Extract only the property address, street, \
             city, or postal code from the user query. Do not add any extra text, \
             explanation, or punctuation.",
            format!("User query: {text}\nAddress:"),
        )
        .await
    }
}

#[async_trait]
impl QueryParser for LlmParser {
    async fn parse(&self, text: &str) -> Result<ParsedQuery> {
        let kind = self.route(text).await?;

        let address = self.extract_address(text).await?;
        if address.is_empty() {
            return Err(CoreError::ValidationError(
                "No address found in question".to_string(),
            ));
        }

        Ok(ParsedQuery { kind, address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            max_tokens: 64,
            temperature: 0.0,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("gpt-4o-mini"));
        assert!(json.contains("max_tokens"));
    }

    #[test]
    fn test_chat_response_parsing() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "nearby_schools"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "nearby_schools");
    }
}
