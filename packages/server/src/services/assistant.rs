use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::{GameError, Result};
use crate::models::code_file::CodeFile;
use crate::utils::config::CONFIG;

const REQUEST_TIMEOUT_SECS: u64 = 20;

pub const FALLBACK_HINT: &str =
    "The assistant is offline. Read the expected output again and trace the code line by line.";
pub const FALLBACK_REVIEW: &str = "The assistant is offline, so this code could not be reviewed.";
pub const FALLBACK_CHAT: &str = "The assistant is offline right now. Try again in a moment.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeReview {
    pub score: Option<u8>,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat-completion client. Every public helper fails open to a canned message.
#[derive(Clone, Debug)]
pub struct AssistantClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl AssistantClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            api_key,
            model: model.into(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(
            CONFIG.assistant_url.clone(),
            CONFIG.assistant_api_key.clone(),
            CONFIG.assistant_model.clone(),
        )
    }

    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GameError::GenerativeService("no API key configured".to_string()))?;

        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GameError::GenerativeService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GameError::GenerativeService(format!(
                "assistant answered {}",
                response.status()
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GameError::GenerativeService(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| GameError::GenerativeService("empty reply".to_string()))
    }

    pub async fn hint(&self, file: &CodeFile) -> String {
        let prompt = format!(
            "Language: {}\nExpected output:\n{}\n\nCode:\n{}",
            file.language, file.expected_output, file.content
        );
        self.complete_or(
            "You are a coding tutor. Give one short hint toward the fix without writing the answer.",
            &prompt,
            FALLBACK_HINT,
        )
        .await
    }

    pub async fn review(&self, file: &CodeFile) -> CodeReview {
        let prompt = format!(
            "Language: {}\nCode:\n{}\n\nStart your reply with a score from 0 to 100, then one paragraph of feedback.",
            file.language, file.content
        );
        match self
            .complete("You are a strict but friendly code reviewer.", &prompt)
            .await
        {
            Ok(feedback) => CodeReview {
                score: parse_score(&feedback),
                feedback,
            },
            Err(e) => {
                warn!("Code review fell back to canned reply: {}", e);
                CodeReview {
                    score: None,
                    feedback: FALLBACK_REVIEW.to_string(),
                }
            }
        }
    }

    pub async fn chat(&self, prompt: &str, context: Option<&str>) -> String {
        let prompt = match context {
            Some(context) => format!("{}\n\nContext:\n{}", prompt, context),
            None => prompt.to_string(),
        };
        self.complete_or(
            "You are the ship's computer in a programming game. Answer briefly.",
            &prompt,
            FALLBACK_CHAT,
        )
        .await
    }

    async fn complete_or(&self, system: &str, prompt: &str, fallback: &str) -> String {
        match self.complete(system, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Assistant fell back to canned reply: {}", e);
                fallback.to_string()
            }
        }
    }
}

/// First integer in the reply, clamped to 0..=100.
pub fn parse_score(text: &str) -> Option<u8> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    Some(value.min(100) as u8)
}
