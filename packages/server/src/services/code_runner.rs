use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{GameError, Result};
use crate::models::code_file::ExecutionOutput;
use crate::utils::config::CONFIG;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<SourceFile<'a>>,
}

#[derive(Debug, Serialize)]
struct SourceFile<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize, Default)]
struct StageOutput {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    #[serde(default)]
    compile: Option<StageOutput>,
    run: StageOutput,
}

/// Client for a Piston-compatible sandbox (`POST {base}/execute`).
#[derive(Clone, Debug)]
pub struct CodeRunner {
    client: Client,
    base_url: String,
}

impl CodeRunner {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(CONFIG.code_runner_url.clone())
    }

    pub async fn execute(&self, language: &str, source: &str) -> Result<ExecutionOutput> {
        let payload = ExecuteRequest {
            language,
            version: "*",
            files: vec![SourceFile { content: source }],
        };

        let response = self
            .client
            .post(format!("{}/execute", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| GameError::NetworkUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GameError::NetworkUnavailable(format!(
                "sandbox answered {}",
                response.status()
            )));
        }

        let body: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| GameError::NetworkUnavailable(e.to_string()))?;

        // コンパイルエラーは stderr にまとめる
        let mut stderr = body.compile.map(|c| c.stderr).unwrap_or_default();
        if !body.run.stderr.is_empty() {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(&body.run.stderr);
        }

        Ok(ExecutionOutput {
            stdout: body.run.stdout,
            stderr,
        })
    }
}
