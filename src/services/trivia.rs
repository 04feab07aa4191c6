//! Fun facts (numbersapi)

use crate::config::Config;
use crate::error::{AssistantError, AssistantResult};
use crate::messages::{random_message, LOCAL_FACTS};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// External trivia backend
#[async_trait]
pub trait TriviaBackend: Send + Sync {
    /// One plain-text fact of the given type (trivia, math, date)
    async fn fact(&self, kind: &str) -> AssistantResult<String>;
}

pub struct NumbersApiClient {
    timeout: Duration,
    client: reqwest::Client,
}

impl NumbersApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.http_timeout(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TriviaBackend for NumbersApiClient {
    async fn fact(&self, kind: &str) -> AssistantResult<String> {
        let response = self
            .client
            .get(format!("http://numbersapi.com/random/{kind}"))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Transport(format!(
                "trivia HTTP {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

pub struct TriviaService {
    backend: Arc<dyn TriviaBackend>,
}

impl TriviaService {
    pub fn new(backend: Arc<dyn TriviaBackend>) -> Self {
        Self { backend }
    }

    /// A fact from the backend, or a random local one on any failure
    pub async fn fact(&self) -> String {
        match self.backend.fact("trivia").await {
            Ok(fact) if !fact.trim().is_empty() => fact.trim().to_string(),
            Ok(_) => random_message(LOCAL_FACTS).to_string(),
            Err(e) => {
                warn!("❌ Trivia lookup failed, using local fact: {}", e);
                random_message(LOCAL_FACTS).to_string()
            }
        }
    }

    pub async fn describe(&self) -> String {
        format!("Aquí tienes un dato curioso: {}", self.fact().await)
    }
}
