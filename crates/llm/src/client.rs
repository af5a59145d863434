use std::time::Duration;

use dqbot_core::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, truncate};

use crate::ai_types::{ChatRequest, ChatResponse};
use crate::error::LlmError;
use crate::generator::GenerationParams;

/// Default HTTP timeout for one chat-completions call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// How transient failures are retried.
///
/// `delays[i]` is the pause before retry `i + 1`; the last delay repeats when
/// there are more retries than delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)],
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: usize, delays: Vec<Duration>) -> Self {
        Self { max_retries, delays }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self { max_retries: 0, delays: Vec::new() }
    }

    pub(crate) fn delay_before(&self, attempt: usize) -> Duration {
        let idx = attempt.saturating_sub(1);
        self.delays.get(idx).or_else(|| self.delays.last()).copied().unwrap_or_default()
    }
}

/// Client for an OpenAI-compatible chat-completions API.
pub struct LlmClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) temperature: f32,
    pub(crate) retry: RetryPolicy,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Creates a new LLM client with the given API key and base URL.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(api_key: String, base_url: String) -> Result<Self, LlmError> {
        Self::with_http_timeout(api_key, base_url, DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a client whose HTTP requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn with_http_timeout(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryPolicy::default(),
        })
    }

    /// Sets a custom model for this client.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generation parameters matching this client's configured model and temperature.
    #[must_use]
    pub fn default_params(&self) -> GenerationParams {
        GenerationParams { model: self.model.clone(), temperature: self.temperature }
    }

    /// Send a chat completion request and return the extracted content string.
    ///
    /// # Errors
    /// Returns an error if the HTTP request fails, the API returns a
    /// non-success status, the response body cannot be parsed, or the choices
    /// array is empty.
    pub(crate) async fn chat_completion(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let max_retries = self.retry.max_retries;
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = self.retry.delay_before(attempt);
                tracing::warn!("LLM retry attempt {attempt}/{max_retries} after {delay:?}");
                tokio::time::sleep(delay).await;
            }

            let response_result = self
                .client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(request)
                .send()
                .await;

            let response = match response_result {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::HttpRequest(e));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.text().await {
                    Ok(b) => b,
                    Err(e) => {
                        last_error = Some(LlmError::HttpRequest(e));
                        continue;
                    },
                };

                let chat_response: ChatResponse =
                    serde_json::from_str(&body).map_err(|e| LlmError::JsonParse {
                        context: format!(
                            "chat completion response (body: {})",
                            truncate(&body, 200)
                        ),
                        source: e,
                    })?;

                let content = chat_response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or(LlmError::EmptyResponse)?;

                return Ok(content);
            }

            let status_code = status.as_u16();
            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());

            let err = LlmError::HttpStatus { code: status_code, body };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        let last = last_error.unwrap_or(LlmError::EmptyResponse);
        if max_retries == 0 {
            return Err(last);
        }
        Err(LlmError::RetriesExhausted(Box::new(last)))
    }
}
