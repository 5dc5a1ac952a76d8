//! AI annotation gateway.
//!
//! Boundary component wrapping the hosted chat-completion API. It takes
//! pre-rendered text, never touches the record store, and classifies every
//! failure into the timeout/auth/rate-limit/transport taxonomy so callers
//! can decide between retrying and fixing configuration.

use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::error::{GatewayError, Result};

const MAX_RETRIES: usize = 3;
const BASE_BACKOFF_MS: u64 = 200;
const MAX_COMPLETION_TOKENS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotationMode {
    /// Judge the grade history and point at weak spots.
    Evaluate,
    /// Condense study notes or progress logs.
    Summarize,
    /// Translate the content, keeping terminology intact.
    Translate,
    /// Draft a study plan from goals and recent results.
    StudyPlan,
}

impl AnnotationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationMode::Evaluate => "evaluate",
            AnnotationMode::Summarize => "summarize",
            AnnotationMode::Translate => "translate",
            AnnotationMode::StudyPlan => "study-plan",
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            AnnotationMode::Evaluate => {
                "You are a supportive tutor. Evaluate the learner's grade \
                 history: name strengths, weaknesses, and one concrete next \
                 step per subject. Be specific and brief."
            }
            AnnotationMode::Summarize => {
                "Summarize the learner's notes and progress log into a short \
                 digest. Keep dates and numbers exact."
            }
            AnnotationMode::Translate => {
                "Translate the content into English (or into Japanese if it \
                 is already English). Preserve subject names and scores."
            }
            AnnotationMode::StudyPlan => {
                "You are a study planner. Given goals, deadlines, and recent \
                 results, draft a one-week plan with daily time blocks."
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub mode: AnnotationMode,
    pub text: String,
    pub model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct Gateway {
    config: AiConfig,
    client: reqwest::blocking::Client,
}

impl Gateway {
    pub fn new(config: AiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Gateway { config, client })
    }

    /// Send `content` for annotation and return the model's text.
    ///
    /// Rate-limit and server-side failures are retried with exponential
    /// backoff; timeouts and credential rejections surface immediately.
    pub fn annotate(&self, content: &str, mode: AnnotationMode) -> Result<Annotation> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version,
        );

        let request = ChatRequest {
            messages: vec![
                ChatMessage { role: "system", content: mode.system_prompt() },
                ChatMessage { role: "user", content },
            ],
            max_completion_tokens: MAX_COMPLETION_TOKENS,
        };

        let mut backoff = Duration::from_millis(BASE_BACKOFF_MS);
        let mut last_error = GatewayError::Transport("no attempt made".to_string());

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                warn!(attempt, ?backoff, "retrying AI request");
                sleep(backoff);
                backoff *= 2;
            }

            match self.send(&url, &request) {
                Ok(response) => {
                    let model = response
                        .model
                        .unwrap_or_else(|| self.config.deployment.clone());
                    let text = response
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.message.content)
                        .filter(|t| !t.trim().is_empty());

                    return match text {
                        Some(text) => {
                            debug!(mode = mode.as_str(), chars = text.len(), "annotation received");
                            Ok(Annotation { mode, text, model })
                        }
                        None => Err(GatewayError::Transport(
                            "empty completion from AI endpoint".to_string(),
                        )
                        .into()),
                    };
                }
                Err(e) if retryable(&e) && attempt < MAX_RETRIES => last_error = e,
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.into())
    }

    fn send(&self, url: &str, request: &ChatRequest<'_>) -> std::result::Result<ChatResponse, GatewayError> {
        let response = self
            .client
            .post(url)
            .header("api-key", &self.config.api_key)
            .json(request)
            .send()
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status.as_u16()));
        }

        response
            .json::<ChatResponse>()
            .map_err(|e| GatewayError::Transport(format!("malformed response: {e}")))
    }

    fn classify_transport(&self, error: reqwest::Error) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout(self.config.timeout)
        } else {
            GatewayError::Transport(error.to_string())
        }
    }
}

fn classify_status(status: u16) -> GatewayError {
    match status {
        401 | 403 => GatewayError::AuthFailure(status),
        429 => GatewayError::RateLimited,
        _ => GatewayError::Upstream(status),
    }
}

fn retryable(error: &GatewayError) -> bool {
    match error {
        GatewayError::RateLimited => true,
        // server-side errors are worth another attempt; client errors,
        // timeouts, and connection-level oddities are not
        GatewayError::Upstream(status) => *status >= 500,
        GatewayError::Timeout(_) | GatewayError::AuthFailure(_) | GatewayError::Transport(_) => {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_onto_the_error_taxonomy() {
        assert!(matches!(classify_status(401), GatewayError::AuthFailure(401)));
        assert!(matches!(classify_status(403), GatewayError::AuthFailure(403)));
        assert!(matches!(classify_status(429), GatewayError::RateLimited));
        assert!(matches!(classify_status(500), GatewayError::Upstream(500)));
        assert!(matches!(classify_status(400), GatewayError::Upstream(400)));
    }

    #[test]
    fn only_rate_limits_and_server_errors_retry() {
        assert!(retryable(&GatewayError::RateLimited));
        assert!(retryable(&classify_status(503)));
        assert!(retryable(&GatewayError::Upstream(599)));
        assert!(!retryable(&classify_status(400)));
        assert!(!retryable(&GatewayError::AuthFailure(401)));
        assert!(!retryable(&GatewayError::Timeout(Duration::from_secs(1))));
        assert!(!retryable(&GatewayError::Transport("connection reset".into())));
    }

    #[test]
    fn request_payload_has_the_chat_shape() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage { role: "system", content: "be brief" },
                ChatMessage { role: "user", content: "hello" },
            ],
            max_completion_tokens: 100,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert_eq!(json["max_completion_tokens"], 100);
    }
}
