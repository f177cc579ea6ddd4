use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL_ID: &str = "gemini-2.5-flash-preview-04-17";

/// Backoff schedule for transient model failures. Attempts are bounded;
/// running out surfaces the last error instead of hanging forever.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(600),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `failures` consecutive failures (doubling from
    /// the base, capped at the ceiling).
    pub fn delay(&self, failures: u32) -> Duration {
        let mut delay = self.base_delay;
        for _ in 0..failures {
            delay = delay.saturating_mul(2);
            if delay >= self.max_delay {
                return self.max_delay;
            }
        }
        delay.min(self.max_delay)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Turn {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: &'a SystemInstruction,
    contents: &'a [Turn],
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: MODEL_ID.to_string(),
        })
    }

    /// Start a stateful chat session. Every send carries the full turn
    /// history, so the model keeps context across the whole exchange.
    pub fn start_chat(&self, system_instruction: &str) -> GeminiChat<'_> {
        GeminiChat {
            client: self,
            system: SystemInstruction {
                parts: vec![TextPart {
                    text: system_instruction.to_string(),
                }],
            },
            history: Vec::new(),
        }
    }

    async fn generate(&self, system: &SystemInstruction, contents: &[Turn]) -> Result<String> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let request = GenerateRequest {
            system_instruction: system,
            contents,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Gemini API error: {} - {}", status, error_text);
        }

        let generated = response
            .json::<GenerateResponse>()
            .await
            .context("Failed to parse Gemini API response")?;

        let text: String = generated
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("Gemini returned an empty response");
        }

        Ok(text)
    }
}

/// One conversational session. The user turn and the model reply are
/// committed to the history only when the call succeeds, so a failed
/// attempt can be retried with an unchanged transcript.
pub struct GeminiChat<'a> {
    client: &'a GeminiClient,
    system: SystemInstruction,
    history: Vec<Turn>,
}

impl GeminiChat<'_> {
    pub async fn send(&mut self, text: &str) -> Result<String> {
        let turn = Turn {
            role: "user",
            parts: vec![TextPart {
                text: text.to_string(),
            }],
        };

        let mut contents = self.history.clone();
        contents.push(turn.clone());

        let reply = self.client.generate(&self.system, &contents).await?;

        self.history.push(turn);
        self.history.push(Turn {
            role: "model",
            parts: vec![TextPart {
                text: reply.clone(),
            }],
        });

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_from_the_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(10));
        assert_eq!(policy.delay(1), Duration::from_secs(20));
        assert_eq!(policy.delay(2), Duration::from_secs(40));
    }

    #[test]
    fn test_delay_is_capped_at_the_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(6), Duration::from_secs(600));
        assert_eq!(policy.delay(60), Duration::from_secs(600));
    }

    #[test]
    fn test_custom_policy_schedule() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(350));
    }
}
