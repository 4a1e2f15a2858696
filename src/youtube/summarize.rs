//! Transcript summarization through an OpenAI-compatible chat API.
//!
//! The transcript is grouped into fixed time windows and each window is
//! summarized with one chat completion. A window that fails to summarize
//! falls back to its concatenated transcript text, so one flaky request
//! never loses the run.

use std::env;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::YoutubeConfig;
use crate::error::{Error, Result};

use super::transcript::{Transcript, TranscriptItem};

/// Group a transcript into time windows and summarize each one.
///
/// With an empty `model` the "summary" is just the concatenated window
/// text, which suits people who summarize in an external app.
///
/// # Errors
///
/// `Error::Config` when a model is set but no API key is available.
pub fn summarize(transcript: &Transcript, config: &YoutubeConfig) -> Result<Transcript> {
    let client = if config.model.is_empty() {
        None
    } else {
        Some(ChatClient::from_env(config)?)
    };

    #[allow(clippy::cast_precision_loss)]
    let window_seconds = (config.summary_time_window_minutes * 60) as f64;

    let mut items: Vec<TranscriptItem> = Vec::new();
    let mut current: Option<Window> = None;

    for item in &transcript.items {
        match &mut current {
            Some(window) if item.start_ts - window.start_ts < window_seconds => {
                window.end_ts = item.start_ts + item.duration;
                window.texts.push(item.text.clone());
            }
            _ => {
                if let Some(window) = current.take() {
                    items.push(window.into_summary(client.as_ref(), config));
                }
                current = Some(Window {
                    start_ts: item.start_ts,
                    end_ts: item.start_ts + item.duration,
                    texts: vec![item.text.clone()],
                });
            }
        }
    }
    if let Some(window) = current.take() {
        items.push(window.into_summary(client.as_ref(), config));
    }

    Ok(Transcript {
        items,
        language: transcript.language.clone(),
    })
}

struct Window {
    start_ts: f64,
    end_ts: f64,
    texts: Vec<String>,
}

impl Window {
    fn into_summary(self, client: Option<&ChatClient>, config: &YoutubeConfig) -> TranscriptItem {
        let mut text = self.texts.join(" ");

        if let Some(client) = client {
            let user_prompt = format!(
                "Transcript:\n\"\"\"\n{text}\n\"\"\"\n\n{}",
                config.prompt_summarize
            );
            match client.complete(&config.prompt_system, &user_prompt) {
                Ok(summary) => text = summary,
                // Keep the concatenated text for a failed window.
                Err(e) => warn!("summarization window failed: {e}"),
            }
        }

        TranscriptItem {
            start_ts: self.start_ts,
            duration: self.end_ts - self.start_ts,
            text,
        }
    }
}

// ── Chat API client ───────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

struct ChatClient {
    http: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    fn from_env(config: &YoutubeConfig) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            Error::Config(
                "OPENAI_API_KEY is not set; it is required when youtube.model is configured"
                    .to_string(),
            )
        })?;

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.api_base);
        let response: ChatResponse = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::Other(format!("chat completion request failed: {e}")))?
            .json()
            .map_err(|e| Error::Other(format!("cannot decode chat completion: {e}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Other("chat completion returned no choices".to_string()))?;
        debug!(
            id = %response.id,
            model = %response.model,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "chat completion finished"
        );

        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(start_ts: f64, duration: f64, text: &str) -> TranscriptItem {
        TranscriptItem {
            start_ts,
            duration,
            text: text.to_string(),
        }
    }

    fn config_with_window(minutes: u64) -> YoutubeConfig {
        YoutubeConfig {
            summary_time_window_minutes: minutes,
            ..YoutubeConfig::default()
        }
    }

    #[test]
    fn test_windows_group_by_start_time() {
        let transcript = Transcript {
            items: vec![
                item(0.0, 5.0, "one"),
                item(30.0, 5.0, "two"),
                item(65.0, 5.0, "three"),
                item(130.0, 10.0, "four"),
            ],
            language: "en".into(),
        };

        // 1-minute windows and no model: summaries are concatenations.
        let summary = summarize(&transcript, &config_with_window(1)).unwrap();

        assert_eq!(summary.items.len(), 3);
        assert_eq!(summary.items[0].text, "one two");
        assert!((summary.items[0].start_ts - 0.0).abs() < f64::EPSILON);
        assert!((summary.items[0].duration - 35.0).abs() < f64::EPSILON);
        assert_eq!(summary.items[1].text, "three");
        assert_eq!(summary.items[2].text, "four");
        assert!((summary.items[2].duration - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_transcript_summarizes_to_nothing() {
        let transcript = Transcript {
            items: vec![],
            language: "en".into(),
        };
        let summary = summarize(&transcript, &config_with_window(15)).unwrap();
        assert!(summary.items.is_empty());
    }
}
