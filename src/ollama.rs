use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BotError, Result};
use crate::types::{MessageRole, Turn};

const CHAT_ENDPOINT: &str = "api/chat";

/// Text generation backend used by the chatbot.
pub trait ChatModel: Send + Sync {
    /// Generate the next assistant turn for the ordered history.
    ///
    /// `Ok(None)` means the model answered without any content.
    fn chat(&self, turns: &[Turn]) -> impl Future<Output = Result<Option<Turn>>> + Send;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: Url,
    model: String,
    system_prompt: Option<String>,
}

impl OllamaClient {
    /// Build a client for the Ollama server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str, model: String, system_prompt: Option<String>) -> Result<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: base.join(CHAT_ENDPOINT)?,
            model,
            system_prompt,
        })
    }

    fn build_request<'a>(&'a self, turns: &'a [Turn]) -> ChatRequest<'a> {
        let system = self.system_prompt.as_deref().map(|prompt| ChatMessage {
            role: MessageRole::System,
            content: prompt,
        });
        let messages = system
            .into_iter()
            .chain(turns.iter().map(|turn| ChatMessage {
                role: turn.role,
                content: &turn.text,
            }))
            .collect();

        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        }
    }
}

/// Map a decoded response body to an assistant turn, if it carries any text.
fn into_turn(response: ChatResponse) -> Option<Turn> {
    let message = response.message?;
    let text = message.content.filter(|content| !content.trim().is_empty())?;
    Some(Turn::assistant(text))
}

impl ChatModel for OllamaClient {
    async fn chat(&self, turns: &[Turn]) -> Result<Option<Turn>> {
        debug!(
            "Sending request to Ollama model {} with {} messages",
            self.model,
            turns.len()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&self.build_request(turns))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::OllamaApi { status, message });
        }

        let body = response.text().await?;
        let decoded: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| BotError::OllamaResponse(format!("undecodable body: {e}")))?;

        debug!("Received response from Ollama API");
        Ok(into_turn(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(system_prompt: Option<&str>) -> Result<OllamaClient> {
        OllamaClient::new(
            "http://localhost:11434",
            "phi3".to_string(),
            system_prompt.map(str::to_string),
        )
    }

    #[test]
    fn endpoint_joins_chat_path() -> Result<()> {
        assert_eq!(
            client(None)?.endpoint.as_str(),
            "http://localhost:11434/api/chat"
        );
        let prefixed = OllamaClient::new("http://gpu-box:8080/ollama", "phi3".to_string(), None)?;
        assert_eq!(prefixed.endpoint.as_str(), "http://gpu-box:8080/ollama/api/chat");
        Ok(())
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            OllamaClient::new("not a url", "phi3".to_string(), None),
            Err(BotError::Url(_))
        ));
    }

    #[test]
    fn request_carries_model_and_history() -> Result<()> {
        let client = client(None)?;
        let turns = [Turn::user("hello"), Turn::assistant("hi")];
        let json = serde_json::to_value(client.build_request(&turns))
            .map_err(|e| BotError::OllamaResponse(e.to_string()))?;

        assert_eq!(
            json,
            serde_json::json!({
                "model": "phi3",
                "messages": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi"},
                ],
                "stream": false,
            })
        );
        Ok(())
    }

    #[test]
    fn system_prompt_leads_the_request() -> Result<()> {
        let client = client(Some("Be brief."))?;
        let turns = [Turn::user("hello")];
        let request = client.build_request(&turns);

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[0].content, "Be brief.");
        Ok(())
    }

    #[test]
    fn response_with_content_becomes_assistant_turn() -> serde_json::Result<()> {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model":"phi3","message":{"role":"assistant","content":"hi"},"done":true}"#,
        )?;
        assert_eq!(into_turn(response), Some(Turn::assistant("hi")));
        Ok(())
    }

    #[test]
    fn missing_or_empty_content_yields_nothing() -> serde_json::Result<()> {
        let absent: ChatResponse = serde_json::from_str(r#"{"done":true}"#)?;
        assert_eq!(into_turn(absent), None);

        let empty: ChatResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"  "}}"#)?;
        assert_eq!(into_turn(empty), None);
        Ok(())
    }
}
