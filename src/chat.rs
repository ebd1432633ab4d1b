//! Chat-completion wire types and the client seam the orchestrator talks through.

use crate::config::ChatConfig;
use crate::error::{Error, Result};
use crate::tools::ToolDefinition;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};

const SERVICE: &str = "chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(default)]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it.
    #[serde(default)]
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

fn assistant_role() -> String {
    "assistant".to_string()
}

/// Tool entry in the `tools` request field.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTool<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: &'a ToolDefinition,
}

impl<'a> From<&'a ToolDefinition> for ChatTool<'a> {
    fn from(function: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ChatTool<'a>>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub message: AssistantMessage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default = "assistant_role")]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatCompletion {
    pub fn first_message(&self) -> Result<&AssistantMessage> {
        self.choices
            .first()
            .map(|c| &c.message)
            .ok_or_else(|| Error::malformed(SERVICE, "response contained no choices"))
    }
}

impl From<AssistantMessage> for ChatMessage {
    fn from(message: AssistantMessage) -> Self {
        ChatMessage::Assistant {
            content: message.content,
            tool_calls: message.tool_calls,
        }
    }
}

#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct HttpChatClient {
    http: Client,
    config: ChatConfig,
}

impl HttpChatClient {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            http: Client::new(),
            config: config.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential("CHAT_API_KEY"))?;

        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            tools: tools.iter().map(ChatTool::from).collect(),
            stream: false,
        };

        debug!(
            "Chat request to {} with {} message(s)",
            self.config.model,
            messages.len()
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            error!("Chat API error: {} {}", status, body);
            return Err(Error::upstream(SERVICE, Some(status.as_u16()), body));
        }

        serde_json::from_str(&body).map_err(|e| Error::malformed(SERVICE, e))
    }
}
