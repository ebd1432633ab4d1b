//! Two-round tool-calling protocol against a chat-completion endpoint.
//!
//! The first round sends the conversation with the full tool schema. If the
//! model asks for tools, every call is executed concurrently, each result is
//! appended as a `tool` turn, and a second round produces the final answer.
//! There is never a third round.

use crate::chat::{ChatClient, ChatCompletion, ChatMessage, ToolCall};
use crate::error::{Error, Result};
use crate::tools::ToolExecutor;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one tool call, as fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallResult {
    pub tool_call_id: String,
    pub role: &'static str,
    pub name: String,
    /// JSON-encoded success payload, or `{"error": "..."}`.
    pub content: String,
}

impl From<ToolCallResult> for ChatMessage {
    fn from(result: ToolCallResult) -> Self {
        ChatMessage::Tool {
            tool_call_id: result.tool_call_id,
            name: result.name,
            content: result.content,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Orchestration {
    /// The response whose first choice is the final answer.
    pub completion: ChatCompletion,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolCallResult>,
    pub final_content: String,
}

#[derive(Clone)]
pub struct Orchestrator {
    chat: Arc<dyn ChatClient>,
    executor: Arc<ToolExecutor>,
}

impl Orchestrator {
    pub fn new(chat: Arc<dyn ChatClient>, executor: Arc<ToolExecutor>) -> Self {
        Self { chat, executor }
    }

    pub fn executor(&self) -> &Arc<ToolExecutor> {
        &self.executor
    }

    /// Runs the conversation to a final answer. Only chat-endpoint failures
    /// are fatal; tool failures become `{"error": ...}` result turns.
    pub async fn run(&self, conversation: Vec<ChatMessage>) -> Result<Orchestration> {
        let tools = self.executor.definitions();
        let mut messages = conversation;

        let first = self.chat.complete(&messages, tools).await?;
        let reply = first.first_message()?.clone();

        if reply.tool_calls.is_empty() {
            info!("Chat answered without tools");
            return Ok(Orchestration {
                final_content: reply.content.unwrap_or_default(),
                completion: first,
                tool_calls: Vec::new(),
                tool_results: Vec::new(),
            });
        }

        let tool_calls = reply.tool_calls.clone();
        info!(
            "Executing {} tool call(s): {:?}",
            tool_calls.len(),
            tool_calls.iter().map(|c| c.function.name.as_str()).collect::<Vec<_>>()
        );

        let tool_results = self.execute_all(&tool_calls).await;

        messages.push(ChatMessage::from(reply));
        messages.extend(tool_results.iter().cloned().map(ChatMessage::from));

        info!("Requesting final answer with {} message(s)", messages.len());
        let second = self.chat.complete(&messages, tools).await?;
        let final_message = second.first_message()?;

        if !final_message.tool_calls.is_empty() {
            warn!(
                "Ignoring {} tool call(s) requested after the final round",
                final_message.tool_calls.len()
            );
        }

        Ok(Orchestration {
            final_content: final_message.content.clone().unwrap_or_default(),
            completion: second,
            tool_calls,
            tool_results,
        })
    }

    /// Runs every call concurrently; one result per call, matched by id.
    async fn execute_all(&self, calls: &[ToolCall]) -> Vec<ToolCallResult> {
        join_all(calls.iter().map(|call| self.execute_one(call))).await
    }

    async fn execute_one(&self, call: &ToolCall) -> ToolCallResult {
        let name = &call.function.name;
        let outcome = match parse_arguments(name, &call.function.arguments) {
            Ok(args) => self.executor.execute(name, args).await,
            Err(e) => Err(e),
        };

        let content = match outcome {
            Ok(value) => {
                info!("Tool {} ({}) succeeded", name, call.id);
                encode(&value)
            }
            Err(e) => {
                error!("Tool {} ({}) failed: {}", name, call.id, e);
                encode(&json!({ "error": e.to_string() }))
            }
        };

        ToolCallResult {
            tool_call_id: call.id.clone(),
            role: "tool",
            name: name.clone(),
            content,
        }
    }
}

fn parse_arguments(tool: &str, raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|e| Error::invalid_arguments(tool, e.to_string()))
}

fn encode(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}
