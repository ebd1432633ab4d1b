#![allow(dead_code)]

use chain_voice_assistant::chat::{ChatClient, ChatCompletion, ChatMessage};
use chain_voice_assistant::config::Config;
use chain_voice_assistant::tools::{Tool, ToolContext, ToolDefinition, ToolExecutor, ToolRegistry};
use chain_voice_assistant::{Error, Result};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const WALLET: &str = "0xC039654Bf76d6aF77A851c26167FBf07405C59BA";

/// Replays canned chat responses and records every request it receives.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<ChatCompletion>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    tool_counts: Mutex<Vec<usize>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<ChatCompletion>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        })
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tool_counts(&self) -> Vec<usize> {
        self.tool_counts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatCompletion> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.tool_counts.lock().unwrap().push(tools.len());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("chat called more times than scripted")
    }
}

pub fn text_reply(content: &str) -> ChatCompletion {
    serde_json::from_value(json!({
        "id": "chatcmpl-text",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": content}
        }]
    }))
    .unwrap()
}

pub fn tool_call_reply(calls: &[(&str, &str, Value)]) -> ChatCompletion {
    let tool_calls: Vec<Value> = calls
        .iter()
        .map(|(id, name, args)| {
            json!({
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": args.to_string()}
            })
        })
        .collect();

    serde_json::from_value(json!({
        "id": "chatcmpl-tools",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {"role": "assistant", "content": null, "tool_calls": tool_calls}
        }]
    }))
    .unwrap()
}

/// Returns `output` after `delay`.
pub struct SlowTool {
    pub name: &'static str,
    pub delay: Duration,
    pub output: Value,
}

#[async_trait::async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "test tool"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<Value> {
        tokio::time::sleep(self.delay).await;
        Ok(self.output.clone())
    }
}

/// Always fails the way an unreachable explorer does.
pub struct BrokenTool {
    pub name: &'static str,
}

#[async_trait::async_trait]
impl Tool for BrokenTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "always fails"
    }

    fn schema(&self) -> Value {
        json!({"type": "object", "properties": {}, "required": []})
    }

    async fn call(&self, _ctx: &ToolContext, _args: Value) -> Result<Value> {
        Err(Error::upstream("explorer", Some(503), "service unavailable"))
    }
}

pub fn config_with_explorer(explorer_url: &str) -> Config {
    Config {
        explorer_api_url: explorer_url.to_string(),
        token_icon_base_url: "https://icons.test/42161".to_string(),
        ..Config::default()
    }
}

pub fn executor(registry: ToolRegistry, config: &Config) -> Arc<ToolExecutor> {
    let context = ToolContext::from_config(config).unwrap();
    Arc::new(ToolExecutor::new(registry, context))
}
