use crate::chat::{ChatMessage, HttpChatClient};
use crate::config::Config;
use crate::error::Error;
use crate::orchestrator::Orchestrator;
use crate::tools::{ToolContext, ToolExecutor, ToolRegistry};
use crate::transcription::Transcriber;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub transcriber: Transcriber,
    pub assistant_prompt: String,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let context = ToolContext::from_config(config)?;
        let executor = Arc::new(ToolExecutor::new(ToolRegistry::standard(), context));
        let chat = Arc::new(HttpChatClient::new(&config.chat));

        Ok(Self {
            orchestrator: Orchestrator::new(chat, executor),
            transcriber: Transcriber::new(&config.transcription),
            assistant_prompt: config.system_prompt(),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/execute", post(execute))
        .route("/api/transcribe", post(transcribe))
        .route("/api/tools", get(list_tools))
        .route("/api/tools/call", post(call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config)?);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;

    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::UpstreamApi { status, .. } => status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        Error::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
        Error::UnknownTool(_) => StatusCode::NOT_FOUND,
        Error::InvalidArguments { .. } | Error::InvalidAudio(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "success": false, "error": message.into() }))).into_response()
}

#[derive(Deserialize)]
pub struct ExecuteRequest {
    pub messages: Vec<ChatMessage>,
}

async fn execute(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExecuteRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejected execute request: {}", e);
            return failure(StatusCode::BAD_REQUEST, "Missing or invalid messages array");
        }
    };

    match state.orchestrator.run(request.messages).await {
        Ok(outcome) => Json(json!({ "success": true, "data": outcome.completion })).into_response(),
        Err(e) => {
            error!("Execute failed: {}", e);
            failure(status_for(&e), e.to_string())
        }
    }
}

#[derive(Deserialize)]
pub struct TranscribeRequest {
    #[serde(default)]
    pub audio: String,
    #[serde(default)]
    pub format: String,
}

async fn transcribe(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranscribeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) if !request.audio.is_empty() && !request.format.is_empty() => request,
        _ => return failure(StatusCode::BAD_REQUEST, "Missing required fields: audio and format"),
    };

    let audio = match base64::engine::general_purpose::STANDARD.decode(request.audio.trim()) {
        Ok(audio) => audio,
        Err(e) => return failure(StatusCode::BAD_REQUEST, format!("Audio is not valid base64: {}", e)),
    };

    let transcription = match state.transcriber.transcribe(&audio, &request.format).await {
        Ok(transcription) => transcription,
        Err(e) => {
            error!("Transcription failed: {}", e);
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to transcribe audio: {}", e),
            );
        }
    };

    let conversation = vec![
        ChatMessage::system(state.assistant_prompt.clone()),
        ChatMessage::user(transcription.text.clone()),
    ];

    match state.orchestrator.run(conversation).await {
        Ok(outcome) => Json(json!({
            "success": true,
            "transcription": transcription,
            "generation": outcome.completion,
            "toolResults": outcome.tool_results,
            "toolCalls": outcome.tool_calls,
            "finalContent": outcome.final_content,
        }))
        .into_response(),
        Err(e) => {
            error!("Generation failed: {}", e);
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Generation failed: {}", e),
            )
        }
    }
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tools: Vec<Value> = state
        .orchestrator
        .executor()
        .definitions()
        .iter()
        .map(|d| json!({ "type": "function", "function": d }))
        .collect();
    Json(json!({ "tools": tools }))
}

#[derive(Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToolCallRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return failure(StatusCode::BAD_REQUEST, "Missing 'name' parameter");
    };
    let args = request.arguments.unwrap_or_else(|| json!({}));

    match state.orchestrator.executor().execute(&request.name, args).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(e) => failure(status_for(&e), format!("Tool execution failed: {}", e)),
    }
}
