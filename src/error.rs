use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Non-2xx answer or transport failure from an external endpoint.
    #[error("{service} request failed{}: {body}", format_status(.status))]
    UpstreamApi {
        service: &'static str,
        status: Option<u16>,
        body: String,
    },

    #[error("{service} returned an unreadable response: {message}")]
    MalformedResponse {
        service: &'static str,
        message: String,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("{tool} failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("Invalid audio: {0}")]
    InvalidAudio(String),

    #[error("Transcription failed for every candidate format. Last error: {0}")]
    TranscriptionUpstream(String),
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with status {}", code),
        None => String::new(),
    }
}

impl Error {
    pub fn upstream(service: &'static str, status: Option<u16>, body: impl Into<String>) -> Self {
        Error::UpstreamApi {
            service,
            status,
            body: body.into(),
        }
    }

    pub fn malformed(service: &'static str, message: impl ToString) -> Self {
        Error::MalformedResponse {
            service,
            message: message.to_string(),
        }
    }

    pub fn invalid_arguments(tool: &str, message: impl Into<String>) -> Self {
        Error::InvalidArguments {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    pub fn tool_execution(tool: &str, message: impl ToString) -> Self {
        Error::ToolExecution {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    /// Upstream HTTP status carried by this error, if any.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::UpstreamApi { status, .. } => *status,
            _ => None,
        }
    }
}
