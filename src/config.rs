use anyhow::Context;
use std::env;
use url::Url;

pub const DEFAULT_ASSISTANT_PROMPT: &str = "You are a helpful blockchain assistant for a smartwatch. \
Keep responses SHORT (under 2 sentences) and SIMPLE. No markdown formatting, no code blocks, no symbols. \
Just plain text.";

/// Wallet the assistant assumes when a question names no address.
pub const DEFAULT_ADDRESS: &str = "0xC039654Bf76d6aF77A851c26167FBf07405C59BA";

#[derive(Clone)]
pub struct ChatConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Clone)]
pub struct TranscriptionConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Clone)]
pub struct Config {
    pub listen_addr: String,
    pub chat: ChatConfig,
    pub transcription: TranscriptionConfig,
    pub explorer_api_url: String,
    pub token_icon_base_url: String,
    pub rpc_url: String,
    pub private_key: Option<String>,
    pub assistant_prompt: String,
    pub default_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            chat: ChatConfig {
                api_url: "https://api.anannas.ai/v1/chat/completions".into(),
                api_key: None,
                model: "gpt-4o".into(),
            },
            transcription: TranscriptionConfig {
                api_url: "https://api.groq.com/openai/v1/audio/transcriptions".into(),
                api_key: None,
                model: "whisper-large-v3-turbo".into(),
            },
            explorer_api_url: "https://arbitrum.blockscout.com/api".into(),
            token_icon_base_url: "https://static.cx.metamask.io/api/v1/tokenIcons/42161".into(),
            rpc_url: "https://arb1.arbitrum.io/rpc".into(),
            private_key: None,
            assistant_prompt: DEFAULT_ASSISTANT_PROMPT.into(),
            default_address: Some(DEFAULT_ADDRESS.into()),
        }
    }
}

impl Config {
    /// Credentials are optional here; their absence only fails the requests that need them.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let config = Self {
            listen_addr: var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            chat: ChatConfig {
                api_url: var("CHAT_API_URL").unwrap_or(defaults.chat.api_url),
                api_key: var("CHAT_API_KEY"),
                model: var("CHAT_MODEL").unwrap_or(defaults.chat.model),
            },
            transcription: TranscriptionConfig {
                api_url: var("TRANSCRIPTION_API_URL").unwrap_or(defaults.transcription.api_url),
                api_key: var("TRANSCRIPTION_API_KEY"),
                model: var("TRANSCRIPTION_MODEL").unwrap_or(defaults.transcription.model),
            },
            explorer_api_url: var("EXPLORER_API_URL").unwrap_or(defaults.explorer_api_url),
            token_icon_base_url: var("TOKEN_ICON_BASE_URL")
                .unwrap_or(defaults.token_icon_base_url),
            rpc_url: var("RPC_URL").unwrap_or(defaults.rpc_url),
            private_key: var("PRIVATE_KEY"),
            assistant_prompt: var("ASSISTANT_PROMPT").unwrap_or(defaults.assistant_prompt),
            default_address: var("DEFAULT_ADDRESS").or(defaults.default_address),
        };

        Url::parse(&config.chat.api_url).context("CHAT_API_URL must be a valid URL")?;
        Url::parse(&config.transcription.api_url)
            .context("TRANSCRIPTION_API_URL must be a valid URL")?;
        Url::parse(&config.explorer_api_url).context("EXPLORER_API_URL must be a valid URL")?;
        Url::parse(&config.rpc_url).context("RPC_URL must be a valid URL")?;

        Ok(config)
    }

    /// System turn for voice conversations: the assistant prompt plus the default wallet.
    pub fn system_prompt(&self) -> String {
        match &self.default_address {
            Some(address) => format!("{} Default address is {}", self.assistant_prompt, address),
            None => self.assistant_prompt.clone(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
