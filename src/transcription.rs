//! Speech-to-text over an OpenAI-compatible `/audio/transcriptions` endpoint.

use crate::config::TranscriptionConfig;
use crate::error::{Error, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Anything shorter cannot hold a usable recording.
pub const MIN_AUDIO_BYTES: usize = 1000;

/// The upstream service gives no score; this is a fixed placeholder, not a measurement.
pub const DEFAULT_CONFIDENCE: f32 = 0.95;

/// `(mime type, file name)` guesses, tried in order until one is accepted.
pub const CANDIDATE_FORMATS: &[(&str, &str)] = &[
    ("audio/mp4", "audio.m4a"),
    ("audio/mpeg", "audio.mp3"),
    ("audio/wav", "audio.wav"),
    ("audio/m4a", "audio.m4a"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Mp4,
    Mp3,
    Wav,
    Ogg,
    Flac,
}

impl AudioContainer {
    /// Classifies by magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 {
            return None;
        }
        if &bytes[4..8] == b"ftyp" {
            return Some(AudioContainer::Mp4);
        }
        match &bytes[..4] {
            [0xff, 0xfb, _, _] | [b'I', b'D', b'3', _] => Some(AudioContainer::Mp3),
            b"RIFF" => Some(AudioContainer::Wav),
            b"OggS" => Some(AudioContainer::Ogg),
            b"fLaC" => Some(AudioContainer::Flac),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcription {
    pub text: String,
    pub confidence: f32,
}

#[derive(Deserialize)]
struct TranscriptionBody {
    #[serde(default)]
    text: String,
}

pub struct Transcriber {
    http: Client,
    config: TranscriptionConfig,
}

impl Transcriber {
    pub fn new(config: &TranscriptionConfig) -> Self {
        Self {
            http: Client::new(),
            config: config.clone(),
        }
    }

    pub async fn transcribe(&self, audio: &[u8], declared_format: &str) -> Result<Transcription> {
        if audio.is_empty() {
            return Err(Error::InvalidAudio("audio data is empty".into()));
        }
        if audio.len() < MIN_AUDIO_BYTES {
            return Err(Error::InvalidAudio(format!(
                "audio data is too small ({} bytes), minimum expected is {} bytes",
                audio.len(),
                MIN_AUDIO_BYTES
            )));
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential("TRANSCRIPTION_API_KEY"))?;

        match AudioContainer::detect(audio) {
            Some(container) => debug!(
                "Audio looks like {:?} (declared {}), {} bytes",
                container,
                declared_format,
                audio.len()
            ),
            None => warn!(
                "Audio has no recognised header (declared {}), first bytes: {}",
                declared_format,
                hex::encode(&audio[..audio.len().min(32)])
            ),
        }

        let mut last_error = String::from("no candidate format attempted");
        for (mime, file_name) in CANDIDATE_FORMATS {
            debug!("Trying transcription as {} ({})", mime, file_name);

            let part = Part::bytes(audio.to_vec())
                .file_name(*file_name)
                .mime_str(mime)
                .map_err(|e| Error::InvalidAudio(format!("invalid mime {}: {}", mime, e)))?;
            let form = Form::new()
                .part("file", part)
                .text("model", self.config.model.clone())
                .text("response_format", "json");

            let response = match self
                .http
                .post(&self.config.api_url)
                .bearer_auth(api_key)
                .multipart(form)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("Transcription as {} failed: {}", mime, e);
                    last_error = e.to_string();
                    continue;
                }
            };

            let status = response.status();
            let body = match accepted_body(status, response.text().await) {
                Ok(body) => body,
                Err(rejection) => {
                    warn!("Transcription as {} rejected: {}", mime, rejection);
                    last_error = rejection;
                    continue;
                }
            };

            let parsed: TranscriptionBody =
                serde_json::from_str(&body).map_err(|e| Error::malformed("transcription", e))?;
            info!("Transcribed {} bytes as {}", audio.len(), mime);

            return Ok(Transcription {
                text: parsed.text,
                confidence: DEFAULT_CONFIDENCE,
            });
        }

        Err(Error::TranscriptionUpstream(last_error))
    }
}

/// Body of an accepted attempt, or the reason to move on to the next format.
fn accepted_body<E: std::fmt::Display>(
    status: StatusCode,
    body: std::result::Result<String, E>,
) -> std::result::Result<String, String> {
    match body {
        Ok(body) if status.is_success() => Ok(body),
        Ok(body) => Err(format!("{} - {}", status.as_u16(), body)),
        Err(e) => Err(format!("{} - failed to read response body: {}", status.as_u16(), e)),
    }
}
