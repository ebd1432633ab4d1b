pub mod chat;
pub mod config;
pub mod error;
pub mod ethereum;
pub mod explorer;
pub mod orchestrator;
pub mod server;
pub mod tools;
pub mod transcription;
pub mod units;

pub use error::{Error, Result};
