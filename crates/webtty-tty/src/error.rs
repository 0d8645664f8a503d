//! Error types for the terminal front-end

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use webtty_app::config::ConfigError;
use webtty_app::ProtocolError;

/// Errors that end the program
#[derive(Error, Debug)]
pub enum TtyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Bad message from the browser: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Timed out waiting for the text of {0}")]
    RawTextTimeout(String),

    #[error("Invalid screenshot data: {0}")]
    Screenshot(#[from] base64::DecodeError),
}

/// Result type for front-end operations
pub type Result<T> = std::result::Result<T, TtyError>;
