/// Result alias that carries the custom [`ArcadeError`] type.
pub type Result<T> = std::result::Result<T, ArcadeError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ArcadeError {
    /// Free-form failure raised by a subsystem that has no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// An argument was outside the range an operation accepts.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Score books and configuration files are JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Raised by the WAV output sink.
    #[error("{0}")]
    Wav(#[from] hound::Error),
    #[error("no default audio output device")]
    NoOutputDevice,
    #[error("failed to query output config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

impl ArcadeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for ArcadeError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ArcadeError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
