/// Result alias that carries the custom [`VideoNoiseError`] type.
pub type Result<T> = std::result::Result<T, VideoNoiseError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum VideoNoiseError {
    /// Free-form message for failures that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The FFT backend rejected a buffer.
    #[error("fft failed: {0}")]
    Fft(#[from] realfft::FftError),
    /// A configuration document or patch could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// The attached source has a channel layout the graph cannot fold.
    #[error("unsupported source with {channels} channels (expected 1 or 2)")]
    UnsupportedSource { channels: u16 },
    /// The attached source runs at a different rate than the audio context.
    #[error("source sample rate {source_rate} Hz does not match context rate {context_rate} Hz")]
    SampleRateMismatch { source_rate: u32, context_rate: u32 },
    /// The audio context could not be created.
    #[error("audio facility unavailable: {0}")]
    AudioUnavailable(String),
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid surface: {0}")]
    InvalidSurface(String),
    /// Encoding a rendered frame failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl VideoNoiseError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for VideoNoiseError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for VideoNoiseError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
