use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No image data provided")]
    MissingImageData,

    #[error("No image file provided")]
    MissingImageFile,

    #[error("Unsupported Content-Type")]
    UnsupportedContentType { content_type: String },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Downstream unavailable: {0}")]
    DownstreamUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Upstream stream error: {0}")]
    UpstreamStream(String),

    #[error("Upstream produced nothing for {seconds}s")]
    UpstreamTimeout { seconds: u64 },

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("OpenAI error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    pub fn downstream(msg: impl Into<String>) -> Self {
        Self::DownstreamUnavailable(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn upstream_stream(msg: impl Into<String>) -> Self {
        Self::UpstreamStream(msg.into())
    }

    pub fn relay(msg: impl Into<String>) -> Self {
        Self::Relay(msg.into())
    }

    /// True for errors caused by the caller's input rather than by a collaborator.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingImageData
                | Self::MissingImageFile
                | Self::UnsupportedContentType { .. }
                | Self::InvalidBody(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingImageData | Self::MissingImageFile | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
