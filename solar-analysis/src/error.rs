use thiserror::Error;

/// Errors produced by the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Missing or unusable startup configuration. Fatal: nothing is served
    /// without the upstream credential.
    #[error("configuration error: {0}")]
    Config(String),

    /// The uploaded bytes are not a decodable image. There is no fallback;
    /// the whole request fails.
    #[error("failed to decode uploaded image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// Transport, authentication, or model failure on the upstream call.
    #[error("analysis request failed: {0}")]
    Upstream(String),

    /// The model reply held no parseable JSON object. Carries the complete
    /// reply text so it can be surfaced for diagnosis.
    #[error("could not parse model reply as JSON: {raw}")]
    Parse { raw: String },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("no image uploaded for session {0}")]
    MissingImage(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
