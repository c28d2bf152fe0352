use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Event stream error: {0}")]
    Stream(String),

    #[error("Stream parse error: {0}")]
    Parse(String),

    #[error("Subtitle parse error: {0}")]
    SubtitleParse(String),

    #[error("Translation job error: {0}")]
    Job(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Translation produced no subtitle content")]
    EmptyTranslation,
}

pub type Result<T> = std::result::Result<T, SubtransError>;
