use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("{0}")]
    RequestShape(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Connection closed by peer")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
