use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },
    #[error("retry ladder exhausted, last status: {last_status:?}")]
    RetryLimit { last_status: Option<StatusCode> },
    #[error("byte cap {cap} is below the configured floor {floor}")]
    PayloadFloor { cap: usize, floor: usize },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Config(String),
}
