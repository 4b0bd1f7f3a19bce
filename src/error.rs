use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("http: {0}")]
    Http(#[from] http::Error),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("manifest line {line}: {reason}")]
    Manifest { line: usize, reason: &'static str },

    #[error("manifest json: {0}")]
    ManifestJson(#[from] serde_json::Error),

    #[error("failed to parse address")]
    FailedToParseAddr,
}
