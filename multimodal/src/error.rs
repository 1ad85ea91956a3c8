use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to fetch image from '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("image fetch from '{url}' returned status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to read image file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type MediaResult<T> = Result<T, MediaError>;
