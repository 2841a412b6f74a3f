//! Client-side error type.
//!
//! Every variant is terminal for the request that produced it; the client
//! never retries.

use motostream_core::codec::CodecError;
use reqwest::StatusCode;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connection failure, broken transfer or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The server answered with a non-2xx status.
    #[error("{url} responded with {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Status {
        url: String,
        status: StatusCode,
        message: Option<String>,
    },

    /// A streamed frame could not be decoded.
    #[error("Stream decode error: {0}")]
    Codec(#[from] CodecError),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Status code of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
