use thiserror::Error;

use crate::backend::BackendMode;

/// Errors raised by the HTTP clients and by backend configuration changes
#[derive(Debug, Error)]
pub enum ChatError {
    /// The request never produced a response (connection refused, DNS, reset...)
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The peer answered with a non-success status
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body was not the JSON shape we expected
    #[error("unexpected response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("the server address can only be changed in local mode")]
    NotLocalMode,

    #[error("server address cannot be empty")]
    EmptyServerAddress,

    #[error("model '{model}' is not offered in {mode} mode")]
    UnknownModel { model: String, mode: BackendMode },
}

impl ChatError {
    /// Splits reqwest failures into transport and decode errors
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err)
        } else {
            ChatError::Transport(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
