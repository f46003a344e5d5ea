use reqwest::StatusCode;

pub mod block;
pub mod client;
pub mod config;
pub mod models;
pub mod page;
mod response;
pub mod user;

pub use client::{HttpTransport, NotionClient, RetryPolicy, Transport};
pub use config::Config;
pub use models::{Block, BlockType, ChildNode, PageProperty, PropertyType};
pub use page::ParagraphRecord;

#[derive(Debug, thiserror::Error)]
pub enum NotionSyncError {
    #[error("notion api exceeded rate limit ({status_code}): {message}")]
    RateLimited {
        status_code: StatusCode,
        message: String,
    },

    #[error(
        "notion api determined bad payload, possibly exceeded size limit ({status_code}): {message}"
    )]
    BadPayload {
        status_code: StatusCode,
        message: String,
    },

    #[error("notion api sent unauthorized ({status_code}): {message}")]
    Unauthorized {
        status_code: StatusCode,
        message: String,
    },

    #[error("notion api server error ({status_code}): {message}")]
    ServerSide {
        status_code: StatusCode,
        message: String,
    },

    #[error("notion api returned error ({status_code}): {message}")]
    BadRequest {
        status_code: StatusCode,
        message: String,
    },

    #[error("failed to decode {kind}: missing `{field}`")]
    Decode { kind: &'static str, field: String },

    #[error("failed to decode {kind}: `{field}` is not {expected}")]
    Shape {
        kind: &'static str,
        field: String,
        expected: &'static str,
    },

    #[error("could not find {message}")]
    NotFound { message: String },

    #[error("in reqwest crate: {message}: {source}")]
    ReqwestError {
        source: reqwest::Error,
        message: String,
    },

    #[error("in reqwest crate: {message}: {source}")]
    InvalidHeaderValue {
        source: reqwest::header::InvalidHeaderValue,
        message: String,
    },

    #[error("in serde_json crate: {message}: {source}")]
    SerdeJsonError {
        source: serde_json::Error,
        message: String,
    },

    #[error("in std io: {message}: {source}")]
    StdIoError {
        source: std::io::Error,
        message: String,
    },

    #[error("in toml crate: {message}: {source}")]
    TomlDeError {
        source: toml::de::Error,
        message: String,
    },

    #[error("{message}")]
    Option { message: String },
}

impl NotionSyncError {
    /// Errors raised from a non-200 status. These are the ones worth retrying.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            NotionSyncError::RateLimited { .. }
                | NotionSyncError::BadPayload { .. }
                | NotionSyncError::Unauthorized { .. }
                | NotionSyncError::ServerSide { .. }
                | NotionSyncError::BadRequest { .. }
        )
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            NotionSyncError::RateLimited { status_code, .. }
            | NotionSyncError::BadPayload { status_code, .. }
            | NotionSyncError::Unauthorized { status_code, .. }
            | NotionSyncError::ServerSide { status_code, .. }
            | NotionSyncError::BadRequest { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }
}

pub type Response<T> = Result<T, NotionSyncError>;
