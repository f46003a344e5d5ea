use crate::{NotionSyncError, Response};

pub(crate) trait IntoResponse<T> {
    fn into_response(self, message: &str) -> Response<T>;
}

impl<T> IntoResponse<T> for Result<T, std::io::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionSyncError::StdIoError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, toml::de::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionSyncError::TomlDeError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, reqwest::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionSyncError::ReqwestError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, reqwest::header::InvalidHeaderValue> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionSyncError::InvalidHeaderValue {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Result<T, serde_json::Error> {
    fn into_response(self, message: &str) -> Response<T> {
        self.map_err(|e| NotionSyncError::SerdeJsonError {
            source: e,
            message: message.to_string(),
        })
    }
}

impl<T> IntoResponse<T> for Option<T> {
    fn into_response(self, message: &str) -> Response<T> {
        self.ok_or_else(|| NotionSyncError::Option {
            message: message.to_string(),
        })
    }
}
