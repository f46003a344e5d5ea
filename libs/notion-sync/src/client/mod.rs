use std::future::Future;

use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{response::IntoResponse, Config, NotionSyncError, Response};

#[cfg(test)]
pub(crate) mod fake;
mod retry;

pub use retry::RetryPolicy;

/// Largest page the list and query endpoints hand out.
pub const PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: vec![],
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: vec![],
            body: Some(body),
        }
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            path: path.into(),
            query: vec![],
            body: Some(body),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub text: String,
}

/// Paginated envelope shared by the list and query endpoints.
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// Issues a single request and hands back the raw status and body. Status
/// handling and retries live in [`NotionClient`].
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Response<ApiResponse>> + Send;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(token: &str, base_url: &str, version: &str) -> Response<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(version)
                .into_response("invalid Notion-Version header")?,
        );
        headers.insert(
            "Authorization",
            HeaderValue::from_str(format!("Bearer {}", token).as_str())
                .into_response("invalid Authorization header")?,
        );

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .into_response("failed to build http client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Response<ApiResponse> {
        let mut builder = self
            .client
            .request(
                request.method,
                format!("{}/{}", self.base_url, request.path),
            )
            .query(&request.query);

        if let Some(body) = &request.body {
            let body = serde_json::to_string(body)
                .into_response("failed to serialize body")?;
            builder = builder
                .header(CONTENT_TYPE, "application/json; charset=UTF-8")
                .body(body);
        }

        let response = builder.send().await.into_response("failed to send")?;
        let status = response.status();
        let text = response.text().await.into_response("failed to get text")?;

        Ok(ApiResponse { status, text })
    }
}

/// Maps a response onto the error taxonomy. Anything but 200 is an error.
pub fn check_response(response: ApiResponse) -> Response<String> {
    let ApiResponse {
        status: status_code,
        text: message,
    } = response;

    match status_code.as_u16() {
        200 => Ok(message),
        429 => Err(NotionSyncError::RateLimited {
            status_code,
            message,
        }),
        400 => Err(NotionSyncError::BadPayload {
            status_code,
            message,
        }),
        401 | 403 => Err(NotionSyncError::Unauthorized {
            status_code,
            message,
        }),
        500.. => Err(NotionSyncError::ServerSide {
            status_code,
            message,
        }),
        _ => Err(NotionSyncError::BadRequest {
            status_code,
            message,
        }),
    }
}

#[derive(Clone, Debug)]
pub struct NotionClient<T = HttpTransport> {
    transport: T,
    retry: RetryPolicy,
}

impl NotionClient<HttpTransport> {
    pub fn from_config(token: &str, config: &Config) -> Response<Self> {
        let transport =
            HttpTransport::new(token, &config.base_url, &config.version)?;

        Ok(Self::new(transport, config.retry.clone()))
    }
}

impl<T: Transport> NotionClient<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` under the retry policy and parses the body as JSON.
    pub async fn request(
        &self,
        task: &str,
        request: ApiRequest,
    ) -> Response<Value> {
        let text = self
            .retry
            .run(task, move || {
                let request = request.clone();
                async move {
                    let response = self.transport.send(request).await?;
                    check_response(response)
                }
            })
            .await?;

        serde_json::from_str(&text)
            .into_response(&format!("failed to parse {} response", task))
    }

    pub async fn request_as<R: DeserializeOwned>(
        &self,
        task: &str,
        request: ApiRequest,
    ) -> Response<R> {
        let value = self.request(task, request).await?;

        serde_json::from_value(value)
            .into_response(&format!("failed to decode {} response", task))
    }
}
