//! In-memory [`Transport`] that replays canned responses per path and records
//! every request it receives.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};

use reqwest::StatusCode;
use serde_json::Value;

use super::{ApiRequest, ApiResponse, NotionClient, RetryPolicy, Transport};
use crate::{response::IntoResponse, Response};

#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<ApiResponse>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for `path`. Responses for the same path are served
    /// in the order they were queued.
    pub fn respond(self, path: &str, status: u16, body: Value) -> Self {
        let response = ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            text: body.to_string(),
        };
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn client(transport: Self) -> NotionClient<Self> {
        NotionClient::new(
            transport,
            RetryPolicy {
                attempts: 3,
                pause: Duration::ZERO,
            },
        )
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Response<ApiResponse> {
        let path = request.path.clone();
        self.requests.lock().unwrap().push(request);

        self.responses
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .into_response(&format!("no scripted response for {}", path))
    }
}
