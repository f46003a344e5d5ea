use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::warn;

use crate::Response;

/// Fixed-count retry with a fixed pause, applied to every call that reaches
/// the Notion API. Only errors raised from a non-200 status are retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            pause: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub async fn run<F, Fut, R>(&self, task: &str, mut operation: F) -> Response<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Response<R>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Err(e) if e.is_bad_request() && attempt < attempts => {
                    warn!(
                        task,
                        attempt,
                        status = ?e.status_code(),
                        error = e.to_string(),
                        "received bad response, retrying in {}s",
                        self.pause.as_secs()
                    );
                    sleep(self.pause).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_bad_request() {
                        warn!(
                            task,
                            attempt,
                            status = ?e.status_code(),
                            error = e.to_string(),
                            "received bad response, giving up"
                        );
                    }
                    return Err(e);
                }
                result => return result,
            }
        }
    }
}
