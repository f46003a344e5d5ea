use serde_json::Value;

use crate::{
    client::{ApiRequest, ListResponse, PAGE_SIZE},
    NotionClient, NotionSyncError, Response, Transport,
};

/// True when every whitespace-separated token of `name` appears in the
/// user's name, ignoring case.
fn matches_name(user: &Value, name: &str) -> bool {
    let Some(user_name) = user.get("name").and_then(Value::as_str) else {
        return false;
    };
    let user_name = user_name.to_lowercase();

    name.split_whitespace()
        .all(|token| user_name.contains(&token.to_lowercase()))
}

impl<T: Transport> NotionClient<T> {
    /// First page of workspace users.
    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Response<Vec<Value>> {
        let request = ApiRequest::get("users").query("page_size", PAGE_SIZE);
        let response: ListResponse =
            self.request_as("list users", request).await?;

        Ok(response.results)
    }

    pub async fn find_user(&self, name: &str) -> Response<Value> {
        let users = self.list_users().await?;

        users
            .into_iter()
            .find(|user| matches_name(user, name))
            .ok_or_else(|| NotionSyncError::NotFound {
                message: format!("user named {}", name),
            })
    }
}
