use async_recursion::async_recursion;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    client::{ApiRequest, ListResponse, PAGE_SIZE},
    Block, BlockType, NotionClient, NotionSyncError, Response, Transport,
};

impl<T: Transport> NotionClient<T> {
    /// One page of a parent's children, as the API returns it.
    #[tracing::instrument(skip(self))]
    pub async fn list_block_children(
        &self,
        parent_id: &str,
        cursor: Option<&str>,
    ) -> Response<ListResponse> {
        let mut request =
            ApiRequest::get(format!("blocks/{}/children", parent_id))
                .query("page_size", PAGE_SIZE);
        if let Some(cursor) = cursor {
            request = request.query("start_cursor", cursor);
        }

        self.request_as("list block children", request).await
    }

    /// Direct children of `parent_id`, first page only.
    pub async fn fetch_children(&self, parent_id: &str) -> Response<Vec<Block>> {
        let response = self.list_block_children(parent_id, None).await?;

        response.results.iter().map(Block::decode).collect()
    }

    /// Children of `parent_id` with every descendant attached, depth first and
    /// in the order the API returns them.
    #[async_recursion]
    pub async fn fetch_full_tree(&self, parent_id: &str) -> Response<Vec<Block>> {
        let mut children = self.fetch_children(parent_id).await?;

        for child in children.iter_mut().filter(|c| c.has_children) {
            debug!(task = "expand block", parent_id, block_id = %child.id);
            let descendants = self.fetch_full_tree(&child.id).await?;
            child.attach_children(descendants);
        }

        Ok(children)
    }

    #[tracing::instrument(skip_all, fields(block_id = %block.id))]
    pub async fn update_block(&self, block: &Block) -> Response<Value> {
        let request = ApiRequest::patch(
            format!("blocks/{}", block.id),
            block.to_wire_payload(),
        );

        self.request("update block", request).await
    }

    #[tracing::instrument(skip(self, children), fields(count = children.len()))]
    pub async fn append_children(
        &self,
        parent_id: &str,
        children: &[Block],
    ) -> Response<ListResponse> {
        let children = children
            .iter()
            .map(Block::to_wire_payload)
            .collect::<Vec<_>>();
        let request = ApiRequest::patch(
            format!("blocks/{}/children", parent_id),
            json!({ "children": children }),
        );

        self.request_as("append block children", request).await
    }

    /// Links the first bulleted-list text run whose plain text is exactly
    /// `text_to_match` to `url` and writes that block back. Mentions and
    /// equations cannot carry a link and are never matched.
    ///
    /// With `replace_only_matched_text` the other runs of the block are kept;
    /// otherwise the block is left with the linked run alone.
    pub async fn set_list_item_link(
        &self,
        page_id: &str,
        text_to_match: &str,
        url: &str,
        replace_only_matched_text: bool,
    ) -> Response<Block> {
        let children = self.fetch_children(page_id).await?;

        let list_items = children
            .into_iter()
            .filter(|b| b.kind() == &BlockType::BulletedListItem);

        for mut block in list_items {
            let Some(key) = block.text_key() else {
                continue;
            };
            let mut runs = block.text_runs().to_vec();
            let Some(position) = runs.iter().position(|run| {
                is_text_run(run)
                    && run.get("plain_text").and_then(Value::as_str)
                        == Some(text_to_match)
            }) else {
                continue;
            };

            attach_link(&mut runs[position], url);
            if !replace_only_matched_text {
                runs = vec![runs.swap_remove(position)];
            }
            block.content.insert(key.to_string(), Value::Array(runs));

            self.update_block(&block).await?;
            info!(task = "set list item link", block_id = %block.id, url);

            return Ok(block);
        }

        Err(NotionSyncError::NotFound {
            message: format!("{} in bullet list", text_to_match),
        })
    }

    /// Plain text of each non-empty paragraph directly under `page_id`.
    pub async fn page_paragraphs(&self, page_id: &str) -> Response<Vec<String>> {
        let children = self.fetch_children(page_id).await?;

        Ok(children
            .iter()
            .filter(|b| b.kind() == &BlockType::Paragraph)
            .map(Block::plain_text)
            .filter(|text| !text.is_empty())
            .collect())
    }
}

fn is_text_run(run: &Value) -> bool {
    run.get("text").is_some_and(Value::is_object)
        && run.get("type").map_or(true, |kind| kind == "text")
}

fn attach_link(run: &mut Value, url: &str) {
    if let Some(text) = run.get_mut("text").and_then(Value::as_object_mut) {
        text.insert("link".to_string(), json!({ "url": url }));
    }
}
