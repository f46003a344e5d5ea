use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};
use serde_with::skip_serializing_none;
use tracing::{info, warn};

use crate::{
    client::{ApiRequest, ListResponse, PAGE_SIZE},
    models::missing,
    response::IntoResponse,
    Block, NotionClient, PageProperty, Response, Transport,
};

/// Title property keys, tried in order. Some exports prefix the column name
/// with a byte-order mark.
const TITLE_KEYS: [&str; 2] = ["\u{feff}Name", "Name"];

#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct QueryDatabaseRequest {
    pub page_size: Option<u32>,
    pub start_cursor: Option<String>,
    pub filter: Option<Value>,
}

/// One paragraph of one page, ready for embedding.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ParagraphRecord {
    pub page_id: String,
    pub url: String,
    pub text: String,
}

/// `title[0].text.content` of the page's title property.
pub fn page_title(record: &Value) -> Response<String> {
    let properties = record
        .get("properties")
        .ok_or_else(|| missing("page", "properties"))?;

    TITLE_KEYS
        .iter()
        .find_map(|key| {
            properties
                .get(key)?
                .get("title")?
                .get(0)?
                .get("text")?
                .get("content")?
                .as_str()
        })
        .map(str::to_string)
        .ok_or_else(|| missing("page", "properties.Name.title"))
}

impl<T: Transport> NotionClient<T> {
    #[tracing::instrument(skip(self))]
    pub async fn get_page(&self, page_id: &str) -> Response<Value> {
        self.request("get page", ApiRequest::get(format!("pages/{}", page_id)))
            .await
    }

    #[tracing::instrument(skip(self, properties), fields(count = properties.len()))]
    pub async fn update_page(
        &self,
        page_id: &str,
        properties: &[PageProperty],
    ) -> Response<Value> {
        let request = ApiRequest::patch(
            format!("pages/{}", page_id),
            json!({
                "properties": PageProperty::to_properties_payload(properties)
            }),
        );

        self.request("update page", request).await
    }

    /// Creates a page under `database_id` and returns its id and url.
    #[tracing::instrument(skip(self, properties, children))]
    pub async fn create_page_under_database(
        &self,
        database_id: &str,
        properties: &[PageProperty],
        children: &[Block],
    ) -> Response<(String, String)> {
        let children = children
            .iter()
            .map(Block::to_wire_payload)
            .collect::<Vec<_>>();
        let request = ApiRequest::post(
            "pages",
            json!({
                "parent": {"type": "database_id", "database_id": database_id},
                "properties": PageProperty::to_properties_payload(properties),
                "children": children,
            }),
        );

        let response = self.request("create page", request).await?;

        let id = response
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("created page", "id"))?;
        let url = response
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("created page", "url"))?;

        info!(task = "create page", database_id, page_id = id);

        Ok((id.to_string(), url.to_string()))
    }

    /// Properties and top-level blocks of `page_id`, e.g. to stamp out new
    /// pages from a template.
    pub async fn page_attributes(
        &self,
        page_id: &str,
    ) -> Response<(Vec<PageProperty>, Vec<Block>)> {
        let page = self.get_page(page_id).await?;
        let properties = page
            .get("properties")
            .ok_or_else(|| missing("page", "properties"))?;
        let properties = PageProperty::decode_all(properties)?;

        let children = self.fetch_children(page_id).await?;

        Ok((properties, children))
    }

    #[tracing::instrument(skip(self))]
    pub async fn query_database(
        &self,
        database_id: &str,
        request: &QueryDatabaseRequest,
    ) -> Response<ListResponse> {
        let body = serde_json::to_value(request)
            .into_response("failed to serialize query")?;

        self.request_as(
            "query database",
            ApiRequest::post(format!("databases/{}/query", database_id), body),
        )
        .await
    }

    /// First page of items whose title contains `query_term`.
    pub async fn query_database_by_title(
        &self,
        database_id: &str,
        query_term: &str,
    ) -> Response<Vec<Value>> {
        let request = QueryDatabaseRequest {
            page_size: Some(PAGE_SIZE),
            filter: Some(json!({
                "or": [{"property": "title", "text": {"contains": query_term}}]
            })),
            ..Default::default()
        };

        let response = self.query_database(database_id, &request).await?;

        Ok(response.results)
    }

    /// Every page of a database keyed by page id, in query order. Each record
    /// gets an extra `title` field holding its plain title.
    pub async fn fetch_all_pages(
        &self,
        database_id: &str,
    ) -> Response<IndexMap<String, Value>> {
        let mut pages = IndexMap::new();
        let mut next_cursor: Option<String> = None;

        loop {
            let request = QueryDatabaseRequest {
                page_size: Some(PAGE_SIZE),
                start_cursor: next_cursor.clone(),
                ..Default::default()
            };
            let response = self.query_database(database_id, &request).await?;

            for mut item in response.results {
                if item.get("object").and_then(Value::as_str) != Some("page") {
                    continue;
                }

                let title = page_title(&item)?;
                let id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| missing("page", "id"))?
                    .to_string();
                if let Some(object) = item.as_object_mut() {
                    object.insert("title".to_string(), Value::from(title));
                }
                pages.insert(id, item);
            }

            if !response.has_more {
                break;
            }
            let Some(cursor) = response.next_cursor else {
                warn!(
                    task = "fetch all pages",
                    database_id, "has_more without next_cursor, stopping"
                );
                break;
            };
            next_cursor = Some(cursor);
        }

        info!(task = "fetch all pages", database_id, count = pages.len());

        Ok(pages)
    }

    /// `(page_id, url, paragraph)` for every non-empty paragraph of every page
    /// in the database.
    pub async fn paragraph_records(
        &self,
        database_id: &str,
    ) -> Response<Vec<ParagraphRecord>> {
        let pages = self.fetch_all_pages(database_id).await?;

        let mut records = vec![];
        for (page_id, page) in pages {
            let url = page
                .get("url")
                .and_then(Value::as_str)
                .ok_or_else(|| missing("page", "url"))?
                .to_string();

            let paragraphs = self.page_paragraphs(&page_id).await?;
            records.extend(paragraphs.into_iter().map(|text| ParagraphRecord {
                page_id: page_id.clone(),
                url: url.clone(),
                text,
            }));
        }

        Ok(records)
    }
}
