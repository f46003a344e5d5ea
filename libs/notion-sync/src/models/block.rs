use serde_json::{Map, Value};
use strum::EnumString;

use super::{missing, wrong_shape};
use crate::Response;

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BlockType {
    Paragraph,
    #[strum(serialize = "heading_1")]
    Heading1,
    #[strum(serialize = "heading_2")]
    Heading2,
    #[strum(serialize = "heading_3")]
    Heading3,
    BulletedListItem,
    ChildDatabase,
    Divider,
    ColumnList,
    Table,
    TableRow,
    #[strum(default)]
    Other(String),
}

impl BlockType {
    pub fn classify(type_name: &str) -> Self {
        type_name
            .parse()
            .unwrap_or_else(|_| BlockType::Other(type_name.to_string()))
    }
}

/// An entry of a block's `children` list: either a block we hold in typed
/// form, or a record that is already in wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildNode {
    Block(Block),
    Wire(Value),
}

impl ChildNode {
    pub fn to_wire_payload(&self) -> Value {
        match self {
            ChildNode::Block(block) => block.to_wire_payload(),
            ChildNode::Wire(record) => record.clone(),
        }
    }
}

impl From<Block> for ChildNode {
    fn from(block: Block) -> Self {
        ChildNode::Block(block)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub object: String,
    pub id: String,
    kind: BlockType,
    type_name: String,
    pub content: Map<String, Value>,
    pub has_children: bool,
    // None until the tree is expanded or children are set by hand. Once set
    // it replaces whatever `children` the payload carried.
    children: Option<Vec<ChildNode>>,
}

impl Block {
    /// Shallow decode: nested children are left as they are in `content`.
    pub fn decode(record: &Value) -> Response<Self> {
        let object = string_field(record, "object")?;
        let id = string_field(record, "id")?;
        let type_name = string_field(record, "type")?;

        let content = record
            .get(&type_name)
            .ok_or_else(|| missing("block", &type_name))?
            .as_object()
            .ok_or_else(|| wrong_shape("block", &type_name, "an object"))?
            .clone();

        let has_children = record
            .get("has_children")
            .and_then(Value::as_bool)
            .ok_or_else(|| missing("block", "has_children"))?;

        Ok(Self {
            object,
            id,
            kind: BlockType::classify(&type_name),
            type_name,
            content,
            has_children,
            children: None,
        })
    }

    pub fn kind(&self) -> &BlockType {
        &self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn children(&self) -> Option<&[ChildNode]> {
        self.children.as_deref()
    }

    pub fn set_children(&mut self, children: Vec<ChildNode>) {
        self.children = Some(children);
    }

    pub fn attach_children(&mut self, children: Vec<Block>) {
        self.set_children(children.into_iter().map(ChildNode::from).collect());
    }

    /// `{object, type, <type>: content}`. Children attached to this block are
    /// not folded in; see [`Block::to_wire_payload`].
    pub fn to_record(&self) -> Value {
        self.wrap(self.content.clone())
    }

    /// The record to send to the update, append and create endpoints.
    ///
    /// Attached children are normalized recursively and written under the
    /// `children` key. Anything else in `content`, `cells` included, is already
    /// in wire shape and passes through untouched.
    pub fn to_wire_payload(&self) -> Value {
        let mut content = self.content.clone();
        if let Some(children) = &self.children {
            let children = children
                .iter()
                .map(ChildNode::to_wire_payload)
                .collect::<Vec<_>>();
            content.insert("children".to_string(), Value::Array(children));
        }

        self.wrap(content)
    }

    fn wrap(&self, content: Map<String, Value>) -> Value {
        let mut record = Map::new();
        record.insert("object".to_string(), Value::from(self.object.clone()));
        record.insert("type".to_string(), Value::from(self.type_name.clone()));
        record.insert(self.type_name.clone(), Value::Object(content));
        Value::Object(record)
    }

    /// Key holding the inline text runs: `rich_text` on the current API,
    /// `text` on payloads from the older one.
    pub fn text_key(&self) -> Option<&'static str> {
        ["rich_text", "text"]
            .into_iter()
            .find(|key| self.content.get(*key).is_some_and(Value::is_array))
    }

    pub fn text_runs(&self) -> &[Value] {
        self.text_key()
            .and_then(|key| self.content.get(key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn plain_text(&self) -> String {
        self.text_runs()
            .iter()
            .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
            .collect()
    }
}

fn string_field(record: &Value, field: &str) -> Response<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing("block", field))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::NotionSyncError;

    fn paragraph(id: &str, text: &str, has_children: bool) -> Value {
        json!({
            "object": "block",
            "id": id,
            "type": "paragraph",
            "has_children": has_children,
            "paragraph": {
                "rich_text": [{"type": "text", "text": {"content": text}, "plain_text": text}],
                "color": "default"
            }
        })
    }

    #[test]
    fn test_classify() {
        let cases = [
            ("paragraph", BlockType::Paragraph),
            ("heading_1", BlockType::Heading1),
            ("heading_2", BlockType::Heading2),
            ("heading_3", BlockType::Heading3),
            ("bulleted_list_item", BlockType::BulletedListItem),
            ("child_database", BlockType::ChildDatabase),
            ("divider", BlockType::Divider),
            ("column_list", BlockType::ColumnList),
            ("table", BlockType::Table),
            ("table_row", BlockType::TableRow),
        ];

        for (tag, expected) in cases {
            assert_eq!(BlockType::classify(tag), expected);
            assert_eq!(BlockType::classify(&tag.to_uppercase()), expected);
        }

        assert_eq!(
            BlockType::classify("synced_block"),
            BlockType::Other("synced_block".to_string())
        );
    }

    #[test]
    fn test_decode_then_encode() {
        // Arrange
        let record = paragraph("b1", "hello", false);

        // Act
        let block = Block::decode(&record).unwrap();

        // Assert
        assert_eq!(block.kind(), &BlockType::Paragraph);
        assert_eq!(block.id, "b1");
        assert!(!block.has_children);
        assert!(block.children().is_none());
        assert_eq!(
            block.to_record(),
            json!({
                "object": "block",
                "type": "paragraph",
                "paragraph": record["paragraph"].clone()
            })
        );
        assert_eq!(block.to_wire_payload(), block.to_record());
    }

    #[test]
    fn test_decode_missing_fields() {
        let mut record = paragraph("b1", "hello", false);
        record.as_object_mut().unwrap().remove("paragraph");
        assert!(matches!(
            Block::decode(&record),
            Err(NotionSyncError::Decode { ref field, .. }) if field == "paragraph"
        ));

        let mut record = paragraph("b1", "hello", false);
        record["paragraph"] = json!("hello");
        assert!(matches!(
            Block::decode(&record),
            Err(NotionSyncError::Shape { ref field, expected: "an object", .. })
                if field == "paragraph"
        ));

        let mut record = paragraph("b1", "hello", false);
        record.as_object_mut().unwrap().remove("type");
        assert!(matches!(
            Block::decode(&record),
            Err(NotionSyncError::Decode { ref field, .. }) if field == "type"
        ));

        let mut record = paragraph("b1", "hello", false);
        record.as_object_mut().unwrap().remove("has_children");
        assert!(matches!(
            Block::decode(&record),
            Err(NotionSyncError::Decode { .. })
        ));
    }

    #[test]
    fn test_wire_payload_normalizes_children() {
        // Arrange
        let mut parent = Block::decode(&json!({
            "object": "block",
            "id": "p",
            "type": "bulleted_list_item",
            "has_children": true,
            "bulleted_list_item": {"rich_text": []}
        }))
        .unwrap();
        let mut child = Block::decode(&paragraph("c1", "one", true)).unwrap();
        child.attach_children(vec![
            Block::decode(&paragraph("g1", "deep", false)).unwrap()
        ]);
        let raw = json!({"object": "block", "type": "divider", "divider": {}});
        parent.set_children(vec![child.into(), ChildNode::Wire(raw.clone())]);

        // Act
        let payload = parent.to_wire_payload();

        // Assert
        let children = payload["bulleted_list_item"]["children"]
            .as_array()
            .unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["type"], "paragraph");
        assert_eq!(
            children[0]["paragraph"]["children"][0]["paragraph"]["rich_text"]
                [0]["plain_text"],
            "deep"
        );
        assert_eq!(children[1], raw);
        assert!(children[0].get("id").is_none());
    }

    #[test]
    fn test_wire_payload_is_idempotent() {
        let mut block = Block::decode(&paragraph("p", "root", true)).unwrap();
        block.attach_children(vec![
            Block::decode(&paragraph("c", "child", false)).unwrap()
        ]);

        let first = block.to_wire_payload();
        let second = block.to_wire_payload();

        assert_eq!(first, second);
        assert_eq!(
            first["paragraph"]["children"].as_array().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_wire_payload_passes_cells_through() {
        let record = json!({
            "object": "block",
            "id": "r1",
            "type": "table_row",
            "has_children": false,
            "table_row": {"cells": [[{"plain_text": "a"}], [{"plain_text": "b"}]]}
        });

        let block = Block::decode(&record).unwrap();

        assert_eq!(block.kind(), &BlockType::TableRow);
        assert_eq!(
            block.to_wire_payload()["table_row"],
            record["table_row"]
        );
    }

    #[test]
    fn test_plain_text() {
        let block = Block::decode(&json!({
            "object": "block",
            "id": "b",
            "type": "bulleted_list_item",
            "has_children": false,
            "bulleted_list_item": {"text": [
                {"plain_text": "Click "},
                {"plain_text": "here"}
            ]}
        }))
        .unwrap();

        assert_eq!(block.text_key(), Some("text"));
        assert_eq!(block.plain_text(), "Click here");
    }
}
