use serde_json::{Map, Value};
use strum::EnumString;

use super::{missing, wrong_shape};
use crate::Response;

#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PropertyType {
    Select,
    People,
    RichText,
    Relation,
    LastEditedTime,
    Title,
    CreatedTime,
    CreatedBy,
    Date,
    Files,
    MultiSelect,
    #[strum(default)]
    Other(String),
}

impl PropertyType {
    /// Unrecognized tags land in `Other` so new property types never break
    /// ingestion.
    pub fn classify(type_name: &str) -> Self {
        type_name
            .parse()
            .unwrap_or_else(|_| PropertyType::Other(type_name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageProperty {
    pub name: String,
    kind: PropertyType,
    type_name: String,
    pub content: Value,
}

impl PageProperty {
    pub fn decode(name: &str, record: &Value) -> Response<Self> {
        let type_name = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| missing("page property", "type"))?;

        let content = record
            .get(type_name)
            .ok_or_else(|| missing("page property", type_name))?;

        Ok(Self {
            name: name.to_string(),
            kind: PropertyType::classify(type_name),
            type_name: type_name.to_string(),
            content: content.clone(),
        })
    }

    /// Decodes every entry of a page's `properties` object, in key order.
    pub fn decode_all(properties: &Value) -> Response<Vec<Self>> {
        let properties = properties
            .as_object()
            .ok_or_else(|| {
                wrong_shape("page properties", "properties", "an object")
            })?;

        properties
            .iter()
            .map(|(name, record)| Self::decode(name, record))
            .collect()
    }

    pub fn kind(&self) -> &PropertyType {
        &self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("type".to_string(), Value::from(self.type_name.clone()));
        record.insert(self.type_name.clone(), self.content.clone());
        Value::Object(record)
    }

    /// `{name: record, ...}` as expected by the page update and create calls.
    pub fn to_properties_payload(properties: &[PageProperty]) -> Value {
        let map = properties
            .iter()
            .map(|p| (p.name.clone(), p.to_record()))
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}
