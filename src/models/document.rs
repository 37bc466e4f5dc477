use bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::models::UpdateCounts;
use crate::error::AppError;

/// Convert a JSON object received from a client into a BSON document.
pub fn document_from_json(value: Value) -> Result<Document, AppError> {
    if !value.is_object() {
        return Err(AppError::BadRequest(
            "Document body must be a JSON object".to_string(),
        ));
    }
    Ok(bson::to_document(&value)?)
}

/// Render a stored document for the wire: ObjectIds as hex strings,
/// datetimes as RFC 3339, everything else as relaxed extended JSON.
pub fn document_to_json(document: Document) -> Value {
    let map: Map<String, Value> = document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect();
    Value::Object(map)
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Document(document) => document_to_json(document),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Only a literal boolean `true` makes a document public.
pub fn coerce_public(value: Option<&Bson>) -> bool {
    matches!(value, Some(Bson::Boolean(true)))
}

/// Selects the config a request targets: `configType` directly, or the
/// registered `(selectedDatabase, collection)` pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_type: Option<String>,
}

/// Query string of `GET /api/documents/{id}`.
///
/// Not flattened: `serde_urlencoded` cannot parse non-string values through
/// `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOneParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    /// Comma-separated field list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_only: Option<bool>,
}

impl FindOneParams {
    pub fn target(&self) -> TargetParams {
        TargetParams {
            selected_database: self.selected_database.clone(),
            collection: self.collection.clone(),
            config_type: self.config_type.clone(),
        }
    }

    pub fn projection_fields(&self) -> Option<Vec<String>> {
        self.projection.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[serde(flatten)]
    pub target: TargetParams,
    pub document: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(flatten)]
    pub target: TargetParams,
    pub update: Value,
}

/// `config` may carry `database` / `collection` when the caller only has
/// the config object at hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateRequest {
    #[serde(flatten)]
    pub target: TargetParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl DuplicateRequest {
    pub fn resolved_target(&self) -> TargetParams {
        let from_config = |key: &str| {
            self.config
                .as_ref()
                .and_then(|c| c.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        TargetParams {
            selected_database: self
                .target
                .selected_database
                .clone()
                .or_else(|| from_config("database")),
            collection: self
                .target
                .collection
                .clone()
                .or_else(|| from_config("collection")),
            config_type: self.target.config_type.clone(),
        }
    }
}

/// Every document endpoint wraps its payload in `{"result": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope<T> {
    pub result: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

impl From<UpdateCounts> for UpdateResult {
    fn from(counts: UpdateCounts) -> Self {
        Self {
            acknowledged: true,
            matched_count: counts.matched_count,
            modified_count: counts.modified_count,
            upserted_count: u64::from(counts.upserted_id.is_some()),
            upserted_id: counts.upserted_id.map(bson_to_json),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;
    use bson::doc;

    #[test]
    fn test_document_from_json_requires_object() {
        assert!(matches!(
            document_from_json(serde_json::json!(["a"])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            document_from_json(serde_json::json!("x")),
            Err(AppError::BadRequest(_))
        ));
        let document = document_from_json(serde_json::json!({ "title": "Report", "n": 3 })).unwrap();
        assert_eq!(document.get_str("title").unwrap(), "Report");
    }

    #[test]
    fn test_document_to_json_renders_ids_and_dates() {
        let oid = ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap();
        let created = bson::DateTime::from_millis(1_704_067_200_000);
        let json = document_to_json(doc! {
            "_id": oid,
            "createdAt": created,
            "nested": { "ref": oid, "tags": ["a", "b"] },
            "count": 5,
            "isPublic": true,
        });

        assert_eq!(json["_id"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(json["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(json["nested"]["ref"], "65a1b2c3d4e5f60718293a4b");
        assert_eq!(json["nested"]["tags"][1], "b");
        assert_eq!(json["count"], 5);
        assert_eq!(json["isPublic"], true);
    }

    #[test]
    fn test_coerce_public() {
        assert!(coerce_public(Some(&Bson::Boolean(true))));
        assert!(!coerce_public(Some(&Bson::Boolean(false))));
        assert!(!coerce_public(Some(&Bson::String("true".into()))));
        assert!(!coerce_public(Some(&Bson::Int32(1))));
        assert!(!coerce_public(None));
    }

    #[test]
    fn test_projection_fields() {
        let params = FindOneParams {
            projection: Some("title, bio,,isPublic".to_string()),
            ..FindOneParams::default()
        };
        assert_eq!(
            params.projection_fields().unwrap(),
            vec!["title", "bio", "isPublic"]
        );
        assert!(FindOneParams::default().projection_fields().is_none());
    }

    #[test]
    fn test_duplicate_request_reads_target_from_config() {
        let request: DuplicateRequest = serde_json::from_value(serde_json::json!({
            "config": { "database": "sample_search", "collection": "declarativeDocuments" }
        }))
        .unwrap();
        let target = request.resolved_target();
        assert_eq!(target.selected_database.as_deref(), Some("sample_search"));
        assert_eq!(target.collection.as_deref(), Some("declarativeDocuments"));
    }

    #[test]
    fn test_update_result_wire_shape() {
        let result = UpdateResult::from(UpdateCounts {
            matched_count: 1,
            modified_count: 1,
            upserted_id: None,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "acknowledged": true,
                "matchedCount": 1,
                "modifiedCount": 1,
                "upsertedCount": 0,
                "upsertedId": null,
            })
        );
    }
}
