use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::db::models::CollectionTarget;

/// Declarative description of one searchable entity type.
///
/// Everything the server and the UI need to know about a collection lives
/// here: where it is stored, which Atlas Search index backs it, how results
/// are summarized and where the detail page lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// The first entry is rendered as the result title.
    pub search_results_summary_fields: Vec<String>,
    pub search_results_suggestions_field: String,
    pub find_one_detail_fields: Vec<String>,
    /// Atlas Search index name.
    pub index: String,
    pub index_definition: IndexDefinition,
    #[serde(default = "default_min_search_length")]
    pub min_search_length: usize,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
    /// Debounce for suggestion lookups, in milliseconds.
    #[serde(default = "default_debounce_time")]
    pub debounce_time: u32,
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    #[serde(default = "default_results_page")]
    pub search_results_paginated_page: String,
    /// Route template, must contain `:id`.
    #[serde(default = "default_detail_path")]
    pub search_result_detail_path: String,
    #[serde(default = "default_query_param")]
    pub search_query_param: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_id_field() -> String {
    "_id".to_string()
}
fn default_min_search_length() -> usize {
    3
}
fn default_max_suggestions() -> usize {
    10
}
fn default_debounce_time() -> u32 {
    300
}
fn default_page_size() -> u64 {
    10
}
fn default_max_page_size() -> u64 {
    50
}
fn default_results_page() -> String {
    "/result".to_string()
}
fn default_detail_path() -> String {
    "/result/:id".to_string()
}
fn default_query_param() -> String {
    "q".to_string()
}
fn default_locale() -> String {
    "en-US".to_string()
}
fn default_date_format() -> String {
    "yyyy-MM-dd".to_string()
}

impl SearchConfig {
    pub fn target(&self) -> CollectionTarget {
        CollectionTarget::new(&self.database, &self.collection)
    }

    /// Field holding the human-readable title of a document.
    pub fn title_field(&self) -> &str {
        &self.search_results_suggestions_field
    }

    /// Field rendered as the heading of a search result.
    pub fn summary_title_field(&self) -> &str {
        self.search_results_summary_fields
            .first()
            .map(String::as_str)
            .unwrap_or(&self.search_results_suggestions_field)
    }

    /// Render the detail route for a document id.
    pub fn detail_path(&self, id: &str) -> String {
        self.search_result_detail_path
            .replace(":id", &urlencoding::encode(id))
    }

    /// Clamp a requested page size into `[1, max_page_size]`, falling back to
    /// `default_page_size` when none was requested.
    pub fn clamp_page_size(&self, requested: Option<i64>) -> u64 {
        let max = self.max_page_size.max(1);
        match requested {
            Some(size) if size < 1 => 1,
            Some(size) => (size as u64).min(max),
            None => self.default_page_size.clamp(1, max),
        }
    }

    /// Sanity checks applied when a config is registered.
    pub fn validate(&self) -> Result<(), String> {
        if self.database.trim().is_empty() || self.collection.trim().is_empty() {
            return Err("database and collection must be set".to_string());
        }
        if self.index.trim().is_empty() {
            return Err("index must be set".to_string());
        }
        if self.id_field.trim().is_empty() {
            return Err("idField must not be empty".to_string());
        }
        if self.search_results_summary_fields.is_empty() {
            return Err("searchResultsSummaryFields must list at least one field".to_string());
        }
        if !self.search_result_detail_path.contains(":id") {
            return Err(format!(
                "searchResultDetailPath '{}' has no :id placeholder",
                self.search_result_detail_path
            ));
        }
        if self.max_page_size == 0 {
            return Err("maxPageSize must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Atlas Search index definition, as stored in the config and sent verbatim
/// to the index management API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub mappings: IndexMappings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMappings {
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub fields: IndexFields,
}

/// Field mappings in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexFields(pub Vec<(String, FieldMapping)>);

impl IndexFields {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMapping)> {
        self.0.iter().map(|(path, mapping)| (path.as_str(), mapping))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for IndexFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (path, mapping) in &self.0 {
            map.serialize_entry(path, mapping)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IndexFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = IndexFields;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field paths to mappings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<IndexFields, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((path, mapping)) = access.next_entry::<String, FieldMapping>()? {
                    fields.push((path, mapping));
                }
                Ok(IndexFields(fields))
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// A field is indexed either one way or several ways at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldMapping {
    Multiple(Vec<FieldType>),
    Single(FieldType),
}

impl FieldMapping {
    pub fn descriptors(&self) -> &[FieldType] {
        match self {
            FieldMapping::Multiple(types) => types,
            FieldMapping::Single(field_type) => std::slice::from_ref(field_type),
        }
    }
}

/// One index descriptor, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Autocomplete(AutocompleteOptions),
    String(StringOptions),
    /// Any other Atlas type. Kept verbatim, never queried.
    Unknown(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_grams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_grams: Option<u32>,
    #[serde(default = "default_tokenization")]
    pub tokenization: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fold_diacritics: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringOptions {
    #[serde(default = "default_analyzer")]
    pub analyzer: String,
}

fn default_tokenization() -> String {
    "edgeGram".to_string()
}
fn default_analyzer() -> String {
    "lucene.standard".to_string()
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let tag = value
            .as_object()
            .ok_or_else(|| de::Error::custom("field mapping must be an object"))?
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        match tag.as_str() {
            "autocomplete" => serde_json::from_value(value)
                .map(FieldType::Autocomplete)
                .map_err(de::Error::custom),
            "string" => serde_json::from_value(value)
                .map(FieldType::String)
                .map_err(de::Error::custom),
            _ => Ok(FieldType::Unknown(value)),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;

        let (tag, options) = match self {
            FieldType::Autocomplete(options) => (
                "autocomplete",
                serde_json::to_value(options).map_err(S::Error::custom)?,
            ),
            FieldType::String(options) => (
                "string",
                serde_json::to_value(options).map_err(S::Error::custom)?,
            ),
            FieldType::Unknown(value) => return value.serialize(serializer),
        };

        let serde_json::Value::Object(fields) = options else {
            return Err(S::Error::custom("field options must serialize to an object"));
        };
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry("type", tag)?;
        for (key, value) in &fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_YAML: &str = r#"
database: sample_search
collection: declarativeDocuments
searchResultsSummaryFields: [title, userEmail]
searchResultsSuggestionsField: title
findOneDetailFields: [title, Content]
index: TitleAndEmailSearchIndex
indexDefinition:
  mappings:
    dynamic: false
    fields:
      userEmail:
        - type: string
        - type: autocomplete
          minGrams: 3
      title:
        type: autocomplete
        maxGrams: 20
      location:
        type: geo
"#;

    fn parse() -> SearchConfig {
        serde_yaml::from_str(CONFIG_YAML).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse();
        assert_eq!(config.id_field, "_id");
        assert_eq!(config.min_search_length, 3);
        assert_eq!(config.max_suggestions, 10);
        assert_eq!(config.debounce_time, 300);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.search_result_detail_path, "/result/:id");
        assert_eq!(config.date_format, "yyyy-MM-dd");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_field_order_and_variants() {
        let config = parse();
        let fields: Vec<(&str, &FieldMapping)> = config.index_definition.mappings.fields.iter().collect();
        assert_eq!(
            fields.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            vec!["userEmail", "title", "location"]
        );

        let email = fields[0].1.descriptors();
        assert_eq!(email.len(), 2);
        assert!(matches!(&email[0], FieldType::String(o) if o.analyzer == "lucene.standard"));
        assert!(matches!(&email[1], FieldType::Autocomplete(o) if o.tokenization == "edgeGram" && o.min_grams == Some(3)));

        assert!(matches!(fields[1].1, FieldMapping::Single(FieldType::Autocomplete(_))));
        assert!(matches!(fields[2].1.descriptors()[0], FieldType::Unknown(_)));
    }

    #[test]
    fn test_index_definition_serializes_with_type_tags() {
        let config = parse();
        let json = serde_json::to_string(&config.index_definition).unwrap();
        let user_email = json.find("\"userEmail\"").unwrap();
        let title = json.find("\"title\"").unwrap();
        assert!(user_email < title, "declaration order must survive serialization");

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mappings"]["fields"]["title"]["type"], "autocomplete");
        assert_eq!(value["mappings"]["fields"]["title"]["maxGrams"], 20);
        assert_eq!(value["mappings"]["fields"]["userEmail"][0]["type"], "string");
        assert_eq!(value["mappings"]["fields"]["location"]["type"], "geo");
    }

    #[test]
    fn test_non_object_descriptor_rejected() {
        let yaml = "mappings:\n  fields:\n    title: autocomplete\n";
        assert!(serde_yaml::from_str::<IndexDefinition>(yaml).is_err());
    }

    #[test]
    fn test_clamp_page_size() {
        let config = parse();
        assert_eq!(config.clamp_page_size(None), 10);
        assert_eq!(config.clamp_page_size(Some(0)), 1);
        assert_eq!(config.clamp_page_size(Some(-4)), 1);
        assert_eq!(config.clamp_page_size(Some(25)), 25);
        assert_eq!(config.clamp_page_size(Some(500)), 50);
    }

    #[test]
    fn test_detail_path_encodes_id() {
        let config = parse();
        assert_eq!(config.detail_path("abc"), "/result/abc");
        assert_eq!(config.detail_path("a b/c"), "/result/a%20b%2Fc");
    }

    #[test]
    fn test_validate_rejects_missing_placeholder() {
        let mut config = parse();
        config.search_result_detail_path = "/result".to_string();
        assert!(config.validate().is_err());
    }
}
