use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::search_config::SearchConfig;
use crate::search::registry::SearchConfigRegistry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub config_type: String,
    pub config: SearchConfig,
}

/// Response of `GET /api/configs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigList {
    pub default_config_type: String,
    pub configs: Vec<ConfigEntry>,
}

pub fn list_configs(registry: &SearchConfigRegistry, default_config_type: &str) -> ConfigList {
    ConfigList {
        default_config_type: default_config_type.to_string(),
        configs: registry
            .iter()
            .map(|(config_type, config)| ConfigEntry {
                config_type: config_type.to_string(),
                config: (**config).clone(),
            })
            .collect(),
    }
}

pub fn get_config(registry: &SearchConfigRegistry, config_type: &str) -> Result<ConfigEntry, AppError> {
    registry
        .get(config_type)
        .map(|config| ConfigEntry {
            config_type: config_type.to_string(),
            config: (**config).clone(),
        })
        .ok_or_else(|| AppError::NotFound(format!("Unknown configType '{config_type}'")))
}

/// `GET /api/configs`
#[cfg(feature = "ssr")]
pub async fn list_configs_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
) -> axum::Json<ConfigList> {
    axum::Json(list_configs(&state.registry, &state.default_config_type))
}

/// `GET /api/configs/{configType}`
#[cfg(feature = "ssr")]
pub async fn get_config_handler(
    axum::extract::State(state): axum::extract::State<crate::app::AppState>,
    axum::extract::Path(config_type): axum::extract::Path<String>,
) -> Result<axum::Json<ConfigEntry>, AppError> {
    get_config(&state.registry, &config_type).map(axum::Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_configs_keeps_registry_order() {
        let list = list_configs(SearchConfigRegistry::builtin(), "mongodbExamples");
        assert_eq!(list.default_config_type, "mongodbExamples");
        let types: Vec<&str> = list.configs.iter().map(|c| c.config_type.as_str()).collect();
        assert_eq!(types, vec!["princesofindia", "mongodbExamples", "declarativeDocuments"]);
    }

    #[test]
    fn test_config_wire_format_is_camel_case() {
        let entry = get_config(SearchConfigRegistry::builtin(), "princesofindia").unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["configType"], "princesofindia");
        assert_eq!(json["config"]["searchResultDetailPath"], "/result/:id");
        assert_eq!(json["config"]["indexDefinition"]["mappings"]["fields"]["name"][0]["type"], "autocomplete");

        let back: ConfigEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_unknown_config_is_not_found() {
        assert!(matches!(
            get_config(SearchConfigRegistry::builtin(), "nope"),
            Err(AppError::NotFound(_))
        ));
    }
}
