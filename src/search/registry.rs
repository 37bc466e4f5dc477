use std::sync::{Arc, LazyLock};

use crate::error::AppError;
use crate::models::search_config::SearchConfig;

/// Search configs bundled with the binary, keyed by config type.
const BUILTIN_SOURCES: &[(&str, &str)] = &[
    (
        "princesofindia",
        include_str!("../../search_configs/princesofindia.yaml"),
    ),
    (
        "mongodbExamples",
        include_str!("../../search_configs/mongodbExamples.yaml"),
    ),
    (
        "declarativeDocuments",
        include_str!("../../search_configs/declarativeDocuments.yaml"),
    ),
];

static BUILTIN: LazyLock<SearchConfigRegistry> = LazyLock::new(|| {
    SearchConfigRegistry::from_sources(BUILTIN_SOURCES)
        .expect("bundled search configs must parse and validate")
});

/// Ordered set of search configs, looked up by config type or by the
/// collection they describe.
#[derive(Debug, Clone, Default)]
pub struct SearchConfigRegistry {
    entries: Vec<(String, Arc<SearchConfig>)>,
}

impl SearchConfigRegistry {
    /// The registry compiled into the binary.
    pub fn builtin() -> &'static SearchConfigRegistry {
        &BUILTIN
    }

    /// Parse `(config_type, yaml)` pairs. Duplicate config types and
    /// invalid configs are rejected.
    pub fn from_sources(sources: &[(&str, &str)]) -> Result<Self, AppError> {
        let mut registry = Self::default();
        for (config_type, yaml) in sources {
            let config: SearchConfig = serde_yaml::from_str(yaml).map_err(|e| {
                AppError::Internal(format!("Invalid search config '{config_type}': {e}"))
            })?;
            registry.register(config_type, config)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, config_type: &str, config: SearchConfig) -> Result<(), AppError> {
        config
            .validate()
            .map_err(|e| AppError::Internal(format!("Invalid search config '{config_type}': {e}")))?;
        if self.get(config_type).is_some() {
            return Err(AppError::Internal(format!(
                "Search config '{config_type}' registered twice"
            )));
        }
        self.entries
            .push((config_type.to_string(), Arc::new(config)));
        Ok(())
    }

    pub fn get(&self, config_type: &str) -> Option<&Arc<SearchConfig>> {
        self.entries
            .iter()
            .find(|(name, _)| name == config_type)
            .map(|(_, config)| config)
    }

    pub fn find_by_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Option<(&str, &Arc<SearchConfig>)> {
        self.entries
            .iter()
            .find(|(_, c)| c.database == database && c.collection == collection)
            .map(|(name, config)| (name.as_str(), config))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<SearchConfig>)> {
        self.entries
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    pub fn config_types(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the config a request is aimed at.
    ///
    /// An explicit `config_type` wins. Otherwise the `(database, collection)`
    /// pair must name a registered collection, so arbitrary collections are
    /// never reachable.
    pub fn resolve(
        &self,
        config_type: Option<&str>,
        database: Option<&str>,
        collection: Option<&str>,
    ) -> Result<&Arc<SearchConfig>, AppError> {
        if let Some(config_type) = config_type.filter(|s| !s.is_empty()) {
            let config = self.get(config_type).ok_or_else(|| {
                AppError::BadRequest(format!("Unknown configType '{config_type}'"))
            })?;
            if let Some(collection) = collection.filter(|s| !s.is_empty()) {
                if collection != config.collection {
                    return Err(AppError::BadRequest(format!(
                        "Collection '{collection}' does not belong to configType '{config_type}'"
                    )));
                }
            }
            return Ok(config);
        }

        match (
            database.filter(|s| !s.is_empty()),
            collection.filter(|s| !s.is_empty()),
        ) {
            (Some(database), Some(collection)) => self
                .find_by_collection(database, collection)
                .map(|(_, config)| config)
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "No search config registered for {database}.{collection}"
                    ))
                }),
            _ => Err(AppError::BadRequest(
                "Either configType or selectedDatabase and collection are required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_configs_load_in_order() {
        let registry = SearchConfigRegistry::builtin();
        assert_eq!(
            registry.config_types(),
            vec!["princesofindia", "mongodbExamples", "declarativeDocuments"]
        );
        let princes = registry.get("princesofindia").unwrap();
        assert_eq!(princes.index, "NameSearchIndex");
        assert_eq!(princes.database, "sample_search");
    }

    #[test]
    fn test_resolve_by_config_type() {
        let registry = SearchConfigRegistry::builtin();
        let config = registry
            .resolve(Some("mongodbExamples"), None, None)
            .unwrap();
        assert_eq!(config.collection, "mongodbExamples");
    }

    #[test]
    fn test_resolve_by_collection() {
        let registry = SearchConfigRegistry::builtin();
        let config = registry
            .resolve(None, Some("sample_search"), Some("declarativeDocuments"))
            .unwrap();
        assert_eq!(config.index, "TitleAndEmailSearchIndex");
    }

    #[test]
    fn test_resolve_rejects_unknown_targets() {
        let registry = SearchConfigRegistry::builtin();
        assert!(matches!(
            registry.resolve(Some("nope"), None, None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            registry.resolve(None, Some("admin"), Some("system.users")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            registry.resolve(None, None, Some("declarativeDocuments")),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            registry.resolve(Some("princesofindia"), None, Some("mongodbExamples")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_duplicate_config_type_rejected() {
        let yaml = include_str!("../../search_configs/princesofindia.yaml");
        let result = SearchConfigRegistry::from_sources(&[("a", yaml), ("a", yaml)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = SearchConfigRegistry::from_sources(&[("broken", "database: [")]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
