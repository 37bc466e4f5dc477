use mongodb::SearchIndexModel;

use crate::db::connection::MongoConnection;
use crate::error::AppError;
use crate::models::search_config::SearchConfig;
use crate::search::registry::SearchConfigRegistry;

/// Atlas Search index model for one config.
pub fn search_index_model(config: &SearchConfig) -> Result<SearchIndexModel, AppError> {
    let definition = bson::to_document(&config.index_definition)?;
    Ok(SearchIndexModel::builder()
        .name(config.index.clone())
        .definition(definition)
        .build())
}

/// Create the search index of every registered config.
///
/// Never fails: an index that already exists, or a deployment without Atlas
/// Search, only produces a warning. Returns the number of indexes created.
pub async fn ensure_search_indexes(
    connection: &MongoConnection,
    registry: &SearchConfigRegistry,
) -> usize {
    let mut created = 0;
    for (config_type, config) in registry.iter() {
        match create_index(connection, config).await {
            Ok(name) => {
                tracing::info!(config_type, index = %name, "search index created");
                created += 1;
            }
            Err(e) => {
                tracing::warn!(config_type, index = %config.index, error = %e, "search index not created");
            }
        }
    }
    created
}

async fn create_index(connection: &MongoConnection, config: &SearchConfig) -> Result<String, AppError> {
    let model = search_index_model(config)?;
    let collection = connection
        .database(&config.database)
        .await?
        .collection::<bson::Document>(&config.collection);
    collection
        .create_search_index(model)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_carries_name_and_mappings() {
        let config = SearchConfigRegistry::builtin().get("princesofindia").unwrap();
        let model = search_index_model(config).unwrap();

        assert_eq!(model.name.as_deref(), Some(config.index.as_str()));
        let mappings = model.definition.get_document("mappings").unwrap();
        let fields = mappings.get_document("fields").unwrap();
        let name = fields.get_array("name").unwrap();
        assert_eq!(name.len(), 2);
        assert_eq!(
            name[0].as_document().unwrap().get_str("type").unwrap(),
            "autocomplete"
        );
    }
}
