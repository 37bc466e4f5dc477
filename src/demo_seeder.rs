use std::collections::HashMap;

use serde_json::Value;

use crate::auth::demo_auth::{demo_user, DEMO_OWNER};
use crate::auth::visibility::DocumentFilter;
use crate::db::models::fields;
use crate::db::repository::DocumentStore;
use crate::db::slug::generate_unique_slug;
use crate::error::AppError;
use crate::models::document::document_from_json;
use crate::search::registry::SearchConfigRegistry;

const SAMPLES: &str = include_str!("../demo_data/samples.yaml");

/// Insert the sample documents of every registered config whose collection
/// is still empty. Returns the number of inserted documents.
pub async fn seed_demo_data(
    store: &dyn DocumentStore,
    registry: &SearchConfigRegistry,
) -> Result<usize, AppError> {
    let samples: HashMap<String, Vec<Value>> = serde_yaml::from_str(SAMPLES)
        .map_err(|e| AppError::Internal(format!("invalid demo samples: {e}")))?;
    let owner = demo_user(DEMO_OWNER)
        .ok_or_else(|| AppError::Internal(format!("unknown demo owner '{DEMO_OWNER}'")))?;

    tracing::info!("Starting demo data seeding...");
    let mut inserted = 0;

    for (config_type, config) in registry.iter() {
        let Some(documents) = samples.get(config_type) else {
            continue;
        };
        let target = config.target();
        if store.find_one(&target, &DocumentFilter::any(), None).await?.is_some() {
            tracing::info!(%target, "collection not empty, skipping demo data");
            continue;
        }

        for sample in documents {
            let mut document = document_from_json(sample.clone())?;
            let title = document
                .get_str(config.title_field())
                .unwrap_or_default()
                .to_string();
            let slug = generate_unique_slug(store, &target, &title).await?;
            let now = bson::DateTime::now();

            document.insert(fields::USER_ID, owner.user_id.as_str());
            document.insert(fields::USER_EMAIL, owner.email.as_str());
            document.insert(fields::IS_PUBLIC, true);
            document.insert(fields::PUBLIC_SLUG, slug);
            document.insert(fields::CREATED_AT, now);
            document.insert(fields::UPDATED_AT, now);

            store.insert_one(&target, document).await?;
            inserted += 1;
        }
        tracing::info!(%target, count = documents.len(), "demo documents inserted");
    }

    tracing::info!("Demo data seeding complete: {inserted} documents.");
    Ok(inserted)
}
