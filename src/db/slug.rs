use std::sync::LazyLock;

use regex::Regex;

use crate::auth::visibility::DocumentFilter;
use crate::db::models::CollectionTarget;
use crate::db::repository::DocumentStore;
use crate::error::AppError;

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

const FALLBACK_SLUG: &str = "document";

/// Lowercase `title`, collapse every run of other characters into `-` and
/// trim dashes from both ends.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Derive a slug from `title` that no document in `target` uses yet,
/// appending `-1`, `-2`, … on collision.
///
/// Check-then-write: two concurrent publishers can still pick the same slug.
pub async fn generate_unique_slug(
    store: &dyn DocumentStore,
    target: &CollectionTarget,
    title: &str,
) -> Result<String, AppError> {
    let mut base = slugify(title);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut candidate = base.clone();
    let mut counter: u64 = 1;
    while store
        .find_one(target, &DocumentFilter::by_slug(candidate.as_str()), None)
        .await?
        .is_some()
    {
        candidate = format!("{base}-{counter}");
        counter += 1;
    }

    Ok(candidate)
}
