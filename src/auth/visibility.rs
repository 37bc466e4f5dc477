//! Visibility rules shared by every document operation.
//!
//! A document is visible to a caller when the caller owns it or when it is
//! public. The same [`AccessScope`] renders to a MongoDB filter for the store
//! and evaluates in process against a `bson::Document`.

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};

use crate::auth::models::AuthenticatedUser;
use crate::db::models::fields;
use crate::error::AppError;
use crate::models::search_config::SearchConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    /// `isPublic == true`
    PublicOnly,
    /// `userId == id OR isPublic == true`
    OwnerOrPublic(String),
    /// `userId == id`
    OwnerOnly(String),
}

impl AccessScope {
    pub fn owner(user: &AuthenticatedUser) -> Self {
        AccessScope::OwnerOnly(user.user_id.clone())
    }

    pub fn to_bson(&self) -> Document {
        match self {
            AccessScope::PublicOnly => doc! { "isPublic": true },
            AccessScope::OwnerOrPublic(user_id) => doc! {
                "$or": [
                    { "userId": user_id },
                    { "isPublic": true },
                ]
            },
            AccessScope::OwnerOnly(user_id) => doc! { "userId": user_id },
        }
    }

    pub fn admits(&self, document: &Document) -> bool {
        match self {
            AccessScope::PublicOnly => is_public(document),
            AccessScope::OwnerOrPublic(user_id) => {
                owner_of(document) == Some(user_id.as_str()) || is_public(document)
            }
            AccessScope::OwnerOnly(user_id) => owner_of(document) == Some(user_id.as_str()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AccessScope::PublicOnly)
    }
}

/// Visibility for a read on behalf of `user` (anonymous when `None`).
pub fn build_visibility_predicate(user: Option<&AuthenticatedUser>) -> AccessScope {
    match user {
        Some(user) => AccessScope::OwnerOrPublic(user.user_id.clone()),
        None => AccessScope::PublicOnly,
    }
}

/// Only a literal boolean `true` counts as public.
pub fn is_public(document: &Document) -> bool {
    matches!(document.get(fields::IS_PUBLIC), Some(Bson::Boolean(true)))
}

pub fn owner_of(document: &Document) -> Option<&str> {
    document.get(fields::USER_ID).and_then(Bson::as_str)
}

/// Remove the owner identity before a document reaches an anonymous caller.
pub fn strip_owner_fields(document: &mut Document) {
    document.remove(fields::USER_ID);
    document.remove(fields::USER_EMAIL);
}

/// Equality on the config's id field.
#[derive(Debug, Clone, PartialEq)]
pub struct IdSelector {
    pub field: String,
    pub value: Bson,
}

impl IdSelector {
    /// Build the selector for a raw id taken from a URL. `_id` values must be
    /// 24-character hex ObjectIds; any other id field compares as a string.
    pub fn for_config(config: &SearchConfig, raw: &str) -> Result<Self, AppError> {
        let value = if config.id_field == fields::ID {
            let oid = ObjectId::parse_str(raw)
                .map_err(|_| AppError::BadRequest(format!("Invalid document id '{raw}'")))?;
            Bson::ObjectId(oid)
        } else {
            Bson::String(raw.to_string())
        };
        Ok(Self {
            field: config.id_field.clone(),
            value,
        })
    }

    /// Select by store-native `_id`, e.g. an id returned from an insert.
    pub fn native(id: Bson) -> Self {
        Self {
            field: fields::ID.to_string(),
            value: id,
        }
    }
}

/// Conjunction of an id (or slug) match and a visibility scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentFilter {
    pub selector: Option<IdSelector>,
    pub public_slug: Option<String>,
    pub scope: Option<AccessScope>,
}

impl DocumentFilter {
    pub fn by_id(selector: IdSelector) -> Self {
        Self {
            selector: Some(selector),
            ..Self::default()
        }
    }

    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self {
            public_slug: Some(slug.into()),
            ..Self::default()
        }
    }

    /// Matches every document in the collection.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn within(mut self, scope: AccessScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn to_bson(&self) -> Document {
        let mut clauses: Vec<Document> = Vec::new();
        if let Some(selector) = &self.selector {
            let mut by_id = Document::new();
            by_id.insert(selector.field.clone(), selector.value.clone());
            clauses.push(by_id);
        }
        if let Some(slug) = &self.public_slug {
            clauses.push(doc! { "publicSlug": slug });
        }
        if let Some(scope) = &self.scope {
            clauses.push(scope.to_bson());
        }

        match clauses.len() {
            0 => Document::new(),
            1 => clauses.remove(0),
            _ => doc! { "$and": clauses },
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        let selector_ok = self
            .selector
            .as_ref()
            .is_none_or(|s| document.get(&s.field) == Some(&s.value));
        let slug_ok = self
            .public_slug
            .as_ref()
            .is_none_or(|slug| document.get_str(fields::PUBLIC_SLUG).ok() == Some(slug.as_str()));
        let scope_ok = self.scope.as_ref().is_none_or(|scope| scope.admits(document));
        selector_ok && slug_ok && scope_ok
    }
}
