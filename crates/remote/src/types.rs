//! Wire types for the PostgREST-shaped collection backend.
//!
//! Rows are normalized at this boundary: both snake_case and camelCase
//! spellings deserialize into the same row type, and `into_domain` produces
//! the one `CollectionItem` shape consumed everywhere downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use caddy_core::collection::{CollectionItem, CollectionItemPatch, ItemStatus};

/// Error body returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: String,
    pub message: String,
}

/// One `collection_items` row as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionItemRow {
    pub id: String,
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    #[serde(alias = "teaId")]
    pub tea_id: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default, alias = "userRating")]
    pub user_rating: Option<f32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(alias = "addedAt")]
    pub added_at: DateTime<Utc>,
    #[serde(default, alias = "triedAt")]
    pub tried_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "preferredSteepTimeSeconds")]
    pub preferred_steep_time_seconds: Option<i64>,
    #[serde(default, alias = "preferredBrewMethod")]
    pub preferred_brew_method: Option<String>,
    #[serde(default, alias = "preferredTemperatureF")]
    pub preferred_temperature_f: Option<i64>,
}

impl CollectionItemRow {
    /// Normalize into the domain shape. Synced items carry no embedded tea
    /// snapshot; the tea is fetched by reference instead.
    pub fn into_domain(self) -> CollectionItem {
        CollectionItem {
            id: self.id,
            user_id: self.user_id,
            tea_id: self.tea_id,
            status: self.status,
            user_rating: self.user_rating,
            notes: self.notes,
            added_at: self.added_at,
            tried_at: self.tried_at,
            preferred_steep_time_seconds: self.preferred_steep_time_seconds,
            preferred_brew_method: self.preferred_brew_method,
            preferred_temperature_f: self.preferred_temperature_f,
            tea_snapshot: None,
        }
    }
}

/// One `teas` row from the name-lookup endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TeaRow {
    pub id: String,
    pub name: String,
}

/// Insert payload for the upsert endpoint.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct InsertCollectionItemBody<'a> {
    pub user_id: &'a str,
    pub tea_id: &'a str,
    pub status: ItemStatus,
}

/// Wire body for a partial update; only set fields are serialized.
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct UpdateCollectionItemBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_steep_time_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_brew_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_temperature_f: Option<i64>,
}

impl From<&CollectionItemPatch> for UpdateCollectionItemBody {
    fn from(patch: &CollectionItemPatch) -> Self {
        Self {
            status: patch.status,
            user_rating: patch.user_rating,
            notes: patch.notes.clone(),
            tried_at: patch.tried_at,
            preferred_steep_time_seconds: patch.preferred_steep_time_seconds,
            preferred_brew_method: patch.preferred_brew_method.clone(),
            preferred_temperature_f: patch.preferred_temperature_f,
        }
    }
}
