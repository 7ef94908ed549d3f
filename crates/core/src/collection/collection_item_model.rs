//! Collection item domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether the user has tried this tea yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    WantToTry,
    Tried,
}

/// Display fields copied from a tea record.
///
/// Only used in local-only mode, where there is no join-capable backend to
/// fetch the tea by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeaSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl TeaSnapshot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            origin: None,
            image_url: None,
        }
    }
}

/// A tea in the user's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionItem {
    pub id: String,
    pub user_id: Option<String>,
    pub tea_id: String,
    pub status: ItemStatus,
    pub user_rating: Option<f32>,
    pub notes: Option<String>,
    pub added_at: DateTime<Utc>,
    pub tried_at: Option<DateTime<Utc>>,
    pub preferred_steep_time_seconds: Option<i64>,
    pub preferred_brew_method: Option<String>,
    pub preferred_temperature_f: Option<i64>,
    pub tea_snapshot: Option<TeaSnapshot>,
}

impl CollectionItem {
    /// Create a locally-owned item with a synthesized id.
    pub fn new_local(tea_id: &str, status: ItemStatus, tea_snapshot: Option<TeaSnapshot>) -> Self {
        let now = Utc::now();
        Self {
            id: synthesize_local_id(now),
            user_id: None,
            tea_id: tea_id.to_string(),
            status,
            user_rating: None,
            notes: None,
            added_at: now,
            tried_at: None,
            preferred_steep_time_seconds: None,
            preferred_brew_method: None,
            preferred_temperature_f: None,
            tea_snapshot,
        }
    }

    /// Merge set fields from `patch`; `None` fields are left untouched.
    pub fn apply_patch(&mut self, patch: &CollectionItemPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(rating) = patch.user_rating {
            self.user_rating = Some(rating);
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(tried_at) = patch.tried_at {
            self.tried_at = Some(tried_at);
        }
        if let Some(seconds) = patch.preferred_steep_time_seconds {
            self.preferred_steep_time_seconds = Some(seconds);
        }
        if let Some(method) = &patch.preferred_brew_method {
            self.preferred_brew_method = Some(method.clone());
        }
        if let Some(temperature) = patch.preferred_temperature_f {
            self.preferred_temperature_f = Some(temperature);
        }
    }
}

/// Partial update of a collection item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionItemPatch {
    pub status: Option<ItemStatus>,
    pub user_rating: Option<f32>,
    pub notes: Option<String>,
    pub tried_at: Option<DateTime<Utc>>,
    pub preferred_steep_time_seconds: Option<i64>,
    pub preferred_brew_method: Option<String>,
    pub preferred_temperature_f: Option<i64>,
}

/// Saved brewing preference for a tea.
///
/// A preference exists only once a steep time has been set; brew method or
/// temperature alone do not constitute one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteepSettings {
    pub steep_time_seconds: i64,
    pub brew_method: Option<String>,
    pub temperature_f: Option<i64>,
}

/// Local-mode item id: `local-<unix millis>`.
pub fn synthesize_local_id(now: DateTime<Utc>) -> String {
    format!("local-{}", now.timestamp_millis())
}
