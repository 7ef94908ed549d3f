//! Remote store contract consumed by the sync engine.

use async_trait::async_trait;

use crate::collection::{CollectionItem, CollectionItemPatch, ItemStatus};
use crate::errors::RemoteStoreError;

/// Insert payload for a remote upsert keyed on `(user_id, tea_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCollectionItem {
    pub user_id: String,
    pub tea_id: String,
    pub status: ItemStatus,
}

/// Table-like capability over the backend's `collection_items` resource,
/// plus the tea lookup used for identifier resolution.
///
/// Implementations own transport and wire-shape normalization; the engine
/// only ever sees domain types.
#[async_trait]
pub trait RemoteCollectionStore: Send + Sync {
    /// All items owned by `user_id`, ordered by `added_at` descending.
    async fn list_items(&self, user_id: &str) -> Result<Vec<CollectionItem>, RemoteStoreError>;

    /// Upsert on the `(user_id, tea_id)` conflict key.
    async fn upsert_item(&self, item: &NewCollectionItem) -> Result<(), RemoteStoreError>;

    /// Partial update of the row keyed by `(user_id, tea_id)`.
    async fn update_item(
        &self,
        user_id: &str,
        tea_id: &str,
        patch: &CollectionItemPatch,
    ) -> Result<(), RemoteStoreError>;

    /// Delete the row keyed by `(user_id, tea_id)`. Deleting an absent row is Ok.
    async fn delete_item(&self, user_id: &str, tea_id: &str) -> Result<(), RemoteStoreError>;

    /// Canonical id of the tea whose display name equals `name`, if exactly
    /// one row matches.
    async fn find_tea_id_by_name(&self, name: &str) -> Result<Option<String>, RemoteStoreError>;
}
