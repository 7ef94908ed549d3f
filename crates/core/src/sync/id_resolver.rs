//! Canonical identifier resolution for teas sourced outside the backend.

use log::debug;
use uuid::Uuid;

use crate::errors::CollectionError;
use crate::sync::remote_store::RemoteCollectionStore;

/// True when `tea_id` already uses the backend's identifier scheme
/// (hyphenated UUID).
pub fn is_canonical_tea_id(tea_id: &str) -> bool {
    tea_id.len() == 36 && Uuid::parse_str(tea_id).is_ok()
}

/// Map a tea id to the backend's canonical id.
///
/// Canonical ids pass through unchanged. Non-canonical ids (scraped or
/// bundled data) are matched against the backend by exact display name;
/// anything other than exactly one match fails resolution, and nothing is
/// written. Only called in synced mode — local-only mode accepts
/// non-canonical ids as-is.
pub async fn resolve_tea_id<R: RemoteCollectionStore + ?Sized>(
    remote: &R,
    tea_id: &str,
    name_hint: Option<&str>,
) -> Result<String, CollectionError> {
    if is_canonical_tea_id(tea_id) {
        return Ok(tea_id.to_string());
    }

    let Some(name) = name_hint.filter(|name| !name.trim().is_empty()) else {
        debug!("no name hint for non-canonical tea id {}", tea_id);
        return Err(CollectionError::Resolution {
            tea_id: tea_id.to_string(),
        });
    };

    match remote.find_tea_id_by_name(name).await? {
        Some(canonical_id) => {
            debug!("resolved tea id {} -> {}", tea_id, canonical_id);
            Ok(canonical_id)
        }
        None => Err(CollectionError::Resolution {
            tea_id: tea_id.to_string(),
        }),
    }
}
