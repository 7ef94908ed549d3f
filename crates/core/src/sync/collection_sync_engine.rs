//! Collection sync engine: mode-aware orchestration of the in-memory view,
//! the durable cache, and the remote store.

use chrono::Utc;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::collection::{
    CollectionItem, CollectionItemPatch, ItemStatus, SteepSettings, TeaSnapshot,
};
use crate::errors::{CollectionError, RemoteStoreError, Result};
use crate::sync::collection_cache::CollectionCache;
use crate::sync::id_resolver::resolve_tea_id;
use crate::sync::remote_store::{NewCollectionItem, RemoteCollectionStore};
use crate::sync::sync_mode::{resolve_sync_mode, IdentitySnapshot, SyncMode};

/// Options for [`CollectionSyncEngine::fetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Suppress the loading flag. Success and failure handling are unchanged.
    pub silent: bool,
}

impl FetchOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// What a [`CollectionSyncEngine::fetch`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Remote state replaced the view and re-primed the cache.
    Applied,
    /// Auth has not resolved yet; nothing was read or written.
    SkippedUnresolved,
    /// Local state is authoritative; there is nothing to fetch.
    SkippedLocalOnly,
    /// No user; the signed-out transition already cleared state.
    SkippedSignedOut,
    /// The remote read failed; the previous view was preserved.
    Failed,
}

/// Orchestrates the user's tea collection across the in-memory view, the
/// durable cache, and (in synced mode) the remote authoritative store.
///
/// In synced mode the remote store is the source of truth and every write is
/// followed by a full reconciling fetch — no optimistic patching, so
/// server-computed fields and concurrent sessions are always reflected. In
/// local-only mode the in-memory view, mirrored to the cache, is
/// authoritative.
pub struct CollectionSyncEngine {
    remote: Option<Arc<dyn RemoteCollectionStore>>,
    cache: CollectionCache,
    mode: Mutex<SyncMode>,
    items: Mutex<Vec<CollectionItem>>,
    loading: AtomicBool,
    revision: watch::Sender<u64>,
}

impl CollectionSyncEngine {
    /// A `None` remote means no backend is configured: the engine can only
    /// ever resolve to local-only mode.
    pub fn new(remote: Option<Arc<dyn RemoteCollectionStore>>, cache: CollectionCache) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            remote,
            cache,
            mode: Mutex::new(SyncMode::Unresolved),
            items: Mutex::new(Vec::new()),
            loading: AtomicBool::new(false),
            revision,
        }
    }

    pub fn backend_configured(&self) -> bool {
        self.remote.is_some()
    }

    /// Current operating mode.
    pub fn mode(&self) -> SyncMode {
        self.lock_mode().clone()
    }

    /// Snapshot of the in-memory collection view.
    pub fn items(&self) -> Vec<CollectionItem> {
        self.lock_items().clone()
    }

    /// True while a non-silent fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Change notifications: the receiver's value bumps on every committed
    /// state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Seed the view from the cache snapshot, if any. Called once at mount,
    /// before identity resolves, so the UI paints without waiting on the
    /// network.
    pub fn bootstrap_from_cache(&self) {
        let Some(cached) = self.cache.load() else {
            return;
        };
        info!("bootstrapped {} collection items from cache", cached.len());
        *self.lock_items() = cached;
        self.notify();
    }

    /// Re-derive the operating mode from fresh identity signals.
    ///
    /// Entering `SignedOut` is the only edge that clears the view and the
    /// cache; staying in `SignedOut` is a no-op by construction. Entering
    /// `Synced` runs a full authoritative fetch.
    pub async fn apply_identity(&self, identity: &IdentitySnapshot) -> SyncMode {
        let next = resolve_sync_mode(self.backend_configured(), identity);
        let previous = {
            let mut mode = self.lock_mode();
            std::mem::replace(&mut *mode, next.clone())
        };
        if previous == next {
            return next;
        }
        debug!("sync mode {:?} -> {:?}", previous, next);

        match &next {
            SyncMode::SignedOut => {
                self.lock_items().clear();
                self.cache.clear();
                self.notify();
            }
            SyncMode::Synced { .. } => {
                self.fetch(FetchOptions::default()).await;
            }
            SyncMode::Unresolved | SyncMode::LocalOnly => {}
        }
        next
    }

    /// Refresh the view from the remote store.
    ///
    /// Fail-soft: a failed read logs, keeps the previous view, and never
    /// clears anything. Concurrent fetches are allowed; the last response to
    /// resolve wins and fully replaces state.
    pub async fn fetch(&self, opts: FetchOptions) -> FetchOutcome {
        let user_id = match self.mode() {
            SyncMode::Unresolved => return FetchOutcome::SkippedUnresolved,
            SyncMode::LocalOnly => return FetchOutcome::SkippedLocalOnly,
            SyncMode::SignedOut => return FetchOutcome::SkippedSignedOut,
            SyncMode::Synced { user_id } => user_id,
        };
        let Some(remote) = self.remote.as_deref() else {
            // Synced mode implies a configured backend.
            warn!("fetch in synced mode without a remote store");
            return FetchOutcome::Failed;
        };

        if !opts.silent {
            self.loading.store(true, Ordering::SeqCst);
        }
        let outcome = match remote.list_items(&user_id).await {
            Ok(fetched) => {
                {
                    let mut items = self.lock_items();
                    *items = fetched;
                    self.cache.save(items.as_slice());
                }
                self.notify();
                FetchOutcome::Applied
            }
            Err(err) => {
                debug!("collection fetch failed, keeping previous view: {}", err);
                FetchOutcome::Failed
            }
        };
        if !opts.silent {
            self.loading.store(false, Ordering::SeqCst);
        }
        outcome
    }

    /// Add a tea to the collection, upserting on the `(user, tea)` pair.
    ///
    /// Non-canonical ids are resolved by display name first in synced mode;
    /// resolution failure surfaces before anything is written. Local-only
    /// mode accepts the id as-is and embeds `tea_hint` as the display
    /// snapshot.
    pub async fn add(
        &self,
        tea_id: &str,
        status: ItemStatus,
        tea_hint: Option<TeaSnapshot>,
    ) -> Result<()> {
        match self.mode() {
            SyncMode::LocalOnly => {
                let item = CollectionItem::new_local(tea_id, status, tea_hint);
                {
                    let mut items = self.lock_items();
                    items.retain(|existing| existing.tea_id != tea_id);
                    items.insert(0, item);
                    self.cache.save(items.as_slice());
                }
                self.notify();
                Ok(())
            }
            SyncMode::Synced { user_id } => {
                let remote = self.synced_remote()?;
                let canonical_id = resolve_tea_id(
                    remote,
                    tea_id,
                    tea_hint.as_ref().map(|hint| hint.name.as_str()),
                )
                .await?;
                remote
                    .upsert_item(&NewCollectionItem {
                        user_id,
                        tea_id: canonical_id,
                        status,
                    })
                    .await?;
                self.fetch(FetchOptions::default()).await;
                Ok(())
            }
            SyncMode::Unresolved | SyncMode::SignedOut => Err(CollectionError::AuthRequired),
        }
    }

    /// Remove a tea from the collection. Removing an absent tea is Ok.
    pub async fn remove(&self, tea_id: &str) -> Result<()> {
        match self.mode() {
            SyncMode::LocalOnly => {
                let changed = {
                    let mut items = self.lock_items();
                    let before = items.len();
                    items.retain(|item| item.tea_id != tea_id);
                    if items.len() != before {
                        self.cache.save(items.as_slice());
                        true
                    } else {
                        false
                    }
                };
                if changed {
                    self.notify();
                }
                Ok(())
            }
            SyncMode::Synced { user_id } => {
                let remote = self.synced_remote()?;
                remote.delete_item(&user_id, tea_id).await?;
                self.fetch(FetchOptions::default()).await;
                Ok(())
            }
            SyncMode::Unresolved | SyncMode::SignedOut => Err(CollectionError::AuthRequired),
        }
    }

    /// Merge fields onto the existing item for `tea_id`.
    pub async fn update(&self, tea_id: &str, patch: CollectionItemPatch) -> Result<()> {
        let patch = self.normalize_patch(tea_id, patch);
        match self.mode() {
            SyncMode::LocalOnly => {
                let changed = {
                    let mut items = self.lock_items();
                    let mut changed = false;
                    for item in items.iter_mut().filter(|item| item.tea_id == tea_id) {
                        item.apply_patch(&patch);
                        changed = true;
                    }
                    if changed {
                        self.cache.save(items.as_slice());
                    }
                    changed
                };
                if changed {
                    self.notify();
                }
                Ok(())
            }
            SyncMode::Synced { user_id } => {
                let remote = self.synced_remote()?;
                remote.update_item(&user_id, tea_id, &patch).await?;
                self.fetch(FetchOptions::default()).await;
                Ok(())
            }
            SyncMode::Unresolved | SyncMode::SignedOut => Err(CollectionError::AuthRequired),
        }
    }

    /// Rate a tea. Sugar over [`CollectionSyncEngine::update`] that marks it
    /// tried.
    pub async fn rate(&self, tea_id: &str, rating: f32) -> Result<()> {
        self.update(
            tea_id,
            CollectionItemPatch {
                user_rating: Some(rating),
                ..Default::default()
            },
        )
        .await
    }

    /// Save a brewing preference. Sugar over [`CollectionSyncEngine::update`].
    pub async fn set_preferred_steep_settings(
        &self,
        tea_id: &str,
        settings: SteepSettings,
    ) -> Result<()> {
        self.update(
            tea_id,
            CollectionItemPatch {
                preferred_steep_time_seconds: Some(settings.steep_time_seconds),
                preferred_brew_method: settings.brew_method,
                preferred_temperature_f: settings.temperature_f,
                ..Default::default()
            },
        )
        .await
    }

    /// Saved steep preference for a tea. `None` unless a steep time has ever
    /// been set — brew method or temperature alone do not count.
    pub fn get_preferred_steep_settings(&self, tea_id: &str) -> Option<SteepSettings> {
        let item = self.get_collection_item(tea_id)?;
        let steep_time_seconds = item.preferred_steep_time_seconds?;
        Some(SteepSettings {
            steep_time_seconds,
            brew_method: item.preferred_brew_method,
            temperature_f: item.preferred_temperature_f,
        })
    }

    pub fn is_in_collection(&self, tea_id: &str) -> bool {
        self.lock_items().iter().any(|item| item.tea_id == tea_id)
    }

    pub fn get_collection_item(&self, tea_id: &str) -> Option<CollectionItem> {
        self.lock_items()
            .iter()
            .find(|item| item.tea_id == tea_id)
            .cloned()
    }

    /// Implicit transitions: a rating marks the tea tried, and the first
    /// transition to tried stamps `tried_at`.
    fn normalize_patch(&self, tea_id: &str, mut patch: CollectionItemPatch) -> CollectionItemPatch {
        if let Some(rating) = patch.user_rating {
            patch.user_rating = Some(rating.clamp(0.0, 5.0));
            patch.status = Some(ItemStatus::Tried);
        }
        if patch.status == Some(ItemStatus::Tried) && patch.tried_at.is_none() {
            let already_tried = self
                .get_collection_item(tea_id)
                .and_then(|item| item.tried_at)
                .is_some();
            if !already_tried {
                patch.tried_at = Some(Utc::now());
            }
        }
        patch
    }

    fn synced_remote(&self) -> Result<&dyn RemoteCollectionStore> {
        self.remote
            .as_deref()
            .ok_or(CollectionError::Remote(RemoteStoreError::NotConfigured))
    }

    fn lock_items(&self) -> MutexGuard<'_, Vec<CollectionItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_mode(&self) -> MutexGuard<'_, SyncMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
