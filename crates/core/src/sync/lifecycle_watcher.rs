//! Foreground-transition watcher that silently refreshes the collection.

use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::sync::collection_sync_engine::{CollectionSyncEngine, FetchOptions};

/// Host application lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycleEvent {
    Active,
    Background,
}

/// Minimum spacing between resume-triggered refreshes, in seconds.
pub const FOREGROUND_REFRESH_DEBOUNCE_SECS: u64 = 5;

/// Watches the host app's lifecycle signal and silently re-fetches on a
/// `Background -> Active` transition, picking up changes made elsewhere
/// (another device, another session). Nothing happens on `Active ->
/// Background`.
pub struct LifecycleWatcher {
    handle: JoinHandle<()>,
}

impl LifecycleWatcher {
    pub fn spawn(
        engine: Arc<CollectionSyncEngine>,
        mut events: broadcast::Receiver<AppLifecycleEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut in_background = false;
            let mut last_refresh: Option<Instant> = None;
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("lifecycle watcher lagged by {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                match event {
                    AppLifecycleEvent::Background => in_background = true,
                    AppLifecycleEvent::Active => {
                        if !in_background {
                            continue;
                        }
                        in_background = false;
                        let debounced = last_refresh.is_some_and(|at| {
                            at.elapsed() < Duration::from_secs(FOREGROUND_REFRESH_DEBOUNCE_SECS)
                        });
                        if debounced {
                            debug!("skipping resume refresh inside debounce window");
                            continue;
                        }
                        last_refresh = Some(Instant::now());
                        engine.fetch(FetchOptions::silent()).await;
                    }
                }
            }
        });
        Self { handle }
    }

    /// Stop watching. Any in-flight refresh is aborted with the task.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for LifecycleWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
