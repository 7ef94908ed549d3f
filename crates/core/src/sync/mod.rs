//! Collection sync domain: operating mode, cache, identifier resolution,
//! the sync engine, and the lifecycle watcher.

mod collection_cache;
mod collection_sync_engine;
mod id_resolver;
mod lifecycle_watcher;
mod remote_store;
mod sync_mode;

pub use collection_cache::*;
pub use collection_sync_engine::*;
pub use id_resolver::*;
pub use lifecycle_watcher::*;
pub use remote_store::*;
pub use sync_mode::*;
