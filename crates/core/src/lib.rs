//! Core domain models and the collection synchronization engine.
//!
//! The engine reconciles three surfaces: the in-memory collection view, a
//! durable local cache, and a remote authoritative store. Remote and local
//! persistence are injected behind traits so hosts (and tests) choose the
//! backing; `caddy-remote` and `caddy-storage-sqlite` provide the production
//! implementations.

pub mod collection;
pub mod errors;
pub mod sync;
