//! Error types shared across the collection crates.

use thiserror::Error;

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors surfaced to callers of the sync engine's mutation operations.
///
/// Remote *read* failures never appear here: fetches are fail-soft and keep
/// the previous view. Writes surface as `Err` values so the UI can decide
/// whether to alert the user; nothing panics across the component boundary.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Mutation attempted without a signed-in user while a backend is configured.
    #[error("sign in to manage your collection")]
    AuthRequired,

    /// A non-canonical tea id could not be matched to a backend tea.
    #[error("could not find this tea in the backend; try refreshing")]
    Resolution { tea_id: String },

    /// A remote write failed; the collection is unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteStoreError),
}

/// Transport-agnostic remote store failure, produced by implementations of
/// [`crate::sync::RemoteCollectionStore`].
#[derive(Debug, Clone, Error)]
pub enum RemoteStoreError {
    /// Network-level failure (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// Error response from the backend.
    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered with a body we could not decode.
    #[error("failed to decode backend response: {0}")]
    Decode(String),

    /// No remote backend is configured.
    #[error("no remote backend is configured")]
    NotConfigured,
}

/// Local persistent store failure. The cache layer absorbs these; they are
/// logged and never reach the UI.
#[derive(Debug, Error)]
#[error("local store error: {0}")]
pub struct LocalStoreError(String);

impl LocalStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
