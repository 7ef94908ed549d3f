//! Operating-mode derivation for the collection sync engine.

/// Identity signals read from the host app's auth provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentitySnapshot {
    pub user_id: Option<String>,
    pub auth_initialized: bool,
    pub dev_mode: bool,
}

/// Operating mode of the collection sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMode {
    /// Auth has not finished initializing. No fetch, no clear, no write.
    Unresolved,
    /// No backend configured, or developer mode: the device is authoritative.
    LocalOnly,
    /// Backend configured and a user is signed in: the remote store is authoritative.
    Synced { user_id: String },
    /// Backend configured, auth resolved, no user.
    SignedOut,
}

impl SyncMode {
    pub fn is_local_only(&self) -> bool {
        matches!(self, SyncMode::LocalOnly)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            SyncMode::Synced { user_id } => Some(user_id),
            _ => None,
        }
    }
}

/// Derive the operating mode from external signals.
///
/// Identity is ignored until `auth_initialized` is true: an unauthenticated
/// flash during app startup must not be mistaken for a signed-out user.
pub fn resolve_sync_mode(backend_configured: bool, identity: &IdentitySnapshot) -> SyncMode {
    if !backend_configured || identity.dev_mode {
        return SyncMode::LocalOnly;
    }
    if !identity.auth_initialized {
        return SyncMode::Unresolved;
    }
    match &identity.user_id {
        Some(user_id) => SyncMode::Synced {
            user_id: user_id.clone(),
        },
        None => SyncMode::SignedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(user_id: Option<&str>, auth_initialized: bool, dev_mode: bool) -> IdentitySnapshot {
        IdentitySnapshot {
            user_id: user_id.map(str::to_string),
            auth_initialized,
            dev_mode,
        }
    }

    #[test]
    fn unconfigured_backend_is_local_only_regardless_of_identity() {
        assert_eq!(
            resolve_sync_mode(false, &identity(Some("u1"), true, false)),
            SyncMode::LocalOnly
        );
        assert_eq!(
            resolve_sync_mode(false, &identity(None, false, false)),
            SyncMode::LocalOnly
        );
    }

    #[test]
    fn dev_mode_forces_local_only() {
        assert_eq!(
            resolve_sync_mode(true, &identity(Some("u1"), true, true)),
            SyncMode::LocalOnly
        );
    }

    #[test]
    fn uninitialized_auth_is_unresolved() {
        assert_eq!(
            resolve_sync_mode(true, &identity(None, false, false)),
            SyncMode::Unresolved
        );
        // A user id arriving before the initialized flag still waits.
        assert_eq!(
            resolve_sync_mode(true, &identity(Some("u1"), false, false)),
            SyncMode::Unresolved
        );
    }

    #[test]
    fn signed_in_user_syncs() {
        assert_eq!(
            resolve_sync_mode(true, &identity(Some("u1"), true, false)),
            SyncMode::Synced {
                user_id: "u1".to_string()
            }
        );
    }

    #[test]
    fn resolved_missing_user_is_signed_out() {
        assert_eq!(
            resolve_sync_mode(true, &identity(None, true, false)),
            SyncMode::SignedOut
        );
    }
}
