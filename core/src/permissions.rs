//! Read-only permission context handed to screens.
//!
//! `AuthSession` is the only owner of mutable auth state. Screens are given an
//! `Arc<PermissionSnapshot>` when they mount and only ever read it, so logging
//! out replaces the session's snapshot without touching mounted screens.
//! None of this is enforcement; the server decides.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Granted permissions as `"<resource>.<action>"` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSnapshot {
    granted: BTreeSet<String>,
}

impl PermissionSnapshot {
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: granted.into_iter().map(Into::into).collect(),
        }
    }

    /// A snapshot that grants nothing.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn allows(&self, resource: &str, action: Action) -> bool {
        self.granted
            .contains(&format!("{resource}.{}", action.as_str()))
    }
}

/// Process-level login state with an explicit init/teardown lifecycle.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: Option<String>,
    snapshot: Option<Arc<PermissionSnapshot>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, token: impl Into<String>, permissions: PermissionSnapshot) {
        info!(granted = permissions.granted.len(), "session started");
        self.token = Some(token.into());
        self.snapshot = Some(Arc::new(permissions));
    }

    pub fn logout(&mut self) {
        if self.token.take().is_some() {
            info!("session ended");
        }
        self.snapshot = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Snapshot for a screen about to mount; empty when logged out.
    pub fn snapshot(&self) -> Arc<PermissionSnapshot> {
        self.snapshot.clone().unwrap_or_else(PermissionSnapshot::empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_matches_resource_and_action() {
        let perms = PermissionSnapshot::new(["locations.view", "locations.create"]);
        assert!(perms.allows("locations", Action::Create));
        assert!(!perms.allows("locations", Action::Delete));
        assert!(!perms.allows("faqs", Action::View));
    }

    #[test]
    fn logout_does_not_touch_handed_out_snapshots() {
        let mut session = AuthSession::new();
        session.login("token-1", PermissionSnapshot::new(["faqs.update"]));
        let held = session.snapshot();
        session.logout();
        assert!(!session.is_authenticated());
        assert!(held.allows("faqs", Action::Update));
        assert!(!session.snapshot().allows("faqs", Action::Update));
    }

    #[test]
    fn logged_out_session_grants_nothing() {
        let session = AuthSession::new();
        assert_eq!(session.token(), None);
        assert!(!session.snapshot().allows("locations", Action::View));
    }
}
