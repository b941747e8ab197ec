//! Session identity minting and tracking.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::schema::Schema;
use crate::session::store::SessionStore;

/// Opaque token identifying one onboarding conversation.
///
/// UUIDv4, so unguessable. Exactly one per entry-page visit; every chat turn
/// within that visit reuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIdentity(Uuid);

impl SessionIdentity {
    /// Mint a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cookie token back into an identity.
    pub fn parse(token: &str) -> Option<Self> {
        Uuid::parse_str(token).ok().map(Self)
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SessionEntry {
    /// Schema snapshot cached at entry-page load, read by /api/register.
    schema: Schema,
    last_seen: Instant,
}

/// Tracks live session identities and their cached schema snapshots.
///
/// Owns the lifecycle: minting on entry-page visits, lazy creation for API
/// calls that arrive without a live session, and pruning idle sessions
/// (which also tears down the matching store namespace).
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionIdentity, SessionEntry>>,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Mint a brand-new identity with a schema snapshot (entry-page visit).
    pub async fn mint(&self, schema: Schema) -> SessionIdentity {
        let identity = SessionIdentity::new();
        self.sessions.write().await.insert(
            identity,
            SessionEntry {
                schema,
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(session = %identity, "Minted session");
        identity
    }

    /// Retire a superseded identity (page reload replaces the old session).
    pub async fn retire(&self, identity: &SessionIdentity) {
        if self.sessions.write().await.remove(identity).is_some() {
            self.store.remove_session(identity).await;
            tracing::debug!(session = %identity, "Retired session");
        }
    }

    /// Resolve an identity from a cookie token, creating one lazily if the
    /// token is absent or no longer live. Returns the identity and whether
    /// it was freshly minted (so the caller can set the cookie).
    pub async fn current_or_mint(&self, token: Option<&str>) -> (SessionIdentity, bool) {
        if let Some(identity) = token.and_then(SessionIdentity::parse) {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get_mut(&identity) {
                entry.last_seen = Instant::now();
                return (identity, false);
            }
        }
        (self.mint(Schema::new()).await, true)
    }

    /// Schema snapshot cached for a session, if any.
    pub async fn schema_snapshot(&self, identity: &SessionIdentity) -> Option<Schema> {
        self.sessions
            .read()
            .await
            .get(identity)
            .map(|entry| entry.schema.clone())
    }

    /// Remove sessions idle longer than `idle_timeout`; returns how many.
    pub async fn prune_stale(&self, idle_timeout: Duration) -> usize {
        let stale: Vec<SessionIdentity> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(_, entry)| entry.last_seen.elapsed() > idle_timeout)
                .map(|(id, _)| *id)
                .collect()
        };
        for identity in &stale {
            self.retire(identity).await;
        }
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Pruned stale sessions");
        }
        stale.len()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
