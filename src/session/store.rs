//! Scoped key/value store — one namespace per onboarding session.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::session::identity::SessionIdentity;

/// Namespace partitioning session state by lifetime/ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Single-turn scratch data.
    Temp,
    /// Collected answers, durable for the session.
    User,
    /// Cached schema snapshot for the session.
    App,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::User => "user",
            Self::App => "app",
        }
    }

    /// Flattened `scope:key` form used at the store boundary.
    pub fn scoped_key(&self, short: &str) -> String {
        format!("{}:{}", self.as_str(), short)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-session scoped key/value storage.
///
/// Writes are visible to subsequent reads immediately, and a `set_many` is
/// all-or-nothing. The in-memory implementation is the core's contract;
/// durable backends can layer underneath the same interface.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read one value, or `None` if the key was never written.
    async fn get(&self, session: &SessionIdentity, scope: Scope, key: &str) -> Option<Value>;

    /// Write a batch of values into one scope, echoing what was written
    /// under flattened `scope:key` names.
    async fn set_many(
        &self,
        session: &SessionIdentity,
        scope: Scope,
        entries: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, StoreError>;

    /// Discard a session's entire namespace.
    async fn remove_session(&self, session: &SessionIdentity);
}

type ScopeMap = HashMap<Scope, HashMap<String, Value>>;

/// In-memory session store.
///
/// A single write lock serializes writes per process, which also gives the
/// within-one-session write ordering the callers rely on.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionIdentity, ScopeMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session: &SessionIdentity, scope: Scope, key: &str) -> Option<Value> {
        self.sessions
            .read()
            .await
            .get(session)
            .and_then(|scopes| scopes.get(&scope))
            .and_then(|values| values.get(key))
            .cloned()
    }

    async fn set_many(
        &self,
        session: &SessionIdentity,
        scope: Scope,
        entries: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let mut sessions = self.sessions.write().await;
        let values = sessions
            .entry(*session)
            .or_default()
            .entry(scope)
            .or_default();

        let mut written = BTreeMap::new();
        for (key, value) in entries {
            written.insert(scope.scoped_key(&key), value.clone());
            values.insert(key, value);
        }
        Ok(written)
    }

    async fn remove_session(&self, session: &SessionIdentity) {
        self.sessions.write().await.remove(session);
    }
}
