//! Session identity and per-session scoped state.

pub mod identity;
pub mod store;

pub use identity::{SessionIdentity, SessionManager};
pub use store::{MemoryStore, Scope, SessionStore};
