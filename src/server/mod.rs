//! HTTP surface for the onboarding service.

pub mod routes;

pub use routes::{AppState, router};
