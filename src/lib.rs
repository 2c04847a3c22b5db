//! PeerFlow client session layer.
//!
//! ARCHITECTURE
//! ============
//! `session::SessionStore` owns credentials, the signed-in user and the
//! cached assignment entities, persisting the session through a
//! `storage::SessionStorage`. `guard::RouteGuard` decides every navigation
//! from the store's authentication predicate. `api::ApiClient` is the only
//! code that talks to the network.

pub mod api;
pub mod config;
pub mod guard;
pub mod model;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use guard::{Navigation, RouteGuard};
pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, SessionStorage};
