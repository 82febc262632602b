//! Surge pricing backend library.
//!
//! Exposes the stream-processing core, store client, query layer, and Read
//! API router for use by the `surge-pricing` binary and by tests.

pub mod api;
pub mod config;
pub mod error;
pub mod h3_index;
pub mod metrics;
pub mod models;
pub mod persist;
pub mod producer;
pub mod query;
pub mod store;
pub mod stream;

pub use config::Config;
pub use store::Store;

/// Shared state handed to every Read API handler.
pub struct AppState {
    pub store: Store,
    pub config: Config,
}
