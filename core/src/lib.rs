//! Client-side store for the QuestLog todo service.
//!
//! # Overview
//! Holds the signed-in user, the todo collection and the statistics derived
//! from it, and mediates every mutation through the REST backend.
//!
//! # Design
//! - `ApiClient` is stateless: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`.
//! - A `Transport` executes requests; `ReqwestTransport` is the network one.
//! - `TokenStore` persists the bearer token across restarts.
//! - `Store` owns session and todos, is constructed explicitly and passed to
//!   whatever renders it.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod store;
pub mod token_store;
pub mod transport;
pub mod types;
pub mod views;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{Session, SessionStatus};
pub use store::Store;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AuthResponse, Badge, Category, Credentials, LeaderboardEntry, NewTodo, Priority, Progress,
    Todo, TodoChanges, TodoPatch, User,
};
pub use views::{Stats, TodoList};

/// A store wired to the network and to on-disk token storage, configured
/// from the environment.
pub fn default_store() -> Store<ReqwestTransport, FileTokenStore> {
    let config = ClientConfig::from_env();
    Store::new(
        ApiClient::new(&config.api_url),
        ReqwestTransport::new(),
        FileTokenStore::default_location(),
    )
}
