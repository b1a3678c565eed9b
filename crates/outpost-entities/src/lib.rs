//! Clients for the console's remote entity store.

pub mod factory;
pub mod interface;
pub mod memory;
pub mod predicate;
pub mod rest;

pub use factory::{
    build_client, resolve_client_kind, supported_client_keys, ClientSettings,
};
pub use interface::{EntityClient, EntityClientError, EntityClientKind, SortKey};
pub use memory::InMemoryEntityClient;
pub use predicate::EntityPredicate;
pub use rest::{RestClientConfig, RestEntityClient};
