// deta-auth — auth framework storage adapter for Deta Base style stores.
//
// The store offers point lookups by key and paginated equality scans, nothing
// else. `Collection` turns a scan into a first-match lookup and normalizes
// documents at the boundary; `DetaAdapter` composes four collections into the
// framework's storage contract. `deta` is the HTTP client for the hosted store.

pub mod adapter;
pub mod collection;
pub mod config;
pub mod deta;
pub mod normalize;

pub use adapter::DetaAdapter;
pub use collection::Collection;
pub use config::{AdapterConfig, CollectionNames, DetaConfig};
pub use deta::{DetaBase, DetaClient};

pub use deta_auth_core::{AdapterResult, AuthAdapter, SessionAndUser, StoreError};
