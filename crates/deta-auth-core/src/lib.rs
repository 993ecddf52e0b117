#![doc = include_str!("../README.md")]

pub mod db;
pub mod env;
pub mod error;
pub mod utils;

// Re-exports for convenience
pub use db::adapter::{AuthAdapter, SessionAndUser};
pub use db::models::{
    Account, Document, EntityKind, NewAccount, NewSession, NewUser, NewVerificationToken,
    Session, SessionPatch, User, UserPatch, VerificationToken,
};
pub use db::store::{BaseProvider, DocumentStore, FetchOptions, FetchPage, Query, RawDocument};
pub use error::{AdapterResult, StoreError};
