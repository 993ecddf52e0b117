pub mod adapter;
pub mod models;
pub mod store;

pub use adapter::{AuthAdapter, SessionAndUser};
pub use models::{Account, Document, EntityKind, Session, User, VerificationToken};
pub use store::{BaseProvider, DocumentStore, FetchOptions, FetchPage, Query, RawDocument};
