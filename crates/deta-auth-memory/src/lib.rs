// deta-auth-memory — In-memory document store for deta-auth.
//
// Keeps each collection in an ordered map and serves scans in pages, so the
// adapter's scan loop runs against the same pagination shape as the hosted
// store. Meant for tests and local development.

pub mod store;

pub use store::{MemoryBase, MemoryDeta, DEFAULT_SCAN_WINDOW};
