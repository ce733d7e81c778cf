//! SQLite-backed named cache stores.
//!
//! A store is a named mapping from request identity (method + URL) to a
//! response snapshot. The worker keeps two stores per version (precache and
//! runtime); version rotation deletes every store that is not current.
//!
//! - Request identity hashed with SHA-256
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Deleting a store cascades to its entries

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use stores::StoreNames;
