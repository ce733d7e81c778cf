//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Request/response model shared by the router and the host
//! - Named cache stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CachedEntry, StoreNames};
pub use config::{AppConfig, ConfigError, NotificationConfig};
pub use error::Error;
pub use http::{Destination, Request, RequestMode, Response};
