//! Cache inspection MCP tools.
//!
//! These read the stores directly and never run a strategy.

pub mod get;
pub mod list;

pub use get::{CacheGetParams, get_impl};
pub use list::list_impl;
