//! Request interception for swcache.
//!
//! This crate provides the network seam, request routing, the caching
//! strategies with their offline fallbacks, and the event-driven worker
//! that ties them to the versioned stores in `swcache-core`.

pub mod fetch;
pub mod offline;
pub mod route;
pub mod router;
pub mod strategy;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Network};
pub use offline::{OfflinePolicy, PlaceholderKind};
pub use route::{Matcher, Route, RouteRule, RouteTable, Strategy};
pub use router::{Intercept, Router};
pub use strategy::{ResponseSource, Served, StrategyContext};
pub use worker::{
    ActivateReport, AssetManifest, Command, EventKind, EventOutcome, HandlerTable, InstallReport, LifecycleState,
    MessageReply, Notification, PushPayload, SkipWaiting, Worker, WorkerContext, WorkerEvent,
};
