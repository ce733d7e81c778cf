//! The worker: an explicit table from event kind to handler.
//!
//! The table is built once at start-up. Handlers are plain functions that
//! receive the [`WorkerContext`] (which owns the store handles) and the
//! event; nothing is captured from ambient state.
//!
//! Dispatch absorbs every failure: handler errors and panics are logged and
//! turned into [`EventOutcome::Failed`], so no event can take the worker
//! down.

pub mod lifecycle;
pub mod message;
pub mod notify;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use swcache_core::{AppConfig, CacheDb, Error, NotificationConfig, Request, StoreNames};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::Network;
use crate::router::{Intercept, Router};

pub use lifecycle::{ActivateReport, AssetManifest, InstallReport, LifecycleState, SkipWaiting};
pub use message::{Command, MessageReply};
pub use notify::{Notification, PushPayload};

/// Kinds of events the host can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
    Sync,
    PeriodicSync,
    Push,
    NotificationClick,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Install,
        EventKind::Activate,
        EventKind::Fetch,
        EventKind::Message,
        EventKind::Sync,
        EventKind::PeriodicSync,
        EventKind::Push,
        EventKind::NotificationClick,
    ];
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message(Command),
    Sync { tag: String },
    PeriodicSync { tag: String },
    /// Raw push payload, if any.
    Push { payload: Option<String> },
    /// Target URL carried by the clicked notification.
    NotificationClick { url: Option<String> },
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Message(_) => EventKind::Message,
            WorkerEvent::Sync { .. } => EventKind::Sync,
            WorkerEvent::PeriodicSync { .. } => EventKind::PeriodicSync,
            WorkerEvent::Push { .. } => EventKind::Push,
            WorkerEvent::NotificationClick { .. } => EventKind::NotificationClick,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Responded(Intercept),
    Replied(MessageReply),
    Notify(Notification),
    OpenWindow { url: String },
    /// Handled with nothing to report.
    Ignored,
    Failed { reason: String },
}

/// Everything a handler may touch, passed explicitly.
pub struct WorkerContext {
    pub cache: CacheDb,
    pub stores: StoreNames,
    pub network: Arc<dyn Network>,
    pub router: Router,
    pub origin: Url,
    pub manifest: AssetManifest,
    pub version: String,
    pub notification: NotificationConfig,
    state: RwLock<LifecycleState>,
    /// Skip-waiting requested while installing.
    skip_pending: AtomicBool,
}

impl WorkerContext {
    pub fn from_config(config: &AppConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        let manifest = AssetManifest::from_config(config, &origin)?;
        let router = Router::from_config(config, cache.clone(), network.clone())?;

        Ok(Self {
            cache,
            stores: config.store_names(),
            network,
            router,
            origin,
            manifest,
            version: config.version.clone(),
            notification: config.notification.clone(),
            state: RwLock::new(LifecycleState::Parsed),
            skip_pending: AtomicBool::new(false),
        })
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    pub(crate) async fn set_state(&self, state: LifecycleState) {
        let mut current = self.state.write().await;
        Self::transition(&mut current, state);
    }

    fn transition(current: &mut LifecycleState, state: LifecycleState) {
        tracing::debug!(from = ?*current, to = ?state, "lifecycle transition");
        *current = state;
    }

    /// Note a skip-waiting request and return the state it arrived in. The
    /// request is kept only while installing; the state lock orders it
    /// against [`Self::finish_install`].
    pub(crate) async fn request_skip_waiting(&self) -> LifecycleState {
        let current = self.state.read().await;
        if *current == LifecycleState::Installing {
            self.skip_pending.store(true, Ordering::SeqCst);
        }
        *current
    }

    /// Enter `Installed`. Returns whether skip-waiting was requested during
    /// the install.
    pub(crate) async fn finish_install(&self) -> bool {
        let mut current = self.state.write().await;
        Self::transition(&mut current, LifecycleState::Installed);
        self.skip_pending.swap(false, Ordering::SeqCst)
    }

    /// Back to `Parsed` after a failed install, dropping any pending skip.
    pub(crate) async fn abort_install(&self) {
        let mut current = self.state.write().await;
        Self::transition(&mut current, LifecycleState::Parsed);
        self.skip_pending.store(false, Ordering::SeqCst);
    }
}

pub type Handler = for<'a> fn(&'a WorkerContext, WorkerEvent) -> BoxFuture<'a, Result<EventOutcome, Error>>;

/// Event kind to handler mapping.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<EventKind, Handler>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every event kind wired to its standard handler.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(EventKind::Install, on_install);
        table.register(EventKind::Activate, on_activate);
        table.register(EventKind::Fetch, on_fetch);
        table.register(EventKind::Message, on_message);
        table.register(EventKind::Sync, on_sync);
        table.register(EventKind::PeriodicSync, on_sync);
        table.register(EventKind::Push, on_push);
        table.register(EventKind::NotificationClick, on_notification_click);
        table
    }

    /// Register a handler, returning the one it replaced.
    pub fn register(&mut self, kind: EventKind, handler: Handler) -> Option<Handler> {
        self.handlers.insert(kind, handler)
    }

    pub fn get(&self, kind: EventKind) -> Option<Handler> {
        self.handlers.get(&kind).copied()
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

fn unexpected(expected: EventKind, event: &WorkerEvent) -> Error {
    Error::InvalidInput(format!("{expected:?} handler received {:?} event", event.kind()))
}

fn on_install(ctx: &WorkerContext, _event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move { Ok(EventOutcome::Installed(lifecycle::install(ctx).await?)) }.boxed()
}

fn on_activate(ctx: &WorkerContext, _event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move { Ok(EventOutcome::Activated(lifecycle::activate(ctx).await?)) }.boxed()
}

fn on_fetch(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move {
        let request = match event {
            WorkerEvent::Fetch(request) => request,
            other => return Err(unexpected(EventKind::Fetch, &other)),
        };
        Ok(EventOutcome::Responded(ctx.router.handle(&request).await))
    }
    .boxed()
}

fn on_message(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move {
        let command = match event {
            WorkerEvent::Message(command) => command,
            other => return Err(unexpected(EventKind::Message, &other)),
        };
        Ok(EventOutcome::Replied(message::handle(ctx, command).await?))
    }
    .boxed()
}

fn on_sync(_ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move {
        match event {
            WorkerEvent::Sync { tag } => tracing::info!(tag = %tag, "background sync"),
            WorkerEvent::PeriodicSync { tag } => tracing::info!(tag = %tag, "periodic sync"),
            other => return Err(unexpected(EventKind::Sync, &other)),
        }
        Ok(EventOutcome::Ignored)
    }
    .boxed()
}

fn on_push(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move {
        let payload = match event {
            WorkerEvent::Push { payload } => payload,
            other => return Err(unexpected(EventKind::Push, &other)),
        };
        let payload = PushPayload::parse(payload.as_deref());
        Ok(EventOutcome::Notify(notify::build(&ctx.notification, &ctx.origin, payload)))
    }
    .boxed()
}

fn on_notification_click(ctx: &WorkerContext, event: WorkerEvent) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    async move {
        let url = match event {
            WorkerEvent::NotificationClick { url } => url,
            other => return Err(unexpected(EventKind::NotificationClick, &other)),
        };
        Ok(EventOutcome::OpenWindow { url: notify::click_target(&ctx.origin, url.as_deref()) })
    }
    .boxed()
}

/// The worker: context plus handler table.
pub struct Worker {
    ctx: WorkerContext,
    handlers: HandlerTable,
}

impl Worker {
    pub fn new(ctx: WorkerContext, handlers: HandlerTable) -> Self {
        Self { ctx, handlers }
    }

    /// Standard worker for a configuration.
    pub fn from_config(config: &AppConfig, cache: CacheDb, network: Arc<dyn Network>) -> Result<Self, Error> {
        Ok(Self::new(WorkerContext::from_config(config, cache, network)?, HandlerTable::standard()))
    }

    pub fn context(&self) -> &WorkerContext {
        &self.ctx
    }

    /// Deliver one event. Never fails and never panics.
    pub async fn dispatch(&self, event: WorkerEvent) -> EventOutcome {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(kind) else {
            tracing::debug!(event = ?kind, "no handler registered");
            return EventOutcome::Ignored;
        };

        match AssertUnwindSafe(handler(&self.ctx, event)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(event = ?kind, error = %e, "event handler failed");
                EventOutcome::Failed { reason: e.to_string() }
            }
            Err(_) => {
                tracing::error!(event = ?kind, "event handler panicked");
                EventOutcome::Failed { reason: format!("{kind:?} handler panicked") }
            }
        }
    }

    /// Deliver a fetch event and return the interception result.
    ///
    /// A failed fetch handler degrades to passthrough so the host can still
    /// try the network.
    pub async fn fetch(&self, request: Request) -> Intercept {
        match self.dispatch(WorkerEvent::Fetch(request)).await {
            EventOutcome::Responded(intercept) => intercept,
            _ => Intercept::Passthrough,
        }
    }
}
