//! In-process network stand-in for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use swcache_core::{Error, Request, Response};

use super::Network;

/// Serves canned responses by URL and records every call.
///
/// Unknown URLs answer 404. With `offline` set, every fetch fails as a
/// transport error.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn offline() -> Self {
        let stub = Self::default();
        stub.set_offline(true);
        stub
    }

    pub(crate) fn with(self, url: &str, response: Response) -> Self {
        self.serve(url, response);
        self
    }

    pub(crate) fn serve(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.cache_url();
        self.calls.lock().unwrap().push(url.clone());

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {url}")));
        }

        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Response::with_content(404, "text/plain", "Not Found")))
    }
}
