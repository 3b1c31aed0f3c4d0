//! In-memory test doubles for the ports.
//!
//! Compiled for this crate's own tests and, with the `testing` feature,
//! for downstream test suites.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use warden_domain::Route;

use crate::ports::{
    Clock, HttpMethod, HttpRequest, HttpResponse, HttpTransport, KeyValueStorage, Navigator,
    TransportError,
};

/// `KeyValueStorage` backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// A navigation observed by [`RecordingNavigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Route(Route),
    Redirect(String),
}

/// `Navigator` that records every call.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<Navigation>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<Navigation> {
        self.history.lock().clone()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.history
            .lock()
            .iter()
            .filter_map(|navigation| match navigation {
                Navigation::Route(route) => Some(route.clone()),
                Navigation::Redirect(_) => None,
            })
            .collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        self.history.lock().push(Navigation::Route(route.clone()));
    }

    fn redirect(&self, url: &str) {
        self.history.lock().push(Navigation::Redirect(url.to_string()));
    }
}

/// `Clock` that returns a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

type Scripted = Result<HttpResponse, TransportError>;

/// `HttpTransport` answering from per-route scripts.
///
/// Each `(method, path)` has a queue of answers; the last answer repeats.
/// A route can be held behind a gate so tests control when it completes.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<(HttpMethod, String), VecDeque<Scripted>>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: HttpMethod, path: &str, response: HttpResponse) {
        self.push(method, path, Ok(response));
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) {
        self.push(method, path, Err(error));
    }

    /// Holds requests to `path` until a permit is added to the returned gate.
    #[must_use]
    pub fn hold(&self, path: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().insert(path.to_string(), gate.clone());
        gate
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|request| request.path == path)
            .cloned()
            .collect()
    }

    fn push(&self, method: HttpMethod, path: &str, answer: Scripted) {
        self.scripts
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(answer);
    }

    fn next_answer(&self, request: &HttpRequest) -> Scripted {
        let mut scripts = self.scripts.lock();
        let Some(queue) = scripts.get_mut(&(request.method, request.path.clone())) else {
            return Err(TransportError::ConnectionFailed(format!(
                "no scripted response for {} {}",
                request.method.as_str(),
                request.path
            )));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or_else(|| Err(TransportError::Timeout))
        } else {
            queue.front().cloned().unwrap_or(Err(TransportError::Timeout))
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request.clone());

        let gate = self.gates.lock().get(&request.path).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        } else {
            tokio::task::yield_now().await;
        }

        self.next_answer(&request)
    }
}
