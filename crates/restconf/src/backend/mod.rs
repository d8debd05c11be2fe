//! Transport trait and implementations.
//!
//! [`http::HttpTransport`] talks to real devices over HTTPS. [`MockTransport`]
//! keeps everything in memory and records every attempt, for tests:
//!
//! ```
//! use restconf::backend::{MockOutcome, MockTransport, Transport};
//! use restconf::Request;
//!
//! let mock = MockTransport::new();
//! mock.script("leaf1", [MockOutcome::Busy]);
//!
//! let req = Request::delete("/data/x");
//! assert!(mock.send("leaf1", &req).is_err());
//! assert!(mock.send("leaf1", &req).is_ok());
//! assert_eq!(mock.calls_to("leaf1").len(), 2);
//! ```

pub mod http;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::types::{Method, Request};

/// Executes a single request attempt against one host.
///
/// Implementations perform exactly one network exchange; retrying is the
/// session's job.
pub trait Transport: Send + Sync {
    /// Send `request` to `host`.
    ///
    /// Returns the response body for fetch requests, `None` otherwise.
    fn send(&self, host: &str, request: &Request) -> Result<Option<String>>;
}

/// One attempt seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Target host.
    pub host: String,
    /// Request method.
    pub method: Method,
    /// Resource path.
    pub path: String,
    /// Payload, for patch/replace.
    pub payload: Option<String>,
}

/// Scripted result for the next attempt against a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Succeed, returning this body for fetch requests.
    Respond(String),
    /// Answer with the busy status.
    Busy,
    /// Answer with another HTTP status.
    Status(u16),
    /// Fail before any response arrives.
    Unreachable(String),
}

/// In-memory transport for testing without network access.
///
/// Cloning shares state, so a test can keep a handle while a session owns
/// the boxed transport.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    scripts: Arc<Mutex<HashMap<String, VecDeque<MockOutcome>>>>,
    bodies: Arc<Mutex<HashMap<(String, String), String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Create a transport where every request succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for the next attempts against `host`.
    ///
    /// Once the queue drains, requests succeed.
    pub fn script(&self, host: &str, outcomes: impl IntoIterator<Item = MockOutcome>) {
        lock(&self.scripts)
            .entry(host.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Answer busy `count` times on `host` before succeeding.
    pub fn busy_then_ok(&self, host: &str, count: usize) {
        self.script(host, std::iter::repeat_n(MockOutcome::Busy, count));
    }

    /// Body returned by fetches of `path` on `host` once the script is drained.
    pub fn set_body(&self, host: &str, path: impl AsRef<str>, body: impl Into<String>) {
        lock(&self.bodies).insert((host.to_string(), path.as_ref().to_string()), body.into());
    }

    /// Every attempt so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Attempts against `host`, in order.
    #[must_use]
    pub fn calls_to(&self, host: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.host == host)
            .cloned()
            .collect()
    }

    /// Hosts in the order they were first contacted.
    #[must_use]
    pub fn hosts_contacted(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        for call in lock(&self.calls).iter() {
            if !hosts.contains(&call.host) {
                hosts.push(call.host.clone());
            }
        }
        hosts
    }
}

impl Transport for MockTransport {
    fn send(&self, host: &str, request: &Request) -> Result<Option<String>> {
        lock(&self.calls).push(RecordedCall {
            host: host.to_string(),
            method: request.method,
            path: request.path.clone(),
            payload: request.payload.clone(),
        });

        let scripted = lock(&self.scripts)
            .get_mut(host)
            .and_then(VecDeque::pop_front);

        let body = match scripted {
            Some(MockOutcome::Respond(body)) => body,
            Some(MockOutcome::Busy) => {
                return Err(Error::Busy {
                    host: host.to_string(),
                    path: request.path.clone(),
                });
            }
            Some(MockOutcome::Status(status)) => {
                return Err(Error::Http {
                    host: host.to_string(),
                    method: request.method,
                    path: request.path.clone(),
                    status,
                });
            }
            Some(MockOutcome::Unreachable(message)) => {
                return Err(Error::Transport {
                    host: host.to_string(),
                    method: request.method,
                    path: request.path.clone(),
                    message,
                });
            }
            None => lock(&self.bodies)
                .get(&(host.to_string(), request.path.clone()))
                .cloned()
                .unwrap_or_default(),
        };

        Ok((request.method == Method::Fetch).then_some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_defaults_to_success() {
        let mock = MockTransport::new();
        let result = mock.send("spine1", &Request::patch("/data/x", "{}")).unwrap();
        assert_eq!(result, None);
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn test_mock_transport_fetch_body() {
        let mock = MockTransport::new();
        mock.set_body("spine1", "/data/x", r#"{"a":1}"#);

        let body = mock.send("spine1", &Request::fetch("/data/x")).unwrap();
        assert_eq!(body.as_deref(), Some(r#"{"a":1}"#));

        let other = mock.send("spine2", &Request::fetch("/data/x")).unwrap();
        assert_eq!(other.as_deref(), Some(""));
    }

    #[test]
    fn test_mock_transport_script_order() {
        let mock = MockTransport::new();
        mock.script(
            "leaf1",
            [
                MockOutcome::Busy,
                MockOutcome::Status(500),
                MockOutcome::Respond("ok".to_string()),
            ],
        );

        let req = Request::fetch("/data/x");
        assert!(matches!(mock.send("leaf1", &req), Err(Error::Busy { .. })));
        assert!(matches!(
            mock.send("leaf1", &req),
            Err(Error::Http { status: 500, .. })
        ));
        assert_eq!(mock.send("leaf1", &req).unwrap().as_deref(), Some("ok"));
    }

    #[test]
    fn test_mock_transport_unreachable() {
        let mock = MockTransport::new();
        mock.script("leaf1", [MockOutcome::Unreachable("timed out".to_string())]);
        let err = mock.send("leaf1", &Request::delete("/data/x")).unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_mock_transport_clones_share_state() {
        let mock = MockTransport::new();
        let handle = mock.clone();
        mock.send("a", &Request::delete("/data/x")).unwrap();
        mock.send("b", &Request::delete("/data/x")).unwrap();
        mock.send("a", &Request::delete("/data/y")).unwrap();

        assert_eq!(handle.calls_to("a").len(), 2);
        assert_eq!(handle.hosts_contacted(), vec!["a", "b"]);
    }
}
