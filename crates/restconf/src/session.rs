//! Single-host execution and multi-host fan-out.

use log::debug;

use crate::backend::Transport;
use crate::backend::http::HttpTransport;
use crate::error::Result;
use crate::retry::{LogCallback, RetryCallback, with_retry};
use crate::types::{Request, Responses, RetryPolicy, TransportConfig};

/// Executes requests through a [`Transport`] with busy-retry.
///
/// A session holds no connection state between calls; hosts are supplied
/// per request.
pub struct Session {
    transport: Box<dyn Transport>,
    policy: RetryPolicy,
    callback: Box<dyn RetryCallback>,
}

impl Session {
    /// Create a session over `transport` with the default retry policy.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Box::new(transport))
    }

    /// Create a session over an already-boxed transport.
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            callback: Box::new(LogCallback),
        }
    }

    /// Create a session over HTTPS.
    pub fn connect(config: &TransportConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the retry callback.
    pub fn with_retry_callback(mut self, callback: impl RetryCallback + 'static) -> Self {
        self.callback = Box::new(callback);
        self
    }

    /// The active retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `request` against one host.
    ///
    /// Returns the response body for fetch requests and an empty string
    /// otherwise.
    pub fn execute(&self, host: &str, request: &Request) -> Result<String> {
        request.validate()?;

        let body = with_retry(&self.policy, Some(self.callback.as_ref()), |attempt| {
            debug!(
                "{} {} on {host} (attempt {attempt}/{}{})",
                request.method,
                request.path,
                self.policy.max_attempts,
                request
                    .role
                    .as_deref()
                    .map(|r| format!(", role {r}"))
                    .unwrap_or_default()
            );
            self.transport.send(host, request)
        })?;

        Ok(body.unwrap_or_default())
    }

    /// Execute `request` against each host in order, stopping at the first failure.
    ///
    /// Hosts after a failing one are not contacted. Hosts already updated are
    /// left as they are.
    pub fn execute_across_hosts<S: AsRef<str>>(
        &self,
        hosts: &[S],
        request: &Request,
    ) -> Result<Responses> {
        request.validate()?;

        let mut responses = Responses::new();
        for host in hosts {
            let host = host.as_ref();
            let body = self.execute(host, request)?;
            responses.push(host, body);
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockOutcome, MockTransport};
    use crate::error::Error;
    use crate::retry::NoCallback;
    use crate::types::Method;
    use std::time::Duration;

    fn session(mock: &MockTransport, max_attempts: u32) -> Session {
        Session::new(mock.clone())
            .with_policy(RetryPolicy::new(max_attempts, Duration::ZERO))
            .with_retry_callback(NoCallback)
    }

    #[test]
    fn test_execute_fetch_returns_body() {
        let mock = MockTransport::new();
        mock.set_body("spine1", "/data/x", "{}");
        let body = session(&mock, 3).execute("spine1", &Request::fetch("/data/x")).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn test_execute_patch_returns_empty_body() {
        let mock = MockTransport::new();
        let body = session(&mock, 3)
            .execute("spine1", &Request::patch("/data/x", "{}"))
            .unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_busy_then_success_counts_attempts() {
        let mock = MockTransport::new();
        mock.busy_then_ok("leaf1", 4);

        let result = session(&mock, 5).execute("leaf1", &Request::patch("/data/x", "{}"));
        assert!(result.is_ok());
        assert_eq!(mock.calls_to("leaf1").len(), 5);
    }

    #[test]
    fn test_busy_beyond_budget_is_transport_error() {
        let mock = MockTransport::new();
        mock.busy_then_ok("leaf1", 6);

        let err = session(&mock, 5)
            .execute("leaf1", &Request::patch("/data/x", "{}"))
            .unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 5, .. }));
        assert_eq!(err.category(), crate::ErrorCategory::Transport);
        assert_eq!(mock.calls_to("leaf1").len(), 5);
    }

    #[test]
    fn test_transport_failure_not_retried() {
        let mock = MockTransport::new();
        mock.script("leaf1", [MockOutcome::Unreachable("connection refused".into())]);

        let err = session(&mock, 5)
            .execute("leaf1", &Request::delete("/data/x"))
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(mock.calls_to("leaf1").len(), 1);
    }

    #[test]
    fn test_http_error_not_retried() {
        let mock = MockTransport::new();
        mock.script("leaf1", [MockOutcome::Status(400)]);

        let err = session(&mock, 5)
            .execute("leaf1", &Request::patch("/data/x", "{}"))
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(mock.calls().len(), 1);
    }

    #[test]
    fn test_invalid_request_never_sent() {
        let mock = MockTransport::new();
        let result = session(&mock, 5).execute("leaf1", &Request::patch("/data/x", ""));
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_fan_out_fail_fast() {
        let mock = MockTransport::new();
        mock.script("B", [MockOutcome::Status(500)]);

        let err = session(&mock, 3)
            .execute_across_hosts(&["A", "B", "C"], &Request::patch("/data/x", "{}"))
            .unwrap_err();

        assert_eq!(err.host(), Some("B"));
        assert_eq!(mock.hosts_contacted(), vec!["A", "B"]);
        assert!(mock.calls_to("C").is_empty());
    }

    #[test]
    fn test_fan_out_collects_bodies_in_order() {
        let mock = MockTransport::new();
        mock.set_body("A", "/data/x", "a");
        mock.set_body("B", "/data/x", "b");

        let hosts = vec!["A".to_string(), "B".to_string()];
        let responses = session(&mock, 3)
            .execute_across_hosts(&hosts, &Request::fetch("/data/x"))
            .unwrap();

        assert_eq!(responses.iter().collect::<Vec<_>>(), vec![("A", "a"), ("B", "b")]);
    }

    #[test]
    fn test_fan_out_busy_host_waited_out() {
        let mock = MockTransport::new();
        mock.busy_then_ok("B", 2);

        let responses = session(&mock, 3)
            .execute_across_hosts(&["A", "B", "C"], &Request::delete("/data/x"))
            .unwrap();

        assert_eq!(responses.len(), 3);
        assert_eq!(mock.calls_to("B").len(), 3);
        assert!(mock.calls().iter().all(|c| c.method == Method::Delete));
    }

    #[test]
    fn test_fan_out_empty_hosts() {
        let mock = MockTransport::new();
        let hosts: [&str; 0] = [];
        let responses = session(&mock, 3)
            .execute_across_hosts(&hosts, &Request::delete("/data/x"))
            .unwrap();
        assert!(responses.is_empty());
        assert!(mock.calls().is_empty());
    }
}
