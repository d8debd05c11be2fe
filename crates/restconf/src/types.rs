//! Core types for RESTCONF sessions.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Status code a device answers with while its configuration database is locked.
pub const BUSY_STATUS: u16 = 409;

/// Media type for YANG-modeled JSON documents.
pub const YANG_JSON: &str = "application/yang-data+json";

/// Operation carried by a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Read a subtree (GET).
    Fetch,
    /// Merge a document into the datastore (PATCH).
    Patch,
    /// Replace a subtree (PUT).
    Replace,
    /// Remove a subtree (DELETE).
    Delete,
}

impl Method {
    /// Lowercase name used on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Patch => "patch",
            Self::Replace => "replace",
            Self::Delete => "delete",
        }
    }

    /// HTTP verb for this method.
    #[must_use]
    pub fn http_verb(&self) -> &'static str {
        match self {
            Self::Fetch => "GET",
            Self::Patch => "PATCH",
            Self::Replace => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method must carry a document.
    #[must_use]
    pub fn carries_payload(&self) -> bool {
        matches!(self, Self::Patch | Self::Replace)
    }

    /// All methods.
    #[must_use]
    pub fn all() -> &'static [Method] {
        &[Self::Fetch, Self::Patch, Self::Replace, Self::Delete]
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.http_verb())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(s) || m.http_verb().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidRequest(format!("unknown method '{s}'")))
    }
}

/// One unit of work sent through a session.
///
/// The target host is supplied separately so the same request can be fanned
/// out across a role's hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Operation to perform.
    pub method: Method,
    /// Resource path below the RESTCONF root, e.g. `/data/...`.
    pub path: String,
    /// Serialized document for patch/replace.
    pub payload: Option<String>,
    /// Role the request was compiled for, used for log correlation.
    pub role: Option<String>,
}

impl Request {
    fn new(method: Method, path: impl Into<String>, payload: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload,
            role: None,
        }
    }

    /// Read the subtree at `path`.
    pub fn fetch(path: impl Into<String>) -> Self {
        Self::new(Method::Fetch, path, None)
    }

    /// Merge `payload` at `path`.
    pub fn patch(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(Method::Patch, path, Some(payload.into()))
    }

    /// Replace the subtree at `path` with `payload`.
    pub fn replace(path: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::new(Method::Replace, path, Some(payload.into()))
    }

    /// Remove the subtree at `path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, None)
    }

    /// Build a request from a method and an optional payload.
    pub fn with_method(method: Method, path: impl Into<String>, payload: Option<String>) -> Self {
        Self::new(method, path, payload)
    }

    /// Tag the request with the role it was compiled for.
    pub fn for_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Check the payload invariant: empty for fetch/delete, non-empty for patch/replace.
    pub fn validate(&self) -> Result<()> {
        let has_payload = self.payload.as_deref().is_some_and(|p| !p.trim().is_empty());
        match (self.method.carries_payload(), has_payload) {
            (true, false) => Err(Error::InvalidRequest(format!(
                "{} {} requires a payload",
                self.method, self.path
            ))),
            (false, _) if self.payload.is_some() => Err(Error::InvalidRequest(format!(
                "{} {} must not carry a payload",
                self.method, self.path
            ))),
            _ if self.path.is_empty() => {
                Err(Error::InvalidRequest(format!("{} with empty path", self.method)))
            }
            _ => Ok(()),
        }
    }
}

/// Bounded retry against the busy signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given budget and delay.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, never retried.
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Upper bound on time spent sleeping for one request.
    #[must_use]
    pub fn worst_case_wait(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Credentials and client settings used to build an HTTP transport.
///
/// Consumed opaquely: nothing outside the transport interprets these.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Basic auth user.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// PEM bundle of trusted roots.
    pub ca_file: Option<PathBuf>,
    /// HTTP(S) proxy URL.
    pub proxy_url: Option<String>,
    /// `user:pass` spliced into the proxy URL.
    pub proxy_credentials: Option<String>,
}

impl TransportConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a config with defaults for everything but credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            insecure: true,
            timeout: Self::DEFAULT_TIMEOUT,
            ca_file: None,
            proxy_url: None,
            proxy_credentials: None,
        }
    }

    /// Verify device certificates (against `ca_file` when set).
    pub fn verify_tls(mut self, ca_file: Option<PathBuf>) -> Self {
        self.insecure = false;
        self.ca_file = ca_file;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route requests through a proxy.
    pub fn proxy(mut self, url: impl Into<String>, credentials: Option<String>) -> Self {
        self.proxy_url = Some(url.into());
        self.proxy_credentials = credentials;
        self
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .field("ca_file", &self.ca_file)
            .field("proxy_url", &self.proxy_url)
            .field(
                "proxy_credentials",
                &self.proxy_credentials.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Response bodies keyed by host, in the order hosts were visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Responses {
    entries: Vec<(String, String)>,
}

impl Responses {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the body returned by `host`.
    pub fn push(&mut self, host: impl Into<String>, body: impl Into<String>) {
        self.entries.push((host.into(), body.into()));
    }

    /// Body returned by `host`, if it was visited.
    ///
    /// When the same host was visited more than once, the latest body wins.
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(h, _)| h == host)
            .map(|(_, body)| body.as_str())
    }

    /// Iterate `(host, body)` pairs in visit order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, b)| (h.as_str(), b.as_str()))
    }

    /// Hosts in visit order.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(h, _)| h.as_str())
    }

    /// Append every entry of `other`.
    pub fn extend(&mut self, other: Responses) {
        self.entries.extend(other.entries);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no host was visited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Responses {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Fetch.name(), "fetch");
        assert_eq!(Method::Replace.http_verb(), "PUT");
        assert_eq!(format!("{}", Method::Patch), "PATCH");
        assert_eq!(Method::all().len(), 4);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("fetch".parse::<Method>().unwrap(), Method::Fetch);
        assert_eq!("PUT".parse::<Method>().unwrap(), Method::Replace);
        assert_eq!("Delete".parse::<Method>().unwrap(), Method::Delete);
        assert!("post".parse::<Method>().is_err());
    }

    #[test]
    fn test_request_payload_invariant() {
        assert!(Request::fetch("/data/x").validate().is_ok());
        assert!(Request::delete("/data/x").validate().is_ok());
        assert!(Request::patch("/data/x", "{}").validate().is_ok());

        assert!(Request::patch("/data/x", "").validate().is_err());
        assert!(Request::replace("/data/x", "   ").validate().is_err());
        assert!(
            Request::with_method(Method::Fetch, "/data/x", Some("{}".to_string()))
                .validate()
                .is_err()
        );
        assert!(
            Request::with_method(Method::Delete, "/data/x", Some(String::new()))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_request_empty_path_rejected() {
        assert!(Request::fetch("").validate().is_err());
    }

    #[test]
    fn test_request_role_tag() {
        let req = Request::delete("/data/x").for_role("leafs");
        assert_eq!(req.role.as_deref(), Some("leafs"));
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.delay, Duration::from_secs(10));
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(190));
    }

    #[test]
    fn test_retry_policy_floor() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::no_retry().worst_case_wait(), Duration::ZERO);
    }

    #[test]
    fn test_transport_config_debug_redacts_secrets() {
        let config = TransportConfig::new("admin", "hunter2").proxy(
            "http://proxy:3128",
            Some("user:secret".to_string()),
        );
        let debug = format!("{config:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_transport_config_defaults() {
        let config = TransportConfig::new("u", "p");
        assert!(config.insecure);
        assert_eq!(config.timeout, Duration::from_secs(30));

        let strict = config.verify_tls(Some(PathBuf::from("/etc/ca.pem")));
        assert!(!strict.insecure);
        assert!(strict.ca_file.is_some());
    }

    #[test]
    fn test_responses_ordered_lookup() {
        let mut responses = Responses::new();
        responses.push("a", "1");
        responses.push("b", "2");
        assert_eq!(responses.get("b"), Some("2"));
        assert_eq!(responses.get("c"), None);
        assert_eq!(responses.hosts().collect::<Vec<_>>(), vec!["a", "b"]);

        let mut more = Responses::new();
        more.push("a", "3");
        responses.extend(more);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses.get("a"), Some("3"));
    }
}
