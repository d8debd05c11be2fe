//! # restconf
//!
//! Blocking RESTCONF session layer for pushing YANG-modeled JSON documents to
//! network devices.
//!
//! This crate provides:
//! - A [`Request`] model with the payload invariant (fetch/delete carry none)
//! - [`ResourcePath`] construction with `%2F`-encoded list keys
//! - A [`Transport`] trait with an HTTPS implementation and an in-memory mock
//! - A [`Session`] that retries only the "configuration database busy" signal
//!   and fans one request out across hosts, stopping at the first failure
//!
//! ## Example
//!
//! ```no_run
//! use restconf::{Request, ResourcePath, Session, TransportConfig};
//!
//! let session = Session::connect(&TransportConfig::new("admin", "secret"))
//!     .expect("client");
//!
//! let path = ResourcePath::native().child("vlan");
//! let responses = session
//!     .execute_across_hosts(&["10.0.0.1", "10.0.0.2"], &Request::fetch(path))
//!     .expect("fetch");
//!
//! for (host, body) in responses.iter() {
//!     println!("{host}: {body}");
//! }
//! ```
//!
//! ## Retry semantics
//!
//! | Outcome                 | Retried | Surfaces as                  |
//! |-------------------------|---------|------------------------------|
//! | HTTP 409 (busy)         | yes     | `RetriesExhausted` when spent |
//! | other HTTP error status | no      | `Http`                       |
//! | connect/TLS/timeout     | no      | `Transport`                  |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod path;
pub mod retry;
pub mod session;
pub mod types;

pub use backend::http::HttpTransport;
pub use backend::{MockOutcome, MockTransport, RecordedCall, Transport};
pub use error::{Error, ErrorCategory, Result};
pub use path::{NATIVE_ROOT, ResourcePath};
pub use retry::{LogCallback, NoCallback, RetryCallback};
pub use session::Session;
pub use types::{BUSY_STATUS, Method, Request, Responses, RetryPolicy, TransportConfig};
