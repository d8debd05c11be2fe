//! # Fabric
//!
//! Declarative EVPN fabric configuration for a fleet of network devices.
//!
//! This crate turns flat, typed intents into nested YANG-modeled JSON
//! documents and reconciles them across the hosts of each role.
//!
//! ## Core Concepts
//!
//! - **Intent**: the declared configuration for one resource, tagged by kind
//! - **Fleet**: role name to ordered host list (`spines`, `leafs`, `borders`)
//! - **Schema**: the wire shape of a kind, consumed by one generic builder
//! - **Reconciler**: resolves hosts, prefetches device state, compiles, and
//!   fans requests out through a [`restconf::Session`]
//!
//! ## Example
//!
//! ```
//! use fabric::{Fleet, Intent, Operation, Reconciler};
//! use restconf::{MockTransport, Session};
//!
//! let fleet = Fleet::new()
//!     .with_role("spines", ["10.0.0.1"])
//!     .with_role("leafs", ["10.0.1.1", "10.0.1.2"]);
//!
//! let intent: Intent = serde_json::from_str(
//!     r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100}"#,
//! )
//! .unwrap();
//!
//! let mock = MockTransport::new();
//! let session = Session::new(mock.clone());
//! Reconciler::new(&session, &fleet)
//!     .reconcile(Operation::Create, intent.resource())
//!     .unwrap();
//!
//! assert_eq!(mock.hosts_contacted(), vec!["10.0.1.1", "10.0.1.2"]);
//! ```
//!
//! ## Provider Traits
//!
//! - [`DebugSink`]: receives each compiled payload before it is sent
//! - [`ProgressCallback`]: receives per-role progress updates
//!
//! Neither is required; the defaults do nothing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod fleet;
pub mod ident;
pub mod reconcile;
pub mod resource;
pub mod schema;

pub use context::{DebugSink, NoDebug, NoProgress, ProgressCallback};
pub use error::{Error, ErrorCategory, Result};
pub use fleet::{Fleet, Role};
pub use ident::{Marker, extract_numeric_id, has_numeric_id, loopback_name};
pub use reconcile::{Operation, Reconciler, reconcile, render};
pub use resource::{CompiledDocument, DeviceQuery, DeviceState, Intent, Resource, Scope, Target};
