//! Reconciliation hooks
//!
//! These traits let the orchestrator report what it does without depending
//! on a terminal, a filesystem, or any particular UI.

use restconf::Method;

use crate::error::Error;

/// Receives every compiled document before it is sent.
///
/// Implement this trait to dump payloads for inspection. Recording must not
/// fail the reconciliation; implementations log their own errors.
pub trait DebugSink: Send + Sync {
    /// Record a serialized document under `name`, e.g. `vlan_leafs_100`.
    fn record(&self, name: &str, payload: &str);
}

/// Sink that discards everything
pub struct NoDebug;

impl DebugSink for NoDebug {
    fn record(&self, _name: &str, _payload: &str) {}
}

/// Progress callback for reconciliation
///
/// A group is one role, or the single host of a host-scoped intent.
pub trait ProgressCallback: Send {
    /// Called when starting work on a group
    fn on_group_start(&mut self, resource: &str, group: &str, hosts: usize);

    /// Called before each request is issued
    fn on_request(&mut self, method: Method, path: &str, hosts: usize);

    /// Called when every request for a group succeeded
    fn on_group_complete(&mut self, group: &str);

    /// Called when a group stops on an error
    fn on_group_failed(&mut self, group: &str, error: &Error);

    /// Called when an optional role has no hosts
    fn on_group_skipped(&mut self, group: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_group_start(&mut self, _resource: &str, _group: &str, _hosts: usize) {}
    fn on_request(&mut self, _method: Method, _path: &str, _hosts: usize) {}
    fn on_group_complete(&mut self, _group: &str) {}
    fn on_group_failed(&mut self, _group: &str, _error: &Error) {}
    fn on_group_skipped(&mut self, _group: &str) {}
}
