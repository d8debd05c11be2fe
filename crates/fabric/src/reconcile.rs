//! Reconciliation orchestrator
//!
//! Resolves an intent's hosts role by role, fetches device state when the
//! resource needs it, compiles, and fans requests out through a [`Session`].
//!
//! Roles are visited in declared order and hosts in fleet order. The first
//! failure aborts the whole call; roles and hosts already updated stay as
//! they are.

use std::fmt;

use log::{debug, info, warn};
use restconf::{Method, Request, ResourcePath, Responses, Session, TransportConfig};

use crate::context::{DebugSink, NoDebug, NoProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::fleet::{Fleet, Role};
use crate::resource::{CompiledDocument, DeviceState, Intent, Resource, Scope, Target};

const NOT_FOUND: u16 = 404;

/// Operation requested by the dispatch layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Push the compiled document.
    Create,
    /// Fetch the resource from every host.
    Read,
    /// Re-send the full document to the update path.
    Update,
    /// Remove the resource.
    Delete,
}

impl Operation {
    /// Lowercase name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One role's hosts, or the single host of a host-scoped intent.
#[derive(Debug)]
struct Group<'g> {
    role: Option<&'g Role>,
    hosts: Vec<&'g str>,
}

impl<'g> Group<'g> {
    fn label(&self) -> &'g str {
        match self.role {
            Some(role) => role.as_str(),
            None => self.hosts.first().copied().unwrap_or("all"),
        }
    }

    fn target(&self) -> Target<'g> {
        match self.role {
            Some(role) => Target::role(role),
            None => self.hosts.first().map_or_else(Target::default, |&h| Target::host(h)),
        }
    }
}

/// Resolve every group up front so a configuration error surfaces before
/// any device is contacted.
fn resolve_groups<'g>(fleet: &'g Fleet, resource: &'g dyn Resource) -> Result<Vec<Group<'g>>> {
    match resource.scope() {
        Scope::Host(host) => Ok(vec![Group {
            role: None,
            hosts: vec![host],
        }]),
        Scope::Roles(roles) => roles
            .iter()
            .map(|role| {
                let hosts = fleet.hosts_for(role)?.unwrap_or_default();
                Ok(Group {
                    role: Some(role),
                    hosts: hosts.iter().map(String::as_str).collect(),
                })
            })
            .collect(),
    }
}

/// Drives one resource through a session against a fleet.
pub struct Reconciler<'a> {
    session: &'a Session,
    fleet: &'a Fleet,
    sink: &'a dyn DebugSink,
    progress: Box<dyn ProgressCallback + 'a>,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler with no debug sink and no progress reporting.
    pub fn new(session: &'a Session, fleet: &'a Fleet) -> Self {
        Self {
            session,
            fleet,
            sink: &NoDebug,
            progress: Box::new(NoProgress),
        }
    }

    /// Hand every compiled document to `sink` before sending it.
    #[must_use]
    pub fn with_debug_sink(mut self, sink: &'a dyn DebugSink) -> Self {
        self.sink = sink;
        self
    }

    /// Report progress to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: impl ProgressCallback + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Reconcile `resource` with operation `op`.
    ///
    /// Returns response bodies per host in visit order. Only reads produce
    /// non-empty bodies.
    pub fn reconcile(&mut self, op: Operation, resource: &dyn Resource) -> Result<Responses> {
        resource.validate()?;
        let fleet = self.fleet;
        let groups = resolve_groups(fleet, resource)?;

        let mut responses = Responses::new();
        for group in &groups {
            let label = group.label();
            if group.hosts.is_empty() {
                warn!(
                    "{op} {}: role '{label}' has no hosts, skipping",
                    resource.description()
                );
                self.progress.on_group_skipped(label);
                continue;
            }

            info!(
                "{op} {} on {label} ({} hosts)",
                resource.description(),
                group.hosts.len()
            );
            self.progress
                .on_group_start(resource.resource_type(), label, group.hosts.len());

            let result = match op {
                Operation::Read => self.read(resource, group),
                Operation::Create | Operation::Update => self.apply(op, resource, group),
                Operation::Delete => self.delete(resource, group),
            };
            match result {
                Ok(group_responses) => {
                    self.progress.on_group_complete(label);
                    info!("{op} {} on {label} done", resource.description());
                    responses.extend(group_responses);
                }
                Err(e) => {
                    self.progress.on_group_failed(label, &e);
                    return Err(e);
                }
            }
        }
        Ok(responses)
    }

    fn read(&mut self, resource: &dyn Resource, group: &Group<'_>) -> Result<Responses> {
        self.execute(Request::fetch(resource.read_path()), group)
    }

    fn apply(
        &mut self,
        op: Operation,
        resource: &dyn Resource,
        group: &Group<'_>,
    ) -> Result<Responses> {
        self.each_target(resource, group, |this, hosts, target| {
            let doc = resource.compile(target)?;
            let path = match op {
                Operation::Update => {
                    for stale in resource.update_prune(target)? {
                        this.delete_if_present(&stale, hosts, group)?;
                    }
                    resource.update_path().unwrap_or_else(|| doc.path.clone())
                }
                _ => doc.path.clone(),
            };
            this.send(&doc, path, hosts, group)
        })
    }

    fn delete(&mut self, resource: &dyn Resource, group: &Group<'_>) -> Result<Responses> {
        self.each_target(resource, group, |this, hosts, target| {
            let mut responses = Responses::new();
            for path in resource.teardown(target)? {
                responses.extend(this.execute_on(Request::delete(path), hosts, group)?);
            }
            Ok(responses)
        })
    }

    /// Run `step` once per compile target of `group`.
    ///
    /// Without a device query that is the whole group. A per-host query
    /// fetches from each host and runs `step` against that host alone,
    /// before moving to the next. Otherwise state is fetched from the first
    /// host and `step` runs once for the whole group.
    fn each_target<F>(
        &mut self,
        resource: &dyn Resource,
        group: &Group<'_>,
        mut step: F,
    ) -> Result<Responses>
    where
        F: FnMut(&mut Self, &[&str], &Target<'_>) -> Result<Responses>,
    {
        let base = group.target();
        let Some(query) = resource.device_query()? else {
            return step(self, &group.hosts, &base);
        };

        if query.per_host {
            let mut responses = Responses::new();
            for &host in &group.hosts {
                let state = self.fetch_state(host, &query.path)?;
                let target = Target {
                    host: Some(host),
                    ..base
                }
                .with_device(&state);
                responses.extend(step(self, &[host], &target)?);
            }
            Ok(responses)
        } else {
            let first = group.hosts.first().ok_or_else(|| {
                Error::invariant(format!(
                    "group '{}' reached compilation with no hosts",
                    group.label()
                ))
            })?;
            let state = self.fetch_state(first, &query.path)?;
            step(self, &group.hosts, &base.with_device(&state))
        }
    }

    fn fetch_state(&mut self, host: &str, path: &ResourcePath) -> Result<DeviceState> {
        self.progress.on_request(Method::Fetch, path.as_str(), 1);
        let body = self.session.execute(host, &Request::fetch(path.as_str()))?;
        DeviceState::parse(host, path.as_str(), &body)
    }

    fn send(
        &mut self,
        doc: &CompiledDocument,
        path: ResourcePath,
        hosts: &[&str],
        group: &Group<'_>,
    ) -> Result<Responses> {
        let payload = doc.to_payload()?;
        self.sink.record(&doc.debug_name, &payload);
        self.execute_on(Request::patch(path, payload), hosts, group)
    }

    /// Delete `path` on each host in turn; a host answering 404 already lacks it.
    fn delete_if_present(
        &mut self,
        path: &ResourcePath,
        hosts: &[&str],
        group: &Group<'_>,
    ) -> Result<()> {
        let mut request = Request::delete(path.as_str());
        if let Some(role) = group.role {
            request = request.for_role(role.as_str());
        }
        self.progress
            .on_request(request.method, &request.path, hosts.len());
        for &host in hosts {
            match self.session.execute(host, &request) {
                Ok(_) => {}
                Err(e) if e.status() == Some(NOT_FOUND) => {
                    debug!("{host}: {} already absent", request.path);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn execute(&mut self, request: Request, group: &Group<'_>) -> Result<Responses> {
        self.execute_on(request, &group.hosts, group)
    }

    fn execute_on(
        &mut self,
        request: Request,
        hosts: &[&str],
        group: &Group<'_>,
    ) -> Result<Responses> {
        let request = match group.role {
            Some(role) => request.for_role(role.as_str()),
            None => request,
        };
        self.progress
            .on_request(request.method, &request.path, hosts.len());
        Ok(self.session.execute_across_hosts(hosts, &request)?)
    }
}

/// Compile `resource` for each of its targets without contacting a device.
///
/// Kinds that need device state cannot be rendered offline and return
/// `Ok(None)`. With `only_role`, other roles are skipped.
pub fn render<'r>(
    resource: &'r dyn Resource,
    only_role: Option<&Role>,
) -> Result<Option<Vec<(&'r str, CompiledDocument)>>> {
    resource.validate()?;
    if resource.device_query()?.is_some() {
        return Ok(None);
    }
    let docs = match resource.scope() {
        Scope::Host(host) => vec![(host, resource.compile(&Target::host(host))?)],
        Scope::Roles(roles) => roles
            .iter()
            .filter(|role| only_role.is_none_or(|only| only == *role))
            .map(|role| Ok((role.as_str(), resource.compile(&Target::role(role))?)))
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(Some(docs))
}

/// Reconcile one intent against a fleet.
///
/// Builds a fresh HTTPS session from `transport` for this call; nothing is
/// shared between calls.
pub fn reconcile(
    op: Operation,
    intent: &Intent,
    fleet: &Fleet,
    transport: &TransportConfig,
) -> Result<Responses> {
    let session = Session::connect(transport)?;
    Reconciler::new(&session, fleet).reconcile(op, intent.resource())
}
