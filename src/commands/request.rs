//! Raw requests through the session manager
//!
//! Useful for inspecting device state that no intent covers, e.g.
//! `evpnctl request fetch /data/Cisco-IOS-XE-native:native/vlan --role leafs`.

use std::fs;

use anyhow::{Context as _, Result, bail};
use fabric::{Fleet, Role};
use restconf::{Request, ResourcePath, Responses, Session};
use serde_json::Value;

use crate::Context;
use crate::cli::RequestArgs;
use crate::commands::connect;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings, args: &RequestArgs) -> Result<()> {
    let request = build(args)?;
    let session = connect(settings)?;
    let responses = send(&session, &settings.fleet, &request, args)?;

    for (host, body) in responses.iter() {
        if !ctx.quiet {
            ui::kv(host, &format!("{} {}", request.method, request.path));
        }
        if !body.is_empty() {
            println!("{body}");
        }
    }
    if !ctx.quiet {
        ui::success(&format!("{} answered", ui::count(responses.len(), "host")));
    }
    Ok(())
}

/// Build the request, reading and checking the payload file if one is given.
fn build(args: &RequestArgs) -> Result<Request> {
    let payload = match &args.payload {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read payload {}", path.display()))?;
            serde_json::from_str::<Value>(&text)
                .with_context(|| format!("Payload {} is not JSON", path.display()))?;
            Some(text)
        }
        None => None,
    };

    let request = Request::with_method(args.method.into(), ResourcePath::raw(&args.path), payload);
    request.validate()?;
    Ok(request)
}

fn send(
    session: &Session,
    fleet: &Fleet,
    request: &Request,
    args: &RequestArgs,
) -> Result<Responses> {
    match (&args.host, &args.role) {
        (Some(host), None) => {
            let body = session.execute(host, request)?;
            let mut responses = Responses::new();
            responses.push(host.as_str(), body);
            Ok(responses)
        }
        (None, Some(role)) => {
            let role = Role::from(role.as_str());
            let Some(hosts) = fleet.hosts_for(&role)? else {
                bail!("Role '{role}' has no hosts");
            };
            let request = request.clone().for_role(role.as_str());
            Ok(session.execute_across_hosts(hosts, &request)?)
        }
        _ => bail!("Exactly one of --host or --role is required"),
    }
}
