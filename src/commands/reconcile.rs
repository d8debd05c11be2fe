//! Reconciliation commands
//!
//! - `apply` - push intents in declaration order
//! - `update` - re-send intents to their update paths
//! - `destroy` - remove intents in reverse declaration order
//! - `read` - fetch intents from every host

use anyhow::{Context as _, Result};
use dialoguer::Confirm;
use fabric::{DebugSink, Intent, NoDebug, Operation, Reconciler};
use serde_json::Value;

use crate::Context;
use crate::cli::Selection;
use crate::commands::{connect, render, select};
use crate::config::Settings;
use crate::debug::DirectorySink;
use crate::progress::RoleSpinner;
use crate::ui;

pub fn apply(
    ctx: &Context,
    settings: &Settings,
    selection: &Selection,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        let intents = select(&settings.intents, selection)?;
        return render::print_documents(&intents, None);
    }
    run(ctx, settings, Operation::Create, selection)
}

pub fn update(ctx: &Context, settings: &Settings, selection: &Selection) -> Result<()> {
    run(ctx, settings, Operation::Update, selection)
}

pub fn destroy(ctx: &Context, settings: &Settings, selection: &Selection, yes: bool) -> Result<()> {
    let count = select(&settings.intents, selection)?.len();
    if count > 0 && !yes && !confirm_destroy(count)? {
        ui::info("Nothing deleted.");
        return Ok(());
    }
    run(ctx, settings, Operation::Delete, selection)
}

pub fn read(ctx: &Context, settings: &Settings, selection: &Selection) -> Result<()> {
    run(ctx, settings, Operation::Read, selection)
}

fn confirm_destroy(count: usize) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete {} from the fleet?", ui::count(count, "intent")))
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Intents in the order `op` visits them.
fn ordered<'a>(mut intents: Vec<&'a Intent>, op: Operation) -> Vec<&'a Intent> {
    if op == Operation::Delete {
        intents.reverse();
    }
    intents
}

fn run(ctx: &Context, settings: &Settings, op: Operation, selection: &Selection) -> Result<()> {
    let intents = ordered(select(&settings.intents, selection)?, op);
    if intents.is_empty() {
        ui::info("No intents declared.");
        return Ok(());
    }

    let session = connect(settings)?;
    let sink: Box<dyn DebugSink> = match &settings.debug_dir {
        Some(dir) => Box::new(DirectorySink::new(dir)),
        None => Box::new(NoDebug),
    };

    if !ctx.quiet {
        ui::header(&format!("{op}: {}", ui::count(intents.len(), "intent")));
    }

    for intent in &intents {
        let resource = intent.resource();
        if !ctx.quiet {
            ui::section(&resource.description());
        }

        let responses = Reconciler::new(&session, &settings.fleet)
            .with_debug_sink(sink.as_ref())
            .with_progress(RoleSpinner::new(ctx.quiet))
            .reconcile(op, resource)
            .with_context(|| format!("{op} {} failed", resource.description()))?;

        if op == Operation::Read {
            for (host, body) in responses.iter() {
                ui::kv(host, "");
                println!("{}", pretty(body));
            }
        }
    }

    if !ctx.quiet {
        println!();
        ui::success(&format!("{op} finished for {}", ui::count(intents.len(), "intent")));
        if let Some(dir) = &settings.debug_dir {
            ui::dim(&format!("Payloads written to {}", dir.display()));
        }
    }
    Ok(())
}

/// Re-indent a JSON body; anything else is shown as-is.
fn pretty(body: &str) -> String {
    if body.trim().is_empty() {
        return "(empty)".to_string();
    }
    serde_json::from_str::<Value>(body)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intents() -> Vec<Intent> {
        [100, 200]
            .iter()
            .map(|id| {
                serde_json::from_value(serde_json::json!({
                    "kind": "vlan", "roles": ["leafs"], "vlan_id": id, "vni": 10000 + id
                }))
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_delete_runs_in_reverse() {
        let intents = intents();
        let refs: Vec<&Intent> = intents.iter().collect();

        let ids = |v: Vec<&Intent>| v.iter().map(|i| i.resource().id()).collect::<Vec<_>>();
        assert_eq!(ids(ordered(refs.clone(), Operation::Create)), vec!["100", "200"]);
        assert_eq!(ids(ordered(refs, Operation::Delete)), vec!["200", "100"]);
    }

    #[test]
    fn test_pretty() {
        assert_eq!(pretty(""), "(empty)");
        assert_eq!(pretty("{\"a\":1}"), "{\n  \"a\": 1\n}");
        assert_eq!(pretty("<html>"), "<html>");
    }
}
