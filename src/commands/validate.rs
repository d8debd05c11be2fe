//! Offline validation of the fleet and every intent

use std::collections::BTreeMap;

use anyhow::{Context as _, Result, bail};
use fabric::{Fleet, Intent};

use crate::Context;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings) -> Result<()> {
    let counts = check(&settings.fleet, &settings.intents)?;

    if !ctx.quiet {
        ui::header(&format!("Validated {}", settings.path.display()));
        ui::kv("hosts", &ui::count(settings.fleet.all_hosts().len(), "host"));
        for (kind, n) in &counts {
            ui::kv(kind, &n.to_string());
        }
        println!();
    }
    ui::success(&format!(
        "{} valid",
        ui::count(settings.intents.len(), "intent")
    ));
    Ok(())
}

/// Validate everything and count intents per kind.
///
/// Every invalid intent is reported before failing.
fn check(fleet: &Fleet, intents: &[Intent]) -> Result<BTreeMap<&'static str, usize>> {
    fleet.validate().context("Invalid fleet")?;

    let mut counts = BTreeMap::new();
    let mut failures = 0;
    for (index, intent) in intents.iter().enumerate() {
        *counts.entry(intent.kind()).or_insert(0) += 1;
        if let Err(e) = intent.validate() {
            ui::error(&format!("resource #{}: {e}", index + 1));
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{} failed validation", ui::count(failures, "intent"));
    }
    Ok(counts)
}
