// Reconciliation against the fleet
pub mod reconcile;

// Offline commands
pub mod hosts;
pub mod render;
pub mod validate;

// Raw device access
pub mod request;

use anyhow::{Result, bail};
use fabric::Intent;
use restconf::Session;

use crate::cli::Selection;
use crate::config::Settings;
use crate::progress::BusyReporter;

/// Intents matching `select`, in declaration order.
pub fn select<'a>(intents: &'a [Intent], select: &Selection) -> Result<Vec<&'a Intent>> {
    if let Some(kind) = &select.kind
        && !Intent::KINDS.contains(&kind.as_str())
    {
        bail!(
            "Unknown kind '{kind}' (expected one of: {})",
            Intent::KINDS.join(", ")
        );
    }

    let selected: Vec<&Intent> = intents
        .iter()
        .filter(|intent| select.kind.as_deref().is_none_or(|k| intent.kind() == k))
        .filter(|intent| {
            select
                .id
                .as_deref()
                .is_none_or(|id| intent.resource().id() == id)
        })
        .collect();

    if selected.is_empty() && (select.kind.is_some() || select.id.is_some()) {
        bail!("No intent matches the selection");
    }
    Ok(selected)
}

/// HTTPS session with the configured retry policy.
pub fn connect(settings: &Settings) -> Result<Session> {
    let transport = settings.transport()?;
    Ok(Session::connect(&transport)?
        .with_policy(settings.retry.clone())
        .with_retry_callback(BusyReporter))
}
