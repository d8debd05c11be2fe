//! Offline preview of compiled documents

use anyhow::{Context as _, Result};
use fabric::{CompiledDocument, Intent, Role};

use crate::cli::Selection;
use crate::commands::select;
use crate::config::Settings;
use crate::ui;

pub fn run(settings: &Settings, selection: &Selection, role: Option<&str>) -> Result<()> {
    let intents = select(&settings.intents, selection)?;
    let role = role.map(Role::from);
    print_documents(&intents, role.as_ref())
}

/// Compile each intent and print its documents.
///
/// Kinds that read device state first are reported and skipped.
pub fn print_documents(intents: &[&Intent], role: Option<&Role>) -> Result<()> {
    if intents.is_empty() {
        ui::info("No intents declared.");
        return Ok(());
    }

    let mut skipped = 0;
    for intent in intents {
        let resource = intent.resource();
        ui::section(&resource.description());

        let rendered = fabric::render(resource, role)
            .with_context(|| format!("Failed to render {}", resource.description()))?;
        let Some(documents) = rendered else {
            ui::warn("Needs device state; run `evpnctl read` or apply to preview it.");
            skipped += 1;
            continue;
        };
        if documents.is_empty() {
            ui::dim("No documents for the selected role.");
        }
        for (target, document) in &documents {
            print_document(target, document)?;
        }
    }

    if skipped > 0 {
        println!();
        ui::dim(&format!("{} not rendered offline", ui::count(skipped, "intent")));
    }
    Ok(())
}

fn print_document(target: &str, document: &CompiledDocument) -> Result<()> {
    ui::kv(target, document.path.as_str());
    println!("{}", document.to_payload()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(json: &str) -> Intent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_print_documents_offline_kinds() {
        let vlan = intent(r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100}"#);
        assert!(print_documents(&[&vlan], None).is_ok());
        assert!(print_documents(&[&vlan], Some(&Role::from("spines"))).is_ok());
    }

    #[test]
    fn test_print_documents_skips_device_state_kinds() {
        let neighbors = intent(
            r#"{"kind": "bgp_neighbor", "roles": ["leafs"], "bgp_id": 65000,
                "neighbors": ["10.0.0.1"], "remote_as": 65000, "update_source": "Loopback0"}"#,
        );
        assert!(print_documents(&[&neighbors], None).is_ok());
    }

    #[test]
    fn test_print_documents_rejects_invalid() {
        let vlan = intent(r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 5000, "vni": 10100}"#);
        assert!(print_documents(&[&vlan], None).is_err());
    }
}
