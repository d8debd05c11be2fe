//! Fleet inspection

use anyhow::Result;
use fabric::{Fleet, Role};

use crate::config::Settings;
use crate::ui;

pub fn run(settings: &Settings, role: Option<&str>) -> Result<()> {
    ui::header(&format!("Fleet ({})", settings.path.display()));
    match role {
        Some(name) => show_role(&settings.fleet, &Role::from(name)),
        None => {
            show_all(&settings.fleet);
            Ok(())
        }
    }
}

fn show_role(fleet: &Fleet, role: &Role) -> Result<()> {
    let hosts = fleet.hosts_for(role)?.unwrap_or_default();
    ui::kv(role.as_str(), &ui::host_list(hosts));
    Ok(())
}

fn show_all(fleet: &Fleet) {
    let mut any = false;
    for (role, hosts) in fleet.roles() {
        any = true;
        ui::kv(role.as_str(), &ui::host_list(hosts));
    }
    if !any {
        ui::dim("No roles declared.");
        return;
    }
    println!();
    ui::dim(&ui::count(fleet.all_hosts().len(), "distinct host"));
}
