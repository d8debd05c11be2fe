//! Global L2VPN EVPN settings.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_true, require_loopback_ref, require_roles,
};
use crate::error::{Result, check_choice};
use crate::fleet::Role;
use crate::ident::{Marker, extract_numeric_id};
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "evpn";

/// Accepted `replication_type` values.
pub const REPLICATION_TYPES: &[&str] = &["static", "ingress"];
/// Accepted `default_gateway` values.
pub const DEFAULT_GATEWAY: &[&str] = &["advertise", "none"];
/// Accepted `route_target_auto` values.
pub const ROUTE_TARGET_AUTO: &[&str] = &["vni", "none"];

static DOCUMENT: Schema = Schema {
    name: "l2vpn evpn",
    fields: &[
        Field::optional(
            "Cisco-IOS-XE-l2vpn:evpn/replication-type/static",
            FieldKind::Presence(Marker::Empty),
        ),
        Field::optional(
            "Cisco-IOS-XE-l2vpn:evpn/replication-type/ingress",
            FieldKind::Presence(Marker::Empty),
        ),
        Field::required("Cisco-IOS-XE-l2vpn:evpn/mac/duplication/limit", FieldKind::Int),
        Field::required("Cisco-IOS-XE-l2vpn:evpn/mac/duplication/time", FieldKind::Int),
        Field::required("Cisco-IOS-XE-l2vpn:evpn/ip/duplication/limit", FieldKind::Int),
        Field::required("Cisco-IOS-XE-l2vpn:evpn/ip/duplication/time", FieldKind::Int),
        Field::required(
            "Cisco-IOS-XE-l2vpn:evpn/router-id/interface/Loopback",
            FieldKind::Int,
        ),
        Field::optional(
            "Cisco-IOS-XE-l2vpn:evpn/default-gateway/advertise",
            FieldKind::Presence(Marker::Empty),
        ),
        Field::optional(
            "Cisco-IOS-XE-l2vpn:evpn/logging/peer/state",
            FieldKind::Presence(Marker::Empty),
        ),
        Field::optional(
            "Cisco-IOS-XE-l2vpn:evpn/route-target/auto/vni",
            FieldKind::Presence(Marker::Empty),
        ),
    ],
};

fn default_replication() -> String {
    "static".to_string()
}

fn default_gateway() -> String {
    "advertise".to_string()
}

fn default_route_target_auto() -> String {
    "vni".to_string()
}

const fn default_duplication_limit() -> u32 {
    20
}

const fn default_duplication_time() -> u32 {
    10
}

/// Global EVPN configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Evpn {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// BUM replication mode.
    #[serde(default = "default_replication")]
    pub replication_type: String,
    /// MAC moves tolerated before a MAC is flagged duplicate.
    #[serde(default = "default_duplication_limit")]
    pub mac_duplication_limit: u32,
    /// Window for MAC duplicate detection, in seconds.
    #[serde(default = "default_duplication_time")]
    pub mac_duplication_time: u32,
    /// IP moves tolerated before an IP is flagged duplicate.
    #[serde(default = "default_duplication_limit")]
    pub ip_duplication_limit: u32,
    /// Window for IP duplicate detection, in seconds.
    #[serde(default = "default_duplication_time")]
    pub ip_duplication_time: u32,
    /// Loopback providing the EVPN router id.
    pub router_id: String,
    /// Default gateway advertisement.
    #[serde(default = "default_gateway")]
    pub default_gateway: String,
    /// Log EVPN peer state changes.
    #[serde(default = "default_true")]
    pub logging_peer_state: bool,
    /// Automatic route-target derivation.
    #[serde(default = "default_route_target_auto")]
    pub route_target_auto: String,
}

impl Evpn {
    fn path() -> ResourcePath {
        ResourcePath::native().child("l2vpn/evpn_cont/evpn")
    }
}

impl Resource for Evpn {
    fn id(&self) -> String {
        self.router_id.clone()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("evpn with router id {}", self.router_id)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        check_choice("replication_type", &self.replication_type, REPLICATION_TYPES)?;
        check_choice("default_gateway", &self.default_gateway, DEFAULT_GATEWAY)?;
        check_choice("route_target_auto", &self.route_target_auto, ROUTE_TARGET_AUTO)?;
        require_loopback_ref(KIND, "router_id", &self.router_id)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let loopback = extract_numeric_id(&self.router_id)?;
        let record = Record::new()
            .flag_if(
                "Cisco-IOS-XE-l2vpn:evpn/replication-type/static",
                self.replication_type == "static",
            )
            .flag_if(
                "Cisco-IOS-XE-l2vpn:evpn/replication-type/ingress",
                self.replication_type == "ingress",
            )
            .set("Cisco-IOS-XE-l2vpn:evpn/mac/duplication/limit", self.mac_duplication_limit)
            .set("Cisco-IOS-XE-l2vpn:evpn/mac/duplication/time", self.mac_duplication_time)
            .set("Cisco-IOS-XE-l2vpn:evpn/ip/duplication/limit", self.ip_duplication_limit)
            .set("Cisco-IOS-XE-l2vpn:evpn/ip/duplication/time", self.ip_duplication_time)
            .set("Cisco-IOS-XE-l2vpn:evpn/router-id/interface/Loopback", loopback)
            .flag_if(
                "Cisco-IOS-XE-l2vpn:evpn/default-gateway/advertise",
                self.default_gateway == "advertise",
            )
            .flag_if("Cisco-IOS-XE-l2vpn:evpn/logging/peer/state", self.logging_peer_state)
            .flag_if(
                "Cisco-IOS-XE-l2vpn:evpn/route-target/auto/vni",
                self.route_target_auto == "vni",
            );
        Ok(CompiledDocument {
            path: Self::path(),
            body: DOCUMENT.build(&record)?,
            debug_name: format!("{KIND}_{}_loopback{loopback}", target.label()),
        })
    }

    fn read_path(&self) -> ResourcePath {
        Self::path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![Self::path()])
    }
}
