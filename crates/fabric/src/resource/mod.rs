//! Resource kinds and the typed intent enum.
//!
//! Every resource kind is a plain struct deserialized from the intent file and
//! validated at the boundary. Its [`Resource`] impl says where the document
//! goes, which hosts it targets, and how to compile it for one role.

use std::fmt;

use restconf::ResourcePath;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::fleet::Role;

pub mod bgp_neighbor;
pub mod bgp_system;
pub mod bgp_vrf;
pub mod bgp_vrf_unicast;
pub mod dhcp;
pub mod dhcp_helper;
pub mod evpn;
pub mod evpn_instance;
pub mod loopback;
pub mod nve;
pub mod subinterface;
pub mod svi;
pub mod vlan;
pub mod vrf;

pub use bgp_neighbor::BgpNeighbor;
pub use bgp_system::BgpSystem;
pub use bgp_vrf::BgpVrf;
pub use bgp_vrf_unicast::BgpNeighborVrfUnicast;
pub use dhcp::Dhcp;
pub use dhcp_helper::DhcpHelper;
pub use evpn::Evpn;
pub use evpn_instance::EvpnInstance;
pub use loopback::Loopback;
pub use nve::Nve;
pub use subinterface::Subinterface;
pub use svi::Svi;
pub use vlan::Vlan;
pub use vrf::Vrf;

/// Description applied when an intent does not set one.
pub const DEFAULT_DESCRIPTION: &str = "Managed by evpnctl";

pub(crate) fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

pub(crate) const fn default_true() -> bool {
    true
}

/// Which hosts an intent applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every host of each role, roles in declared order.
    Roles(&'a [Role]),
    /// One named host.
    Host(&'a str),
}

/// Device state to fetch before compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuery {
    /// Path to fetch.
    pub path: ResourcePath,
    /// Fetch from each host and compile per host, rather than once per role.
    pub per_host: bool,
}

/// Parsed response from a [`DeviceQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    /// Host the state came from.
    pub host: String,
    /// Path that was fetched.
    pub path: String,
    /// Parsed body.
    pub body: Value,
}

impl DeviceState {
    /// Parse a fetched body.
    pub fn parse(host: &str, path: &str, body: &str) -> Result<Self> {
        let body = serde_json::from_str(body).map_err(|e| Error::DeviceState {
            host: host.to_string(),
            path: path.to_string(),
            message: format!("invalid JSON: {e}"),
        })?;
        Ok(Self {
            host: host.to_string(),
            path: path.to_string(),
            body,
        })
    }

    /// String at a JSON pointer, or a device-state error naming `what`.
    pub fn require_str(&self, pointer: &str, what: &str) -> Result<&str> {
        self.body
            .pointer(pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::DeviceState {
                host: self.host.clone(),
                path: self.path.clone(),
                message: format!("{what} not found"),
            })
    }
}

/// What a document is being compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    /// Role being applied, for role-scoped intents.
    pub role: Option<&'a Role>,
    /// Host, for host-scoped intents or per-host compilation.
    pub host: Option<&'a str>,
    /// Prefetched device state.
    pub device: Option<&'a DeviceState>,
}

impl<'a> Target<'a> {
    /// Compile for a role.
    #[must_use]
    pub fn role(role: &'a Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// Compile for a single host.
    #[must_use]
    pub fn host(host: &'a str) -> Self {
        Self {
            host: Some(host),
            ..Self::default()
        }
    }

    /// Attach prefetched device state.
    #[must_use]
    pub fn with_device(mut self, device: &'a DeviceState) -> Self {
        self.device = Some(device);
        self
    }

    /// Whether compiling for the spine role.
    #[must_use]
    pub fn is_spine(&self) -> bool {
        self.role.is_some_and(Role::is_spine)
    }

    /// Role name, else host, for debug naming.
    #[must_use]
    pub fn label(&self) -> &str {
        self.role
            .map(Role::as_str)
            .or(self.host)
            .unwrap_or("all")
    }

    /// Prefetched state, which `kind` cannot compile without.
    pub fn require_device(&self, kind: &str) -> Result<&'a DeviceState> {
        self.device
            .ok_or_else(|| Error::invariant(format!("{kind} compiled without device state")))
    }
}

/// Output of compiling an intent for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDocument {
    /// Path the document is patched at.
    pub path: ResourcePath,
    /// Nested document.
    pub body: Value,
    /// Name handed to the debug sink.
    pub debug_name: String,
}

impl CompiledDocument {
    /// Serialize the document for the wire.
    pub fn to_payload(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.body)?)
    }
}

/// Core trait for fabric resources.
///
/// Implementations are pure: all device I/O is done by the orchestrator,
/// which hands prefetched state in through [`Target`].
pub trait Resource: Send + Sync + fmt::Debug {
    /// Stable identifier within the resource type, e.g. `"100"` for VLAN 100.
    fn id(&self) -> String;

    /// Resource type, e.g. `"vlan"`.
    fn resource_type(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> String {
        format!("{} {}", self.resource_type(), self.id())
    }

    /// Hosts this intent applies to.
    fn scope(&self) -> Scope<'_>;

    /// Boundary validation: shape, ranges, enumerated choices.
    fn validate(&self) -> Result<()>;

    /// Device state needed before compiling or tearing down.
    fn device_query(&self) -> Result<Option<DeviceQuery>> {
        Ok(None)
    }

    /// Compile the document for `target`.
    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument>;

    /// Path used when re-sending on update. Defaults to the create path.
    fn update_path(&self) -> Option<ResourcePath> {
        None
    }

    /// Paths deleted before re-sending on update, for parts of the resource
    /// the intent has switched off. A path already absent is not an error.
    fn update_prune(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(Vec::new())
    }

    /// Path fetched on read.
    fn read_path(&self) -> ResourcePath;

    /// Paths to delete, in order.
    fn teardown(&self, target: &Target<'_>) -> Result<Vec<ResourcePath>>;
}

/// A declared intent, tagged by resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// VLAN with its VNI mapping.
    Vlan(Vlan),
    /// Loopback interface on one host.
    Loopback(Loopback),
    /// BGP process.
    BgpSystem(BgpSystem),
    /// BGP neighbors with optional L2VPN EVPN activation.
    BgpNeighbor(BgpNeighbor),
    /// IPv4 unicast neighbors inside a VRF on one host.
    BgpNeighborVrfUnicast(BgpNeighborVrfUnicast),
    /// BGP VRF address families.
    BgpVrf(BgpVrf),
    /// Global EVPN settings.
    Evpn(Evpn),
    /// EVPN instance.
    EvpnInstance(EvpnInstance),
    /// VRF definition.
    Vrf(Vrf),
    /// NVE interface.
    Nve(Nve),
    /// Switched virtual interface.
    Svi(Svi),
    /// Routed subinterface on one host.
    Subinterface(Subinterface),
    /// DHCP relay and snooping.
    Dhcp(Dhcp),
    /// DHCP helper addresses on an SVI.
    DhcpHelper(DhcpHelper),
}

impl Intent {
    /// Every resource kind tag.
    pub const KINDS: &'static [&'static str] = &[
        "vlan",
        "loopback",
        "bgp_system",
        "bgp_neighbor",
        "bgp_neighbor_vrf_unicast",
        "bgp_vrf",
        "evpn",
        "evpn_instance",
        "vrf",
        "nve",
        "svi",
        "subinterface",
        "dhcp",
        "dhcp_helper",
    ];

    /// The intent as a resource.
    #[must_use]
    pub fn resource(&self) -> &dyn Resource {
        match self {
            Intent::Vlan(r) => r,
            Intent::Loopback(r) => r,
            Intent::BgpSystem(r) => r,
            Intent::BgpNeighbor(r) => r,
            Intent::BgpNeighborVrfUnicast(r) => r,
            Intent::BgpVrf(r) => r,
            Intent::Evpn(r) => r,
            Intent::EvpnInstance(r) => r,
            Intent::Vrf(r) => r,
            Intent::Nve(r) => r,
            Intent::Svi(r) => r,
            Intent::Subinterface(r) => r,
            Intent::Dhcp(r) => r,
            Intent::DhcpHelper(r) => r,
        }
    }

    /// Resource kind tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.resource().resource_type()
    }

    /// Validate the wrapped intent.
    pub fn validate(&self) -> Result<()> {
        self.resource().validate()
    }
}

// ============================================================================
// Shared validation helpers
// ============================================================================

pub(crate) fn require_roles(kind: &'static str, roles: &[Role]) -> Result<()> {
    if roles.is_empty() {
        return Err(Error::intent(kind, "at least one role is required"));
    }
    Ok(())
}

pub(crate) fn require_host(kind: &'static str, host: &str) -> Result<()> {
    if host.trim().is_empty() {
        return Err(Error::intent(kind, "host is required"));
    }
    Ok(())
}

pub(crate) fn require_nonempty(kind: &'static str, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::intent(kind, format!("{field} is required")));
    }
    Ok(())
}

pub(crate) fn require_ipv4(kind: &'static str, field: &str, value: &str) -> Result<()> {
    value
        .parse::<std::net::Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| Error::intent(kind, format!("{field} '{value}' is not an IPv4 address")))
}

pub(crate) fn require_loopback_ref(kind: &'static str, field: &str, value: &str) -> Result<()> {
    if crate::ident::has_numeric_id(value) {
        Ok(())
    } else {
        Err(Error::intent(
            kind,
            format!("{field} '{value}' does not name a loopback (e.g. Loopback0)"),
        ))
    }
}

pub(crate) fn require_range(
    kind: &'static str,
    field: &str,
    value: u32,
    range: std::ops::RangeInclusive<u32>,
) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::intent(
            kind,
            format!(
                "{field} {value} out of range {}..={}",
                range.start(),
                range.end()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_state_require_str() {
        let state = DeviceState::parse("h", "/p", r#"{"a":{"b":"x"}}"#).unwrap();
        assert_eq!(state.require_str("/a/b", "b").unwrap(), "x");
        let err = state.require_str("/a/c", "c leaf").unwrap_err();
        assert!(matches!(err, Error::DeviceState { .. }));
        assert!(err.to_string().contains("c leaf"));
    }

    #[test]
    fn test_device_state_invalid_json() {
        assert!(matches!(
            DeviceState::parse("h", "/p", "<html>"),
            Err(Error::DeviceState { .. })
        ));
    }

    #[test]
    fn test_target_label() {
        let role = Role::from("leafs");
        assert_eq!(Target::role(&role).label(), "leafs");
        assert_eq!(Target::host("10.0.0.1").label(), "10.0.0.1");
        assert_eq!(Target::default().label(), "all");
        assert!(!Target::role(&role).is_spine());
    }

    #[test]
    fn test_target_require_device() {
        let err = Target::default().require_device("bgp_neighbor").unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn test_intent_kinds_cover_every_variant() {
        for kind in Intent::KINDS {
            assert!(!kind.is_empty());
        }
        assert_eq!(Intent::KINDS.len(), 14);
    }

    #[test]
    fn test_intent_deserialize_tagged() {
        let intent: Intent = serde_json::from_str(
            r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100}"#,
        )
        .unwrap();
        assert_eq!(intent.kind(), "vlan");
        assert!(intent.validate().is_ok());
        assert_eq!(intent.resource().id(), "100");
    }

    #[test]
    fn test_intent_unknown_kind() {
        let result: std::result::Result<Intent, _> =
            serde_json::from_str(r#"{"kind": "ospf", "roles": ["leafs"]}"#);
        assert!(result.is_err());
    }

    // ------------------------------------------------------------------------
    // Payload round trip
    // ------------------------------------------------------------------------

    fn intent(json: &str) -> Intent {
        serde_json::from_str(json).unwrap()
    }

    /// Compile twice, serialize, re-parse; the body must survive unchanged.
    fn assert_payload_round_trip(intent: &Intent, target: &Target<'_>) -> Value {
        let resource = intent.resource();
        let doc = resource.compile(target).unwrap();
        let payload = doc.to_payload().unwrap();

        let reparsed: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(reparsed, doc.body);
        assert_eq!(
            serde_json::to_string(&reparsed).unwrap(),
            serde_json::to_string(&doc.body).unwrap(),
            "field order changed"
        );

        let again = resource.compile(target).unwrap().to_payload().unwrap();
        assert_eq!(payload, again);
        reparsed
    }

    const VLAN_ENTRIES: &str = "Cisco-IOS-XE-vlan:configuration-entry";

    #[test]
    fn test_round_trip_vlan_without_evpn_instance() {
        let role = Role::from("leafs");
        let vlan = intent(r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100}"#);
        let body = assert_payload_round_trip(&vlan, &Target::role(&role));

        let member = &body["Cisco-IOS-XE-native:vlan"][VLAN_ENTRIES][0]["member"];
        assert!(member.get("vni").is_some());
        assert!(member.get("evpn-instance").is_none());
    }

    #[test]
    fn test_round_trip_vlan_with_evpn_instance() {
        let role = Role::from("leafs");
        let vlan = intent(
            r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100,
                "evpn_instance": 100}"#,
        );
        let body = assert_payload_round_trip(&vlan, &Target::role(&role));

        let member = &body["Cisco-IOS-XE-native:vlan"][VLAN_ENTRIES][0]["member"];
        assert!(member.get("evpn-instance").is_some());
    }

    #[test]
    fn test_round_trip_bgp_neighbor() {
        let role = Role::from("spines");
        let neighbors = intent(
            r#"{"kind": "bgp_neighbor", "roles": ["spines"], "bgp_id": 65000,
                "neighbors": ["10.0.0.1", "10.0.0.2"], "remote_as": 65000,
                "update_source": "Loopback0", "l2vpn_evpn": true, "route_reflector_client": true}"#,
        );
        let loopback = serde_json::json!({"Cisco-IOS-XE-native:Loopback": [{
            "name": 0,
            "ip": {"address": {"primary": {"address": "10.0.0.1", "mask": "255.255.255.255"}}}
        }]});
        let state = DeviceState::parse("10.0.0.1", "/lo0", &loopback.to_string()).unwrap();

        let body = assert_payload_round_trip(&neighbors, &Target::role(&role).with_device(&state));
        let payload = body.to_string();
        assert!(payload.contains("10.0.0.2"));
        assert!(!payload.contains("\"10.0.0.1\""));
    }

    #[test]
    fn test_round_trip_evpn_instance() {
        let role = Role::from("leafs");
        let instance = intent(
            r#"{"kind": "evpn_instance", "roles": ["leafs"], "instance_id": 100,
                "vlan_based": true, "rd": "1:100", "rt_type": "both",
                "re_originate": "route-type5"}"#,
        );
        assert_payload_round_trip(&instance, &Target::role(&role));

        let plain = intent(r#"{"kind": "evpn_instance", "roles": ["leafs"], "instance_id": 200}"#);
        assert_payload_round_trip(&plain, &Target::role(&role));
    }

    #[test]
    fn test_intent_rejects_misspelled_field() {
        let result: std::result::Result<Intent, _> = serde_json::from_str(
            r#"{"kind": "vlan", "roles": ["leafs"], "vlan_id": 100, "vni": 10100,
                "evpn_instanse": 5}"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("evpn_instanse"), "{err}");

        let result: std::result::Result<Intent, _> = serde_json::from_str(
            r#"{"kind": "svi", "roles": ["leafs"], "svi_id": 100, "unumbered": "Loopback1"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_helpers() {
        assert!(require_roles("vlan", &[]).is_err());
        assert!(require_host("loopback", " ").is_err());
        assert!(require_ipv4("svi", "ipv4_address", "10.0.0.256").is_err());
        assert!(require_ipv4("svi", "ipv4_address", "10.0.0.1").is_ok());
        assert!(require_loopback_ref("nve", "source_interface", "Loopback1").is_ok());
        assert!(require_loopback_ref("nve", "source_interface", "Loopback").is_err());
        assert!(require_range("vlan", "vlan_id", 4095, 1..=4094).is_err());
    }
}
