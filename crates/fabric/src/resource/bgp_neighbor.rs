//! BGP neighbors and their L2VPN EVPN activation.
//!
//! The neighbor list is shared by every device in a role, so each device
//! excludes its own address, read from its update-source loopback, before
//! compiling. That makes compilation per host.

use restconf::ResourcePath;
use serde::Deserialize;

use super::bgp_system::router_path;
use super::{
    CompiledDocument, DeviceQuery, Resource, Scope, Target, default_true, loopback, require_ipv4,
    require_loopback_ref, require_roles,
};
use crate::error::{Error, Result, check_choice};
use crate::fleet::Role;
use crate::ident::{Marker, extract_numeric_id};
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "bgp_neighbor";

/// Accepted `send_community` values.
pub const SEND_COMMUNITY: &[&str] = &["both", "extended", "standard"];

static NEIGHBOR: Schema = Schema {
    name: "bgp neighbor",
    fields: &[
        Field::required("id", FieldKind::Str),
        Field::required("remote-as", FieldKind::Int),
        Field::required("update-source/interface/Loopback", FieldKind::Int),
    ],
};

static EVPN_NEIGHBOR: Schema = Schema {
    name: "l2vpn-evpn neighbor",
    fields: &[
        Field::required("id", FieldKind::Str),
        Field::optional("activate", FieldKind::Presence(Marker::Null)),
        Field::optional("route-reflector-client", FieldKind::Presence(Marker::Null)),
        Field::optional("send-community/send-community-where", FieldKind::Str),
    ],
};

static L2VPN: Schema = Schema {
    name: "l2vpn address-family",
    fields: &[
        Field::required("af-name", FieldKind::Str),
        Field::required("l2vpn-evpn/neighbor", FieldKind::List(&EVPN_NEIGHBOR)),
    ],
};

static ENTRY: Schema = Schema {
    name: "bgp",
    fields: &[
        Field::required("id", FieldKind::Int),
        Field::required("neighbor", FieldKind::List(&NEIGHBOR)),
        Field::optional("address-family/no-vrf/l2vpn", FieldKind::List(&L2VPN)),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "bgp neighbors",
    fields: &[Field::required("Cisco-IOS-XE-bgp:bgp", FieldKind::List(&ENTRY))],
};

/// Neighbors applied to every device in a role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpNeighbor {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// Local autonomous system number.
    pub bgp_id: u32,
    /// Neighbor addresses; a device's own address is skipped.
    pub neighbors: Vec<String>,
    /// Neighbor autonomous system number.
    pub remote_as: u32,
    /// Update-source loopback, e.g. `Loopback0`.
    pub update_source: String,
    /// Activate the neighbors for L2VPN EVPN.
    #[serde(default)]
    pub l2vpn_evpn: bool,
    /// Send `activate` in the EVPN address family.
    #[serde(default = "default_true")]
    pub activate: bool,
    /// Communities sent to EVPN neighbors.
    #[serde(default = "default_send_community")]
    pub send_community: String,
    /// Mark EVPN neighbors as route-reflector clients. Spines only.
    #[serde(default)]
    pub route_reflector_client: bool,
}

fn default_send_community() -> String {
    "both".to_string()
}

impl BgpNeighbor {
    fn loopback_id(&self) -> Result<u32> {
        extract_numeric_id(&self.update_source)
    }

    /// Neighbors other than `local`.
    pub fn peers_of<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a str> {
        self.neighbors
            .iter()
            .map(String::as_str)
            .filter(move |n| *n != local)
    }

    fn evpn_neighbor(&self, peer: &str, spine: bool) -> Record {
        Record::new()
            .set("id", peer)
            .flag_if("activate", self.activate)
            .flag_if("route-reflector-client", spine && self.route_reflector_client)
            .set("send-community/send-community-where", &self.send_community)
    }
}

impl Resource for BgpNeighbor {
    fn id(&self) -> String {
        format!("{}_{}", self.bgp_id, self.update_source)
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("bgp neighbors of AS {} via {}", self.bgp_id, self.update_source)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        if self.neighbors.is_empty() {
            return Err(Error::intent(KIND, "at least one neighbor is required"));
        }
        for neighbor in &self.neighbors {
            require_ipv4(KIND, "neighbors", neighbor)?;
        }
        require_loopback_ref(KIND, "update_source", &self.update_source)?;
        check_choice("send_community", &self.send_community, SEND_COMMUNITY)
    }

    fn device_query(&self) -> Result<Option<DeviceQuery>> {
        Ok(Some(DeviceQuery {
            path: loopback::path_for(self.loopback_id()?),
            per_host: true,
        }))
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let device = target.require_device(KIND)?;
        let local = loopback::primary_address(device)?;
        let loopback = self.loopback_id()?;

        let peers: Vec<&str> = self.peers_of(local).collect();
        if peers.is_empty() {
            return Err(Error::NoData(format!(
                "{KIND} on {}: every neighbor is the local address {local}",
                device.host
            )));
        }

        let neighbors: Vec<Record> = peers
            .iter()
            .map(|peer| {
                Record::new()
                    .set("id", *peer)
                    .set("remote-as", self.remote_as)
                    .set("update-source/interface/Loopback", loopback)
            })
            .collect();
        let mut entry = Record::new()
            .set("id", self.bgp_id)
            .set("neighbor", neighbors);
        if self.l2vpn_evpn {
            let spine = target.is_spine();
            let evpn: Vec<Record> = peers
                .iter()
                .map(|peer| self.evpn_neighbor(peer, spine))
                .collect();
            entry = entry.set(
                "address-family/no-vrf/l2vpn",
                vec![Record::new().set("af-name", "evpn").set("l2vpn-evpn/neighbor", evpn)],
            );
        }

        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-bgp:bgp", vec![entry]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("router/bgp"),
            body,
            debug_name: format!("bgp_neighbors_{}_{local}", target.label()),
        })
    }

    fn read_path(&self) -> ResourcePath {
        router_path(self.bgp_id).child("neighbor")
    }

    fn teardown(&self, target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        let device = target.require_device(KIND)?;
        let local = loopback::primary_address(device)?;
        let mut paths = Vec::new();
        for peer in self.peers_of(local) {
            if self.l2vpn_evpn {
                paths.push(
                    router_path(self.bgp_id)
                        .child("address-family/no-vrf/l2vpn/evpn/l2vpn-evpn")
                        .keyed("neighbor", peer),
                );
            }
            paths.push(router_path(self.bgp_id).keyed("neighbor", peer));
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::DeviceState;
    use serde_json::json;

    fn neighbor() -> BgpNeighbor {
        BgpNeighbor {
            roles: vec![Role::from("spines"), Role::from("leafs")],
            bgp_id: 65000,
            neighbors: vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()],
            remote_as: 65000,
            update_source: "Loopback0".to_string(),
            l2vpn_evpn: true,
            activate: true,
            send_community: "both".to_string(),
            route_reflector_client: true,
        }
    }

    fn state(address: &str) -> DeviceState {
        let body = json!({"Cisco-IOS-XE-native:Loopback": [{
            "name": 0,
            "ip": {"address": {"primary": {"address": address, "mask": "255.255.255.255"}}}
        }]});
        DeviceState::parse("device", "/lo0", &body.to_string()).unwrap()
    }

    #[test]
    fn test_device_query_per_host() {
        let query = neighbor().device_query().unwrap().unwrap();
        assert!(query.per_host);
        assert!(query.path.as_str().ends_with("/interface/Loopback=0"));
    }

    #[test]
    fn test_self_exclusion() {
        let role = Role::from("leafs");
        let state = state("10.0.0.1");
        let doc = neighbor().compile(&Target::role(&role).with_device(&state)).unwrap();
        let bgp = &doc.body["Cisco-IOS-XE-bgp:bgp"][0];
        assert_eq!(
            bgp["neighbor"],
            json!([{
                "id": "10.0.0.2",
                "remote-as": 65000,
                "update-source": {"interface": {"Loopback": 0}}
            }])
        );
        assert_eq!(doc.debug_name, "bgp_neighbors_leafs_10.0.0.1");
    }

    #[test]
    fn test_route_reflector_client_only_on_spines() {
        let leafs = Role::from("leafs");
        let spines = Role::from("spines");
        let state = state("10.0.0.9");

        let doc = neighbor().compile(&Target::role(&leafs).with_device(&state)).unwrap();
        let evpn = &doc.body["Cisco-IOS-XE-bgp:bgp"][0]["address-family"]["no-vrf"]["l2vpn"][0];
        assert_eq!(evpn["af-name"], json!("evpn"));
        assert!(evpn["l2vpn-evpn"]["neighbor"][0].get("route-reflector-client").is_none());

        let doc = neighbor().compile(&Target::role(&spines).with_device(&state)).unwrap();
        let evpn = &doc.body["Cisco-IOS-XE-bgp:bgp"][0]["address-family"]["no-vrf"]["l2vpn"][0];
        assert_eq!(
            evpn["l2vpn-evpn"]["neighbor"][0],
            json!({
                "id": "10.0.0.1",
                "activate": [null],
                "route-reflector-client": [null],
                "send-community": {"send-community-where": "both"}
            })
        );
    }

    #[test]
    fn test_no_address_family_without_l2vpn_evpn() {
        let intent = BgpNeighbor {
            l2vpn_evpn: false,
            ..neighbor()
        };
        let state = state("10.0.0.1");
        let doc = intent.compile(&Target::default().with_device(&state)).unwrap();
        assert!(doc.body["Cisco-IOS-XE-bgp:bgp"][0].get("address-family").is_none());
    }

    #[test]
    fn test_only_self_is_no_data() {
        let intent = BgpNeighbor {
            neighbors: vec!["10.0.0.1".to_string()],
            ..neighbor()
        };
        let state = state("10.0.0.1");
        let err = intent.compile(&Target::default().with_device(&state)).unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn test_compile_requires_device_state() {
        assert!(matches!(
            neighbor().compile(&Target::default()),
            Err(Error::Invariant(_))
        ));
    }

    #[test]
    fn test_missing_loopback_address() {
        let empty = DeviceState::parse("device", "/lo0", "{}").unwrap();
        assert!(matches!(
            neighbor().compile(&Target::default().with_device(&empty)),
            Err(Error::DeviceState { .. })
        ));
    }

    #[test]
    fn test_teardown_paths_skip_self() {
        let state = state("10.0.0.1");
        let paths = neighbor().teardown(&Target::default().with_device(&state)).unwrap();
        let paths: Vec<&str> = paths.iter().map(ResourcePath::as_str).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with("/no-vrf/l2vpn/evpn/l2vpn-evpn/neighbor=10.0.0.2"));
        assert!(paths[0].contains("/router/bgp=65000/"));
        assert!(paths[1].ends_with("/router/bgp=65000/neighbor=10.0.0.2"));
    }

    #[test]
    fn test_validate_send_community() {
        let bad = BgpNeighbor {
            send_community: "large".to_string(),
            ..neighbor()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidChoice { .. })));
    }
}
