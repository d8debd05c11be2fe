//! IPv4 unicast neighbors inside a VRF, configured on one host.

use restconf::ResourcePath;
use serde::Deserialize;

use super::bgp_system::router_path;
use super::{
    CompiledDocument, Resource, Scope, Target, default_true, require_host, require_ipv4,
    require_nonempty,
};
use crate::error::{Error, Result};
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "bgp_neighbor_vrf_unicast";

static NEIGHBOR: Schema = Schema {
    name: "vrf ipv4-unicast neighbor",
    fields: &[
        Field::required("id", FieldKind::Str),
        Field::required("remote-as", FieldKind::Int),
        Field::optional("activate", FieldKind::Presence(Marker::Blank)),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "vrf ipv4-unicast",
    fields: &[Field::required(
        "Cisco-IOS-XE-bgp:ipv4-unicast/neighbor",
        FieldKind::List(&NEIGHBOR),
    )],
};

/// VRF-scoped IPv4 unicast neighbors on a single device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpNeighborVrfUnicast {
    /// Device to configure.
    pub host: String,
    /// Local autonomous system number.
    pub bgp_id: u32,
    /// Neighbor autonomous system number.
    pub remote_as: u32,
    /// Activate the neighbors.
    #[serde(default = "default_true")]
    pub activate: bool,
    /// VRF name.
    pub vrf: String,
    /// Neighbor addresses.
    #[serde(default)]
    pub ipv4_neighbors: Vec<String>,
}

impl BgpNeighborVrfUnicast {
    fn unicast_path(&self) -> ResourcePath {
        router_path(self.bgp_id)
            .child("address-family/with-vrf/ipv4/unicast")
            .keyed("vrf", &self.vrf)
            .child("ipv4-unicast")
    }
}

impl Resource for BgpNeighborVrfUnicast {
    fn id(&self) -> String {
        format!("{}_{}", self.host, self.vrf)
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("vrf {} unicast neighbors on {}", self.vrf, self.host)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Host(&self.host)
    }

    fn validate(&self) -> Result<()> {
        require_host(KIND, &self.host)?;
        require_nonempty(KIND, "vrf", &self.vrf)?;
        for neighbor in &self.ipv4_neighbors {
            require_ipv4(KIND, "ipv4_neighbors", neighbor)?;
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        if self.ipv4_neighbors.is_empty() {
            return Err(Error::NoData(format!(
                "{KIND} {}: no ipv4_neighbors",
                self.id()
            )));
        }
        let neighbors: Vec<Record> = self
            .ipv4_neighbors
            .iter()
            .map(|id| {
                Record::new()
                    .set("id", id)
                    .set("remote-as", self.remote_as)
                    .flag_if("activate", self.activate)
            })
            .collect();
        let body = DOCUMENT.build(
            &Record::new().set("Cisco-IOS-XE-bgp:ipv4-unicast/neighbor", neighbors),
        )?;
        Ok(CompiledDocument {
            path: self.unicast_path(),
            body,
            debug_name: format!("{KIND}_ipv4_{}_{}", target.label(), self.vrf),
        })
    }

    fn read_path(&self) -> ResourcePath {
        self.unicast_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(self
            .ipv4_neighbors
            .iter()
            .map(|n| self.unicast_path().keyed("neighbor", n))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unicast() -> BgpNeighborVrfUnicast {
        BgpNeighborVrfUnicast {
            host: "10.0.2.1".to_string(),
            bgp_id: 65000,
            remote_as: 65100,
            activate: true,
            vrf: "tenant".to_string(),
            ipv4_neighbors: vec!["172.16.0.1".to_string(), "172.16.0.5".to_string()],
        }
    }

    #[test]
    fn test_compile() {
        let intent = unicast();
        let doc = intent.compile(&Target::host(&intent.host)).unwrap();
        assert_eq!(
            doc.body,
            json!({"Cisco-IOS-XE-bgp:ipv4-unicast": {"neighbor": [
                {"id": "172.16.0.1", "remote-as": 65100, "activate": [""]},
                {"id": "172.16.0.5", "remote-as": 65100, "activate": [""]}
            ]}})
        );
        assert!(doc.path.as_str().ends_with(
            "/router/bgp=65000/address-family/with-vrf/ipv4/unicast/vrf=tenant/ipv4-unicast"
        ));
        assert_eq!(doc.debug_name, "bgp_neighbor_vrf_unicast_ipv4_10.0.2.1_tenant");
    }

    #[test]
    fn test_activate_omitted() {
        let intent = BgpNeighborVrfUnicast {
            activate: false,
            ..unicast()
        };
        let doc = intent.compile(&Target::default()).unwrap();
        assert!(doc.body["Cisco-IOS-XE-bgp:ipv4-unicast"]["neighbor"][0].get("activate").is_none());
    }

    #[test]
    fn test_empty_neighbors_is_no_data() {
        let intent = BgpNeighborVrfUnicast {
            ipv4_neighbors: vec![],
            ..unicast()
        };
        assert!(intent.validate().is_ok());
        assert!(matches!(intent.compile(&Target::default()), Err(Error::NoData(_))));
    }

    #[test]
    fn test_teardown_one_path_per_neighbor() {
        let paths = unicast().teardown(&Target::default()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].as_str().ends_with("/ipv4-unicast/neighbor=172.16.0.5"));
    }
}
