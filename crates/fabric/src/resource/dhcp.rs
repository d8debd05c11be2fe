//! Global DHCP relay options and snooping.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{CompiledDocument, Resource, Scope, Target, default_true, require_range, require_roles};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "dhcp";

/// Leaf path inside the global dhcp container.
macro_rules! dhcp {
    ($leaf:literal) => {
        concat!("Cisco-IOS-XE-native:dhcp/Cisco-IOS-XE-dhcp:", $leaf)
    };
}

static VLAN_LIST: Schema = Schema {
    name: "snooping vlan-list",
    fields: &[Field::required("id", FieldKind::Str)],
};

static DOCUMENT: Schema = Schema {
    name: "dhcp",
    fields: &[
        Field::required(dhcp!("compatibility/suboption/link-selection"), FieldKind::Str),
        Field::required(dhcp!("compatibility/suboption/server-override"), FieldKind::Str),
        Field::required(
            dhcp!("relay/information/option/option-default"),
            FieldKind::Presence(Marker::Null),
        ),
        Field::optional(dhcp!("relay/information/option/vpn"), FieldKind::Presence(Marker::Null)),
        Field::required(dhcp!("snooping"), FieldKind::Presence(Marker::Null)),
        Field::required(dhcp!("snooping-conf/snooping/vlan-list"), FieldKind::List(&VLAN_LIST)),
    ],
};

/// DHCP relay and snooping for a set of VLANs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dhcp {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// VLANs to snoop on.
    #[serde(default)]
    pub vlans: Vec<u16>,
    /// Insert the VPN relay suboption.
    #[serde(default = "default_true")]
    pub relay_vpn: bool,
}

impl Dhcp {
    fn path() -> ResourcePath {
        ResourcePath::native().child("ip/dhcp")
    }

    /// Comma-joined VLAN list, e.g. `"10,20"`.
    #[must_use]
    pub fn vlan_list(&self) -> String {
        self.vlans
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Resource for Dhcp {
    fn id(&self) -> String {
        "global".to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("dhcp snooping on vlans {}", self.vlan_list())
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        for vlan in &self.vlans {
            require_range(KIND, "vlans", u32::from(*vlan), 1..=4094)?;
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        if self.vlans.is_empty() {
            return Err(Error::NoData(format!("{KIND}: no vlans to snoop on")));
        }
        let record = Record::new()
            .set(dhcp!("compatibility/suboption/link-selection"), "standard")
            .set(dhcp!("compatibility/suboption/server-override"), "standard")
            .flag(dhcp!("relay/information/option/option-default"))
            .flag_if(dhcp!("relay/information/option/vpn"), self.relay_vpn)
            .flag(dhcp!("snooping"))
            .set(
                dhcp!("snooping-conf/snooping/vlan-list"),
                vec![Record::new().set("id", self.vlan_list())],
            );
        Ok(CompiledDocument {
            path: Self::path(),
            body: DOCUMENT.build(&record)?,
            debug_name: format!("{KIND}_{}_global", target.label()),
        })
    }

    fn read_path(&self) -> ResourcePath {
        Self::path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![Self::path()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dhcp() -> Dhcp {
        Dhcp {
            roles: vec![Role::from("leafs")],
            vlans: vec![10, 20],
            relay_vpn: true,
        }
    }

    #[test]
    fn test_compile() {
        let role = Role::from("leafs");
        let doc = dhcp().compile(&Target::role(&role)).unwrap();
        assert_eq!(
            doc.body,
            json!({"Cisco-IOS-XE-native:dhcp": {
                "Cisco-IOS-XE-dhcp:compatibility": {
                    "suboption": {"link-selection": "standard", "server-override": "standard"}
                },
                "Cisco-IOS-XE-dhcp:relay": {
                    "information": {"option": {"option-default": [null], "vpn": [null]}}
                },
                "Cisco-IOS-XE-dhcp:snooping": [null],
                "Cisco-IOS-XE-dhcp:snooping-conf": {"snooping": {"vlan-list": [{"id": "10,20"}]}}
            }})
        );
        assert_eq!(doc.debug_name, "dhcp_leafs_global");
    }

    #[test]
    fn test_vpn_suboption_omitted() {
        let intent = Dhcp {
            relay_vpn: false,
            ..dhcp()
        };
        let doc = intent.compile(&Target::default()).unwrap();
        let relay = &doc.body["Cisco-IOS-XE-native:dhcp"]["Cisco-IOS-XE-dhcp:relay"];
        assert_eq!(relay["information"]["option"], json!({"option-default": [null]}));
    }

    #[test]
    fn test_empty_vlans_is_no_data() {
        let intent = Dhcp {
            vlans: vec![],
            ..dhcp()
        };
        assert!(matches!(intent.compile(&Target::default()), Err(Error::NoData(_))));
    }

    #[test]
    fn test_vlan_list_and_paths() {
        assert_eq!(Dhcp { vlans: vec![5], ..dhcp() }.vlan_list(), "5");
        assert!(dhcp().read_path().as_str().ends_with("/ip/dhcp"));
        assert_eq!(dhcp().teardown(&Target::default()).unwrap().len(), 1);
        assert!(Dhcp { vlans: vec![0], ..dhcp() }.validate().is_err());
    }
}
