//! Switched virtual interfaces.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_description, require_ipv4, require_nonempty,
    require_range, require_roles,
};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "svi";

static ENTRY: Schema = Schema {
    name: "svi",
    fields: &[
        Field::required("name", FieldKind::Int),
        Field::required("autostate", FieldKind::Bool),
        Field::optional("description", FieldKind::Str),
        Field::optional("vrf/forwarding", FieldKind::Str),
        Field::optional("ip/address/primary/address", FieldKind::Str),
        Field::optional("ip/address/primary/mask", FieldKind::Str),
        Field::optional("ip/unnumbered", FieldKind::Str),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "svi interface",
    fields: &[Field::required("Cisco-IOS-XE-native:Vlan", FieldKind::List(&ENTRY))],
};

/// How the SVI gets its IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing<'a> {
    /// Primary address and mask.
    Primary {
        /// Address.
        address: &'a str,
        /// Mask.
        mask: &'a str,
    },
    /// Borrowed from another interface.
    Unnumbered(&'a str),
}

/// An SVI for a VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Svi {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// VLAN number.
    pub svi_id: u16,
    /// Keep the SVI up only while a member port is up.
    #[serde(default)]
    pub autostate: bool,
    /// Interface description.
    #[serde(default = "default_description")]
    pub description: String,
    /// VRF to forward in.
    #[serde(default)]
    pub vrf: Option<String>,
    /// Primary address.
    #[serde(default)]
    pub ipv4_address: Option<String>,
    /// Primary mask; required with `ipv4_address`.
    #[serde(default)]
    pub ipv4_mask: Option<String>,
    /// Interface to borrow an address from, e.g. `Loopback1`.
    #[serde(default)]
    pub unnumbered: Option<String>,
}

impl Svi {
    fn interface_path(&self) -> ResourcePath {
        ResourcePath::native().child("interface").keyed("Vlan", self.svi_id)
    }

    /// Resolve the addressing mode; exactly one must be configured.
    pub fn addressing(&self) -> Result<Addressing<'_>> {
        match (
            self.ipv4_address.as_deref(),
            self.ipv4_mask.as_deref(),
            self.unnumbered.as_deref(),
        ) {
            (Some(address), Some(mask), None) => Ok(Addressing::Primary { address, mask }),
            (None, None, Some(interface)) => Ok(Addressing::Unnumbered(interface)),
            (Some(_), None, _) => Err(Error::intent(KIND, "ipv4_address requires ipv4_mask")),
            (None, Some(_), _) => Err(Error::intent(KIND, "ipv4_mask requires ipv4_address")),
            (Some(_), Some(_), Some(_)) => Err(Error::intent(
                KIND,
                "ipv4_address and unnumbered are mutually exclusive",
            )),
            (None, None, None) => Err(Error::intent(
                KIND,
                "either ipv4_address/ipv4_mask or unnumbered is required",
            )),
        }
    }
}

impl Resource for Svi {
    fn id(&self) -> String {
        self.svi_id.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("svi Vlan{}", self.svi_id)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_range(KIND, "svi_id", u32::from(self.svi_id), 1..=4094)?;
        match self.addressing()? {
            Addressing::Primary { address, mask } => {
                require_ipv4(KIND, "ipv4_address", address)?;
                require_ipv4(KIND, "ipv4_mask", mask)
            }
            Addressing::Unnumbered(interface) => require_nonempty(KIND, "unnumbered", interface),
        }
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let mut entry = Record::new()
            .set("name", self.svi_id)
            .set("autostate", self.autostate)
            .set_opt(
                "description",
                Some(self.description.as_str()).filter(|d| !d.is_empty()),
            )
            .set_opt("vrf/forwarding", self.vrf.as_deref());
        entry = match self.addressing()? {
            Addressing::Primary { address, mask } => entry
                .set("ip/address/primary/address", address)
                .set("ip/address/primary/mask", mask),
            Addressing::Unnumbered(interface) => entry.set("ip/unnumbered", interface),
        };
        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-native:Vlan", vec![entry]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("interface/Vlan"),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.svi_id),
        })
    }

    fn update_path(&self) -> Option<ResourcePath> {
        Some(self.interface_path())
    }

    fn read_path(&self) -> ResourcePath {
        self.interface_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![self.interface_path()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn svi() -> Svi {
        Svi {
            roles: vec![Role::from("leafs")],
            svi_id: 100,
            autostate: false,
            description: String::new(),
            vrf: Some("tenant".to_string()),
            ipv4_address: Some("10.100.0.1".to_string()),
            ipv4_mask: Some("255.255.255.0".to_string()),
            unnumbered: None,
        }
    }

    #[test]
    fn test_compile_primary_address() {
        let role = Role::from("leafs");
        let doc = svi().compile(&Target::role(&role)).unwrap();
        assert_eq!(
            doc.body,
            json!({"Cisco-IOS-XE-native:Vlan": [{
                "name": 100,
                "autostate": false,
                "vrf": {"forwarding": "tenant"},
                "ip": {"address": {"primary": {"address": "10.100.0.1", "mask": "255.255.255.0"}}}
            }]})
        );
        assert_eq!(doc.debug_name, "svi_leafs_100");
    }

    #[test]
    fn test_compile_unnumbered() {
        let intent = Svi {
            ipv4_address: None,
            ipv4_mask: None,
            unnumbered: Some("Loopback1".to_string()),
            vrf: None,
            ..svi()
        };
        let doc = intent.compile(&Target::default()).unwrap();
        let entry = &doc.body["Cisco-IOS-XE-native:Vlan"][0];
        assert_eq!(entry["ip"], json!({"unnumbered": "Loopback1"}));
        assert!(entry.get("vrf").is_none());
    }

    #[test]
    fn test_addressing_rules() {
        let neither = Svi {
            ipv4_address: None,
            ipv4_mask: None,
            ..svi()
        };
        assert!(matches!(neither.validate(), Err(Error::InvalidIntent { .. })));

        let both = Svi {
            unnumbered: Some("Loopback1".to_string()),
            ..svi()
        };
        assert!(both.validate().is_err());

        let no_mask = Svi {
            ipv4_mask: None,
            ..svi()
        };
        assert!(no_mask.compile(&Target::default()).is_err());
    }

    #[test]
    fn test_paths() {
        assert!(svi().update_path().unwrap().as_str().ends_with("/interface/Vlan=100"));
        assert_eq!(svi().teardown(&Target::default()).unwrap(), vec![svi().read_path()]);
    }
}
