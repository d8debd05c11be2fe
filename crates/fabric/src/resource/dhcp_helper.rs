//! DHCP helper addresses on an SVI.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{CompiledDocument, Resource, Scope, Target, require_ipv4, require_range, require_roles};
use crate::error::{Error, Result, check_choice};
use crate::fleet::Role;
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "dhcp_helper";

/// Accepted `vrf` values.
pub const HELPER_VRFS: &[&str] = &["global"];

static HELPER: Schema = Schema {
    name: "helper-address",
    fields: &[
        Field::required("address", FieldKind::Str),
        Field::required("global", FieldKind::Presence(Marker::Blank)),
    ],
};

static ENTRY: Schema = Schema {
    name: "svi dhcp helper",
    fields: &[
        Field::required("name", FieldKind::Int),
        Field::required("ip/helper-address", FieldKind::List(&HELPER)),
        Field::optional(
            "ip/dhcp/Cisco-IOS-XE-dhcp:relay/source-interface",
            FieldKind::Str,
        ),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "dhcp helper",
    fields: &[Field::required("Cisco-IOS-XE-native:Vlan", FieldKind::List(&ENTRY))],
};

fn default_vrf() -> String {
    "global".to_string()
}

/// Helper addresses relaying DHCP from an SVI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DhcpHelper {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// SVI number.
    pub svi_id: u16,
    /// DHCP server addresses.
    #[serde(default)]
    pub ipv4_helper: Vec<String>,
    /// Routing table of the helpers; only the global table is supported.
    #[serde(default = "default_vrf")]
    pub vrf: String,
    /// Relay source interface.
    #[serde(default)]
    pub source_interface: Option<String>,
}

impl DhcpHelper {
    fn interface_path(&self) -> ResourcePath {
        ResourcePath::native().child("interface").keyed("Vlan", self.svi_id)
    }
}

impl Resource for DhcpHelper {
    fn id(&self) -> String {
        self.svi_id.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("dhcp helpers on Vlan{}", self.svi_id)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_range(KIND, "svi_id", u32::from(self.svi_id), 2..=4094)?;
        check_choice("vrf", &self.vrf, HELPER_VRFS)?;
        for helper in &self.ipv4_helper {
            require_ipv4(KIND, "ipv4_helper", helper)?;
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        if self.ipv4_helper.is_empty() {
            return Err(Error::NoData(format!(
                "{KIND} Vlan{}: no ipv4_helper addresses",
                self.svi_id
            )));
        }
        let helpers: Vec<Record> = self
            .ipv4_helper
            .iter()
            .map(|address| Record::new().set("address", address).flag("global"))
            .collect();
        let entry = Record::new()
            .set("name", self.svi_id)
            .set("ip/helper-address", helpers)
            .set_opt(
                "ip/dhcp/Cisco-IOS-XE-dhcp:relay/source-interface",
                self.source_interface.as_deref(),
            );
        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-native:Vlan", vec![entry]))?;
        Ok(CompiledDocument {
            path: self.interface_path(),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.svi_id),
        })
    }

    fn read_path(&self) -> ResourcePath {
        self.interface_path().child("ip/helper-address")
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        let mut paths: Vec<ResourcePath> = self
            .ipv4_helper
            .iter()
            .map(|helper| {
                self.interface_path()
                    .child("ip")
                    .keyed("helper-address", helper)
            })
            .collect();
        if self.source_interface.is_some() {
            paths.push(self.interface_path().child("ip/dhcp/relay"));
        }
        Ok(paths)
    }
}
