//! VLAN definition with its VNI mapping.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{CompiledDocument, Resource, Scope, Target, require_range, require_roles};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "vlan";

/// Prefix of the generated VLAN name.
pub const DEFAULT_NAME_PREFIX: &str = "ManagedByEvpnctl";

static CONFIGURATION_ENTRY: Schema = Schema {
    name: "vlan configuration-entry",
    fields: &[
        Field::required("vlan-id", FieldKind::Str),
        Field::optional("member/evpn-instance/evpn-instance", FieldKind::Int),
        Field::optional("member/evpn-instance/vni", FieldKind::Int),
        Field::optional("member/vni", FieldKind::Int),
    ],
};

static VLAN_LIST: Schema = Schema {
    name: "vlan-list",
    fields: &[
        Field::required("id", FieldKind::Int),
        Field::required("name", FieldKind::Str),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "vlan",
    fields: &[
        Field::required(
            "Cisco-IOS-XE-native:vlan/Cisco-IOS-XE-vlan:configuration-entry",
            FieldKind::List(&CONFIGURATION_ENTRY),
        ),
        Field::required(
            "Cisco-IOS-XE-native:vlan/Cisco-IOS-XE-vlan:vlan-list",
            FieldKind::List(&VLAN_LIST),
        ),
    ],
};

/// A VLAN mapped to a VNI, optionally through an EVPN instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vlan {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// VLAN number.
    pub vlan_id: u16,
    /// VLAN name; generated from the id when unset.
    #[serde(default)]
    pub name: Option<String>,
    /// EVPN instance the VLAN is a member of.
    #[serde(default)]
    pub evpn_instance: Option<u32>,
    /// VXLAN network identifier.
    pub vni: u32,
}

impl Vlan {
    /// Name sent to the device.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{DEFAULT_NAME_PREFIX}_{}", self.vlan_id),
        }
    }

    fn base_path() -> ResourcePath {
        ResourcePath::native().child("vlan")
    }

    fn entry_path(&self) -> ResourcePath {
        Self::base_path().keyed("configuration-entry", self.vlan_id)
    }
}

impl Resource for Vlan {
    fn id(&self) -> String {
        self.vlan_id.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_range(KIND, "vlan_id", u32::from(self.vlan_id), 1..=4094)?;
        require_range(KIND, "vni", self.vni, 1..=16_777_215)?;
        if self.evpn_instance == Some(0) {
            return Err(Error::intent(KIND, "evpn_instance must be positive"));
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let entry = match self.evpn_instance {
            Some(instance) => Record::new()
                .set("vlan-id", self.vlan_id.to_string())
                .set("member/evpn-instance/evpn-instance", instance)
                .set("member/evpn-instance/vni", self.vni),
            None => Record::new()
                .set("vlan-id", self.vlan_id.to_string())
                .set("member/vni", self.vni),
        };
        let listing = Record::new()
            .set("id", self.vlan_id)
            .set("name", self.display_name());

        let body = DOCUMENT.build(
            &Record::new()
                .set(
                    "Cisco-IOS-XE-native:vlan/Cisco-IOS-XE-vlan:configuration-entry",
                    vec![entry],
                )
                .set("Cisco-IOS-XE-native:vlan/Cisco-IOS-XE-vlan:vlan-list", vec![listing]),
        )?;
        Ok(CompiledDocument {
            path: Self::base_path(),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.vlan_id),
        })
    }

    fn read_path(&self) -> ResourcePath {
        self.entry_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![self.entry_path()])
    }
}
