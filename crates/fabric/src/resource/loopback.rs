//! Loopback interface on a single host.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, DeviceState, Resource, Scope, Target, default_description, default_true,
    require_host, require_ipv4,
};
use crate::error::Result;
use crate::ident::{Marker, loopback_name};
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "loopback";

/// Pointer to the primary address in a fetched loopback document.
pub const PRIMARY_ADDRESS_POINTER: &str =
    "/Cisco-IOS-XE-native:Loopback/0/ip/address/primary/address";

static ENTRY: Schema = Schema {
    name: "loopback",
    fields: &[
        Field::required("name", FieldKind::Int),
        Field::optional("description", FieldKind::Str),
        Field::required("ip/address/primary/address", FieldKind::Str),
        Field::required("ip/address/primary/mask", FieldKind::Str),
        Field::optional(
            "ip/pim/Cisco-IOS-XE-multicast:pim-mode-choice-cfg/sparse-mode",
            FieldKind::Presence(Marker::Container),
        ),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "loopback interface",
    fields: &[Field::required(
        "Cisco-IOS-XE-native:Loopback",
        FieldKind::List(&ENTRY),
    )],
};

/// Path of loopback `id`.
#[must_use]
pub fn path_for(id: u32) -> ResourcePath {
    ResourcePath::native()
        .child("interface")
        .keyed("Loopback", id)
}

/// Primary IPv4 address in a fetched loopback document.
pub fn primary_address(state: &DeviceState) -> Result<&str> {
    state.require_str(PRIMARY_ADDRESS_POINTER, "loopback primary address")
}

/// A loopback with a primary IPv4 address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Loopback {
    /// Device to configure.
    pub host: String,
    /// Loopback number.
    pub loopback_id: u32,
    /// Interface description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Primary address.
    pub ipv4_address: String,
    /// Primary mask.
    pub ipv4_mask: String,
    /// Enable PIM sparse mode.
    #[serde(default = "default_true")]
    pub pim_sm: bool,
}

impl Loopback {
    /// Interface name, e.g. `Loopback0`.
    #[must_use]
    pub fn interface_name(&self) -> String {
        loopback_name(self.loopback_id)
    }
}

impl Resource for Loopback {
    fn id(&self) -> String {
        format!("{}_{}", self.host, self.loopback_id)
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        format!("{} on {}", self.interface_name(), self.host)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Host(&self.host)
    }

    fn validate(&self) -> Result<()> {
        require_host(KIND, &self.host)?;
        require_ipv4(KIND, "ipv4_address", &self.ipv4_address)?;
        require_ipv4(KIND, "ipv4_mask", &self.ipv4_mask)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let entry = Record::new()
            .set("name", self.loopback_id)
            .set_opt(
                "description",
                Some(self.description.as_str()).filter(|d| !d.is_empty()),
            )
            .set("ip/address/primary/address", &self.ipv4_address)
            .set("ip/address/primary/mask", &self.ipv4_mask)
            .flag_if(
                "ip/pim/Cisco-IOS-XE-multicast:pim-mode-choice-cfg/sparse-mode",
                self.pim_sm,
            );
        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-native:Loopback", vec![entry]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("interface/Loopback"),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.loopback_id),
        })
    }

    fn update_path(&self) -> Option<ResourcePath> {
        Some(path_for(self.loopback_id))
    }

    fn read_path(&self) -> ResourcePath {
        path_for(self.loopback_id)
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![path_for(self.loopback_id)])
    }
}
