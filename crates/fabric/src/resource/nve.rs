//! NVE interface: VNI membership and replication.

use std::collections::BTreeMap;

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_description, require_ipv4,
    require_loopback_ref, require_roles,
};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::ident::{Marker, extract_numeric_id};
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "nve";

/// Interface number of the single NVE interface.
pub const NVE_ID: u32 = 1;

const VNI_MAX: u32 = 16_777_215;

static ONE_LINE_VNI: Schema = Schema {
    name: "nve member-in-one-line vni",
    fields: &[
        Field::required("vni-range", FieldKind::Str),
        Field::required("vrf", FieldKind::Str),
    ],
};

static MEMBER_VNI: Schema = Schema {
    name: "nve member vni",
    fields: &[
        Field::required("vni-range", FieldKind::Str),
        Field::optional("mcast-group/multicast-group-min", FieldKind::Str),
        Field::optional(
            "ir-cp-config/ingress-replication",
            FieldKind::Presence(Marker::Blank),
        ),
    ],
};

static INTERFACE: Schema = Schema {
    name: "nve interface",
    fields: &[
        Field::required("name", FieldKind::Int),
        Field::required(
            "host-reachability/protocol/bgp",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::required("source-interface/Loopback", FieldKind::Int),
        Field::optional(
            "member-in-one-line/member/vni",
            FieldKind::List(&ONE_LINE_VNI),
        ),
        Field::optional("member/vni", FieldKind::List(&MEMBER_VNI)),
        Field::optional("description", FieldKind::Str),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "nve",
    fields: &[Field::required(
        "Cisco-IOS-XE-native:nve",
        FieldKind::List(&INTERFACE),
    )],
};

/// Normalize a VNI or VNI range to `a` or `a-b`.
///
/// Whitespace around the bounds is dropped. Bounds must be valid VNIs and
/// ascending.
pub fn normalize_vni_range(range: &str) -> Result<String> {
    let bound = |s: &str| -> Result<u32> {
        let s = s.trim();
        match s.parse::<u32>() {
            Ok(vni) if (1..=VNI_MAX).contains(&vni) => Ok(vni),
            _ => Err(Error::intent(KIND, format!("invalid VNI '{s}' in range '{range}'"))),
        }
    };
    let parts: Vec<&str> = range.split('-').collect();
    match parts.as_slice() {
        [single] => Ok(bound(single)?.to_string()),
        [start, end] => {
            let (start, end) = (bound(start)?, bound(end)?);
            if start > end {
                return Err(Error::intent(
                    KIND,
                    format!("VNI range '{range}' is descending"),
                ));
            }
            Ok(format!("{start}-{end}"))
        }
        _ => Err(Error::intent(KIND, format!("malformed VNI range '{range}'"))),
    }
}

/// The fabric's NVE interface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Nve {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// Interface description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Source loopback, e.g. `Loopback1`.
    pub source_interface: String,
    /// VRF → L3 VNI range.
    #[serde(default)]
    pub vni: BTreeMap<String, String>,
    /// Multicast group → L2 VNI range.
    #[serde(default)]
    pub vni_ipv4_multicast_group: BTreeMap<String, String>,
    /// L2 VNIs using ingress replication.
    #[serde(default)]
    pub vni_ingress_replication: Vec<u32>,
}

impl Nve {
    fn interface_path() -> ResourcePath {
        ResourcePath::native().child("interface").keyed("nve", NVE_ID)
    }

    fn one_line_members(&self) -> Result<Vec<Record>> {
        self.vni
            .iter()
            .map(|(vrf, range)| {
                Ok(Record::new()
                    .set("vni-range", normalize_vni_range(range)?)
                    .set("vrf", vrf))
            })
            .collect()
    }

    fn members(&self) -> Result<Vec<Record>> {
        let mut members = self
            .vni_ipv4_multicast_group
            .iter()
            .map(|(group, range)| {
                Ok(Record::new()
                    .set("vni-range", normalize_vni_range(range)?)
                    .set("mcast-group/multicast-group-min", group))
            })
            .collect::<Result<Vec<_>>>()?;
        members.extend(self.vni_ingress_replication.iter().map(|vni| {
            Record::new()
                .set("vni-range", vni.to_string())
                .flag("ir-cp-config/ingress-replication")
        }));
        Ok(members)
    }
}

impl Resource for Nve {
    fn id(&self) -> String {
        NVE_ID.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_loopback_ref(KIND, "source_interface", &self.source_interface)?;
        for range in self.vni.values().chain(self.vni_ipv4_multicast_group.values()) {
            normalize_vni_range(range)?;
        }
        for group in self.vni_ipv4_multicast_group.keys() {
            require_ipv4(KIND, "vni_ipv4_multicast_group", group)?;
        }
        if let Some(vni) = self
            .vni_ingress_replication
            .iter()
            .find(|vni| !(1..=VNI_MAX).contains(*vni))
        {
            return Err(Error::intent(KIND, format!("invalid ingress replication VNI {vni}")));
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let interface = Record::new()
            .set("name", NVE_ID)
            .flag("host-reachability/protocol/bgp")
            .set(
                "source-interface/Loopback",
                extract_numeric_id(&self.source_interface)?,
            )
            .set("member-in-one-line/member/vni", self.one_line_members()?)
            .set("member/vni", self.members()?)
            .set_opt(
                "description",
                Some(self.description.as_str()).filter(|d| !d.is_empty()),
            );
        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-native:nve", vec![interface]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("interface/nve"),
            body,
            debug_name: format!("{KIND}_{}_{NVE_ID}", target.label()),
        })
    }

    fn update_path(&self) -> Option<ResourcePath> {
        Some(Self::interface_path())
    }

    fn read_path(&self) -> ResourcePath {
        Self::interface_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![Self::interface_path()])
    }
}
