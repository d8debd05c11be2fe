//! VRF definitions with EVPN route-targets.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_true, require_nonempty, require_roles,
};
use crate::error::Result;
use crate::fleet::Role;
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "vrf";

static WITHOUT_STITCHING: Schema = Schema {
    name: "route-target without-stitching",
    fields: &[Field::required("asn-ip", FieldKind::Str)],
};

static WITH_STITCHING: Schema = Schema {
    name: "route-target with-stitching",
    fields: &[
        Field::required("asn-ip", FieldKind::Str),
        Field::required("stitching", FieldKind::Presence(Marker::Blank)),
    ],
};

const IPV4_TARGETS: [&str; 4] = [
    "address-family/ipv4/route-target/export-route-target/without-stitching",
    "address-family/ipv4/route-target/export-route-target/with-stitching",
    "address-family/ipv4/route-target/import-route-target/without-stitching",
    "address-family/ipv4/route-target/import-route-target/with-stitching",
];

const IPV6_TARGETS: [&str; 4] = [
    "address-family/ipv6/route-target/export-route-target/without-stitching",
    "address-family/ipv6/route-target/export-route-target/with-stitching",
    "address-family/ipv6/route-target/import-route-target/without-stitching",
    "address-family/ipv6/route-target/import-route-target/with-stitching",
];

static DEFINITION: Schema = Schema {
    name: "vrf definition",
    fields: &[
        Field::required("name", FieldKind::Str),
        Field::required("rd", FieldKind::Str),
        Field::optional(IPV4_TARGETS[0], FieldKind::List(&WITHOUT_STITCHING)),
        Field::optional(IPV4_TARGETS[1], FieldKind::List(&WITH_STITCHING)),
        Field::optional(IPV4_TARGETS[2], FieldKind::List(&WITHOUT_STITCHING)),
        Field::optional(IPV4_TARGETS[3], FieldKind::List(&WITH_STITCHING)),
        Field::optional(IPV6_TARGETS[0], FieldKind::List(&WITHOUT_STITCHING)),
        Field::optional(IPV6_TARGETS[1], FieldKind::List(&WITH_STITCHING)),
        Field::optional(IPV6_TARGETS[2], FieldKind::List(&WITHOUT_STITCHING)),
        Field::optional(IPV6_TARGETS[3], FieldKind::List(&WITH_STITCHING)),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "vrf",
    fields: &[Field::required(
        "Cisco-IOS-XE-native:definition",
        FieldKind::List(&DEFINITION),
    )],
};

/// A VRF whose route-targets mirror its route distinguisher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Vrf {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// VRF name.
    pub name: String,
    /// Route distinguisher.
    pub rd: String,
    /// Route-target value; falls back to `rd`.
    #[serde(default)]
    pub route_target: Option<String>,
    /// Configure IPv4 route-targets.
    #[serde(default = "default_true")]
    pub ipv4: bool,
    /// Configure IPv6 route-targets.
    #[serde(default = "default_true")]
    pub ipv6: bool,
}

impl Vrf {
    fn definition_path(&self) -> ResourcePath {
        ResourcePath::native().child("vrf").keyed("definition", &self.name)
    }

    fn with_targets(&self, record: Record, fields: [&'static str; 4]) -> Record {
        let value = self.route_target.as_deref().unwrap_or(&self.rd);
        let plain = || vec![Record::new().set("asn-ip", value)];
        let stitched = || vec![Record::new().set("asn-ip", value).flag("stitching")];
        record
            .set(fields[0], plain())
            .set(fields[1], stitched())
            .set(fields[2], plain())
            .set(fields[3], stitched())
    }
}

impl Resource for Vrf {
    fn id(&self) -> String {
        self.name.clone()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_nonempty(KIND, "name", &self.name)?;
        require_nonempty(KIND, "rd", &self.rd)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let mut definition = Record::new().set("name", &self.name).set("rd", &self.rd);
        if self.ipv4 {
            definition = self.with_targets(definition, IPV4_TARGETS);
        }
        if self.ipv6 {
            definition = self.with_targets(definition, IPV6_TARGETS);
        }
        let body =
            DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-native:definition", vec![definition]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("vrf/definition"),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.name),
        })
    }

    fn update_path(&self) -> Option<ResourcePath> {
        Some(self.definition_path())
    }

    fn read_path(&self) -> ResourcePath {
        self.definition_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![self.definition_path()])
    }
}
