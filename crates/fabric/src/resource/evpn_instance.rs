//! EVPN instances.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{CompiledDocument, Resource, Scope, Target, default_true, require_roles};
use crate::error::{Error, Result, check_choice};
use crate::fleet::Role;
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "evpn_instance";

/// Accepted `encapsulation` values.
pub const ENCAPSULATIONS: &[&str] = &["vxlan", "mpls"];
/// Accepted `replication_type` values.
pub const REPLICATION_TYPES: &[&str] = &["static", "ingress"];
/// Accepted `rt_type` values.
pub const RT_TYPES: &[&str] = &["both", "import", "export"];
/// Accepted `re_originate` values.
pub const RE_ORIGINATE: &[&str] = &["route-type5"];

static INSTANCE: Schema = Schema {
    name: "evpn instance",
    fields: &[
        Field::required("evpn-instance-num", FieldKind::Int),
        Field::optional(
            "vlan-based/replication-type/static",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::optional(
            "vlan-based/replication-type/ingress",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::optional("vlan-based/encapsulation", FieldKind::Str),
        Field::optional("vlan-based/rd/rd-value", FieldKind::Str),
        Field::optional("vlan-based/route-target/both/rt-value", FieldKind::Str),
        Field::optional("vlan-based/route-target/import/rt-value", FieldKind::Str),
        Field::optional("vlan-based/route-target/export/rt-value", FieldKind::Str),
        Field::optional(
            "vlan-based/ip/local-learning/disable",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::optional("vlan-based/default-gateway/advertise", FieldKind::Str),
        Field::optional(
            "vlan-based/re-originate/route-type5",
            FieldKind::Presence(Marker::Blank),
        ),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "evpn instances",
    fields: &[Field::required(
        "Cisco-IOS-XE-l2vpn:instance/instance",
        FieldKind::List(&INSTANCE),
    )],
};

fn default_encapsulation() -> String {
    "vxlan".to_string()
}

fn default_replication() -> String {
    "static".to_string()
}

/// An EVPN instance, optionally VLAN-based.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvpnInstance {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// Instance number.
    pub instance_id: u32,
    /// Configure the VLAN-based service; without it only the number is sent.
    #[serde(default = "default_true")]
    pub vlan_based: bool,
    /// Data-plane encapsulation.
    #[serde(default = "default_encapsulation")]
    pub encapsulation: String,
    /// BUM replication mode.
    #[serde(default = "default_replication")]
    pub replication_type: String,
    /// Route distinguisher.
    #[serde(default)]
    pub rd: Option<String>,
    /// Route-target value; falls back to `rd`.
    #[serde(default)]
    pub rt: Option<String>,
    /// Route-target direction.
    #[serde(default)]
    pub rt_type: Option<String>,
    /// Learn local IP addresses.
    #[serde(default)]
    pub ip_learning: bool,
    /// Advertise the default gateway.
    #[serde(default)]
    pub default_gateway_advertise: bool,
    /// Route type to re-originate.
    #[serde(default)]
    pub re_originate: Option<String>,
}

impl EvpnInstance {
    fn base_path() -> ResourcePath {
        ResourcePath::native().child("l2vpn/evpn_cont/evpn-instance/evpn/instance")
    }

    fn instance_path(&self) -> ResourcePath {
        Self::base_path().keyed("instance", self.instance_id)
    }

    /// Route-target value sent to the device: `rt`, else `rd`.
    #[must_use]
    pub fn route_target(&self) -> Option<&str> {
        self.rt.as_deref().or(self.rd.as_deref())
    }

    fn vlan_based(&self, record: Record) -> Record {
        let mut record = record
            .flag_if(
                "vlan-based/replication-type/static",
                self.replication_type == "static",
            )
            .flag_if(
                "vlan-based/replication-type/ingress",
                self.replication_type == "ingress",
            )
            .set("vlan-based/encapsulation", &self.encapsulation)
            .set_opt("vlan-based/rd/rd-value", self.rd.as_deref());

        if let (Some(rt_type), Some(value)) = (self.rt_type.as_deref(), self.route_target()) {
            let field = match rt_type {
                "import" => "vlan-based/route-target/import/rt-value",
                "export" => "vlan-based/route-target/export/rt-value",
                _ => "vlan-based/route-target/both/rt-value",
            };
            record = record.set(field, value);
        }

        record
            .flag_if("vlan-based/ip/local-learning/disable", !self.ip_learning)
            .set(
                "vlan-based/default-gateway/advertise",
                if self.default_gateway_advertise { "enable" } else { "disable" },
            )
            .flag_if("vlan-based/re-originate/route-type5", self.re_originate.is_some())
    }
}

impl Resource for EvpnInstance {
    fn id(&self) -> String {
        self.instance_id.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        if self.instance_id == 0 {
            return Err(Error::intent(KIND, "instance_id must be positive"));
        }
        check_choice("encapsulation", &self.encapsulation, ENCAPSULATIONS)?;
        check_choice("replication_type", &self.replication_type, REPLICATION_TYPES)?;
        if let Some(rt_type) = &self.rt_type {
            check_choice("rt_type", rt_type, RT_TYPES)?;
        }
        if let Some(re_originate) = &self.re_originate {
            check_choice("re_originate", re_originate, RE_ORIGINATE)?;
        }
        Ok(())
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let mut instance = Record::new().set("evpn-instance-num", self.instance_id);
        if self.vlan_based {
            instance = self.vlan_based(instance);
        }
        let body = DOCUMENT.build(
            &Record::new().set("Cisco-IOS-XE-l2vpn:instance/instance", vec![instance]),
        )?;
        Ok(CompiledDocument {
            path: Self::base_path(),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.instance_id),
        })
    }

    fn read_path(&self) -> ResourcePath {
        self.instance_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![self.instance_path()])
    }
}
