//! BGP VRF address families advertised into L2VPN EVPN.

use restconf::ResourcePath;
use serde::Deserialize;

use super::bgp_system::router_path;
use super::{
    CompiledDocument, Resource, Scope, Target, default_true, require_nonempty, require_roles,
};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::ident::Marker;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "bgp_vrf";

static VRF_IPV4: Schema = Schema {
    name: "with-vrf ipv4 vrf",
    fields: &[
        Field::required("name", FieldKind::Str),
        Field::required(
            "ipv4-unicast/advertise/l2vpn/evpn",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::optional(
            "ipv4-unicast/redistribute-vrf/connected",
            FieldKind::Presence(Marker::Container),
        ),
        Field::optional(
            "ipv4-unicast/redistribute-vrf/static",
            FieldKind::Presence(Marker::Container),
        ),
    ],
};

static VRF_IPV6: Schema = Schema {
    name: "with-vrf ipv6 vrf",
    fields: &[
        Field::required("name", FieldKind::Str),
        Field::required(
            "ipv6-unicast/advertise/l2vpn/evpn",
            FieldKind::Presence(Marker::Blank),
        ),
        Field::optional(
            "ipv6-unicast/redistribute-v6/connected",
            FieldKind::Presence(Marker::Container),
        ),
        Field::optional(
            "ipv6-unicast/redistribute-v6/static",
            FieldKind::Presence(Marker::Container),
        ),
    ],
};

static FAMILY_IPV4: Schema = Schema {
    name: "with-vrf ipv4",
    fields: &[
        Field::required("af-name", FieldKind::Str),
        Field::required("vrf", FieldKind::List(&VRF_IPV4)),
    ],
};

static FAMILY_IPV6: Schema = Schema {
    name: "with-vrf ipv6",
    fields: &[
        Field::required("af-name", FieldKind::Str),
        Field::required("vrf", FieldKind::List(&VRF_IPV6)),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "bgp with-vrf",
    fields: &[
        Field::optional("Cisco-IOS-XE-bgp:with-vrf/ipv4", FieldKind::List(&FAMILY_IPV4)),
        Field::optional("Cisco-IOS-XE-bgp:with-vrf/ipv6", FieldKind::List(&FAMILY_IPV6)),
    ],
};

#[derive(Debug, Clone, Copy)]
enum Family {
    Ipv4,
    Ipv6,
}

impl Family {
    const ALL: [Self; 2] = [Self::Ipv4, Self::Ipv6];

    fn name(self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }

    fn document_field(self) -> &'static str {
        match self {
            Self::Ipv4 => "Cisco-IOS-XE-bgp:with-vrf/ipv4",
            Self::Ipv6 => "Cisco-IOS-XE-bgp:with-vrf/ipv6",
        }
    }

    fn leaves(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Ipv4 => (
                "ipv4-unicast/advertise/l2vpn/evpn",
                "ipv4-unicast/redistribute-vrf/connected",
                "ipv4-unicast/redistribute-vrf/static",
            ),
            Self::Ipv6 => (
                "ipv6-unicast/advertise/l2vpn/evpn",
                "ipv6-unicast/redistribute-v6/connected",
                "ipv6-unicast/redistribute-v6/static",
            ),
        }
    }
}

/// Per-VRF BGP address families.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpVrf {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// Local autonomous system number.
    pub bgp_id: u32,
    /// VRF name.
    pub vrf: String,
    /// Configure the IPv4 unicast family.
    #[serde(default = "default_true")]
    pub ipv4: bool,
    /// Configure the IPv6 unicast family.
    #[serde(default = "default_true")]
    pub ipv6: bool,
    /// Redistribute connected routes.
    #[serde(default = "default_true")]
    pub redistribute_connected: bool,
    /// Redistribute static routes.
    #[serde(default = "default_true")]
    pub redistribute_static: bool,
}

impl BgpVrf {
    fn enabled(&self, family: Family) -> bool {
        match family {
            Family::Ipv4 => self.ipv4,
            Family::Ipv6 => self.ipv6,
        }
    }

    /// Families switched on, or off, in declaration order.
    fn families_where(&self, enabled: bool) -> Vec<Family> {
        Family::ALL
            .into_iter()
            .filter(|family| self.enabled(*family) == enabled)
            .collect()
    }

    fn families(&self) -> Vec<Family> {
        self.families_where(true)
    }

    fn family_path(&self, family: Family) -> ResourcePath {
        self.with_vrf_path()
            .child(family.name())
            .child("unicast")
            .keyed("vrf", &self.vrf)
    }

    fn family_record(&self, family: Family) -> Record {
        let (advertise, connected, static_routes) = family.leaves();
        let vrf = Record::new()
            .set("name", &self.vrf)
            .flag(advertise)
            .flag_if(connected, self.redistribute_connected)
            .flag_if(static_routes, self.redistribute_static);
        Record::new().set("af-name", "unicast").set("vrf", vec![vrf])
    }

    fn with_vrf_path(&self) -> ResourcePath {
        router_path(self.bgp_id).child("address-family/with-vrf")
    }
}

impl Resource for BgpVrf {
    fn id(&self) -> String {
        format!("{}_{}", self.bgp_id, self.vrf)
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        require_nonempty(KIND, "vrf", &self.vrf)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let families = self.families();
        if families.is_empty() {
            return Err(Error::NoData(format!(
                "{KIND} {}: ipv4 and ipv6 are both disabled",
                self.vrf
            )));
        }
        let record = families.into_iter().fold(Record::new(), |record, family| {
            record.set(family.document_field(), vec![self.family_record(family)])
        });
        Ok(CompiledDocument {
            path: self.with_vrf_path(),
            body: DOCUMENT.build(&record)?,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.vrf),
        })
    }

    fn update_prune(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(self
            .families_where(false)
            .into_iter()
            .map(|family| self.family_path(family))
            .collect())
    }

    fn read_path(&self) -> ResourcePath {
        self.with_vrf_path()
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(self
            .families()
            .into_iter()
            .map(|family| self.family_path(family))
            .collect())
    }
}
