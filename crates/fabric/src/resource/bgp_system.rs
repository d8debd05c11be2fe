//! BGP process settings.

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_true, require_loopback_ref, require_roles,
};
use crate::error::{Error, Result};
use crate::fleet::Role;
use crate::ident::extract_numeric_id;
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "bgp_system";

static ENTRY: Schema = Schema {
    name: "bgp",
    fields: &[
        Field::required("id", FieldKind::Int),
        Field::required("bgp/default/ipv4-unicast", FieldKind::Bool),
        Field::optional("bgp/log-neighbor-changes", FieldKind::Bool),
        Field::required("bgp/router-id/interface/Loopback", FieldKind::Int),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "bgp system",
    fields: &[Field::required("Cisco-IOS-XE-bgp:bgp", FieldKind::List(&ENTRY))],
};

pub(crate) fn router_path(asn: u32) -> ResourcePath {
    ResourcePath::native().child("router").keyed("bgp", asn)
}

/// The BGP process for an autonomous system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BgpSystem {
    /// Roles to apply to.
    pub roles: Vec<Role>,
    /// Local autonomous system number.
    pub bgp_id: u32,
    /// Loopback providing the router id, e.g. `Loopback0`.
    pub router_id: String,
    /// Log neighbor up/down events.
    #[serde(default = "default_true")]
    pub log_neighbor_changes: bool,
    /// Activate IPv4 unicast for every neighbor by default.
    #[serde(default)]
    pub default_ipv4_unicast: bool,
}

impl Resource for BgpSystem {
    fn id(&self) -> String {
        self.bgp_id.to_string()
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Roles(&self.roles)
    }

    fn validate(&self) -> Result<()> {
        require_roles(KIND, &self.roles)?;
        if self.bgp_id == 0 {
            return Err(Error::intent(KIND, "bgp_id must be positive"));
        }
        require_loopback_ref(KIND, "router_id", &self.router_id)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let loopback = extract_numeric_id(&self.router_id)?;
        let entry = Record::new()
            .set("id", self.bgp_id)
            .set("bgp/default/ipv4-unicast", self.default_ipv4_unicast)
            .set_opt(
                "bgp/log-neighbor-changes",
                self.log_neighbor_changes.then_some(true),
            )
            .set("bgp/router-id/interface/Loopback", loopback);
        let body = DOCUMENT.build(&Record::new().set("Cisco-IOS-XE-bgp:bgp", vec![entry]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("router/bgp"),
            body,
            debug_name: format!("{KIND}_{}_{}", target.label(), self.bgp_id),
        })
    }

    fn update_path(&self) -> Option<ResourcePath> {
        Some(router_path(self.bgp_id))
    }

    fn read_path(&self) -> ResourcePath {
        router_path(self.bgp_id)
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![router_path(self.bgp_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn system() -> BgpSystem {
        BgpSystem {
            roles: vec![Role::from("spines"), Role::from("leafs")],
            bgp_id: 65000,
            router_id: "Loopback0".to_string(),
            log_neighbor_changes: true,
            default_ipv4_unicast: false,
        }
    }

    #[test]
    fn test_compile() {
        let role = Role::from("spines");
        let doc = system().compile(&Target::role(&role)).unwrap();
        assert_eq!(
            doc.body,
            json!({"Cisco-IOS-XE-bgp:bgp": [{
                "id": 65000,
                "bgp": {
                    "default": {"ipv4-unicast": false},
                    "log-neighbor-changes": true,
                    "router-id": {"interface": {"Loopback": 0}}
                }
            }]})
        );
        assert_eq!(doc.debug_name, "bgp_system_spines_65000");
    }

    #[test]
    fn test_log_neighbor_changes_omitted_when_off() {
        let doc = BgpSystem {
            log_neighbor_changes: false,
            ..system()
        }
        .compile(&Target::default())
        .unwrap();
        assert!(doc.body["Cisco-IOS-XE-bgp:bgp"][0]["bgp"].get("log-neighbor-changes").is_none());
    }

    #[test]
    fn test_router_id_must_name_loopback() {
        let bad = BgpSystem {
            router_id: "Loopback".to_string(),
            ..system()
        };
        assert!(matches!(bad.validate(), Err(Error::InvalidIntent { .. })));
        assert!(bad.compile(&Target::default()).is_err());
    }

    #[test]
    fn test_paths() {
        assert!(system().update_path().unwrap().as_str().ends_with("/router/bgp=65000"));
        assert_eq!(system().teardown(&Target::default()).unwrap(), vec![router_path(65000)]);
    }
}
