//! Routed Ethernet subinterfaces, configured on one host.

use std::fmt;

use restconf::ResourcePath;
use serde::Deserialize;

use super::{
    CompiledDocument, Resource, Scope, Target, default_description, require_host, require_ipv4,
    require_nonempty, require_range,
};
use crate::error::{Error, Result};
use crate::schema::{Field, FieldKind, Record, Schema};

const KIND: &str = "subinterface";

/// Ethernet interface family, derived from port speed in Gbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// 1G
    GigabitEthernet,
    /// 10G
    TenGigabitEthernet,
    /// 25G
    TwentyFiveGigE,
    /// 40G
    FortyGigabitEthernet,
    /// 100G
    HundredGigE,
    /// 400G
    FourHundredGigE,
}

impl InterfaceKind {
    /// Accepted speeds.
    pub const SPEEDS: &'static [u32] = &[1, 10, 25, 40, 100, 400];

    /// Interface kind for a port speed.
    pub fn from_speed(speed: u32) -> Result<Self> {
        Ok(match speed {
            1 => Self::GigabitEthernet,
            10 => Self::TenGigabitEthernet,
            25 => Self::TwentyFiveGigE,
            40 => Self::FortyGigabitEthernet,
            100 => Self::HundredGigE,
            400 => Self::FourHundredGigE,
            other => {
                return Err(Error::intent(
                    KIND,
                    format!(
                        "unsupported interface_speed {other} \
                         (expected one of 1, 10, 25, 40, 100, 400)"
                    ),
                ));
            }
        })
    }

    /// Interface name prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GigabitEthernet => "GigabitEthernet",
            Self::TenGigabitEthernet => "TenGigabitEthernet",
            Self::TwentyFiveGigE => "TwentyFiveGigE",
            Self::FortyGigabitEthernet => "FortyGigabitEthernet",
            Self::HundredGigE => "HundredGigE",
            Self::FourHundredGigE => "FourHundredGigE",
        }
    }

    fn document_field(self) -> &'static str {
        match self {
            Self::GigabitEthernet => "Cisco-IOS-XE-native:GigabitEthernet",
            Self::TenGigabitEthernet => "Cisco-IOS-XE-native:TenGigabitEthernet",
            Self::TwentyFiveGigE => "Cisco-IOS-XE-native:TwentyFiveGigE",
            Self::FortyGigabitEthernet => "Cisco-IOS-XE-native:FortyGigabitEthernet",
            Self::HundredGigE => "Cisco-IOS-XE-native:HundredGigE",
            Self::FourHundredGigE => "Cisco-IOS-XE-native:FourHundredGigE",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static ENTRY: Schema = Schema {
    name: "subinterface",
    fields: &[
        Field::required("name", FieldKind::Str),
        Field::optional("description", FieldKind::Str),
        Field::optional("encapsulation/dot1Q/vlan-id", FieldKind::Int),
        Field::optional("vrf/forwarding", FieldKind::Str),
        Field::required("ip/address/primary/address", FieldKind::Str),
        Field::required("ip/address/primary/mask", FieldKind::Str),
    ],
};

static DOCUMENT: Schema = Schema {
    name: "ethernet subinterface",
    fields: &[
        Field::optional("Cisco-IOS-XE-native:FourHundredGigE", FieldKind::List(&ENTRY)),
        Field::optional("Cisco-IOS-XE-native:HundredGigE", FieldKind::List(&ENTRY)),
        Field::optional("Cisco-IOS-XE-native:FortyGigabitEthernet", FieldKind::List(&ENTRY)),
        Field::optional("Cisco-IOS-XE-native:TwentyFiveGigE", FieldKind::List(&ENTRY)),
        Field::optional("Cisco-IOS-XE-native:TenGigabitEthernet", FieldKind::List(&ENTRY)),
        Field::optional("Cisco-IOS-XE-native:GigabitEthernet", FieldKind::List(&ENTRY)),
    ],
};

/// A routed subinterface such as `TenGigabitEthernet1/0/1.100`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subinterface {
    /// Device to configure.
    pub host: String,
    /// Interface description.
    #[serde(default = "default_description")]
    pub description: String,
    /// Slot/port and subinterface number, e.g. `1/0/1.100`.
    pub ethernet: String,
    /// Port speed in Gbit/s.
    pub interface_speed: u32,
    /// 802.1Q VLAN tag.
    #[serde(default)]
    pub dot1q: Option<u16>,
    /// VRF to forward in.
    #[serde(default)]
    pub vrf: Option<String>,
    /// Primary address.
    pub ipv4_address: String,
    /// Primary mask.
    pub ipv4_mask: String,
}

impl Subinterface {
    /// Interface kind for the configured speed.
    pub fn kind(&self) -> Result<InterfaceKind> {
        InterfaceKind::from_speed(self.interface_speed)
    }

    fn interface_path(&self) -> Result<ResourcePath> {
        Ok(ResourcePath::native()
            .child("interface")
            .keyed(self.kind()?.name(), &self.ethernet))
    }
}

impl Resource for Subinterface {
    fn id(&self) -> String {
        format!("{}_{}", self.host, self.ethernet)
    }

    fn resource_type(&self) -> &'static str {
        KIND
    }

    fn description(&self) -> String {
        let kind = self.kind().map_or("Ethernet", InterfaceKind::name);
        format!("{kind}{} on {}", self.ethernet, self.host)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Host(&self.host)
    }

    fn validate(&self) -> Result<()> {
        require_host(KIND, &self.host)?;
        require_nonempty(KIND, "ethernet", &self.ethernet)?;
        self.kind()?;
        if let Some(tag) = self.dot1q {
            require_range(KIND, "dot1q", u32::from(tag), 1..=4094)?;
        }
        require_ipv4(KIND, "ipv4_address", &self.ipv4_address)?;
        require_ipv4(KIND, "ipv4_mask", &self.ipv4_mask)
    }

    fn compile(&self, target: &Target<'_>) -> Result<CompiledDocument> {
        self.validate()?;
        let kind = self.kind()?;
        let entry = Record::new()
            .set("name", &self.ethernet)
            .set_opt(
                "description",
                Some(self.description.as_str()).filter(|d| !d.is_empty()),
            )
            .set_opt("encapsulation/dot1Q/vlan-id", self.dot1q)
            .set_opt("vrf/forwarding", self.vrf.as_deref())
            .set("ip/address/primary/address", &self.ipv4_address)
            .set("ip/address/primary/mask", &self.ipv4_mask);
        let body = DOCUMENT.build(&Record::new().set(kind.document_field(), vec![entry]))?;
        Ok(CompiledDocument {
            path: ResourcePath::native().child("interface").child(kind.name()),
            body,
            debug_name: format!("subint_{}_{}", target.label(), self.ipv4_address),
        })
    }

    fn read_path(&self) -> ResourcePath {
        // validate() rejects unknown speeds before any read is issued
        self.interface_path().unwrap_or_else(|_| {
            ResourcePath::native()
                .child("interface")
                .keyed(InterfaceKind::GigabitEthernet.name(), &self.ethernet)
        })
    }

    fn teardown(&self, _target: &Target<'_>) -> Result<Vec<ResourcePath>> {
        Ok(vec![self.interface_path()?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subinterface() -> Subinterface {
        Subinterface {
            host: "10.0.2.1".to_string(),
            description: String::new(),
            ethernet: "1/0/1.100".to_string(),
            interface_speed: 10,
            dot1q: Some(100),
            vrf: Some("tenant".to_string()),
            ipv4_address: "172.16.0.2".to_string(),
            ipv4_mask: "255.255.255.252".to_string(),
        }
    }

    #[test]
    fn test_kind_from_speed() {
        assert_eq!(InterfaceKind::from_speed(1).unwrap(), InterfaceKind::GigabitEthernet);
        assert_eq!(InterfaceKind::from_speed(25).unwrap().name(), "TwentyFiveGigE");
        assert_eq!(InterfaceKind::from_speed(400).unwrap().to_string(), "FourHundredGigE");
        assert!(InterfaceKind::from_speed(2).is_err());
        for speed in InterfaceKind::SPEEDS {
            assert!(InterfaceKind::from_speed(*speed).is_ok());
        }
    }

    #[test]
    fn test_compile() {
        let intent = subinterface();
        let doc = intent.compile(&Target::host(&intent.host)).unwrap();
        assert_eq!(
            doc.body,
            json!({"Cisco-IOS-XE-native:TenGigabitEthernet": [{
                "name": "1/0/1.100",
                "encapsulation": {"dot1Q": {"vlan-id": 100}},
                "vrf": {"forwarding": "tenant"},
                "ip": {"address": {"primary": {"address": "172.16.0.2", "mask": "255.255.255.252"}}}
            }]})
        );
        assert!(doc.path.as_str().ends_with("/interface/TenGigabitEthernet"));
        assert_eq!(doc.debug_name, "subint_10.0.2.1_172.16.0.2");
    }

    #[test]
    fn test_teardown_encodes_slashes() {
        let paths = subinterface().teardown(&Target::default()).unwrap();
        assert!(paths[0]
            .as_str()
            .ends_with("/interface/TenGigabitEthernet=1%2F0%2F1.100"));
        assert_eq!(subinterface().read_path(), paths[0]);
    }

    #[test]
    fn test_validate() {
        assert!(Subinterface { interface_speed: 5, ..subinterface() }.validate().is_err());
        assert!(Subinterface { dot1q: Some(0), ..subinterface() }.validate().is_err());
        assert!(Subinterface { ipv4_mask: "x".to_string(), ..subinterface() }.validate().is_err());
        assert!(Subinterface { dot1q: None, vrf: None, ..subinterface() }.validate().is_ok());
    }
}
