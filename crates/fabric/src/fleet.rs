//! Roles, the fleet map, and host resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named class of devices, e.g. `spines`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Spine switches; must have hosts.
    pub const SPINES: &'static str = "spines";
    /// Leaf switches; must have hosts.
    pub const LEAFS: &'static str = "leafs";
    /// Border leaves; may be empty.
    pub const BORDERS: &'static str = "borders";

    /// Roles that must resolve to at least one host.
    pub const REQUIRED: &'static [&'static str] = &[Self::SPINES, Self::LEAFS];

    /// Create a role from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an empty host set for this role is a configuration error.
    #[must_use]
    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(&self.0.as_str())
    }

    /// Whether this is the spine role.
    #[must_use]
    pub fn is_spine(&self) -> bool {
        self.0 == Self::SPINES
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Role → ordered host list.
///
/// Read-only for the duration of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fleet {
    roles: BTreeMap<Role, Vec<String>>,
}

impl Fleet {
    /// Create an empty fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `role` with `hosts`, replacing any earlier declaration.
    pub fn with_role<H: Into<String>>(
        mut self,
        role: &str,
        hosts: impl IntoIterator<Item = H>,
    ) -> Self {
        self.roles
            .insert(Role::new(role), hosts.into_iter().map(Into::into).collect());
        self
    }

    /// Hosts declared for `role`, in declared order.
    ///
    /// An undeclared or empty role yields an empty slice; the caller decides
    /// whether that is fatal.
    #[must_use]
    pub fn resolve_hosts(&self, role: &Role) -> &[String] {
        self.roles.get(role).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `role` is declared at all.
    #[must_use]
    pub fn declares(&self, role: &Role) -> bool {
        self.roles.contains_key(role)
    }

    /// Hosts for `role`, enforcing the required-role rule.
    ///
    /// Returns `Ok(None)` for an empty optional role.
    pub fn hosts_for(&self, role: &Role) -> Result<Option<&[String]>> {
        if !self.declares(role) && !role.is_required() && role.as_str() != Role::BORDERS {
            return Err(Error::UnknownRole(role.to_string()));
        }
        let hosts = self.resolve_hosts(role);
        match (hosts.is_empty(), role.is_required()) {
            (false, _) => Ok(Some(hosts)),
            (true, true) => Err(Error::EmptyRole(role.to_string())),
            (true, false) => Ok(None),
        }
    }

    /// Declared roles with their hosts.
    pub fn roles(&self) -> impl Iterator<Item = (&Role, &[String])> {
        self.roles.iter().map(|(role, hosts)| (role, hosts.as_slice()))
    }

    /// Every host across all roles, without duplicates, in role order.
    #[must_use]
    pub fn all_hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = Vec::new();
        for host in self.roles.values().flatten() {
            if !hosts.contains(&host.as_str()) {
                hosts.push(host);
            }
        }
        hosts
    }

    /// Check the fleet-level rules: required roles have hosts, no blank hosts.
    pub fn validate(&self) -> Result<()> {
        for name in Role::REQUIRED {
            if self.resolve_hosts(&Role::new(*name)).is_empty() {
                return Err(Error::EmptyRole((*name).to_string()));
            }
        }
        for (role, hosts) in &self.roles {
            if hosts.iter().any(|h| h.trim().is_empty()) {
                return Err(Error::intent("fleet", format!("role '{role}' has a blank host")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> Fleet {
        Fleet::new()
            .with_role("spines", ["10.0.0.1", "10.0.0.2"])
            .with_role("leafs", ["10.0.1.1", "10.0.1.2", "10.0.1.3"])
            .with_role("borders", Vec::<String>::new())
    }

    #[test]
    fn test_resolve_hosts_declared_order() {
        let fleet = fleet();
        assert_eq!(
            fleet.resolve_hosts(&Role::from("leafs")),
            ["10.0.1.1", "10.0.1.2", "10.0.1.3"]
        );
    }

    #[test]
    fn test_resolve_hosts_empty_is_not_error() {
        let fleet = fleet();
        assert!(fleet.resolve_hosts(&Role::from("borders")).is_empty());
        assert!(fleet.resolve_hosts(&Role::from("superspines")).is_empty());
    }

    #[test]
    fn test_hosts_for_required_and_optional() {
        let fleet = Fleet::new().with_role("spines", ["s1"]);
        assert_eq!(fleet.hosts_for(&Role::from("spines")).unwrap(), Some(&["s1".to_string()][..]));
        assert!(matches!(
            fleet.hosts_for(&Role::from("leafs")),
            Err(Error::EmptyRole(_))
        ));
        assert_eq!(fleet.hosts_for(&Role::from("borders")).unwrap(), None);
        assert!(matches!(
            fleet.hosts_for(&Role::from("superspines")),
            Err(Error::UnknownRole(_))
        ));
    }

    #[test]
    fn test_custom_declared_role_may_be_empty() {
        let fleet = fleet().with_role("edge", Vec::<String>::new());
        assert_eq!(fleet.hosts_for(&Role::from("edge")).unwrap(), None);
    }

    #[test]
    fn test_validate() {
        assert!(fleet().validate().is_ok());
        assert!(matches!(
            Fleet::new().with_role("spines", ["s1"]).validate(),
            Err(Error::EmptyRole(role)) if role == "leafs"
        ));
        let blank = fleet().with_role("borders", [" "]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_all_hosts_dedup() {
        let fleet = Fleet::new()
            .with_role("leafs", ["a", "b"])
            .with_role("borders", ["b", "c"]);
        // BTreeMap order: borders before leafs
        assert_eq!(fleet.all_hosts(), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_role_flags() {
        assert!(Role::from("spines").is_required());
        assert!(Role::from("spines").is_spine());
        assert!(!Role::from("borders").is_required());
        assert_eq!(Role::from("leafs").to_string(), "leafs");
    }

    #[test]
    fn test_deserialize_from_toml_shape() {
        let fleet: Fleet = serde_json::from_str(
            r#"{"spines": ["s1"], "leafs": ["l1", "l2"], "borders": []}"#,
        )
        .unwrap();
        assert_eq!(fleet.resolve_hosts(&Role::from("leafs")).len(), 2);
        assert!(fleet.validate().is_ok());
    }
}
