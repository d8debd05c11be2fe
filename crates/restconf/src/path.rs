//! Resource path construction.
//!
//! Paths follow `/data/<schema-root>/<container>[=<key>]/...`. List keys are
//! percent-encoded for `/` so interface names like `1/0/1.100` stay one segment.

use std::fmt;

/// Schema root of the native device model.
pub const NATIVE_ROOT: &str = "/data/Cisco-IOS-XE-native:native";

/// Hierarchical resource locator.
///
/// # Example
///
/// ```
/// use restconf::ResourcePath;
///
/// let path = ResourcePath::native()
///     .child("interface")
///     .keyed("GigabitEthernet", "1/0/1.100");
/// assert_eq!(
///     path.as_str(),
///     "/data/Cisco-IOS-XE-native:native/interface/GigabitEthernet=1%2F0%2F1.100"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Path to the native model root.
    #[must_use]
    pub fn native() -> Self {
        Self(NATIVE_ROOT.to_string())
    }

    /// Use a caller-supplied path as-is, adding a leading `/` if missing.
    pub fn raw(path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim();
        if path.starts_with('/') {
            Self(path.to_string())
        } else {
            Self(format!("/{path}"))
        }
    }

    /// Append a container segment. Slashes inside `segment` are kept, so
    /// `child("router/bgp")` appends two segments.
    pub fn child(mut self, segment: impl AsRef<str>) -> Self {
        let segment = segment.as_ref().trim_matches('/');
        if !segment.is_empty() {
            self.0.push('/');
            self.0.push_str(segment);
        }
        self
    }

    /// Append a list entry segment `list=<key>`.
    pub fn keyed(mut self, list: &str, key: impl fmt::Display) -> Self {
        self.0.push('/');
        self.0.push_str(list);
        self.0.push('=');
        self.0.push_str(&encode_key(&key.to_string()));
        self
    }

    /// Borrow the path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Percent-encode `/` in a list key.
#[must_use]
pub fn encode_key(key: &str) -> String {
    key.replace('/', "%2F")
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ResourcePath> for String {
    fn from(path: ResourcePath) -> Self {
        path.0
    }
}
