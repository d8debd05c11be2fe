//! Fabric configuration
//!
//! One TOML file holds credentials, the retry policy, the fleet map, and the
//! intents. Anything the file leaves unset may come from the environment:
//!
//! - `EVPN_USERNAME`, `EVPN_PASSWORD` - device credentials
//! - `EVPN_CA_FILE` - PEM bundle of trusted roots
//! - `EVPN_PROXY_URL`, `EVPN_PROXY_CREDS` - proxy and its `user:pass`
//!
//! The file is found at `--config`, then `EVPNCTL_CONFIG`, then
//! `<config dir>/evpnctl/fabric.toml`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use fabric::{Fleet, Intent};
use restconf::{RetryPolicy, TransportConfig};
use serde::Deserialize;

/// Environment variable names for values the file may leave unset.
pub const ENV_USERNAME: &str = "EVPN_USERNAME";
pub const ENV_PASSWORD: &str = "EVPN_PASSWORD";
pub const ENV_CA_FILE: &str = "EVPN_CA_FILE";
pub const ENV_PROXY_URL: &str = "EVPN_PROXY_URL";
pub const ENV_PROXY_CREDS: &str = "EVPN_PROXY_CREDS";

/// Default configuration file, `<config dir>/evpnctl/fabric.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("evpnctl").join("fabric.toml"))
}

/// Expand `~` and environment variables in a path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

// ============================================================================
// File Format
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_delay_secs() -> u64 {
    RetryPolicy::default().delay.as_secs()
}

fn default_debug_dir() -> String {
    "debug".to_string()
}

/// `fabric.toml` as written on disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FabricFile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub insecure: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub ca_file: Option<String>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub proxy_creds: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_debug_dir")]
    pub debug_dir: String,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub roles: Fleet,
    #[serde(default, rename = "resource")]
    pub resources: Vec<Intent>,
}

/// An extra file holding only `[[resource]]` tables.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct IntentsFile {
    #[serde(default, rename = "resource")]
    resources: Vec<Intent>,
}

// ============================================================================
// Resolved Settings
// ============================================================================

/// Configuration after environment fallbacks are applied.
pub struct Settings {
    pub path: PathBuf,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure: bool,
    pub timeout: Duration,
    pub ca_file: Option<PathBuf>,
    pub proxy_url: Option<String>,
    pub proxy_creds: Option<String>,
    pub debug_dir: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub fleet: Fleet,
    pub intents: Vec<Intent>,
}

impl Settings {
    /// Load the configuration file and any extra intent files.
    pub fn load(config: Option<&Path>, intents: &[PathBuf]) -> Result<Self> {
        let path = match config {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        let mut settings = Self::from_file(&path, |key| std::env::var(key).ok())?;
        for extra in intents {
            settings.intents.extend(load_intents(extra)?);
        }
        Ok(settings)
    }

    /// Load one configuration file, reading unset values through `lookup`.
    pub fn from_file(path: &Path, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let file: FabricFile = toml::from_str(&content)
            .with_context(|| format!("Invalid fabric configuration in {}", path.display()))?;
        Ok(Self::resolve(path, file, lookup))
    }

    /// Apply environment fallbacks to a parsed file.
    pub fn resolve(path: &Path, file: FabricFile, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fallback = |value: Option<String>, key: &str| {
            value.or_else(|| lookup(key)).filter(|v| !v.is_empty())
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        Self {
            path: path.to_path_buf(),
            username: fallback(file.username, ENV_USERNAME),
            password: fallback(file.password, ENV_PASSWORD),
            insecure: file.insecure.unwrap_or(true),
            timeout: file
                .timeout_secs
                .map_or(TransportConfig::DEFAULT_TIMEOUT, Duration::from_secs),
            ca_file: fallback(file.ca_file, ENV_CA_FILE).map(|p| expand_path(&p)),
            proxy_url: fallback(file.proxy_url, ENV_PROXY_URL),
            proxy_creds: fallback(file.proxy_creds, ENV_PROXY_CREDS),
            debug_dir: file.debug.then(|| base.join(expand_path(&file.debug_dir))),
            retry: RetryPolicy::new(
                file.retry.max_attempts,
                Duration::from_secs(file.retry.delay_secs),
            ),
            fleet: file.roles,
            intents: file.resources,
        }
    }

    /// Transport settings; fails when credentials are missing.
    pub fn transport(&self) -> Result<TransportConfig> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            bail!(
                "Device credentials missing: set username/password in {} \
                 or {ENV_USERNAME}/{ENV_PASSWORD}",
                self.path.display()
            );
        };

        let mut config = TransportConfig::new(username, password).timeout(self.timeout);
        if !self.insecure {
            config = config.verify_tls(self.ca_file.clone());
        }
        if let Some(url) = &self.proxy_url {
            config = config.proxy(url, self.proxy_creds.clone());
        }
        Ok(config)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.path)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("insecure", &self.insecure)
            .field("proxy_url", &self.proxy_url)
            .field("fleet", &self.fleet)
            .field("intents", &self.intents.len())
            .finish_non_exhaustive()
    }
}

/// Load an extra intents file.
pub fn load_intents(path: &Path) -> Result<Vec<Intent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    let file: IntentsFile = toml::from_str(&content)
        .with_context(|| format!("Invalid intents file {}", path.display()))?;
    Ok(file.resources)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const FABRIC: &str = r#"
username = "admin"
timeout_secs = 5
debug = true

[retry]
max_attempts = 3

[roles]
spines = ["10.0.0.1", "10.0.0.2"]
leafs = ["10.0.1.1"]
borders = []

[[resource]]
kind = "vlan"
roles = ["leafs"]
vlan_id = 100
vni = 10100

[[resource]]
kind = "nve"
roles = ["leafs"]
source_interface = "Loopback1"

[resource.vni]
red = "50001"
"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "fabric.toml", FABRIC);

        let settings = Settings::from_file(&path, env(&[])).unwrap();
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert!(settings.insecure);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry.delay, Duration::from_secs(10));
        assert_eq!(settings.debug_dir, Some(dir.path().join("debug")));
        assert_eq!(settings.intents.len(), 2);
        assert_eq!(settings.intents[1].kind(), "nve");
        assert!(settings.fleet.validate().is_ok());
        assert_eq!(settings.fleet.resolve_hosts(&"spines".into()).len(), 2);
    }

    #[test]
    fn test_env_fills_unset_values_only() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "fabric.toml", FABRIC);

        let settings = Settings::from_file(
            &path,
            env(&[
                (ENV_USERNAME, "ignored"),
                (ENV_PASSWORD, "secret"),
                (ENV_PROXY_URL, "http://proxy:3128"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert_eq!(settings.password.as_deref(), Some("secret"));

        let transport = settings.transport().unwrap();
        assert_eq!(transport.password, "secret");
        assert_eq!(transport.proxy_url.as_deref(), Some("http://proxy:3128"));
        assert!(transport.insecure);
    }

    #[test]
    fn test_missing_credentials() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "fabric.toml", FABRIC);

        let settings = Settings::from_file(&path, env(&[(ENV_PASSWORD, "")])).unwrap();
        let err = settings.transport().unwrap_err();
        assert!(err.to_string().contains(ENV_PASSWORD));
    }

    #[test]
    fn test_verify_tls() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "fabric.toml",
            "username = \"a\"\npassword = \"b\"\ninsecure = false\nca_file = \"/etc/ca.pem\"\n",
        );
        let transport = Settings::from_file(&path, env(&[])).unwrap().transport().unwrap();
        assert!(!transport.insecure);
        assert_eq!(transport.ca_file, Some(PathBuf::from("/etc/ca.pem")));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "fabric.toml", "usernme = \"typo\"\n");
        assert!(Settings::from_file(&path, env(&[])).is_err());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "fabric.toml", "[[resource]]\nkind = \"ospf\"\n");
        let err = Settings::from_file(&path, env(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid fabric configuration"));
    }

    #[test]
    fn test_extra_intents_appended() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "fabric.toml", FABRIC);
        let extra = write(
            &dir,
            "tenant.toml",
            "[[resource]]\nkind = \"vrf\"\nroles = [\"leafs\"]\nname = \"red\"\nrd = \"65000:1\"\n",
        );

        let settings = Settings::load(Some(&config), &[extra]).unwrap();
        assert_eq!(settings.intents.len(), 3);
        assert_eq!(settings.intents[2].kind(), "vrf");
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_file(Path::new("/nonexistent/fabric.toml"), env(&[])).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/ca.pem");
        assert!(!expanded.to_string_lossy().starts_with('~') || dirs::home_dir().is_none());
    }
}
