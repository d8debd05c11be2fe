//! On-disk debug sink: every compiled payload lands in `<dir>/<name>.json`.

use std::fs;
use std::path::PathBuf;

use fabric::DebugSink;

pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File a payload named `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl DebugSink for DirectorySink {
    fn record(&self, name: &str, payload: &str) {
        let path = self.path_for(name);
        let result = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, payload));
        match result {
            Ok(()) => log::debug!("Wrote {}", path.display()),
            Err(e) => log::warn!("Could not write debug payload {}: {e}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_writes_file() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path().join("debug"));

        sink.record("vlan_leafs_100", "{}");
        let written = fs::read_to_string(dir.path().join("debug/vlan_leafs_100.json")).unwrap();
        assert_eq!(written, "{}");
    }

    #[test]
    fn test_record_overwrites() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.record("evpn_spines_loopback1", "{\"a\":1}");
        sink.record("evpn_spines_loopback1", "{\"a\":2}");
        let written = fs::read_to_string(sink.path_for("evpn_spines_loopback1")).unwrap();
        assert_eq!(written, "{\"a\":2}");
    }

    #[test]
    fn test_path_for_sanitizes() {
        let sink = DirectorySink::new("/tmp/x");
        assert_eq!(
            sink.path_for("subint_h_1/0/1"),
            PathBuf::from("/tmp/x/subint_h_1_0_1.json")
        );
    }

    #[test]
    fn test_unwritable_dir_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let sink = DirectorySink::new(&blocker);
        sink.record("vlan_leafs_100", "{}");
        assert!(!sink.path_for("vlan_leafs_100").exists());
    }
}
