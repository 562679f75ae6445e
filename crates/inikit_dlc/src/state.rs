//! Install-state persistence.
//!
//! The overlay itself lives in memory; what survives a restart is the list
//! of bundle names that were installed, serialized as `dlc.json` next to
//! the DLC directory. On startup the game re-discovers bundles and
//! re-installs the ones named here, in order.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::Result;

const STATE_VERSION: u32 = 1;

/// Snapshot of which bundles are installed, persisted as `dlc.json`.
///
/// ```json
/// {
///   "version": 1,
///   "installed": ["MapPack", "Skins"]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DlcState {
    pub version: u32,
    /// Bundle names in install order.
    pub installed: Vec<String>,
}

impl Default for DlcState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            installed: Vec::new(),
        }
    }
}

impl DlcState {
    pub fn new(installed: Vec<String>) -> Self {
        Self {
            version: STATE_VERSION,
            installed,
        }
    }

    /// `Ok(None)` when the file doesn't exist or carries a different schema
    /// version; both mean "install nothing automatically".
    pub fn load(path: &Utf8Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path.as_std_path())?;
        let state: Self = serde_json::from_str(&contents)?;
        if state.version != STATE_VERSION {
            return Ok(None);
        }
        Ok(Some(state))
    }

    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join("state/dlc.json");

        let state = DlcState::new(vec!["MapPack".to_string(), "Skins".to_string()]);
        state.save(&path).unwrap();

        let loaded = DlcState::load(&path).unwrap().unwrap();
        assert_eq!(loaded.installed, state.installed);
    }

    #[test]
    fn test_missing_and_mismatched_version() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join("dlc.json");
        assert!(DlcState::load(&path).unwrap().is_none());

        std::fs::write(
            path.as_std_path(),
            r#"{"version": 99, "installed": ["Old"]}"#,
        )
        .unwrap();
        assert!(DlcState::load(&path).unwrap().is_none());
    }
}
