//! On-disk DLC bundle discovery.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// One discovered bundle: a direct subdirectory of the DLC root, with its
/// files split into content packages and everything else.
#[derive(Debug, Clone)]
pub struct DlcBundle {
    /// The subdirectory name.
    pub name: String,
    pub root: Utf8PathBuf,
    /// Files carrying the package extension.
    pub package_files: Vec<Utf8PathBuf>,
    /// Config, localization, and integrity files.
    pub non_package_files: Vec<Utf8PathBuf>,
    /// Set when the bundle's directory could not be fully read. Corrupt
    /// bundles are never installed.
    pub corrupt: bool,
}

/// Walks a DLC root directory for bundles.
pub struct BundleEnumerator {
    dlc_dir: Utf8PathBuf,
    package_extension: String,
    listeners: Vec<Box<dyn Fn(&[DlcBundle])>>,
}

impl BundleEnumerator {
    /// `package_extension` is compared without case and without a leading
    /// dot, e.g. `"upk"`.
    pub fn new(dlc_dir: impl Into<Utf8PathBuf>, package_extension: impl Into<String>) -> Self {
        Self {
            dlc_dir: dlc_dir.into(),
            package_extension: package_extension.into(),
            listeners: Vec::new(),
        }
    }

    /// Registers a callback invoked after every completed enumeration with
    /// the full bundle list.
    pub fn on_enumeration_complete(&mut self, listener: impl Fn(&[DlcBundle]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Every bundle under the DLC root, in name order. A missing root is
    /// not an error; there is simply no content.
    pub fn find_bundles(&self) -> Result<Vec<DlcBundle>> {
        let mut bundles = Vec::new();
        if self.dlc_dir.is_dir() {
            let mut subdirs: Vec<Utf8PathBuf> = self
                .dlc_dir
                .read_dir_utf8()?
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .map(|entry| entry.into_path())
                .collect();
            subdirs.sort();

            for root in subdirs {
                bundles.push(self.read_bundle(&root));
            }
        } else {
            debug!("no DLC directory at {}", self.dlc_dir);
        }
        for listener in &self.listeners {
            listener(&bundles);
        }
        Ok(bundles)
    }

    fn read_bundle(&self, root: &Utf8Path) -> DlcBundle {
        let name = root.file_name().unwrap_or("").to_string();
        let mut bundle = DlcBundle {
            name,
            root: root.to_owned(),
            package_files: Vec::new(),
            non_package_files: Vec::new(),
            corrupt: false,
        };

        for entry in WalkDir::new(root.as_std_path()) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!("unreadable entry in DLC bundle {}: {error}", bundle.name);
                    bundle.corrupt = true;
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
                warn!("non-UTF-8 path in DLC bundle {}", bundle.name);
                bundle.corrupt = true;
                continue;
            };
            if self.is_package(&path) {
                bundle.package_files.push(path);
            } else {
                bundle.non_package_files.push(path);
            }
        }
        bundle.package_files.sort();
        bundle.non_package_files.sort();
        bundle
    }

    fn is_package(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.package_extension))
    }
}
