//! Installing DLC bundles on top of the config cache, and peeling them off.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use inikit_config::parser::{Event, Parser};
use inikit_config::{ConfigCache, ConfigFile, ConfigSection};

use crate::bundle::DlcBundle;
use crate::error::Result;
use crate::reload::ReloadSet;
use crate::{ALWAYS_LOADED_PREFIX, FULLY_LOAD_SECTION};

/// One merged config file's pre-install snapshot, enough to undo the merge.
#[derive(Debug, Clone)]
struct UndoEntry {
    target: Utf8PathBuf,
    /// Sections that existed before and were touched, with their prior
    /// contents.
    replaced_sections: Vec<(String, ConfigSection)>,
    /// Sections the merge introduced.
    added_sections: Vec<String>,
}

/// The installed-DLC overlay: merged config state, the undo log that can
/// reverse it, and the registries fed from bundle contents.
///
/// Config merges go through [`ConfigFile::combine_from_buffer`] directly,
/// so they work even while the cache's file operations are disabled; the
/// bundle contents were already validated by the platform's content system.
///
/// [`ConfigFile::combine_from_buffer`]: inikit_config::ConfigFile::combine_from_buffer
#[derive(Debug, Default)]
pub struct DlcOverlay {
    installed: Vec<String>,
    undo_log: Vec<UndoEntry>,
    registered_packages: Vec<Utf8PathBuf>,
    always_loaded: Vec<String>,
    fully_load: IndexMap<String, Vec<String>>,
    integrity: IndexMap<String, Vec<u8>>,
    assets: IndexMap<String, Utf8PathBuf>,
}

impl DlcOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of installed bundles, in install order.
    pub fn installed(&self) -> &[String] {
        &self.installed
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.iter().any(|n| n == name)
    }

    /// Every content package registered by installed bundles.
    pub fn registered_packages(&self) -> &[Utf8PathBuf] {
        &self.registered_packages
    }

    /// Package names that stay loaded for the whole session.
    pub fn always_loaded(&self) -> &[String] {
        &self.always_loaded
    }

    /// Packages to fully load when `map_name` opens.
    pub fn packages_to_fully_load(&self, map_name: &str) -> &[String] {
        self.fully_load
            .get(map_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The integrity digest registered for `file_name`, if any.
    pub fn integrity_digest(&self, file_name: &str) -> Option<&[u8]> {
        self.integrity.get(file_name).map(Vec::as_slice)
    }

    /// Where the loose asset called `file_name` lives on disk, if an
    /// installed bundle shipped one.
    pub fn asset_path(&self, file_name: &str) -> Option<&Utf8Path> {
        self.assets.get(file_name).map(Utf8PathBuf::as_path)
    }

    /// Install one bundle: register its packages, merge its config and
    /// localization files over the cache, and record everything needed to
    /// undo it. Already-installed and corrupt bundles are skipped.
    ///
    /// Returns the sections the merge touched, for reload dispatch.
    pub fn install_bundle(
        &mut self,
        cache: &mut ConfigCache,
        bundle: &DlcBundle,
    ) -> Result<ReloadSet> {
        let mut changes = ReloadSet::new();
        if self.is_installed(&bundle.name) {
            debug!("DLC bundle {} already installed", bundle.name);
            return Ok(changes);
        }
        if bundle.corrupt {
            warn!("skipping corrupt DLC bundle {}", bundle.name);
            return Ok(changes);
        }

        for package in &bundle.package_files {
            self.register_package(package);
        }

        for path in &bundle.non_package_files {
            let extension = path.extension().unwrap_or("");
            if extension.eq_ignore_ascii_case("sha") {
                self.register_digest(path)?;
            } else if extension.eq_ignore_ascii_case("ini")
                || cache.env().is_localization_extension(extension)
            {
                changes.merge(self.merge_config_file(cache, path)?);
            } else if extension.eq_ignore_ascii_case("xxx") {
                debug!("ignoring cooked DLC file {path}");
            } else if let Some(name) = path.file_name() {
                self.assets.insert(name.to_string(), path.clone());
            }
        }

        info!(
            "installed DLC bundle {} ({} package(s))",
            bundle.name,
            bundle.package_files.len()
        );
        self.installed.push(bundle.name.clone());
        Ok(changes)
    }

    /// Remove the whole overlay: undo every config merge in reverse install
    /// order and drop all registries. Returns the sections restored, for
    /// reload dispatch.
    pub fn clear(&mut self, cache: &mut ConfigCache) -> ReloadSet {
        let mut changes = ReloadSet::new();
        while let Some(entry) = self.undo_log.pop() {
            let Some(file) = cache.find(&entry.target, true) else {
                continue;
            };
            for name in &entry.added_sections {
                file.remove_section(name);
                changes.note_section(name);
            }
            for (name, section) in entry.replaced_sections {
                changes.note_section(&name);
                file.insert_section(name, section);
            }
        }
        info!("cleared {} DLC bundle(s)", self.installed.len());
        self.installed.clear();
        self.registered_packages.clear();
        self.always_loaded.clear();
        self.fully_load.clear();
        self.integrity.clear();
        self.assets.clear();
        changes
    }

    fn register_package(&mut self, package: &Utf8Path) {
        if let Some(stem) = package.file_stem() {
            if stem.starts_with(ALWAYS_LOADED_PREFIX) {
                self.always_loaded.push(stem.to_string());
            }
        }
        self.registered_packages.push(package.to_owned());
    }

    fn register_digest(&mut self, path: &Utf8Path) -> Result<()> {
        // DLC.sha guards DLC.<ext>; register under the guarded name.
        let guarded = path.file_stem().unwrap_or("").to_string();
        let digest = std::fs::read(path.as_std_path())?;
        self.integrity.insert(guarded, digest);
        Ok(())
    }

    fn merge_config_file(
        &mut self,
        cache: &mut ConfigCache,
        path: &Utf8Path,
    ) -> Result<ReloadSet> {
        let text = std::fs::read_to_string(path.as_std_path())?;
        let target = merge_target(cache, path);

        // Snapshot every section the buffer names before merging, so the
        // merge can be reversed exactly.
        let mut entry = UndoEntry {
            target: target.clone(),
            replaced_sections: Vec::new(),
            added_sections: Vec::new(),
        };
        let mut changes = ReloadSet::new();
        let env = cache.env().clone();
        // Seed an empty entry when the target is not cached, so the buffer
        // below is the only source of its content.
        if cache.find_config_file(&target).is_none() {
            cache.set_file(&target, ConfigFile::new());
        }
        let file = match cache.find(&target, true) {
            Some(file) => file,
            None => return Ok(changes),
        };
        for event in Parser::new(&text) {
            let Event::OpenSection(name) = event else {
                continue;
            };
            if entry.added_sections.iter().any(|n| n == &name)
                || entry.replaced_sections.iter().any(|(n, _)| n == &name)
            {
                continue;
            }
            changes.note_section(&name);
            match file.section(&name) {
                Some(section) => entry.replaced_sections.push((name, section.clone())),
                None => entry.added_sections.push(name),
            }
        }

        file.combine_from_buffer(&target, &text, &env);

        // Newly advertised fully-load mappings become queryable right away.
        let mapping = cache.parse_1_to_n(&target, FULLY_LOAD_SECTION, "MapName", "Package");
        for (map_name, packages) in mapping {
            self.fully_load.entry(map_name).or_default().extend(packages);
        }

        debug!("merged DLC config {path} into {target}");
        self.undo_log.push(entry);
        Ok(changes)
    }
}

/// A DLC config file overrides the cached file with the same base name; a
/// base name nothing in the cache matches merges under its own path.
fn merge_target(cache: &ConfigCache, path: &Utf8Path) -> Utf8PathBuf {
    let Some(name) = path.file_name() else {
        return path.to_owned();
    };
    for (cached, _) in cache.files() {
        if cached.file_name() == Some(name) {
            return cached.clone();
        }
    }
    path.to_owned()
}
