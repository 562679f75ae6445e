//! The process-wide registry of loaded config files.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::env::ConfigEnvironment;
use crate::error::{Error, Result};
use crate::file::ConfigFile;
use crate::value::{Color, Rotator, Value, Vector};

/// Keyed-by-path cache of [`ConfigFile`]s. All file I/O for configuration
/// goes through here; files load lazily on first access and write back on
/// [`flush`](Self::flush).
#[derive(Debug, Default)]
pub struct ConfigCache {
    files: IndexMap<Utf8PathBuf, ConfigFile>,
    env: ConfigEnvironment,
}

impl ConfigCache {
    pub fn new(env: ConfigEnvironment) -> Self {
        Self {
            files: IndexMap::new(),
            env,
        }
    }

    pub fn env(&self) -> &ConfigEnvironment {
        &self.env
    }

    /// Switch the running language. Files already loaded keep their content;
    /// callers reload localization afterwards.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.env.language = language.into();
    }

    pub fn disable_file_operations(&mut self) {
        self.env.file_operations_disabled = true;
    }

    pub fn enable_file_operations(&mut self) {
        self.env.file_operations_disabled = false;
    }

    pub fn are_file_operations_disabled(&self) -> bool {
        self.env.file_operations_disabled
    }

    /// The cached file for `path`, loading it from disk on first access.
    /// Without `create_if_not_found`, a path with no sections on disk stays
    /// out of the cache and `None` is returned.
    pub fn find(&mut self, path: &Utf8Path, create_if_not_found: bool) -> Option<&mut ConfigFile> {
        if !self.files.contains_key(path) {
            let mut file = ConfigFile::new();
            file.read(path, &self.env);
            file.dirty = false;
            if file.is_empty() && !create_if_not_found {
                return None;
            }
            debug!("cached config file {path} ({} sections)", file.len());
            self.files.insert(path.to_owned(), file);
        }
        self.files.get_mut(path)
    }

    /// The already-cached file for `path`, never touching disk.
    pub fn find_config_file(&self, path: &Utf8Path) -> Option<&ConfigFile> {
        self.files.get(path)
    }

    /// Load (or reload) `path` from disk. When the file is empty on disk and
    /// a fallback is supplied, the fallback's content is copied in and the
    /// file marked dirty so the next flush materializes it.
    pub fn load_file(&mut self, path: &Utf8Path, fallback: Option<&ConfigFile>) -> &mut ConfigFile {
        let mut file = ConfigFile::new();
        file.read(path, &self.env);
        file.dirty = false;
        if file.is_empty() {
            if let Some(fallback) = fallback {
                file = fallback.clone();
                file.dirty = true;
            }
        }
        let slot = self.files.entry(path.to_owned()).or_default();
        *slot = file;
        slot
    }

    /// Install `file` under `path`, replacing any cached content.
    pub fn set_file(&mut self, path: &Utf8Path, file: ConfigFile) {
        self.files.insert(path.to_owned(), file);
    }

    /// Drop `path` from the cache without writing it. Returns whether it was
    /// cached.
    pub fn unload(&mut self, path: &Utf8Path) -> bool {
        self.files.shift_remove(path).is_some()
    }

    /// Keep `path` cached but never write it back.
    pub fn detach(&mut self, path: &Utf8Path) {
        if let Some(file) = self.find(path, true) {
            file.no_save = true;
        }
    }

    /// Write dirty files back to disk. `path` restricts the flush to one
    /// file; `read_back` re-reads each flushed file from disk afterwards.
    pub fn flush(&mut self, read_back: bool, path: Option<&Utf8Path>) -> Result<()> {
        let mut failed = 0;
        let mut total = 0;
        let env = self.env.clone();
        for (file_path, file) in &mut self.files {
            if let Some(only) = path {
                if file_path != only {
                    continue;
                }
            }
            total += 1;
            if !file.write(file_path, &env) {
                failed += 1;
                continue;
            }
            if read_back {
                file.read(file_path, &env);
                file.dirty = false;
            }
        }
        if failed > 0 {
            return Err(Error::FlushFailed { failed, total });
        }
        Ok(())
    }

    /// Iterate over every cached (path, file) pair.
    pub fn files(&self) -> impl Iterator<Item = (&Utf8PathBuf, &ConfigFile)> {
        self.files.iter()
    }

    // ---- section queries --------------------------------------------------

    pub fn section_names(&mut self, path: &Utf8Path) -> Vec<String> {
        match self.find(path, false) {
            Some(file) => file.section_names().iter().map(|s| s.to_string()).collect(),
            None => Vec::new(),
        }
    }

    /// Section names of the form `<instance> <class>` whose class part (the
    /// text after the first space) equals `class_name`. At most `max`
    /// instance names are returned.
    pub fn per_object_config_sections(
        &mut self,
        path: &Utf8Path,
        class_name: &str,
        max: usize,
    ) -> Vec<String> {
        let mut out = Vec::new();
        let Some(file) = self.find(path, false) else {
            return out;
        };
        for name in file.section_names() {
            // The first space delimits instance from class; class names
            // never contain spaces, instance names may.
            let Some((instance, class)) = name.split_once(' ') else {
                continue;
            };
            if class.eq_ignore_ascii_case(class_name) {
                out.push(instance.to_string());
                if out.len() >= max {
                    break;
                }
            }
        }
        out
    }

    /// The pairs of a section rendered as `Key=Value` strings, or `None`
    /// when the file or section does not exist.
    pub fn section_pairs(&mut self, path: &Utf8Path, section: &str) -> Option<Vec<String>> {
        let file = self.find(path, false)?;
        let section = file.section(section)?;
        Some(
            section
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect(),
        )
    }

    /// Remove every pair of a section, leaving the section itself out of the
    /// file. When the file ends up with no sections, its on-disk copy is
    /// deleted as well. Returns whether anything was removed.
    pub fn empty_section(&mut self, path: &Utf8Path, section: &str) -> bool {
        let env = self.env.clone();
        let Some(file) = self.find(path, false) else {
            return false;
        };
        if file.remove_section(section).is_none() {
            return false;
        }
        if file.is_empty() && !env.file_operations_disabled {
            if let Err(error) = std::fs::remove_file(path.as_std_path()) {
                if error.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to delete emptied config file {path}: {error}");
                }
            }
            file.dirty = false;
        }
        true
    }

    /// [`empty_section`](Self::empty_section) for every section whose name
    /// contains `fragment`. Returns the number of sections removed.
    pub fn empty_sections_matching(&mut self, path: &Utf8Path, fragment: &str) -> usize {
        let names: Vec<String> = match self.find(path, false) {
            Some(file) => file
                .section_names()
                .iter()
                .filter(|name| name.contains(fragment))
                .map(|name| name.to_string())
                .collect(),
            None => return 0,
        };
        let mut removed = 0;
        for name in &names {
            if self.empty_section(path, name) {
                removed += 1;
            }
        }
        removed
    }

    /// Parse a section laid out as repeated `key_one` entries each followed
    /// by its `key_n` entries, into a map from each `key_one` value to its
    /// `key_n` values. `key_n` entries before the first `key_one` are
    /// dropped.
    pub fn parse_1_to_n(
        &mut self,
        path: &Utf8Path,
        section: &str,
        key_one: &str,
        key_n: &str,
    ) -> IndexMap<String, Vec<String>> {
        let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
        let Some(file) = self.find(path, false) else {
            return out;
        };
        let Some(section) = file.section(section) else {
            return out;
        };
        let mut current: Option<String> = None;
        for (key, value) in section.iter() {
            if key == &key_one {
                let bucket = value.as_str().to_string();
                out.entry(bucket.clone()).or_default();
                current = Some(bucket);
            } else if key == &key_n {
                if let Some(bucket) = &current {
                    if let Some(values) = out.get_mut(bucket) {
                        values.push(value.as_str().to_string());
                    }
                }
            }
        }
        out
    }

    // ---- typed access -----------------------------------------------------

    pub fn get_string(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<String> {
        self.get_value(path, section, key)
            .map(|value| value.as_str().to_string())
    }

    pub fn get_int(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<i32> {
        self.get_value(path, section, key).and_then(|v| v.as_i32())
    }

    pub fn get_float(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<f32> {
        self.get_value(path, section, key).and_then(|v| v.as_f32())
    }

    pub fn get_double(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<f64> {
        self.get_value(path, section, key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<bool> {
        self.get_value(path, section, key).and_then(|v| v.as_bool())
    }

    pub fn get_vector(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<Vector> {
        self.get_value(path, section, key).and_then(|v| v.as_vector())
    }

    pub fn get_rotator(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<Rotator> {
        self.get_value(path, section, key)
            .and_then(|v| v.as_rotator())
    }

    pub fn get_color(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<Color> {
        self.get_value(path, section, key).and_then(|v| v.as_color())
    }

    /// Every value stored under `key`, in order.
    pub fn get_array(&mut self, path: &Utf8Path, section: &str, key: &str) -> Vec<String> {
        match self.find(path, false) {
            Some(file) => file
                .get_array(section, key)
                .into_iter()
                .map(|value| value.as_str().to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// A single value split on whitespace (quoted runs stay together).
    pub fn get_single_line_array(
        &mut self,
        path: &Utf8Path,
        section: &str,
        key: &str,
    ) -> Vec<String> {
        self.get_value(path, section, key)
            .map(|value| value.tokens())
            .unwrap_or_default()
    }

    fn get_value(&mut self, path: &Utf8Path, section: &str, key: &str) -> Option<&Value> {
        self.find(path, false)?.get_string(section, key)
    }

    pub fn set_string(&mut self, path: &Utf8Path, section: &str, key: &str, value: &str) {
        if let Some(file) = self.find(path, true) {
            file.set_string(section, key, value);
        }
    }

    pub fn set_int(&mut self, path: &Utf8Path, section: &str, key: &str, value: i32) {
        self.set_string(path, section, key, &value.to_string());
    }

    pub fn set_float(&mut self, path: &Utf8Path, section: &str, key: &str, value: f32) {
        self.set_string(path, section, key, &value.to_string());
    }

    pub fn set_double(&mut self, path: &Utf8Path, section: &str, key: &str, value: f64) {
        self.set_string(path, section, key, &value.to_string());
    }

    pub fn set_bool(&mut self, path: &Utf8Path, section: &str, key: &str, value: bool) {
        self.set_string(path, section, key, if value { "True" } else { "False" });
    }

    pub fn set_array(&mut self, path: &Utf8Path, section: &str, key: &str, values: &[String]) {
        if let Some(file) = self.find(path, true) {
            file.set_array(section, key, values);
        }
    }

    // ---- diagnostics ------------------------------------------------------

    /// Per-file memory usage, largest peak first.
    pub fn memory_report(&self) -> Vec<FileMemoryUsage> {
        let mut report: Vec<FileMemoryUsage> = self
            .files
            .iter()
            .map(|(path, file)| {
                let (current_bytes, peak_bytes) = file.memory_bytes();
                FileMemoryUsage {
                    path: path.clone(),
                    sections: file.len(),
                    current_bytes,
                    peak_bytes,
                }
            })
            .collect();
        report.sort_by(|a, b| b.peak_bytes.cmp(&a.peak_bytes));
        report
    }

    /// Log the memory report at info level.
    pub fn log_memory_usage(&self) {
        let report = self.memory_report();
        let current: usize = report.iter().map(|f| f.current_bytes).sum();
        let peak: usize = report.iter().map(|f| f.peak_bytes).sum();
        for usage in &report {
            info!(
                "config file {}: {} sections, {} bytes ({} peak)",
                usage.path, usage.sections, usage.current_bytes, usage.peak_bytes
            );
        }
        info!(
            "config cache total: {} file(s), {current} bytes ({peak} peak)",
            report.len()
        );
    }
}

/// One row of [`ConfigCache::memory_report`].
#[derive(Debug, Clone)]
pub struct FileMemoryUsage {
    pub path: Utf8PathBuf,
    pub sections: usize,
    pub current_bytes: usize,
    pub peak_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
        cache: ConfigCache,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        Fixture {
            _dir: dir,
            root,
            cache: ConfigCache::new(ConfigEnvironment::new("Example", "INT")),
        }
    }

    fn write(root: &Utf8Path, name: &str, text: &str) -> Utf8PathBuf {
        let path = root.join(name);
        std::fs::write(path.as_std_path(), text).unwrap();
        path
    }

    #[test]
    fn test_find_loads_lazily() {
        let mut fx = fixture();
        let path = write(&fx.root, "Engine.ini", "[A]\nK=v\n");
        let file = fx.cache.find(&path, false).unwrap();
        assert_eq!(file.get_string("A", "K").unwrap().as_str(), "v");
        assert!(!file.dirty);
    }

    #[test]
    fn test_find_missing_without_create() {
        let mut fx = fixture();
        let path = fx.root.join("Missing.ini");
        assert!(fx.cache.find(&path, false).is_none());
        assert!(fx.cache.find_config_file(&path).is_none());
        assert!(fx.cache.find(&path, true).is_some());
    }

    #[test]
    fn test_load_file_with_fallback() {
        let mut fx = fixture();
        let mut fallback = ConfigFile::new();
        fallback.set_string("Defaults", "K", "v");
        let path = fx.root.join("Custom.ini");
        let file = fx.cache.load_file(&path, Some(&fallback));
        assert!(file.dirty);
        assert_eq!(file.get_string("Defaults", "K").unwrap().as_str(), "v");
    }

    #[test]
    fn test_flush_writes_dirty_files() {
        let mut fx = fixture();
        let path = fx.root.join("Engine.ini");
        fx.cache.set_string(&path, "A", "K", "v");
        fx.cache.flush(false, None).unwrap();
        assert!(path.exists());

        let mut fresh = ConfigCache::new(ConfigEnvironment::new("Example", "INT"));
        assert_eq!(fresh.get_string(&path, "A", "K").as_deref(), Some("v"));
    }

    #[test]
    fn test_flush_single_file() {
        let mut fx = fixture();
        let first = fx.root.join("First.ini");
        let second = fx.root.join("Second.ini");
        fx.cache.set_string(&first, "A", "K", "1");
        fx.cache.set_string(&second, "A", "K", "2");
        fx.cache.flush(false, Some(&first)).unwrap();
        assert!(first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn test_detach_suppresses_write() {
        let mut fx = fixture();
        let path = fx.root.join("Engine.ini");
        fx.cache.set_string(&path, "A", "K", "v");
        fx.cache.detach(&path);
        fx.cache.flush(false, None).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unload() {
        let mut fx = fixture();
        let path = fx.root.join("Engine.ini");
        fx.cache.set_string(&path, "A", "K", "v");
        assert!(fx.cache.unload(&path));
        assert!(!fx.cache.unload(&path));
        assert!(fx.cache.find_config_file(&path).is_none());
    }

    #[test]
    fn test_per_object_config_sections() {
        let mut fx = fixture();
        let text = "[Engine.Engine]\nK=1\n\
                    [Rifle Weapon]\nDamage=10\n\
                    [Heavy Rifle Weapon]\nDamage=30\n\
                    [Pistol Weapon]\nDamage=5\n";
        let path = write(&fx.root, "Weapons.ini", text);
        let all = fx.cache.per_object_config_sections(&path, "Weapon", 10);
        // First space splits instance from class, so "Heavy Rifle Weapon"
        // is instance "Heavy" of class "Rifle Weapon", not a Weapon.
        assert_eq!(all, vec!["Rifle", "Pistol"]);
        let capped = fx.cache.per_object_config_sections(&path, "Weapon", 1);
        assert_eq!(capped, vec!["Rifle"]);
    }

    #[test]
    fn test_section_pairs() {
        let mut fx = fixture();
        let path = write(&fx.root, "Engine.ini", "[A]\nK=1\n.K=2\n");
        assert_eq!(
            fx.cache.section_pairs(&path, "A").unwrap(),
            vec!["K=1", "K=2"]
        );
        assert!(fx.cache.section_pairs(&path, "Missing").is_none());
    }

    #[test]
    fn test_empty_section_deletes_emptied_file() {
        let mut fx = fixture();
        let path = write(&fx.root, "Engine.ini", "[A]\nK=1\n");
        assert!(fx.cache.empty_section(&path, "A"));
        assert!(!path.exists());
        assert!(!fx.cache.empty_section(&path, "A"));
    }

    #[test]
    fn test_empty_sections_matching() {
        let mut fx = fixture();
        let text = "[DLC1_Maps]\nK=1\n[DLC2_Maps]\nK=2\n[Engine]\nK=3\n";
        let path = write(&fx.root, "Engine.ini", text);
        assert_eq!(fx.cache.empty_sections_matching(&path, "_Maps"), 2);
        assert_eq!(fx.cache.section_names(&path), vec!["Engine"]);
        assert!(path.exists());
    }

    #[test]
    fn test_parse_1_to_n() {
        let mut fx = fixture();
        let text = "[Engine.PackagesToFullyLoadForDLC]\n\
                    Package=MapA\n\
                    LoadPackage=MapA_Tex\n\
                    LoadPackage=MapA_Snd\n\
                    Package=MapB\n\
                    LoadPackage=MapB_Tex\n";
        let path = write(&fx.root, "DLC.ini", text);
        let map = fx.cache.parse_1_to_n(
            &path,
            "Engine.PackagesToFullyLoadForDLC",
            "Package",
            "LoadPackage",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map["MapA"], vec!["MapA_Tex", "MapA_Snd"]);
        assert_eq!(map["MapB"], vec!["MapB_Tex"]);
    }

    #[test]
    fn test_typed_accessors() {
        let mut fx = fixture();
        let text = "[T]\nNum=42\nRatio=0.5\nOn=Yes\n\
                    Where=(X=1.0,Y=2.0,Z=3.0)\n\
                    Tint=(R=255,G=128,B=0)\n\
                    List=one \"two three\" four\n";
        let path = write(&fx.root, "Types.ini", text);
        assert_eq!(fx.cache.get_int(&path, "T", "Num"), Some(42));
        assert_eq!(fx.cache.get_float(&path, "T", "Ratio"), Some(0.5));
        assert_eq!(fx.cache.get_bool(&path, "T", "On"), Some(true));
        let v = fx.cache.get_vector(&path, "T", "Where").unwrap();
        assert_eq!((v.x, v.y, v.z), (1.0, 2.0, 3.0));
        let c = fx.cache.get_color(&path, "T", "Tint").unwrap();
        assert_eq!((c.r, c.g, c.b, c.a), (255, 128, 0, 0));
        assert_eq!(
            fx.cache.get_single_line_array(&path, "T", "List"),
            vec!["one", "two three", "four"]
        );
    }

    #[test]
    fn test_file_operations_disabled() {
        let mut fx = fixture();
        let path = write(&fx.root, "Engine.ini", "[A]\nK=v\n");
        fx.cache.disable_file_operations();
        assert!(fx.cache.are_file_operations_disabled());
        assert!(fx.cache.find(&path, false).is_none());
        fx.cache.enable_file_operations();
        assert!(fx.cache.find(&path, false).is_some());
    }

    #[test]
    fn test_memory_report_sorted() {
        let mut fx = fixture();
        let small = write(&fx.root, "Small.ini", "[A]\nK=1\n");
        let large = write(
            &fx.root,
            "Large.ini",
            "[A]\nLongKeyName=a considerably longer value than the other file has\n",
        );
        fx.cache.find(&small, false);
        fx.cache.find(&large, false);
        let report = fx.cache.memory_report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].path, large);
        assert!(report[0].peak_bytes >= report[1].peak_bytes);
    }
}
