//! One parsed configuration file: ordered sections plus write-back state.

use camino::Utf8Path;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::cmdline;
use crate::env::ConfigEnvironment;
use crate::loc;
use crate::name::{Name, NameKey};
use crate::parser::{Command, Event, Parser};
use crate::section::ConfigSection;
use crate::value::{Color, Rotator, Value, Vector};
use crate::GAME_NAME_TOKEN;

/// A config file's sections in file order, with the flags controlling
/// write-back.
///
/// Merging ([`combine_from_buffer`](Self::combine_from_buffer)) is additive:
/// layering several buffers into one file applies each buffer's per-key
/// commands on top of the existing state. [`read`](Self::read) resets the
/// file first, so a read is equivalent to merging into an empty file.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    sections: IndexMap<Name, ConfigSection>,
    /// Set by any mutation; cleared by a successful write.
    pub dirty: bool,
    /// Suppresses write-back entirely (used for files synthesized from
    /// coalesced or downloaded content).
    pub no_save: bool,
    /// Forces every written value into quotes regardless of content.
    pub quotes: bool,
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Drop all sections. Flags are kept.
    pub fn empty(&mut self) {
        self.sections.clear();
    }

    // ---- loading ----------------------------------------------------------

    /// Merge the contents of the file at `path` into this file. Returns
    /// whether the file existed and was merged. Does not consult the
    /// file-operations switch; callers that honor it go through
    /// [`read`](Self::read) or the cache.
    pub fn combine(&mut self, path: &Utf8Path, env: &ConfigEnvironment) -> bool {
        match read_text_file(path) {
            Some(text) => {
                self.combine_from_buffer(path, &text, env);
                true
            }
            None => false,
        }
    }

    /// Reset this file and load it from disk. Disabled file operations leave
    /// the file empty.
    pub fn read(&mut self, path: &Utf8Path, env: &ConfigEnvironment) {
        self.empty();
        if env.file_operations_disabled {
            return;
        }
        if !self.combine(path, env) {
            debug!("config file not found: {path}");
        }
    }

    /// Merge a text buffer into this file, attributing it to `path` (the
    /// path decides localization handling and commandline overrides).
    ///
    /// The buffer goes through, in order: `%GAME%` substitution; for
    /// localization files, `%` protection; line parsing (continuations,
    /// comments, quoting); per-pair merge commands; for localization files,
    /// escape expansion on unquoted values and, under the faux language,
    /// pseudo-localization. `-ini:` commandline overrides apply last.
    pub fn combine_from_buffer(&mut self, path: &Utf8Path, text: &str, env: &ConfigEnvironment) {
        let extension = path.extension().unwrap_or("");
        let localized = env.is_localization_extension(extension);
        let faux = env.is_faux_localized(extension);

        let mut text = text.replace(GAME_NAME_TOKEN, &env.game_name);
        if localized {
            text = loc::protect_percent(&text);
        }

        let mut current_name: Option<Name> = None;

        for event in Parser::new(&text) {
            match event {
                Event::OpenSection(name) => {
                    let name = Name::from(name);
                    self.sections.entry(name.clone()).or_default();
                    current_name = Some(name);
                }
                Event::SetPair {
                    command,
                    key,
                    value,
                    quoted,
                } => {
                    // Pairs before the first section header have nowhere to
                    // live and are dropped.
                    let Some(section_name) = &current_name else {
                        continue;
                    };
                    let mut value = value;
                    if localized && !quoted {
                        value = loc::expand_escapes(&value);
                    }
                    if faux {
                        value = if quoted {
                            // Quoted escapes were already expanded while
                            // parsing; re-escape so the pseudo-localization
                            // pass sees the escape pairs, then expand back.
                            let escaped = loc::escape_control_chars(&value);
                            loc::expand_escapes(&loc::faux_localize_quoted(&escaped))
                        } else {
                            loc::faux_localize_unquoted(&value)
                        };
                    }
                    let section = self
                        .sections
                        .entry(section_name.clone())
                        .or_default();
                    match command {
                        Command::Set => match section.find_mut(&key) {
                            Some(existing) => *existing = Value::new(value),
                            None => section.add(key, value),
                        },
                        Command::AddUnique => {
                            section.add_unique(key, value);
                        }
                        Command::Remove => {
                            section.remove_pair(&key, &value);
                        }
                        Command::Append => section.add(key, value),
                        Command::Clear => {
                            section.remove_key(&key);
                        }
                    }
                }
            }
        }

        self.dirty = true;
        cmdline::override_from_commandline(self, path, env);
    }

    // ---- writing ----------------------------------------------------------

    /// Write this file back to disk if it needs it. Returns whether the file
    /// is now in sync with disk (a skipped write counts as success).
    ///
    /// Writes are skipped when the file is clean, marked no-save, is a
    /// localization file, or when `-nowrite` is on the commandline. With
    /// file operations disabled the write reports success but stays dirty.
    pub fn write(&mut self, path: &Utf8Path, env: &ConfigEnvironment) -> bool {
        if !self.dirty || self.no_save {
            return true;
        }
        if cmdline::has_switch(&env.commandline, "nowrite") {
            return true;
        }
        if env.is_localization_extension(path.extension().unwrap_or("")) {
            return true;
        }
        if env.file_operations_disabled {
            return true;
        }

        let text = self.to_text(false);
        if text.is_empty() {
            self.dirty = false;
            return true;
        }

        let success = match std::fs::write(path.as_std_path(), text) {
            Ok(()) => true,
            Err(error) => {
                warn!("failed to write config file {path}: {error}");
                false
            }
        };
        self.dirty = !success;
        success
    }

    /// Serialize to INI text with `\r\n` terminators. When `localized` is
    /// set, control characters and quotes in values are re-escaped the way a
    /// localization loader expects.
    pub fn to_text(&self, localized: bool) -> String {
        let mut out = String::new();
        for (name, section) in &self.sections {
            out.push('[');
            out.push_str(name.as_str());
            out.push_str("]\r\n");
            for (key, value) in section.iter() {
                out.push_str(key.as_str());
                out.push('=');
                if localized {
                    out.push_str(&loc::escape_control_chars(value.as_str()));
                } else {
                    write_value(&mut out, value.as_str(), self.quotes);
                }
                out.push_str("\r\n");
            }
            out.push_str("\r\n");
        }
        out
    }

    // ---- sections ---------------------------------------------------------

    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.get(&NameKey(name))
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut ConfigSection> {
        self.sections.get_mut(&NameKey(name))
    }

    /// The named section, created empty if absent.
    pub fn section_or_insert(&mut self, name: &str) -> &mut ConfigSection {
        self.sections.entry(Name::from(name)).or_default()
    }

    /// Insert or replace a whole section.
    pub fn insert_section(&mut self, name: impl Into<Name>, section: ConfigSection) {
        self.sections.insert(name.into(), section);
        self.dirty = true;
    }

    /// Remove a section, returning it if it existed. Order of the remaining
    /// sections is preserved.
    pub fn remove_section(&mut self, name: &str) -> Option<ConfigSection> {
        let removed = self.sections.shift_remove(&NameKey(name));
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.keys().map(Name::as_str).collect()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&Name, &ConfigSection)> {
        self.sections.iter()
    }

    // ---- typed access -----------------------------------------------------

    pub fn get_string(&self, section: &str, key: &str) -> Option<&Value> {
        self.section(section)?.find(key)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Option<i32> {
        self.get_string(section, key)?.as_i32()
    }

    pub fn get_float(&self, section: &str, key: &str) -> Option<f32> {
        self.get_string(section, key)?.as_f32()
    }

    pub fn get_double(&self, section: &str, key: &str) -> Option<f64> {
        self.get_string(section, key)?.as_f64()
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get_string(section, key)?.as_bool()
    }

    pub fn get_vector(&self, section: &str, key: &str) -> Option<Vector> {
        self.get_string(section, key)?.as_vector()
    }

    pub fn get_rotator(&self, section: &str, key: &str) -> Option<Rotator> {
        self.get_string(section, key)?.as_rotator()
    }

    pub fn get_color(&self, section: &str, key: &str) -> Option<Color> {
        self.get_string(section, key)?.as_color()
    }

    /// Whitespace-separated tokens of the value, honoring quoting.
    pub fn get_single_line_array(&self, section: &str, key: &str) -> Vec<String> {
        match self.get_string(section, key) {
            Some(value) => value.tokens(),
            None => Vec::new(),
        }
    }

    /// All values for `key`, in order.
    pub fn get_array(&self, section: &str, key: &str) -> Vec<&Value> {
        match self.section(section) {
            Some(section) => section.find_all(key).collect(),
            None => Vec::new(),
        }
    }

    /// Set `key` to `value`, creating the section if needed. The file is
    /// only marked dirty when the stored value actually changes.
    pub fn set_string(&mut self, section: &str, key: &str, value: &str) {
        let section = self.section_or_insert(section);
        match section.find_mut(key) {
            Some(existing) => {
                if existing.as_str() != value {
                    *existing = Value::new(value);
                    self.dirty = true;
                }
            }
            None => {
                section.add(key, value);
                self.dirty = true;
            }
        }
    }

    pub fn set_int(&mut self, section: &str, key: &str, value: i32) {
        self.set_string(section, key, &value.to_string());
    }

    pub fn set_float(&mut self, section: &str, key: &str, value: f32) {
        self.set_string(section, key, &value.to_string());
    }

    pub fn set_double(&mut self, section: &str, key: &str, value: f64) {
        self.set_string(section, key, &value.to_string());
    }

    pub fn set_bool(&mut self, section: &str, key: &str, value: bool) {
        self.set_string(section, key, if value { "True" } else { "False" });
    }

    /// Replace every value for `key` with `values`, in order.
    pub fn set_array(&mut self, section: &str, key: &str, values: &[String]) {
        let section = self.section_or_insert(section);
        section.remove_key(key);
        for value in values {
            section.add(key, value.as_str());
        }
        self.dirty = true;
    }

    /// Copy every pair from `other` that this file is missing (by exact
    /// key+value match), preserving `other`'s order for new material.
    pub fn add_missing_properties(&mut self, other: &ConfigFile) {
        for (name, source) in other.sections() {
            let target = self.sections.entry(name.clone()).or_default();
            for (key, value) in source.iter() {
                if target.add_unique(key.as_str(), value.as_str()) {
                    self.dirty = true;
                }
            }
        }
    }

    /// Structural equality over sections: same names in the same order,
    /// each pair matching per [`ConfigSection::matches`].
    pub fn matches(&self, other: &ConfigFile) -> bool {
        if self.sections.len() != other.sections.len() {
            return false;
        }
        self.sections
            .iter()
            .zip(other.sections.iter())
            .all(|((name, section), (other_name, other_section))| {
                name == other_name && section.matches(other_section)
            })
    }

    /// (current, peak) bytes held by this file's strings and tables.
    pub(crate) fn memory_bytes(&self) -> (usize, usize) {
        let mut current = 0;
        let mut peak = 0;
        for (name, section) in &self.sections {
            let (section_current, section_peak) = section.memory_bytes();
            current += name.as_str().len() + section_current;
            peak += name.byte_capacity() + section_peak;
        }
        (current, peak)
    }
}

/// Append `value` to `out`, quoting and escaping when the value would not
/// survive a parse round trip bare: a forced-quotes file, a leading space,
/// or an embedded newline.
fn write_value(out: &mut String, value: &str, force_quotes: bool) {
    let needs_quotes = force_quotes
        || value.starts_with(' ')
        || value.contains('\n')
        || value.contains('\r')
        || value.starts_with('"');
    if !needs_quotes {
        out.push_str(value);
        return;
    }
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\0d"),
            other => out.push(other),
        }
    }
    out.push('"');
}

/// Read a whole text file, honoring a UTF-16 byte-order mark; anything else
/// is treated as UTF-8 (invalid sequences replaced). `None` when the file
/// is missing or unreadable.
fn read_text_file(path: &Utf8Path) -> Option<String> {
    let bytes = match std::fs::read(path.as_std_path()) {
        Ok(bytes) => bytes,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to read {path}: {error}");
            }
            return None;
        }
    };
    Some(decode_text(&bytes))
}

fn decode_text(bytes: &[u8]) -> String {
    let utf16 = |units: Vec<u16>| -> String {
        char::decode_utf16(units)
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    };
    match bytes {
        [0xFF, 0xFE, rest @ ..] => utf16(
            rest.chunks(2)
                .map(|pair| u16::from_le_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                .collect(),
        ),
        [0xFE, 0xFF, rest @ ..] => utf16(
            rest.chunks(2)
                .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                .collect(),
        ),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
