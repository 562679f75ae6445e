//! Offline coalesced-file packager.
//!
//! Walks the config tree once and the localization tree once per language,
//! normalizes every file through the parser, strips editor-only content,
//! and writes one `Coalesced_<LANG>.bin` per language containing the shared
//! config entries plus that language's localization entries.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use inikit_config::{ConfigEnvironment, ConfigFile, FALLBACK_LANGUAGE, FAUX_LANGUAGE};

use crate::cipher;
use crate::coalesced_file_name;
use crate::error::Result;
use crate::strip;
use crate::transport::{self, Entry, MAGIC};

/// What to coalesce and where to put it.
#[derive(Debug, Clone)]
pub struct CoalesceOptions {
    /// Directory walked (recursively) for `.ini` files.
    pub config_dir: Utf8PathBuf,
    /// Directory holding one subdirectory per language code.
    pub localization_dir: Utf8PathBuf,
    /// Where the `Coalesced_<LANG>.bin` files land.
    pub output_dir: Utf8PathBuf,
    /// Language codes to generate. Languages with no localization
    /// subdirectory are skipped.
    pub languages: Vec<String>,
    /// File names (with extension) excluded from coalescing.
    pub filter: Vec<String>,
    /// Extra config files outside `config_dir` to include, such as the
    /// engine's `ConsoleVariables.ini`.
    pub extra_files: Vec<Utf8PathBuf>,
    /// Substituted for `%GAME%` while normalizing.
    pub game_name: String,
    /// AES-256 key; the placeholder key writes plain blobs.
    pub key: [u8; 32],
}

impl CoalesceOptions {
    pub fn new(
        config_dir: impl Into<Utf8PathBuf>,
        localization_dir: impl Into<Utf8PathBuf>,
        output_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            localization_dir: localization_dir.into(),
            output_dir: output_dir.into(),
            languages: vec![FALLBACK_LANGUAGE.to_string()],
            filter: Vec::new(),
            extra_files: Vec::new(),
            game_name: "Game".to_string(),
            key: cipher::COALESCED_KEY,
        }
    }
}

/// The file names listed in a `[ConfigCoalesceFilter]` section, for
/// [`CoalesceOptions::filter`].
pub fn filter_from_ini(path: &Utf8Path, env: &ConfigEnvironment) -> Vec<String> {
    let mut file = ConfigFile::new();
    file.read(path, env);
    match file.section("ConfigCoalesceFilter") {
        Some(section) => section
            .iter()
            .map(|(_, value)| value.as_str().to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Build every requested language's coalesced blob from the files on disk.
/// Returns the paths written.
pub fn coalesce_from_disk(options: &CoalesceOptions) -> Result<Vec<Utf8PathBuf>> {
    let config_entries = collect_config_entries(options);
    info!(
        "coalescing {} config file(s) from {}",
        config_entries.len(),
        options.config_dir
    );

    std::fs::create_dir_all(options.output_dir.as_std_path())?;

    let mut written = Vec::new();
    for language in &options.languages {
        // Faux localization is generated from the fallback-language files.
        let source_language = if language.eq_ignore_ascii_case(FAUX_LANGUAGE) {
            FALLBACK_LANGUAGE
        } else {
            language.as_str()
        };
        let language_dir = options.localization_dir.join(source_language);
        if !language_dir.is_dir() {
            warn!("no localization directory for {language}, skipping");
            continue;
        }

        let mut entries = config_entries.clone();
        let env = ConfigEnvironment::new(&options.game_name, language.as_str());
        entries.extend(collect_localization_entries(options, &language_dir, &env));

        let path = options.output_dir.join(coalesced_file_name(language));
        write_blob(&path, &entries, &options.key)?;
        info!("wrote {path} ({} entries)", entries.len());
        written.push(path);
    }
    Ok(written)
}

fn write_blob(path: &Utf8Path, entries: &[Entry], key: &[u8; 32]) -> Result<()> {
    let mut payload = transport::serialize(entries);
    let bytes = if cipher::encryption_enabled(key) {
        cipher::pad_to_block(&mut payload);
        cipher::encrypt(&mut payload, key);
        let mut out = Vec::with_capacity(payload.len() + 4);
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&payload);
        out
    } else {
        warn!("writing {path} without encryption");
        payload
    };
    std::fs::write(path.as_std_path(), bytes)?;
    Ok(())
}

/// Config files appended after filtering, so a `[ConfigCoalesceFilter]`
/// entry cannot drop them.
const ALWAYS_INCLUDED: &[&str] = &["ConsoleVariables.ini"];

fn collect_config_entries(options: &CoalesceOptions) -> Vec<Entry> {
    let env = ConfigEnvironment::new(&options.game_name, FALLBACK_LANGUAGE);
    let walked = find_files(&options.config_dir, |path| {
        path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ini"))
            && path.file_stem() != Some("Coalesced")
    });
    let mut paths: Vec<Utf8PathBuf> = walked
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|n| !ALWAYS_INCLUDED.iter().any(|a| a.eq_ignore_ascii_case(n)))
        })
        .filter_map(|path| file_name_unless_filtered(&path, &options.filter).map(|_| path))
        .collect();
    for name in ALWAYS_INCLUDED {
        let path = options.config_dir.join(name);
        if path.is_file() {
            paths.push(path);
        } else {
            debug!("no {name} under {}", options.config_dir);
        }
    }
    paths.extend(options.extra_files.iter().cloned());

    let mut entries = Vec::new();
    for path in paths {
        let Some(name) = path.file_name().map(str::to_string) else {
            continue;
        };
        let mut file = ConfigFile::new();
        if !file.combine(&path, &env) {
            warn!("skipping unreadable config file {path}");
            continue;
        }
        strip::strip_sound_node_wave_sections(&mut file);
        if file.is_empty() {
            debug!("skipping empty config file {path}");
            continue;
        }
        entries.push(Entry {
            name,
            contents: file.to_text(false),
        });
    }
    entries
}

fn collect_localization_entries(
    options: &CoalesceOptions,
    language_dir: &Utf8Path,
    env: &ConfigEnvironment,
) -> Vec<Entry> {
    let paths = find_files(language_dir, |path| {
        path.extension()
            .is_some_and(|ext| env.is_localization_extension(ext))
    });

    let mut entries = Vec::new();
    for path in paths {
        let Some(name) = file_name_unless_filtered(&path, &options.filter) else {
            continue;
        };
        let Ok(raw) = std::fs::read_to_string(path.as_std_path()) else {
            warn!("skipping unreadable localization file {path}");
            continue;
        };
        let raw = strip::strip_editor_only_lines(&raw);
        let raw = strip::strip_subtitle_lines(&raw);

        let mut file = ConfigFile::new();
        file.combine_from_buffer(&path, &raw, env);
        if file.is_empty() {
            continue;
        }
        entries.push(Entry {
            name,
            contents: file.to_text(true),
        });
    }
    entries
}

/// Files under `root`, deepest-last and name-sorted for a deterministic
/// blob layout.
fn find_files(root: &Utf8Path, keep: impl Fn(&Utf8Path) -> bool) -> Vec<Utf8PathBuf> {
    let mut paths: Vec<Utf8PathBuf> = WalkDir::new(root.as_std_path())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.into_path()).ok())
        .filter(|path| keep(path))
        .collect();
    paths.sort();
    paths
}

fn file_name_unless_filtered(path: &Utf8Path, filter: &[String]) -> Option<String> {
    let name = path.file_name()?;
    if filter.iter().any(|f| f.eq_ignore_ascii_case(name)) {
        debug!("filtered out {path}");
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Utf8Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        std::fs::write(path.as_std_path(), text).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, CoalesceOptions) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let options = CoalesceOptions::new(
            root.join("Config"),
            root.join("Localization"),
            root.join("Out"),
        );
        (dir, options)
    }

    #[test]
    fn test_coalesce_plain() {
        let (_dir, mut options) = fixture();
        write(&options.config_dir.join("Engine.ini"), "[A]\nK=1\n");
        write(&options.config_dir.join("Game.ini"), "[B]\nX=2\n");
        write(
            &options.localization_dir.join("INT/Game.INT"),
            "[Msgs]\nHello=hi\n",
        );

        let written = coalesce_from_disk(&options).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].file_name(), Some("Coalesced_INT.bin"));

        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        let entries = transport::deserialize(&bytes).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Engine.ini", "Game.ini", "Game.INT"]);

        options.languages = vec!["FRA".to_string()];
        assert!(coalesce_from_disk(&options).unwrap().is_empty());
    }

    #[test]
    fn test_coalesce_encrypted_has_magic() {
        let (_dir, mut options) = fixture();
        options.key = [0x42; 32];
        write(&options.config_dir.join("Engine.ini"), "[A]\nK=1\n");
        std::fs::create_dir_all(options.localization_dir.join("INT").as_std_path()).unwrap();

        let written = coalesce_from_disk(&options).unwrap();
        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        assert_eq!(&bytes[..4], &MAGIC.to_le_bytes());
        assert_eq!((bytes.len() - 4) % cipher::AES_BLOCK_SIZE, 0);

        let mut payload = bytes[4..].to_vec();
        cipher::decrypt(&mut payload, &options.key);
        let entries = transport::deserialize(&payload).unwrap();
        assert_eq!(entries[0].name, "Engine.ini");
    }

    #[test]
    fn test_filter_and_coalesced_excluded() {
        let (_dir, mut options) = fixture();
        options.filter = vec!["Editor.ini".to_string()];
        write(&options.config_dir.join("Engine.ini"), "[A]\nK=1\n");
        write(&options.config_dir.join("Editor.ini"), "[E]\nK=1\n");
        write(&options.config_dir.join("Coalesced.ini"), "[C]\nK=1\n");
        std::fs::create_dir_all(options.localization_dir.join("INT").as_std_path()).unwrap();

        let written = coalesce_from_disk(&options).unwrap();
        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        let entries = transport::deserialize(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Engine.ini");
    }

    #[test]
    fn test_console_variables_always_included() {
        let (_dir, mut options) = fixture();
        // Even an explicit filter entry cannot drop it.
        options.filter = vec!["ConsoleVariables.ini".to_string()];
        write(&options.config_dir.join("Engine.ini"), "[A]\nK=1\n");
        write(
            &options.config_dir.join("ConsoleVariables.ini"),
            "[Startup]\nr.Shadows=0\n",
        );
        std::fs::create_dir_all(options.localization_dir.join("INT").as_std_path()).unwrap();

        let written = coalesce_from_disk(&options).unwrap();
        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        let entries = transport::deserialize(&bytes).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Engine.ini", "ConsoleVariables.ini"]);
    }

    #[test]
    fn test_faux_language_built_from_fallback_files() {
        let (_dir, mut options) = fixture();
        options.languages = vec![FAUX_LANGUAGE.to_string()];
        write(
            &options.localization_dir.join("INT/Game.INT"),
            "[Msgs]\nHello=\"Hi\"\n",
        );
        std::fs::create_dir_all(options.config_dir.as_std_path()).unwrap();

        let written = coalesce_from_disk(&options).unwrap();
        assert_eq!(written[0].file_name(), Some("Coalesced_XXX.bin"));
        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        let entries = transport::deserialize(&bytes).unwrap();
        assert_eq!(entries[0].name, "Game.INT");
        assert!(entries[0].contents.contains("Hello=XX"));
    }

    #[test]
    fn test_editor_only_content_stripped() {
        let (_dir, options) = fixture();
        let text = "[Cue1 SoundNodeWave]\nSpokenText=\"Read me\"\n\
                    [Msgs]\nHello=hi\nComment=\"studio note\"\n";
        write(&options.localization_dir.join("INT/Game.INT"), text);
        std::fs::create_dir_all(options.config_dir.as_std_path()).unwrap();

        let written = coalesce_from_disk(&options).unwrap();
        let bytes = std::fs::read(written[0].as_std_path()).unwrap();
        let entries = transport::deserialize(&bytes).unwrap();
        assert!(!entries[0].contents.contains("SpokenText"));
        assert!(!entries[0].contents.contains("SoundNodeWave"));
        assert!(entries[0].contents.contains("Hello=hi"));
    }

    #[test]
    fn test_filter_from_ini() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let path = root.join("Engine.ini");
        std::fs::write(
            path.as_std_path(),
            "[ConfigCoalesceFilter]\n+File=Editor.ini\n+File=Debug.ini\n",
        )
        .unwrap();
        let env = ConfigEnvironment::new("Example", "INT");
        assert_eq!(filter_from_ini(&path, &env), vec!["Editor.ini", "Debug.ini"]);
    }
}
