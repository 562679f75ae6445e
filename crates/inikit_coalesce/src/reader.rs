//! Runtime loader for coalesced blobs.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use inikit_config::{cmdline, ConfigCache, ConfigFile, FALLBACK_LANGUAGE};

use crate::cipher;
use crate::coalesced_file_name;
use crate::error::{Error, Result};
use crate::transport::{self, MAGIC};

/// Where loaded entries are cached under.
#[derive(Debug, Clone)]
pub struct CoalescedLayout {
    /// Directory the blobs live in.
    pub coalesced_dir: Utf8PathBuf,
    /// Cache path prefix for `.ini` entries.
    pub config_dir: Utf8PathBuf,
    /// Cache path prefix for localization entries.
    pub localization_dir: Utf8PathBuf,
    /// AES-256 key; the placeholder key only reads plain blobs.
    pub key: [u8; 32],
}

impl CoalescedLayout {
    pub fn new(
        coalesced_dir: impl Into<Utf8PathBuf>,
        config_dir: impl Into<Utf8PathBuf>,
        localization_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            coalesced_dir: coalesced_dir.into(),
            config_dir: config_dir.into(),
            localization_dir: localization_dir.into(),
            key: cipher::COALESCED_KEY,
        }
    }
}

/// Load the coalesced blob for the cache's running language, falling back
/// to the default language when the localized blob is missing or the
/// `-ENGLISHCOALESCED` switch is set. Every contained file lands in the
/// cache as a no-save entry, with commandline overrides applied.
///
/// Returns the number of files installed. A missing fallback blob is fatal
/// for shipping builds, reported as [`Error::MissingCoalesced`].
pub fn load_coalesced(cache: &mut ConfigCache, layout: &CoalescedLayout) -> Result<usize> {
    let language = cache.env().language.clone();
    let mut path = layout.coalesced_dir.join(coalesced_file_name(&language));

    let force_english = cmdline::has_switch(&cache.env().commandline, "ENGLISHCOALESCED");
    if force_english || !path.is_file() {
        if !force_english {
            warn!("no coalesced file for language {language}, using {FALLBACK_LANGUAGE}");
        }
        path = layout
            .coalesced_dir
            .join(coalesced_file_name(FALLBACK_LANGUAGE));
    }
    if !path.is_file() {
        return Err(Error::MissingCoalesced {
            language,
            directory: layout.coalesced_dir.clone(),
        });
    }

    let entries = read_blob(&path, &layout.key)?;
    let count = entries.len();

    for entry in entries {
        let target = route_entry(layout, &entry.name);
        let mut file = ConfigFile::new();
        file.combine_from_buffer(&target, &entry.contents, cache.env());
        file.dirty = false;
        file.no_save = true;
        cache.set_file(&target, file);
    }
    info!("loaded {count} file(s) from {path}");
    Ok(count)
}

/// `.ini` entries belong to the config directory; everything else carries a
/// language extension and belongs to the localization directory.
fn route_entry(layout: &CoalescedLayout, name: &str) -> Utf8PathBuf {
    let is_ini = Utf8Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ini"));
    if is_ini {
        layout.config_dir.join(name)
    } else {
        layout.localization_dir.join(name)
    }
}

/// Read and decode one blob, decrypting when it carries the magic prefix.
pub fn read_blob(path: &Utf8Path, key: &[u8; 32]) -> Result<Vec<transport::Entry>> {
    let mut bytes = std::fs::read(path.as_std_path())?;
    let encrypted = bytes.len() >= 4 && bytes[..4] == MAGIC.to_le_bytes();
    if !encrypted {
        return transport::deserialize(&bytes);
    }
    if !cipher::encryption_enabled(key) {
        return Err(Error::EncryptedWithoutKey(path.to_owned()));
    }
    let payload = &mut bytes[4..];
    if payload.len() % cipher::AES_BLOCK_SIZE != 0 {
        return Err(Error::Malformed(format!(
            "encrypted payload length {} is not block aligned",
            payload.len()
        )));
    }
    cipher::decrypt(payload, key);
    transport::deserialize(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{coalesce_from_disk, CoalesceOptions};
    use inikit_config::ConfigEnvironment;

    struct Fixture {
        _dir: tempfile::TempDir,
        options: CoalesceOptions,
        layout: CoalescedLayout,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let options = CoalesceOptions::new(
            root.join("Config"),
            root.join("Localization"),
            root.join("Out"),
        );
        let layout = CoalescedLayout::new(
            root.join("Out"),
            root.join("Config"),
            root.join("Localization"),
        );
        Fixture {
            _dir: dir,
            options,
            layout,
        }
    }

    fn write(path: &Utf8Path, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
        std::fs::write(path.as_std_path(), text).unwrap();
    }

    fn seed(fx: &Fixture) {
        write(&fx.options.config_dir.join("Engine.ini"), "[A]\nK=1\n");
        write(
            &fx.options.localization_dir.join("INT/Game.INT"),
            "[Msgs]\nHello=100%% done\n",
        );
    }

    #[test]
    fn test_round_trip_through_cache() {
        let fx = fixture();
        seed(&fx);
        coalesce_from_disk(&fx.options).unwrap();

        let mut cache = ConfigCache::new(ConfigEnvironment::new("Example", "INT"));
        let count = load_coalesced(&mut cache, &fx.layout).unwrap();
        assert_eq!(count, 2);

        let ini = fx.layout.config_dir.join("Engine.ini");
        assert_eq!(cache.get_int(&ini, "A", "K"), Some(1));

        let loc = fx.layout.localization_dir.join("Game.INT");
        assert_eq!(
            cache.get_string(&loc, "Msgs", "Hello").as_deref(),
            Some("100`` done")
        );

        // Coalesced entries must never write back.
        let file = cache.find_config_file(&ini).unwrap();
        assert!(file.no_save);
    }

    #[test]
    fn test_encrypted_round_trip() {
        let mut fx = fixture();
        fx.options.key = [7; 32];
        fx.layout.key = [7; 32];
        seed(&fx);
        coalesce_from_disk(&fx.options).unwrap();

        let mut cache = ConfigCache::new(ConfigEnvironment::new("Example", "INT"));
        assert_eq!(load_coalesced(&mut cache, &fx.layout).unwrap(), 2);
    }

    #[test]
    fn test_encrypted_blob_without_key_fails() {
        let mut fx = fixture();
        fx.options.key = [7; 32];
        seed(&fx);
        coalesce_from_disk(&fx.options).unwrap();

        let mut cache = ConfigCache::new(ConfigEnvironment::new("Example", "INT"));
        assert!(matches!(
            load_coalesced(&mut cache, &fx.layout),
            Err(Error::EncryptedWithoutKey(_))
        ));
    }

    #[test]
    fn test_missing_language_falls_back_to_default() {
        let fx = fixture();
        seed(&fx);
        coalesce_from_disk(&fx.options).unwrap();

        let mut cache = ConfigCache::new(ConfigEnvironment::new("Example", "FRA"));
        assert_eq!(load_coalesced(&mut cache, &fx.layout).unwrap(), 2);
    }

    #[test]
    fn test_english_coalesced_switch() {
        let fx = fixture();
        seed(&fx);
        let mut options = fx.options.clone();
        options.languages = vec!["INT".to_string(), "FRA".to_string()];
        write(
            &options.localization_dir.join("FRA/Game.FRA"),
            "[Msgs]\nHello=salut\n",
        );
        coalesce_from_disk(&options).unwrap();

        let env = ConfigEnvironment::new("Example", "FRA").with_commandline("-ENGLISHCOALESCED");
        let mut cache = ConfigCache::new(env);
        load_coalesced(&mut cache, &fx.layout).unwrap();
        let loc = fx.layout.localization_dir.join("Game.INT");
        assert!(cache.find_config_file(&loc).is_some());
        let fra = fx.layout.localization_dir.join("Game.FRA");
        assert!(cache.find_config_file(&fra).is_none());
    }

    #[test]
    fn test_missing_all_blobs_is_fatal() {
        let fx = fixture();
        std::fs::create_dir_all(fx.layout.coalesced_dir.as_std_path()).unwrap();
        let mut cache = ConfigCache::new(ConfigEnvironment::new("Example", "INT"));
        assert!(matches!(
            load_coalesced(&mut cache, &fx.layout),
            Err(Error::MissingCoalesced { .. })
        ));
    }
}
