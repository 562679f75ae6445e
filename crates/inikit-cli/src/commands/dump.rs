use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;

use inikit_config::{ConfigCache, ConfigEnvironment};

use crate::errors::CliError;

pub struct DumpCacheArgs {
    pub config_dir: String,
    pub language: String,
    pub game_name: String,
    pub memory: bool,
}

pub fn dump_cache(args: DumpCacheArgs) -> miette::Result<()> {
    let config_dir = Utf8PathBuf::from(&args.config_dir);
    if !config_dir.is_dir() {
        return Err(CliError::directory_missing(config_dir).into());
    }

    let env = ConfigEnvironment::new(&args.game_name, &args.language);
    let mut cache = ConfigCache::new(env);
    for path in find_ini_files(&config_dir)? {
        cache.find(&path, false);
    }

    if args.memory {
        println!("{}", "🧠 Config cache memory:".bright_magenta().bold());
        for usage in cache.memory_report() {
            println!(
                "   {} {} {}",
                "•".bright_cyan(),
                usage.path.as_str().bright_white().bold(),
                format!(
                    "({} sections, {} bytes, {} peak)",
                    usage.sections, usage.current_bytes, usage.peak_bytes
                )
                .dimmed()
            );
        }
        return Ok(());
    }

    for (path, file) in cache.files() {
        println!(
            "{} {}",
            "📄 File:".bright_blue().bold(),
            path.as_str().bright_cyan().bold()
        );
        for (section, contents) in file.sections() {
            println!("   [{}]", section.as_str().bright_yellow());
            for (key, value) in contents.iter() {
                println!("   {}={}", key.as_str().bright_white(), value.as_str());
            }
        }
    }
    Ok(())
}

/// The .ini files directly under `root`, name-sorted.
fn find_ini_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CliError> {
    let mut paths: Vec<Utf8PathBuf> = root
        .read_dir_utf8()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ini"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
