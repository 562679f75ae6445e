use camino::Utf8PathBuf;
use colored::Colorize;

use inikit_coalesce::writer::{coalesce_from_disk, filter_from_ini, CoalesceOptions};
use inikit_config::ConfigEnvironment;

use crate::errors::CliError;

pub struct CoalesceTreeArgs {
    pub config_dir: String,
    pub localization_dir: String,
    pub output_dir: String,
    pub languages: Vec<String>,
    pub game_name: String,
    pub filter_ini: Option<String>,
}

pub fn coalesce_tree(args: CoalesceTreeArgs) -> miette::Result<()> {
    let config_dir = Utf8PathBuf::from(&args.config_dir);
    if !config_dir.is_dir() {
        return Err(CliError::directory_missing(config_dir).into());
    }

    let mut options = CoalesceOptions::new(
        config_dir,
        Utf8PathBuf::from(&args.localization_dir),
        Utf8PathBuf::from(&args.output_dir),
    );
    options.languages = args.languages;
    options.game_name = args.game_name.clone();

    if let Some(filter_ini) = &args.filter_ini {
        let env = ConfigEnvironment::new(&args.game_name, "INT");
        options.filter = filter_from_ini(Utf8PathBuf::from(filter_ini).as_path(), &env);
        if !options.filter.is_empty() {
            println!(
                "{} {} file(s) excluded by {}",
                "🧹 Filter:".bright_yellow(),
                options.filter.len().to_string().bright_white().bold(),
                filter_ini.bright_cyan()
            );
        }
    }

    let written = coalesce_from_disk(&options).map_err(CliError::coalesce_failed)?;
    if written.is_empty() {
        println!(
            "{}",
            "No coalesced files written (no matching language directories)".bright_yellow()
        );
        return Ok(());
    }

    println!("{}", "📦 Coalesced:".bright_blue().bold());
    for path in &written {
        println!("   {} {}", "•".bright_cyan(), path.as_str().bright_white());
    }
    Ok(())
}
