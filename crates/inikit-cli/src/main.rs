use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    coalesce_tree, dump_cache, inspect_blob, CoalesceTreeArgs, DumpCacheArgs, InspectBlobArgs,
};
use miette::Result;

mod commands;
mod errors;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Coalesce a config/localization tree into per-language binary blobs
    Coalesce {
        /// Directory searched for .ini files
        #[arg(short, long)]
        config_dir: String,

        /// Directory holding one subdirectory per language
        #[arg(short, long)]
        localization_dir: String,

        /// Where to write the Coalesced_<LANG>.bin files
        #[arg(short, long, default_value = "Coalesced")]
        output_dir: String,

        /// Language codes to generate
        #[arg(long, default_values_t = [String::from("INT")])]
        language: Vec<String>,

        /// Name substituted for %GAME% while normalizing
        #[arg(long, default_value = "Game")]
        game_name: String,

        /// Ini file whose [ConfigCoalesceFilter] section lists files to skip
        #[arg(long)]
        filter_ini: Option<String>,
    },
    /// Show the contents of a coalesced blob
    Inspect {
        /// The path to the Coalesced_<LANG>.bin file
        #[arg(short, long)]
        file_path: String,

        /// Print full file contents instead of a summary
        #[arg(long, default_value_t = false)]
        contents: bool,

        /// Emit machine-readable JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Load a config tree the way the runtime would and dump the cache
    Dump {
        /// Directory searched for .ini files
        #[arg(short, long)]
        config_dir: String,

        /// Running language code
        #[arg(long, default_value = "INT")]
        language: String,

        /// Name substituted for %GAME%
        #[arg(long, default_value = "Game")]
        game_name: String,

        /// Show per-file memory usage instead of contents
        #[arg(long, default_value_t = false)]
        memory: bool,
    },
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = parse_args();

    match args.command {
        Commands::Coalesce {
            config_dir,
            localization_dir,
            output_dir,
            language,
            game_name,
            filter_ini,
        } => coalesce_tree(CoalesceTreeArgs {
            config_dir,
            localization_dir,
            output_dir,
            languages: language,
            game_name,
            filter_ini,
        }),
        Commands::Inspect {
            file_path,
            contents,
            json,
        } => inspect_blob(InspectBlobArgs {
            file_path,
            contents,
            json,
        }),
        Commands::Dump {
            config_dir,
            language,
            game_name,
            memory,
        } => dump_cache(DumpCacheArgs {
            config_dir,
            language,
            game_name,
            memory,
        }),
    }
}
