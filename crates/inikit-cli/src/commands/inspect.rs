use camino::Utf8PathBuf;
use colored::Colorize;
use serde_json::json;

use inikit_coalesce::cipher::COALESCED_KEY;
use inikit_coalesce::read_blob;

use crate::errors::CliError;

pub struct InspectBlobArgs {
    pub file_path: String,
    pub contents: bool,
    pub json: bool,
}

pub fn inspect_blob(args: InspectBlobArgs) -> miette::Result<()> {
    let path = Utf8PathBuf::from(&args.file_path);
    let entries = read_blob(&path, &COALESCED_KEY)
        .map_err(|source| CliError::blob_read_failed(path.clone(), source))?;

    if args.json {
        let value = json!({
            "path": path.as_str(),
            "entries": entries
                .iter()
                .map(|entry| {
                    json!({
                        "name": entry.name,
                        "bytes": entry.contents.len(),
                        "contents": args.contents.then_some(entry.contents.as_str()),
                    })
                })
                .collect::<Vec<_>>(),
        });
        // Serializing a just-built value cannot fail.
        println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        return Ok(());
    }

    println!(
        "{} {} {}",
        "📦 Coalesced:".bright_blue().bold(),
        path.as_str().bright_cyan().bold(),
        format!("({} entries)", entries.len()).dimmed()
    );
    for entry in &entries {
        println!(
            "   {} {} {}",
            "•".bright_cyan(),
            entry.name.bright_white().bold(),
            format!("({} bytes)", entry.contents.len()).dimmed()
        );
        if args.contents {
            for line in entry.contents.lines() {
                println!("     {line}");
            }
        }
    }
    Ok(())
}
