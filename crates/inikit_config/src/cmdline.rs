//! Commandline override parsing.
//!
//! After every load, a file inspects the process commandline for
//! `-ini:<basename>:<Section>.<Key>=<Value>[,...]` and applies each element
//! as a plain set. The basename matches the cached file's path after its
//! directory and extension are stripped. Malformed elements are skipped
//! silently.

use camino::Utf8Path;
use tracing::debug;

use crate::env::ConfigEnvironment;
use crate::file::ConfigFile;

/// Whether the commandline contains the switch `-<name>`, compared without
/// case. The switch must be a whole token.
pub fn has_switch(commandline: &str, name: &str) -> bool {
    commandline.split_whitespace().any(|token| {
        token
            .strip_prefix('-')
            .is_some_and(|t| t.eq_ignore_ascii_case(name))
    })
}

/// The value following `<prefix>` on the commandline, up to the next
/// whitespace (or the closing quote when the value is quoted).
pub fn switch_value<'a>(commandline: &'a str, prefix: &str) -> Option<&'a str> {
    let lower = commandline.to_ascii_lowercase();
    let at = lower.find(&prefix.to_ascii_lowercase())?;
    let rest = &commandline[at + prefix.len()..];
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"')?;
        Some(&quoted[..end])
    } else {
        let end = rest
            .find(char::is_whitespace)
            .unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

/// Apply any `-ini:<basename>:` overrides for `path` to `file`.
///
/// Each comma-separated element is `<Section>.<Key>=<Value>`; the rightmost
/// `.` separates section from key, so section names may contain dots.
pub fn override_from_commandline(
    file: &mut ConfigFile,
    path: &Utf8Path,
    env: &ConfigEnvironment,
) {
    let Some(basename) = path.file_stem() else {
        return;
    };
    let prefix = format!("-ini:{basename}:");
    let Some(settings) = switch_value(&env.commandline, &prefix) else {
        return;
    };

    for element in settings.split(',') {
        let Some((section_and_key, value)) = element.split_once('=') else {
            continue;
        };
        // Rightmost dot: section names may contain dots, keys may not.
        let Some((section, key)) = section_and_key.rsplit_once('.') else {
            continue;
        };
        if section.is_empty() || key.is_empty() {
            continue;
        }
        debug!("commandline override {basename}: [{section}] {key}={value}");
        file.set_string(section, key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_has_switch() {
        assert!(has_switch("-log -NOWRITE -windowed", "nowrite"));
        assert!(!has_switch("-nowriteback", "nowrite"));
        assert!(!has_switch("nowrite", "nowrite"));
    }

    #[test]
    fn test_switch_value() {
        assert_eq!(
            switch_value("-ini:Engine:A.B=C -log", "-ini:Engine:"),
            Some("A.B=C")
        );
        assert_eq!(
            switch_value("-ini:Engine:\"A.B=C D\" -log", "-ini:Engine:"),
            Some("A.B=C D")
        );
        assert_eq!(switch_value("-log", "-ini:Engine:"), None);
    }

    #[test]
    fn test_override_applied() {
        let mut file = ConfigFile::new();
        file.set_string("E.E", "bSmooth", "True");
        file.dirty = false;

        let env = ConfigEnvironment::new("Example", "INT")
            .with_commandline("-ini:u:E.E.bSmooth=False");
        override_from_commandline(&mut file, &Utf8PathBuf::from("Config/u.ini"), &env);

        assert_eq!(
            file.get_string("E.E", "bSmooth").unwrap().as_str(),
            "False"
        );
    }

    #[test]
    fn test_rightmost_dot_splits_section_from_key() {
        let mut file = ConfigFile::new();
        let env = ConfigEnvironment::new("Example", "INT")
            .with_commandline("-ini:game:A.B.C=1");
        override_from_commandline(&mut file, &Utf8PathBuf::from("game.ini"), &env);
        assert_eq!(file.get_string("A.B", "C").unwrap().as_str(), "1");
    }

    #[test]
    fn test_malformed_elements_skipped() {
        let mut file = ConfigFile::new();
        let env = ConfigEnvironment::new("Example", "INT")
            .with_commandline("-ini:game:noequals,nodot=1,A.K=2");
        override_from_commandline(&mut file, &Utf8PathBuf::from("game.ini"), &env);
        assert_eq!(file.section_names().len(), 1);
        assert_eq!(file.get_string("A", "K").unwrap().as_str(), "2");
    }
}
