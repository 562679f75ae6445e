//! The configuration environment.
//!
//! The game name, running language, process commandline, and the
//! file-operations switch travel as an explicit value owned by the
//! [`ConfigCache`](crate::ConfigCache) and passed by reference to everything
//! that needs them.

use crate::{FALLBACK_LANGUAGE, FAUX_LANGUAGE};

/// Ambient configuration shared by every file and cache operation.
#[derive(Debug, Clone)]
pub struct ConfigEnvironment {
    /// Substituted for `%GAME%` in loaded text.
    pub game_name: String,
    /// The running language code, e.g. `INT`, `FRA`, or the faux code `XXX`.
    pub language: String,
    /// The process commandline tail, inspected for `-ini:` overrides and
    /// switches such as `-nowrite`.
    pub commandline: String,
    /// When set, every filesystem read or write becomes a no-op with a
    /// neutral result. In-memory queries still function.
    pub file_operations_disabled: bool,
}

impl ConfigEnvironment {
    pub fn new(game_name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            game_name: game_name.into(),
            language: language.into(),
            commandline: String::new(),
            file_operations_disabled: false,
        }
    }

    pub fn with_commandline(mut self, commandline: impl Into<String>) -> Self {
        self.commandline = commandline.into();
        self
    }

    /// Whether a file extension marks a localization file: it equals the
    /// running language code or the fallback code, compared without case.
    pub fn is_localization_extension(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case(&self.language)
            || extension.eq_ignore_ascii_case(FALLBACK_LANGUAGE)
    }

    /// Whether the pseudo-localization pass applies to a file with the given
    /// extension: the running language is `XXX` and the file is a
    /// fallback-language file.
    pub fn is_faux_localized(&self, extension: &str) -> bool {
        self.language.eq_ignore_ascii_case(FAUX_LANGUAGE)
            && extension.eq_ignore_ascii_case(FALLBACK_LANGUAGE)
    }
}

impl Default for ConfigEnvironment {
    fn default() -> Self {
        Self::new("Game", FALLBACK_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localization_extension() {
        let env = ConfigEnvironment::new("Example", "FRA");
        assert!(env.is_localization_extension("fra"));
        assert!(env.is_localization_extension("INT"));
        assert!(!env.is_localization_extension("ini"));
    }

    #[test]
    fn test_faux_localized() {
        let env = ConfigEnvironment::new("Example", "XXX");
        assert!(env.is_faux_localized("INT"));
        assert!(!env.is_faux_localized("XXX"));

        let env = ConfigEnvironment::new("Example", "INT");
        assert!(!env.is_faux_localized("INT"));
    }
}
