//! Hierarchical INI/localization configuration cache for game runtimes.
//!
//! The crate is organized around three layers:
//!
//! - [`ConfigSection`]: an ordered multimap of key/value pairs for one
//!   `[Section]` of a file.
//! - [`ConfigFile`]: an ordered map of sections plus dirty/no-save/quote
//!   flags; the parse, merge, and serialize unit.
//! - [`ConfigCache`]: the process-wide registry of loaded files, which owns
//!   all file I/O and exposes typed accessors.
//!
//! Files are merged with a per-key command grammar (`+ - . !`), support line
//! continuation via a trailing `\\`, and quoted values with escape sequences.
//! Localization files (extension equal to the running language or the
//! fallback language) get additional transformations on load and are never
//! written back. See [`ConfigFile::combine_from_buffer`] for the grammar.
//!
//! All mutation is single-threaded cooperative: the cache takes `&mut self`
//! for every mutating operation and places no locks internally.

pub mod cache;
pub mod cmdline;
pub mod env;
pub mod error;
pub mod file;
pub mod loc;
pub mod name;
pub mod parser;
pub mod section;
pub mod value;

pub use cache::{ConfigCache, FileMemoryUsage};
pub use env::ConfigEnvironment;
pub use error::{Error, Result};
pub use file::ConfigFile;
pub use name::Name;
pub use section::ConfigSection;
pub use value::{Color, Rotator, Value, Vector};

/// The fallback language code, used when no localization exists for the
/// running language.
pub const FALLBACK_LANGUAGE: &str = "INT";

/// The distinguished language code that triggers the deterministic
/// pseudo-localization pass on fallback-language files.
pub const FAUX_LANGUAGE: &str = "XXX";

/// Replacement for `%` in localization text, protecting values from
/// downstream format-string interpretation.
pub const PERCENT_SENTINEL: char = '`';

/// The token replaced by the game name when any config text is loaded.
pub const GAME_NAME_TOKEN: &str = "%GAME%";
