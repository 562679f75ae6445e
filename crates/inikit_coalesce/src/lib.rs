//! Coalesced configuration packaging.
//!
//! Shipping builds bundle every config and localization file for one
//! language into a single `Coalesced_<LANG>.bin` blob, optionally encrypted
//! with AES-256. This crate holds both halves of that pipeline:
//!
//! - [`writer`]: the offline packager that walks the config and
//!   localization trees and emits one blob per language.
//! - [`reader`]: the runtime loader that picks the blob for the running
//!   language (falling back to the default language), decrypts it, and
//!   installs every contained file into a [`ConfigCache`].
//!
//! [`ConfigCache`]: inikit_config::ConfigCache

pub mod cipher;
pub mod error;
pub mod reader;
pub mod strip;
pub mod transport;
pub mod writer;

pub use error::{Error, Result};
pub use reader::{load_coalesced, read_blob, CoalescedLayout};
pub use writer::{coalesce_from_disk, CoalesceOptions};

/// File name of the coalesced blob for one language.
pub fn coalesced_file_name(language: &str) -> String {
    format!("Coalesced_{}.bin", language.to_ascii_uppercase())
}
