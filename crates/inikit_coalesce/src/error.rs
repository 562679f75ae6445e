//! Error types for coalesced packaging and loading.

use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither the running language's blob nor the fallback-language blob
    /// exists. Shipping builds cannot start without one.
    #[error("No coalesced file found for language {language} (looked in {directory})")]
    MissingCoalesced {
        language: String,
        directory: Utf8PathBuf,
    },

    /// The blob's structure did not parse: truncated counts, lengths past
    /// the end of the payload, or non-UTF-8 file names.
    #[error("Malformed coalesced data: {0}")]
    Malformed(String),

    /// The blob carries the encryption magic but this build has no real key.
    #[error("Coalesced file {0} is encrypted but no decryption key is configured")]
    EncryptedWithoutKey(Utf8PathBuf),
}
