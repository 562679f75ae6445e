use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Directory not found: {path}")]
    #[diagnostic(
        code(fs::directory_missing),
        help("Make sure the directory exists and the path is correct")
    )]
    DirectoryMissing { path: Utf8PathBuf },

    #[error("Coalescing failed")]
    #[diagnostic(code(coalesce::write_failed))]
    CoalesceFailed {
        #[source]
        source: inikit_coalesce::Error,
    },

    #[error("Could not read coalesced file: {path}")]
    #[diagnostic(
        code(coalesce::read_failed),
        help("Pass the Coalesced_<LANG>.bin produced by the coalesce command")
    )]
    BlobReadFailed {
        path: Utf8PathBuf,
        #[source]
        source: inikit_coalesce::Error,
    },

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn directory_missing(path: Utf8PathBuf) -> Self {
        Self::DirectoryMissing { path }
    }

    pub fn coalesce_failed(source: inikit_coalesce::Error) -> Self {
        Self::CoalesceFailed { source }
    }

    pub fn blob_read_failed(path: Utf8PathBuf, source: inikit_coalesce::Error) -> Self {
        Self::BlobReadFailed { path, source }
    }
}
