//! Downloadable-content overlay for the config cache.
//!
//! A DLC bundle is a directory of content packages plus loose config and
//! localization files. Installing a bundle registers its packages and merges
//! its config files on top of the running cache, keeping an undo log so the
//! whole overlay can be peeled off again (for example when the user signs
//! out of the profile that owns the content).
//!
//! - [`bundle`]: on-disk bundle discovery.
//! - [`overlay`]: install, undo, and the package/integrity registries.
//! - [`reload`]: notifying config consumers whose sections changed.
//! - [`state`]: persistence of which bundles are installed.

pub mod bundle;
pub mod error;
pub mod overlay;
pub mod reload;
pub mod state;

pub use bundle::{BundleEnumerator, DlcBundle};
pub use error::{Error, Result};
pub use overlay::DlcOverlay;
pub use reload::{ReloadDispatcher, ReloadHandler, ReloadSet};
pub use state::DlcState;

/// Content packages with this name prefix stay loaded for the whole
/// session instead of loading on demand.
pub const ALWAYS_LOADED_PREFIX: &str = "GuidCache_";

/// Section mapping map names to the packages to fully load when they open.
pub const FULLY_LOAD_SECTION: &str = "Engine.PackagesToFullyLoadForDLC";
