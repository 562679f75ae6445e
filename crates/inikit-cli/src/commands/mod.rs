mod coalesce;
mod dump;
mod inspect;

pub use coalesce::{coalesce_tree, CoalesceTreeArgs};
pub use dump::{dump_cache, DumpCacheArgs};
pub use inspect::{inspect_blob, InspectBlobArgs};
