//! Two-tier sheet cache: session-lifetime memory plus a persistent blob
//! store with a 5-minute freshness window, coordinated stale-while-revalidate
//! style so tab switches render instantly and edits still show up.

pub mod coordinator;
pub mod store;

pub use coordinator::{CacheCoordinator, DataSource, Origin};
pub use store::{BlobStore, FileStore};
