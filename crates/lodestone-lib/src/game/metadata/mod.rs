//! Version list retrieval and local version discovery
pub mod fetcher;
pub mod types;

pub use fetcher::{fetch_version_list, local_version_ids, merge_local_versions};
pub use types::{LatestVersions, VersionList, VersionMeta, LOCAL_VERSION_TYPE};
