pub mod installer;
pub mod launcher;
pub mod metadata;
pub mod root;

// Re-export commonly used types
pub use installer::{FetchConfig, PlatformContext, RootLayout};
pub use launcher::{CommandLine, LogCallback, Profile, VersionManifest};
pub use metadata::{VersionList, VersionMeta};
pub use root::GameRoot;
