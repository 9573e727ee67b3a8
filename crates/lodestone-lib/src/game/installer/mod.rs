pub mod config;
pub mod core;
pub mod types;
pub mod vanilla;

pub use config::FetchConfig;
pub use types::{
    Arch, CancelToken, NoopReporter, OsType, PlatformContext, ProgressReporter, RootLayout,
};
pub use vanilla::VanillaInstaller;
