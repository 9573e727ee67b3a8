//! Centralized installer settings.
//! Static defaults; callers override them through `FetchConfig` and `GameRoot`.

use std::time::Duration;

pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Parallel downloads per batch
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Highest `minimumLauncherVersion` whose arguments we understand
pub const MAX_SUPPORTED_MANIFEST_VERSION: u32 = 21;

pub const LAUNCHER_NAME: &str = "lodestone";
pub const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

// URL Constants
pub const VERSION_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Network settings shared by every fetch of a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            user_agent: format!("{}/{}", LAUNCHER_NAME, LAUNCHER_VERSION),
        }
    }
}

impl FetchConfig {
    /// Build the HTTP client used by all downloads
    pub fn build_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
    }

    /// Never less than one worker
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }
}
