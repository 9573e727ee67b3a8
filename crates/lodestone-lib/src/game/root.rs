//! Launcher directory facade.
//!
//! `GameRoot` ties the version list, the installer and the launcher together
//! for one launcher directory and one authenticated user.

use crate::auth::AuthData;
use crate::game::installer::config::{FetchConfig, RESOURCES_URL, VERSION_MANIFEST_URL};
use crate::game::installer::core::downloader::{write_atomic, ArtifactStore};
use crate::game::installer::core::library::download_natives;
use crate::game::installer::types::{
    ensure_path_component, CancelToken, NoopReporter, PlatformContext, ProgressReporter,
    RootLayout,
};
use crate::game::installer::vanilla::VanillaInstaller;
use crate::game::launcher::arguments::build_command_line;
use crate::game::launcher::natives::extract_natives;
use crate::game::launcher::process::{run_command, LogCallback};
use crate::game::launcher::types::{CommandLine, LaunchDirs, Profile};
use crate::game::launcher::version_parser::{self, VersionManifest};
use crate::game::metadata::{fetch_version_list, local_version_ids, merge_local_versions, VersionMeta};
use crate::utils::java::{JavaLocator, SystemJava};
use crate::utils::os_version::SystemProbe;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

pub struct GameRoot {
    layout: RootLayout,
    auth: AuthData,
    config: FetchConfig,
    store: ArtifactStore,
    version_list_url: String,
    resources_url: String,
    platform: PlatformContext,
    java: Arc<dyn JavaLocator>,
    reporter: Arc<dyn ProgressReporter>,

    latest_release: String,
    latest_snapshot: String,
    known_versions: Option<HashMap<String, VersionMeta>>,
    manifests: HashMap<String, VersionManifest>,
}

impl GameRoot {
    /// Root at `path` with default network settings and the detected platform
    pub fn new(path: impl Into<PathBuf>, auth: AuthData) -> Result<Self> {
        let config = FetchConfig::default();
        let client = config
            .build_client()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            layout: RootLayout::new(path),
            auth,
            config,
            store: ArtifactStore::new(client),
            version_list_url: VERSION_MANIFEST_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            platform: PlatformContext::detect(&SystemProbe),
            java: Arc::new(SystemJava::from_env()),
            reporter: Arc::new(NoopReporter),
            latest_release: String::new(),
            latest_snapshot: String::new(),
            known_versions: None,
            manifests: HashMap::new(),
        })
    }

    /// Replace the network settings; the HTTP client is rebuilt.
    pub fn with_config(mut self, config: FetchConfig) -> Result<Self> {
        let client = config
            .build_client()
            .context("Failed to create HTTP client")?;
        let cancel = self.store.cancel_token().clone();
        self.store = ArtifactStore::new(client).with_cancel(cancel);
        self.config = config;
        Ok(self)
    }

    pub fn with_urls(mut self, version_list_url: impl Into<String>, resources_url: impl Into<String>) -> Self {
        self.version_list_url = version_list_url.into();
        self.resources_url = resources_url.into();
        self
    }

    pub fn with_platform(mut self, platform: PlatformContext) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_java(mut self, java: Arc<dyn JavaLocator>) -> Self {
        self.java = java;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.store = self.store.clone().with_cancel(cancel);
        self
    }

    pub fn layout(&self) -> &RootLayout {
        &self.layout
    }

    pub fn auth(&self) -> &AuthData {
        &self.auth
    }

    pub fn set_auth(&mut self, auth: AuthData) {
        self.auth = auth;
    }

    pub fn platform(&self) -> &PlatformContext {
        &self.platform
    }

    pub fn latest_release(&self) -> &str {
        &self.latest_release
    }

    pub fn latest_snapshot(&self) -> &str {
        &self.latest_snapshot
    }

    /// Manifest previously loaded by `get_version`
    pub fn manifest(&self, id: &str) -> Option<&VersionManifest> {
        self.manifests.get(id)
    }

    pub fn installer(&self) -> VanillaInstaller<'_> {
        VanillaInstaller::new(
            &self.store,
            &self.layout,
            &self.resources_url,
            self.config.workers(),
            self.reporter.clone(),
        )
    }

    /// Remote versions merged with the directories under versions/,
    /// newest release time first.
    ///
    /// An unreachable version list still yields the local entries.
    pub async fn versions(&mut self) -> Result<Vec<VersionMeta>> {
        let remote = match fetch_version_list(&self.store, &self.version_list_url).await {
            Ok(list) => {
                self.latest_release = list.latest.release;
                self.latest_snapshot = list.latest.snapshot;
                list.versions
            }
            Err(e) => {
                log::warn!("Version list unavailable, using local versions only: {}", e);
                Vec::new()
            }
        };

        let versions_dir = self.layout.versions_dir();
        let local = local_version_ids(&versions_dir)
            .await
            .with_context(|| format!("Failed to list {:?}", versions_dir))?;

        let known = merge_local_versions(remote, &local);
        let mut list: Vec<VersionMeta> = known.values().cloned().collect();
        list.sort_by(|a, b| {
            b.release_time
                .cmp(&a.release_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        self.known_versions = Some(known);
        Ok(list)
    }

    /// Load the manifest of a known version, downloading and persisting it
    /// when it is not installed yet.
    pub async fn get_version(&mut self, id: &str) -> Result<VersionManifest> {
        ensure_path_component(id).with_context(|| format!("Invalid version id {:?}", id))?;
        if self.known_versions.is_none() {
            self.versions().await?;
        }

        let meta = self
            .known_versions
            .as_ref()
            .and_then(|known| known.get(id))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown version id: {}", id))?;

        let manifest = if meta.installed {
            let json = self.layout.version_json(id);
            log::debug!("Reading installed manifest {:?}", json);
            version_parser::parse_file(&json)
                .await
                .with_context(|| format!("Failed to read version info for {}", id))?
        } else {
            self.download_manifest(&meta).await?
        };

        if let Err(e) = manifest.support_status() {
            log::warn!("{}: {}", id, e);
        }

        self.manifests.insert(id.to_string(), manifest.clone());
        Ok(manifest)
    }

    async fn download_manifest(&mut self, meta: &VersionMeta) -> Result<VersionManifest> {
        if !meta.is_downloadable() {
            anyhow::bail!("Can't download local-only version {}", meta.id);
        }

        let blob = self
            .store
            .fetch_bytes(&meta.url, meta.sha1.as_deref())
            .await
            .with_context(|| format!("Failed to download version info for {}", meta.id))?;

        // Only a parseable manifest is persisted; the directory marks it installed
        let manifest = version_parser::parse(&blob)
            .with_context(|| format!("Failed to parse version info for {}", meta.id))?;

        let json = self.layout.version_json(&meta.id);
        write_atomic(&json, &blob)
            .await
            .with_context(|| format!("Failed to write version info for {}", meta.id))?;

        if let Some(known) = self.known_versions.as_mut() {
            if let Some(entry) = known.get_mut(&meta.id) {
                entry.installed = true;
            }
        }
        Ok(manifest)
    }

    /// Libraries, asset index, assets and client jar.
    pub async fn update_version(&self, manifest: &VersionManifest) -> Result<()> {
        self.installer()
            .update_version(manifest, &self.platform)
            .await
    }

    /// Directories for a launch using `natives_dir` as scratch
    pub fn launch_dirs(&self, natives_dir: &Path) -> LaunchDirs {
        LaunchDirs {
            versions_dir: self.layout.versions_dir(),
            libraries_dir: self.layout.libraries_dir(),
            natives_dir: natives_dir.to_path_buf(),
            assets_dir: self.layout.assets_dir(),
        }
    }

    pub fn command_line(
        &self,
        manifest: &VersionManifest,
        profile: &Profile,
        natives_dir: &Path,
    ) -> Result<CommandLine> {
        build_command_line(
            manifest,
            profile,
            &self.auth,
            &self.launch_dirs(natives_dir),
            &self.platform,
            self.java.as_ref(),
        )
        .with_context(|| format!("Failed to build command line for {}", manifest.id))
    }

    /// Prepare natives in a temporary directory, run the game and wait for
    /// it to exit. The directory is removed afterwards.
    pub async fn run_version(
        &self,
        manifest: &VersionManifest,
        profile: &Profile,
        log_callback: Option<LogCallback>,
    ) -> Result<ExitStatus> {
        let natives_dir = tempfile::Builder::new()
            .prefix("lodestone-natives-")
            .tempdir()
            .context("Failed to create natives directory")?;

        let natives = download_natives(
            &self.store,
            &manifest.libraries,
            &self.layout.libraries_dir(),
            &self.platform,
            self.config.workers(),
            self.reporter.clone(),
        )
        .await
        .with_context(|| format!("Failed to verify natives for {}", manifest.id))?;

        extract_natives(natives, natives_dir.path().to_path_buf()).await?;

        let command_line = self.command_line(manifest, profile, natives_dir.path())?;
        let status = run_command(&command_line, &profile.game_dir, &manifest.id, log_callback).await?;

        if let Err(e) = natives_dir.close() {
            log::warn!("Failed to remove natives directory: {}", e);
        }
        Ok(status)
    }
}
