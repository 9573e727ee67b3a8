use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::core::batch::{BatchDownloader, FetchJob};
use crate::game::installer::core::downloader::{is_sha1_hex, ArtifactStore, FetchedArtifact};
use crate::game::installer::core::library::{download_libraries, NativeArchive};
use crate::game::installer::types::{
    ensure_path_component, PlatformContext, ProgressReporter, RootLayout,
};
use crate::game::launcher::version_parser::VersionManifest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Contents of assets/indexes/<id>.json
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetIndexFile {
    #[serde(default)]
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetObject {
    /// Two-character shard directory of the object.
    /// Anything but a 40-digit hex hash is rejected.
    pub fn shard(&self) -> LauncherResult<&str> {
        if !is_sha1_hex(&self.hash) {
            return Err(LauncherError::MalformedManifest(format!(
                "invalid asset hash '{}'",
                self.hash
            )));
        }
        Ok(&self.hash[..2])
    }
}

/// Installs the files a version needs: libraries, asset index, assets and
/// the client jar.
pub struct VanillaInstaller<'a> {
    store: &'a ArtifactStore,
    layout: &'a RootLayout,
    resources_url: &'a str,
    concurrency: usize,
    reporter: Arc<dyn ProgressReporter>,
}

impl<'a> VanillaInstaller<'a> {
    pub fn new(
        store: &'a ArtifactStore,
        layout: &'a RootLayout,
        resources_url: &'a str,
        concurrency: usize,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            store,
            layout,
            resources_url,
            concurrency,
            reporter,
        }
    }

    /// Fetch every included library jar and native archive
    pub async fn download_libraries(
        &self,
        manifest: &VersionManifest,
        platform: &PlatformContext,
    ) -> Result<Vec<NativeArchive>> {
        download_libraries(
            self.store,
            &manifest.libraries,
            &self.layout.libraries_dir(),
            platform,
            self.concurrency,
            self.reporter.clone(),
        )
        .await
        .with_context(|| format!("Failed to download libraries for {}", manifest.id))
    }

    /// versions/<id>/<id>.jar
    pub async fn download_client(&self, manifest: &VersionManifest) -> Result<FetchedArtifact> {
        let client = manifest
            .downloads
            .client
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Version {} has no client download", manifest.id))?;

        ensure_path_component(&manifest.id)?;
        let target = self.layout.version_jar(&manifest.id);
        log::debug!("Client jar for {} -> {:?}", manifest.id, target);
        self.store
            .fetch_verified(&target, &client.url, &client.sha1)
            .await
            .with_context(|| format!("Failed to download client jar for {}", manifest.id))
    }

    /// assets/indexes/<id>.json
    pub async fn download_asset_index(&self, manifest: &VersionManifest) -> Result<FetchedArtifact> {
        let index = manifest
            .asset_index
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No asset index specified in version manifest"))?;

        ensure_path_component(&index.id)?;
        let target = self.layout.asset_index(&index.id);
        self.store
            .fetch_verified(&target, &index.url, &index.sha1)
            .await
            .with_context(|| format!("Failed to download asset index {}", index.id))
    }

    /// Read the persisted index and fetch every object into the shard layout.
    /// Returns the number of objects in the index.
    pub async fn download_assets(&self, index: &FetchedArtifact) -> Result<usize> {
        let bytes = tokio::fs::read(index.path())
            .await
            .map_err(|e| LauncherError::fs(index.path(), e))?;
        let index_file: AssetIndexFile = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse asset index {:?}", index.path()))?;

        let objects_dir = self.layout.objects_dir();
        let base = self.resources_url.trim_end_matches('/');

        let mut jobs = Vec::with_capacity(index_file.objects.len());
        for (name, object) in &index_file.objects {
            let shard = object.shard().with_context(|| format!("Invalid asset {}", name))?;
            let hash = object.hash.to_lowercase();
            jobs.push(FetchJob {
                name: format!("asset {}", name),
                url: format!("{}/{}/{}", base, shard.to_lowercase(), hash),
                path: objects_dir.join(shard.to_lowercase()).join(&hash),
                sha1: hash,
            });
        }

        let total = index_file.objects.len();
        log::info!("Downloading {} assets with parallel downloads", total);

        BatchDownloader::new(self.store.clone(), self.concurrency)
            .download_all(jobs, self.reporter.clone())
            .await?;

        Ok(total)
    }

    /// Libraries, asset index, assets, then the client jar.
    pub async fn update_version(
        &self,
        manifest: &VersionManifest,
        platform: &PlatformContext,
    ) -> Result<()> {
        log::info!("Updating version {}", manifest.id);

        self.reporter.start_step("Downloading libraries", Some(4));
        self.download_libraries(manifest, platform).await?;

        self.reporter.start_step("Downloading asset index", Some(4));
        let index = self.download_asset_index(manifest).await?;

        self.reporter.start_step("Downloading assets", Some(4));
        self.download_assets(&index)
            .await
            .with_context(|| format!("Failed to download assets for {}", manifest.id))?;

        self.reporter.start_step("Downloading client", Some(4));
        self.download_client(manifest).await?;

        log::info!("Version {} is up to date", manifest.id);
        Ok(())
    }
}
