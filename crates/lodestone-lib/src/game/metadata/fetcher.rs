use super::types::{VersionList, VersionMeta};
use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::core::downloader::ArtifactStore;
use std::collections::HashMap;
use std::path::Path;

/// Fetch the remote version list
pub async fn fetch_version_list(store: &ArtifactStore, url: &str) -> LauncherResult<VersionList> {
    log::info!("Fetching version list from {}", url);
    let list: VersionList = store.fetch_json(url).await?;
    log::debug!(
        "Version list has {} entries (latest release {}, snapshot {})",
        list.versions.len(),
        list.latest.release,
        list.latest.snapshot
    );
    Ok(list)
}

/// Names of the directories directly under versions/.
/// A missing versions directory yields no entries.
pub async fn local_version_ids(versions_dir: &Path) -> LauncherResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(versions_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LauncherError::fs(versions_dir, e)),
    };

    let mut ids = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::fs(versions_dir, e))?
    {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            ids.push(name.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

/// Mark remote entries present on disk as installed and add the rest of the
/// local ids as local-only entries.
pub fn merge_local_versions(
    remote: Vec<VersionMeta>,
    local_ids: &[String],
) -> HashMap<String, VersionMeta> {
    let mut known: HashMap<String, VersionMeta> = remote
        .into_iter()
        .map(|meta| (meta.id.clone(), meta))
        .collect();

    for id in local_ids {
        known
            .entry(id.clone())
            .and_modify(|meta| meta.installed = true)
            .or_insert_with(|| VersionMeta::local(id.clone()));
    }
    known
}
