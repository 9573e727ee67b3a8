use super::batch::{BatchDownloader, FetchJob};
use super::downloader::{ArtifactStore, FetchedArtifact};
use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::types::{OsType, PlatformContext, ProgressReporter};
use crate::game::launcher::rules::{is_allowed, RuleContext};
use crate::game::launcher::version_parser::{Artifact, Library};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A verified native archive, ready for extraction
#[derive(Debug, Clone)]
pub struct NativeArchive {
    /// Library coordinate the archive belongs to
    pub library: String,
    pub archive: FetchedArtifact,
    /// Entry-name prefixes to skip when extracting
    pub exclude: Vec<String>,
}

/// Split "group:artifact:version" into its three fields
pub fn split_name(name: &str) -> LauncherResult<(&str, &str, &str)> {
    let mut parts = name.split(':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(artifact), Some(version), None) => Ok((group, artifact, version)),
        _ => Err(LauncherError::MalformedCoordinate(name.to_string())),
    }
}

fn storage_path(name: &str, suffix: Option<&str>) -> LauncherResult<PathBuf> {
    let (group, artifact, version) = split_name(name)?;

    let segments: Vec<&str> = group
        .split('.')
        .chain([artifact, version])
        .chain(suffix)
        .collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == ".." || s.contains(['/', '\\']))
    {
        return Err(LauncherError::MalformedCoordinate(name.to_string()));
    }

    let mut path = PathBuf::new();
    for segment in group.split('.') {
        path.push(segment);
    }
    path.push(artifact);
    path.push(version);

    let filename = match suffix {
        Some(s) => format!("{}-{}-{}.jar", artifact, version, s),
        None => format!("{}-{}.jar", artifact, version),
    };
    path.push(filename);
    Ok(path)
}

/// Main jar path, relative to the libraries directory
pub fn library_path(lib: &Library) -> LauncherResult<PathBuf> {
    storage_path(&lib.name, None)
}

/// Native classifier for the platform with `${arch}` resolved, if the
/// library declares one.
pub fn native_suffix(lib: &Library, platform: &PlatformContext) -> Option<String> {
    if platform.os == OsType::Other {
        return None;
    }
    lib.natives
        .get(platform.os.as_str())
        .map(|template| template.replace("${arch}", platform.arch.bits()))
}

/// Native artifact for the platform. Unsupported OS means none.
pub fn native_artifact<'a>(lib: &'a Library, platform: &PlatformContext) -> Option<&'a Artifact> {
    if platform.os == OsType::Other {
        return None;
    }
    let classifiers = &lib.downloads.classifiers;
    native_suffix(lib, platform)
        .and_then(|suffix| classifiers.get(&suffix))
        .or_else(|| classifiers.get(&format!("natives-{}", platform.os.as_str())))
}

/// Native jar path, relative to the libraries directory. `None` when the
/// library has no native component for this platform.
pub fn native_path(lib: &Library, platform: &PlatformContext) -> LauncherResult<Option<PathBuf>> {
    if native_artifact(lib, platform).is_none() {
        return Ok(None);
    }
    let suffix = native_suffix(lib, platform)
        .unwrap_or_else(|| format!("natives-{}", platform.os.as_str()));
    storage_path(&lib.name, Some(&suffix)).map(Some)
}

/// Library inclusion uses the rule engine without profile features
pub fn should_include(lib: &Library, platform: &PlatformContext) -> bool {
    is_allowed(lib.rules.as_deref(), &RuleContext::for_libraries(platform))
}

struct PlannedNative {
    library: String,
    path: PathBuf,
    exclude: Vec<String>,
}

fn plan(
    libraries: &[Library],
    libraries_dir: &Path,
    platform: &PlatformContext,
    include_main: bool,
) -> Result<(Vec<FetchJob>, Vec<PlannedNative>)> {
    let mut jobs = Vec::new();
    let mut natives = Vec::new();

    for lib in libraries.iter().filter(|l| should_include(l, platform)) {
        if include_main {
            if let Some(ref artifact) = lib.downloads.artifact {
                let rel = library_path(lib)
                    .with_context(|| format!("Failed to resolve library {}", lib.name))?;
                jobs.push(FetchJob {
                    name: lib.name.clone(),
                    url: artifact.url.clone(),
                    path: libraries_dir.join(rel),
                    sha1: artifact.sha1.clone(),
                });
            }
        }

        let rel = native_path(lib, platform)
            .with_context(|| format!("Failed to resolve natives for {}", lib.name))?;
        if let (Some(rel), Some(artifact)) = (rel, native_artifact(lib, platform)) {
            let path = libraries_dir.join(rel);
            jobs.push(FetchJob {
                name: format!("{} (natives)", lib.name),
                url: artifact.url.clone(),
                path: path.clone(),
                sha1: artifact.sha1.clone(),
            });
            natives.push(PlannedNative {
                library: lib.name.clone(),
                path,
                exclude: lib.extract_excludes().to_vec(),
            });
        }
    }

    Ok((jobs, natives))
}

async fn run(
    store: &ArtifactStore,
    libraries: &[Library],
    libraries_dir: &Path,
    platform: &PlatformContext,
    concurrency: usize,
    reporter: Arc<dyn ProgressReporter>,
    include_main: bool,
) -> Result<Vec<NativeArchive>> {
    let (jobs, planned) = plan(libraries, libraries_dir, platform, include_main)?;

    let fetched = BatchDownloader::new(store.clone(), concurrency)
        .download_all(jobs, reporter)
        .await?;

    let mut by_path: HashMap<PathBuf, FetchedArtifact> = fetched
        .into_iter()
        .map(|f| (f.path().to_path_buf(), f))
        .collect();

    let mut archives: Vec<NativeArchive> = Vec::with_capacity(planned.len());
    for native in planned {
        // Duplicate native paths were fetched once; later entries reuse the proof
        let archive = match by_path.remove(&native.path) {
            Some(a) => a,
            None => match archives
                .iter()
                .find(|a| a.archive.path() == native.path.as_path())
            {
                Some(existing) => existing.archive.clone(),
                None => anyhow::bail!("Native archive for {} was not fetched", native.library),
            },
        };
        archives.push(NativeArchive {
            library: native.library,
            archive,
            exclude: native.exclude,
        });
    }

    Ok(archives)
}

/// Fetch the main and native artifacts of every included library.
/// Returns the verified native archives for extraction.
pub async fn download_libraries(
    store: &ArtifactStore,
    libraries: &[Library],
    libraries_dir: &Path,
    platform: &PlatformContext,
    concurrency: usize,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<Vec<NativeArchive>> {
    log::info!("Downloading {} libraries", libraries.len());
    run(store, libraries, libraries_dir, platform, concurrency, reporter, true).await
}

/// Verify (fetching when missing) only the native archives of included libraries
pub async fn download_natives(
    store: &ArtifactStore,
    libraries: &[Library],
    libraries_dir: &Path,
    platform: &PlatformContext,
    concurrency: usize,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<Vec<NativeArchive>> {
    run(store, libraries, libraries_dir, platform, concurrency, reporter, false).await
}
