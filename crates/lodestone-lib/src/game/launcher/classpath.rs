/// Classpath construction
use crate::error::LauncherResult;
use crate::game::installer::core::library::{library_path, should_include};
use crate::game::installer::types::PlatformContext;
use crate::game::launcher::version_parser::VersionManifest;
use std::path::Path;

/// Included libraries' main jars in manifest order, then the client jar.
/// Entries are joined with the platform separator.
///
/// Natives-only libraries (a natives map but no main artifact) have no jar
/// of their own and are left out.
pub fn build_classpath(
    manifest: &VersionManifest,
    libraries_dir: &Path,
    versions_dir: &Path,
    platform: &PlatformContext,
) -> LauncherResult<String> {
    let mut classpath_entries = Vec::with_capacity(manifest.libraries.len() + 1);

    for library in &manifest.libraries {
        if !should_include(library, platform) {
            continue;
        }
        if library.downloads.artifact.is_none() && !library.natives.is_empty() {
            continue;
        }
        let full_path = libraries_dir.join(library_path(library)?);
        classpath_entries.push(full_path.to_string_lossy().to_string());
    }

    let client_jar = versions_dir
        .join(&manifest.id)
        .join(format!("{}.jar", manifest.id));
    classpath_entries.push(client_jar.to_string_lossy().to_string());

    Ok(classpath_entries.join(platform.os.classpath_separator()))
}
