/// Native library extraction
use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::core::library::NativeArchive;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Check if an archive entry should be excluded
fn should_exclude(entry_name: &str, exclusions: &[String]) -> bool {
    exclusions
        .iter()
        .any(|exclusion| entry_name.starts_with(exclusion.as_str()))
}

/// Extract one verified native archive into `output_dir`.
/// Returns the number of files written.
pub fn extract_native(native: &NativeArchive, output_dir: &Path) -> LauncherResult<usize> {
    let jar_path = native.archive.path();
    log::debug!("Extracting natives from: {:?}", jar_path);

    let file = std::fs::File::open(jar_path).map_err(|e| LauncherError::fs(jar_path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| LauncherError::Archive {
        path: jar_path.to_path_buf(),
        source,
    })?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|source| LauncherError::Archive {
            path: jar_path.to_path_buf(),
            source,
        })?;

        if should_exclude(entry.name(), &native.exclude) {
            continue;
        }

        // Entries escaping the output directory are dropped
        let relative = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                log::warn!("Skipping unsafe entry '{}' in {:?}", entry.name(), jar_path);
                continue;
            }
        };
        let output_path = output_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| LauncherError::fs(&output_path, e))?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::fs(parent, e))?;
        }

        let mut output_file = std::fs::File::create(&output_path)
            .map_err(|e| LauncherError::fs(&output_path, e))?;
        std::io::copy(&mut entry, &mut output_file)
            .map_err(|e| LauncherError::fs(&output_path, e))?;
        written += 1;
    }

    Ok(written)
}

/// Extract every archive into the scratch directory on the blocking pool
pub async fn extract_natives(natives: Vec<NativeArchive>, natives_dir: PathBuf) -> Result<usize> {
    tokio::fs::create_dir_all(&natives_dir)
        .await
        .map_err(|e| LauncherError::fs(&natives_dir, e))?;

    tokio::task::spawn_blocking(move || {
        let mut total = 0;
        for native in &natives {
            total += extract_native(native, &natives_dir)
                .with_context(|| format!("Failed to extract natives of {}", native.library))?;
        }
        log::debug!("Extracted {} native files into {:?}", total, natives_dir);
        Ok::<_, anyhow::Error>(total)
    })
    .await
    .context("Native extraction task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::installer::core::downloader::FetchedArtifact;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
        let f = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(f);
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory::<&str, ()>(name, FileOptions::default())
                    .unwrap();
            } else {
                zip.start_file::<&str, ()>(name, FileOptions::default())
                    .unwrap();
                zip.write_all(data).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    fn native(path: &Path, exclude: &[&str]) -> NativeArchive {
        NativeArchive {
            library: "org.lwjgl:lwjgl:3.2.1".to_string(),
            archive: FetchedArtifact::new(path.to_path_buf(), "00".to_string(), false),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_should_exclude() {
        let exclusions = vec!["META-INF/".to_string(), "module-info.class".to_string()];

        assert!(should_exclude("META-INF/MANIFEST.MF", &exclusions));
        assert!(should_exclude("module-info.class", &exclusions));
        assert!(!should_exclude("org/lwjgl/Library.class", &exclusions));
        assert!(!should_exclude("liblwjgl.so", &[]));
    }

    #[test]
    fn test_extract_skips_excluded_prefix() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("natives.jar");
        write_jar(
            &jar,
            &[
                ("META-INF/", b""),
                ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
                ("liblwjgl.so", b"elf"),
                ("linux/x64/org/lwjgl/liblwjgl_opengl.so", b"gl"),
            ],
        );

        let out = tmp.path().join("out");
        let written = extract_native(&native(&jar, &["META-INF/"]), &out).unwrap();

        assert_eq!(written, 2);
        assert!(out.join("liblwjgl.so").exists());
        assert_eq!(
            std::fs::read(out.join("linux/x64/org/lwjgl/liblwjgl_opengl.so")).unwrap(),
            b"gl"
        );
        assert!(!out.join("META-INF").exists());
    }

    #[test]
    fn test_extract_rejects_escaping_entries() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("evil.jar");
        write_jar(&jar, &[("../escape.so", b"x"), ("ok.so", b"y")]);

        let out = tmp.path().join("out");
        let written = extract_native(&native(&jar, &[]), &out).unwrap();
        assert_eq!(written, 1);
        assert!(out.join("ok.so").exists());
        assert!(!tmp.path().join("escape.so").exists());
    }

    #[test]
    fn test_extract_bad_archive() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("broken.jar");
        std::fs::write(&jar, b"not a zip").unwrap();
        let err = extract_native(&native(&jar, &[]), tmp.path()).unwrap_err();
        assert!(matches!(err, LauncherError::Archive { .. }));
    }

    #[tokio::test]
    async fn test_extract_natives_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("a.jar");
        write_jar(&jar, &[("lwjgl.dll", b"dll")]);

        let out = tmp.path().join("natives").join("1.20.1");
        let total = extract_natives(vec![native(&jar, &[])], out.clone())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert!(out.join("lwjgl.dll").exists());
    }
}
