use std::path::PathBuf;
use thiserror::Error;

/// Error type for the leaf components (artifact store, manifest reader,
/// coordinate handling, probes). Orchestrators wrap these in `anyhow`
/// with the library / asset / version that failed.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Manifest ────────────────────────────────────────
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Manifest requires launcher version {found}, highest supported is {supported}")]
    UnsupportedManifestVersion { found: u32, supported: u32 },

    #[error("Malformed library coordinate: {0}")]
    MalformedCoordinate(String),

    // ── Network ─────────────────────────────────────────
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download rejected for {url}: HTTP {status}")]
    HttpRejection { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error at {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    // ── Probes ──────────────────────────────────────────
    #[error("Probe failed: {0}")]
    Probe(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for LauncherError {
    fn from(err: serde_json::Error) -> Self {
        LauncherError::MalformedManifest(err.to_string())
    }
}
