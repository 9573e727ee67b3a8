use crate::error::{LauncherError, LauncherResult};
use crate::utils::os_version::OsVersionProbe;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Progress reporter trait for installer operations
pub trait ProgressReporter: Send + Sync {
    /// Start a new step with optional total steps
    fn start_step(&self, name: &str, total_steps: Option<u32>);

    /// Set a numeric step count for the current step (e.g. "3/12").
    /// `total` may be None when unknown.
    fn set_step_count(&self, current: u32, total: Option<u32>);

    /// Mark operation as complete
    fn done(&self, success: bool, message: Option<&str>);
}

/// A progress reporter that does nothing (silent).
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start_step(&self, _name: &str, _total_steps: Option<u32>) {}
    fn set_step_count(&self, _current: u32, _total: Option<u32>) {}
    fn done(&self, _success: bool, _message: Option<&str>) {}
}

/// Cancellation token wrapper
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Create a token together with the sender that trips it.
    pub fn pair() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self::new(rx))
    }

    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(rx)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

/// On-disk layout below a launcher root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootLayout {
    root: PathBuf,
}

impl RootLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    /// versions/<id>/<id>.json
    pub fn version_json(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.json", id))
    }

    /// versions/<id>/<id>.jar
    pub fn version_jar(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.jar", id))
    }

    pub fn asset_index(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{}.json", index_id))
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }
}

/// Reject ids that cannot be used as a single directory or file name
/// under the root (version ids, asset index ids).
pub fn ensure_path_component(id: &str) -> LauncherResult<()> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', ':'])
        || id.chars().any(|c| c.is_control());
    if invalid {
        return Err(LauncherError::MalformedManifest(format!(
            "invalid id '{}'",
            id
        )));
    }
    Ok(())
}

/// Operating system types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    MacOS,
    Linux,
    /// Any other OS; carries no native artifacts.
    Other,
}

impl OsType {
    /// Detect the current OS
    pub fn current() -> Self {
        match std::env::consts::OS {
            "windows" => OsType::Windows,
            "macos" => OsType::MacOS,
            "linux" => OsType::Linux,
            _ => OsType::Other,
        }
    }

    /// Get the OS name as a string (for rule matching).
    /// macOS is reported under its historical manifest alias "osx".
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::Linux => "linux",
            OsType::MacOS => "osx",
            OsType::Other => std::env::consts::OS,
        }
    }

    /// Get the classpath separator for this OS
    pub fn classpath_separator(&self) -> &'static str {
        match self {
            OsType::Windows => ";",
            _ => ":",
        }
    }

    /// File extension of executables on this OS
    pub fn exe_suffix(&self) -> &'static str {
        match self {
            OsType::Windows => ".exe",
            _ => "",
        }
    }
}

/// Architecture types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X64,
    Arm32,
    Arm64,
    Other,
}

impl Arch {
    /// Detect the current architecture
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "x86_64" => Arch::X64,
            "arm" => Arch::Arm32,
            "aarch64" => Arch::Arm64,
            _ => Arch::Other,
        }
    }

    /// Name used by `os.arch` rule predicates. Unknown architectures have none.
    pub fn rule_name(&self) -> Option<&'static str> {
        match self {
            Arch::X86 => Some("x86"),
            Arch::X64 => Some("amd64"),
            Arch::Arm32 => Some("arm"),
            Arch::Arm64 => Some("arm64"),
            Arch::Other => None,
        }
    }

    /// Word size substituted for `${arch}` in native classifiers.
    /// Everything that is not a recognized 32-bit target counts as "64".
    pub fn bits(&self) -> &'static str {
        match self {
            Arch::X86 | Arch::Arm32 => "32",
            _ => "64",
        }
    }
}

/// Host facts used by rule evaluation and path building.
/// Computed once and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    pub os: OsType,
    pub arch: Arch,
    /// `None` when the OS version probe failed
    pub os_version: Option<String>,
}

impl PlatformContext {
    pub fn new(os: OsType, arch: Arch, os_version: Option<String>) -> Self {
        Self {
            os,
            arch,
            os_version,
        }
    }

    /// Detect the host platform, probing the OS version once.
    pub fn detect(probe: &dyn OsVersionProbe) -> Self {
        let os_version = match probe.probe() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Failed to get OS version: {}", e);
                None
            }
        };
        Self::new(OsType::current(), Arch::current(), os_version)
    }
}
