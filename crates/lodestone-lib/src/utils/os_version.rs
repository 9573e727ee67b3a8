use crate::error::{LauncherError, LauncherResult};
use sysinfo::System;

/// Source of the host OS version string matched by `os.version` rules
pub trait OsVersionProbe: Send + Sync {
    fn probe(&self) -> LauncherResult<String>;
}

/// Kernel release on Linux and macOS, OS version on Windows
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl OsVersionProbe for SystemProbe {
    fn probe(&self) -> LauncherResult<String> {
        let version = if cfg!(windows) {
            System::os_version()
        } else {
            System::kernel_version()
        };
        version.ok_or_else(|| LauncherError::Probe("OS version unavailable".to_string()))
    }
}
