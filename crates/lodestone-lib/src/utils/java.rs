use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::types::OsType;
use std::ffi::OsString;
use std::path::PathBuf;

/// Finds a Java executable when the profile does not name one
pub trait JavaLocator: Send + Sync {
    fn locate(&self) -> LauncherResult<PathBuf>;
}

/// `JRE_HOME`, then `JAVA_HOME`, then `java` on `PATH`
#[derive(Debug, Clone, Default)]
pub struct SystemJava {
    pub jre_home: Option<OsString>,
    pub java_home: Option<OsString>,
}

impl SystemJava {
    pub fn from_env() -> Self {
        Self {
            jre_home: std::env::var_os("JRE_HOME").filter(|v| !v.is_empty()),
            java_home: std::env::var_os("JAVA_HOME").filter(|v| !v.is_empty()),
        }
    }

    fn binary_name() -> String {
        format!("java{}", OsType::current().exe_suffix())
    }
}

impl JavaLocator for SystemJava {
    fn locate(&self) -> LauncherResult<PathBuf> {
        let home = self.jre_home.as_ref().or(self.java_home.as_ref());
        if let Some(home) = home {
            let java = PathBuf::from(home).join("bin").join(Self::binary_name());
            log::debug!("Using Java from environment: {:?}", java);
            return Ok(java);
        }

        which::which(Self::binary_name())
            .map_err(|e| LauncherError::Probe(format!("java not found on PATH: {}", e)))
    }
}
