/// Core types for game launching
use crate::game::launcher::rules::FeatureState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// User-controlled launch settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Version ID to launch (e.g., "1.20.1")
    pub version_id: String,

    /// Game working directory
    pub game_dir: PathBuf,

    /// Java executable override; the system Java is used when unset
    pub java_path: Option<PathBuf>,

    /// Heap ceiling in MB, 0 for the JVM default
    pub heap_max_mb: u32,

    /// Free-form extra JVM arguments, split on spaces
    pub extra_jvm_args: String,

    /// Free-form extra game arguments, split on spaces
    pub extra_game_args: String,

    /// Window size, 0 when unset
    pub resolution_width: u32,
    pub resolution_height: u32,

    pub demo_user: bool,
}

impl Profile {
    pub fn new(version_id: impl Into<String>, game_dir: impl Into<PathBuf>) -> Self {
        Self {
            version_id: version_id.into(),
            game_dir: game_dir.into(),
            ..Default::default()
        }
    }

    pub fn has_resolution(&self) -> bool {
        self.resolution_width != 0 && self.resolution_height != 0
    }

    /// Feature flags seen by argument rules
    pub fn features(&self) -> FeatureState {
        FeatureState::new(self.demo_user, self.resolution_width, self.resolution_height)
    }
}

/// Directories a launch reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDirs {
    pub versions_dir: PathBuf,
    pub libraries_dir: PathBuf,
    pub natives_dir: PathBuf,
    pub assets_dir: PathBuf,
}

/// Fully resolved process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_features() {
        let mut profile = Profile::new("1.20.1", "/games/mc");
        assert!(!profile.has_resolution());
        assert_eq!(profile.features(), FeatureState::default());

        profile.resolution_width = 1280;
        profile.resolution_height = 720;
        profile.demo_user = true;
        let features = profile.features();
        assert!(features.has_custom_resolution);
        assert!(features.is_demo_user);
    }

    #[test]
    fn test_profile_deserialize_defaults() {
        let profile: Profile =
            serde_json::from_str(r#"{"version_id": "1.12.2", "heap_max_mb": 2048}"#).unwrap();
        assert_eq!(profile.version_id, "1.12.2");
        assert_eq!(profile.heap_max_mb, 2048);
        assert!(profile.java_path.is_none());
        assert!(profile.extra_jvm_args.is_empty());
    }
}
