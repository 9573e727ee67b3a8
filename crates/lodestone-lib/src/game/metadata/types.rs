use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version type given to directories under versions/ the remote list does not know
pub const LOCAL_VERSION_TYPE: &str = "local";

/// Remote version list document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionList {
    pub latest: LatestVersions,
    #[serde(default)]
    pub versions: Vec<VersionMeta>,
}

/// Latest version information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatestVersions {
    #[serde(default)]
    pub release: String,
    #[serde(default)]
    pub snapshot: String,
}

/// One entry of the version list, possibly only known locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMeta {
    pub id: String,

    /// release, snapshot, old_alpha, old_beta or local
    #[serde(rename = "type")]
    pub version_type: String,

    /// Manifest URL; empty for local-only versions
    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<DateTime<Utc>>,

    /// versions/<id> exists on disk
    #[serde(skip)]
    pub installed: bool,
}

impl VersionMeta {
    pub fn local(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version_type: LOCAL_VERSION_TYPE.to_string(),
            url: String::new(),
            sha1: None,
            release_time: None,
            installed: true,
        }
    }

    pub fn is_downloadable(&self) -> bool {
        !self.url.is_empty()
    }
}
