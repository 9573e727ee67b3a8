/// Version.json parser normalizing legacy and modern argument shapes
use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::config::MAX_SUPPORTED_MANIFEST_VERSION;
use crate::game::launcher::rules::Rule;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Downloadable file with known hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    pub url: String,
}

/// Asset index information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub sha1: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub total_size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Artifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Artifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,

    /// Keyed by classifier, e.g. "natives-linux" or "natives-windows-64"
    #[serde(default)]
    pub classifiers: HashMap<String, Artifact>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Library definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// Maven coordinates, "group:artifact:version"
    pub name: String,

    #[serde(default)]
    pub downloads: LibraryDownloads,

    /// Native classifier suffix per OS, may contain `${arch}`
    #[serde(default)]
    pub natives: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractRules>,
}

impl Library {
    /// Archive entry prefixes skipped when extracting natives
    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|e| e.exclude.as_slice())
            .unwrap_or(&[])
    }
}

/// One command-line argument record.
///
/// A plain string becomes a single token. An array-valued conditional entry
/// becomes one record carrying all of its tokens, so they are gated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub values: Vec<String>,
    pub rules: Vec<Rule>,
}

impl Argument {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            values: vec![value.into()],
            rules: Vec::new(),
        }
    }

    /// Space-joined textual value
    pub fn value(&self) -> String {
        self.values.join(" ")
    }
}

/// Normalized version manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionManifest {
    pub id: String,
    pub version_type: String,
    pub asset_index: Option<AssetIndexRef>,
    pub downloads: VersionDownloads,
    pub libraries: Vec<Library>,
    pub main_class: String,
    pub jvm_arguments: Vec<Argument>,
    pub game_arguments: Vec<Argument>,
    pub minimum_launcher_version: u32,
}

impl VersionManifest {
    /// Asset index id, or an empty string for manifests without one
    pub fn assets_index_name(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|a| a.id.as_str())
            .unwrap_or("")
    }

    /// Whether arguments were normalized. Manifests newer than the reader
    /// understands keep only their common fields.
    pub fn support_status(&self) -> LauncherResult<()> {
        if self.minimum_launcher_version > MAX_SUPPORTED_MANIFEST_VERSION {
            return Err(LauncherError::UnsupportedManifestVersion {
                found: self.minimum_launcher_version,
                supported: MAX_SUPPORTED_MANIFEST_VERSION,
            });
        }
        Ok(())
    }
}

// Superset of both historical shapes, as found on disk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    id: String,
    #[serde(default, rename = "type")]
    version_type: String,
    #[serde(default)]
    asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    downloads: VersionDownloads,
    #[serde(default)]
    libraries: Vec<Library>,
    #[serde(default)]
    main_class: String,
    #[serde(default)]
    minimum_launcher_version: u32,
    #[serde(default)]
    minecraft_arguments: Option<String>,
    // Left untyped until the version marker says it can be read
    #[serde(default)]
    arguments: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawArguments {
    #[serde(default)]
    game: Option<Vec<RawArgument>>,
    #[serde(default)]
    jvm: Option<Vec<RawArgument>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArgument {
    Simple(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: RawArgumentValue,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArgumentValue {
    Single(String),
    Multiple(Vec<String>),
}

impl From<RawArgument> for Argument {
    fn from(raw: RawArgument) -> Self {
        match raw {
            RawArgument::Simple(s) => Argument::plain(s),
            RawArgument::Conditional { rules, value } => {
                let values = match value {
                    RawArgumentValue::Single(s) => vec![s],
                    RawArgumentValue::Multiple(v) => v,
                };
                Argument { values, rules }
            }
        }
    }
}

fn normalize(raw: Vec<RawArgument>) -> Vec<Argument> {
    raw.into_iter().map(Argument::from).collect()
}

/// Built-in JVM arguments for manifests that declare none
pub fn default_jvm_arguments() -> Vec<Argument> {
    [
        "-Xss1M",
        "-Djava.library.path=${natives_directory}",
        "-Dminecraft.launcher.brand=${launcher_name}",
        "-Dminecraft.launcher.version=${launcher_version}",
        "-cp",
        "${classpath}",
        // Memory settings
        "-Xmx2G",
        // G1GC settings
        "-XX:+UnlockExperimentalVMOptions",
        "-XX:+UseG1GC",
        "-XX:G1NewSizePercent=20",
        "-XX:G1ReservePercent=20",
        "-XX:MaxGCPauseMillis=50",
        "-XX:G1HeapRegionSize=32M",
    ]
    .into_iter()
    .map(Argument::plain)
    .collect()
}

/// Parse version.json bytes into the normalized model
pub fn parse(bytes: &[u8]) -> LauncherResult<VersionManifest> {
    let raw: RawManifest = serde_json::from_slice(bytes)?;

    let mut manifest = VersionManifest {
        id: raw.id,
        version_type: raw.version_type,
        asset_index: raw.asset_index,
        downloads: raw.downloads,
        libraries: raw.libraries,
        main_class: raw.main_class,
        jvm_arguments: Vec::new(),
        game_arguments: Vec::new(),
        minimum_launcher_version: raw.minimum_launcher_version,
    };

    if manifest.minimum_launcher_version > MAX_SUPPORTED_MANIFEST_VERSION {
        log::warn!(
            "Version {} requires launcher version {} (supported up to {}), arguments ignored",
            manifest.id,
            manifest.minimum_launcher_version,
            MAX_SUPPORTED_MANIFEST_VERSION
        );
    } else {
        if let Some(value) = raw.arguments {
            let args: RawArguments = serde_json::from_value(value)?;
            if let Some(game) = args.game {
                manifest.game_arguments = normalize(game);
            }
            if let Some(jvm) = args.jvm {
                manifest.jvm_arguments = normalize(jvm);
            }
        }

        if let Some(ref legacy) = raw.minecraft_arguments {
            if !legacy.is_empty() {
                manifest.game_arguments = legacy
                    .split(' ')
                    .filter(|s| !s.is_empty())
                    .map(Argument::plain)
                    .collect();
            }
        }
    }

    if manifest.jvm_arguments.is_empty() {
        manifest.jvm_arguments = default_jvm_arguments();
    }

    Ok(manifest)
}

/// Parse a version.json file
pub async fn parse_file(path: &Path) -> LauncherResult<VersionManifest> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LauncherError::fs(path, e))?;
    parse(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::launcher::rules::RuleAction;

    const MODERN: &str = r#"{
        "id": "1.20.1",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "minimumLauncherVersion": 21,
        "assetIndex": {"id": "5", "sha1": "ab", "size": 1, "totalSize": 2, "url": "http://x/5.json"},
        "downloads": {"client": {"sha1": "cd", "size": 3, "url": "http://x/client.jar"}},
        "arguments": {
            "game": [
                "--username", "${auth_player_name}",
                {"rules": [{"action": "allow", "features": {"has_custom_resolution": true}}],
                 "value": ["--width", "${resolution_width}", "--height", "${resolution_height}"]}
            ],
            "jvm": [
                {"rules": [{"action": "allow", "os": {"name": "osx"}}], "value": "-XstartOnFirstThread"},
                "-cp", "${classpath}"
            ]
        },
        "libraries": [{"name": "org.lwjgl:lwjgl:3.2.1"}]
    }"#;

    #[test]
    fn test_parse_modern_manifest() {
        let manifest = parse(MODERN.as_bytes()).unwrap();
        assert_eq!(manifest.id, "1.20.1");
        assert_eq!(manifest.version_type, "release");
        assert_eq!(manifest.assets_index_name(), "5");
        assert_eq!(manifest.main_class, "net.minecraft.client.main.Main");
        assert!(manifest.downloads.client.is_some());
        assert_eq!(manifest.libraries.len(), 1);

        assert_eq!(manifest.game_arguments.len(), 3);
        let sized = &manifest.game_arguments[2];
        assert_eq!(sized.values.len(), 4);
        assert_eq!(sized.rules.len(), 1);

        assert_eq!(manifest.jvm_arguments.len(), 3);
        assert_eq!(manifest.jvm_arguments[0].value(), "-XstartOnFirstThread");
        assert_eq!(manifest.jvm_arguments[0].rules[0].action, RuleAction::Allow);
        assert!(manifest.support_status().is_ok());
    }

    #[test]
    fn test_parse_legacy_manifest() {
        let json = r#"{
            "id": "1.7.10",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "minimumLauncherVersion": 13,
            "minecraftArguments": "--username ${auth_player_name} --uuid ${auth_uuid}"
        }"#;
        let manifest = parse(json.as_bytes()).unwrap();
        assert_eq!(
            manifest.game_arguments,
            vec![
                Argument::plain("--username"),
                Argument::plain("${auth_player_name}"),
                Argument::plain("--uuid"),
                Argument::plain("${auth_uuid}"),
            ]
        );
        assert_eq!(manifest.jvm_arguments, default_jvm_arguments());
    }

    #[test]
    fn test_empty_jvm_array_gets_defaults() {
        let json = r#"{"id": "x", "arguments": {"game": [], "jvm": []}}"#;
        let manifest = parse(json.as_bytes()).unwrap();
        assert_eq!(manifest.jvm_arguments.len(), 13);
        assert!(manifest.jvm_arguments.iter().all(|a| a.rules.is_empty()));
        assert_eq!(manifest.jvm_arguments[5].value(), "${classpath}");
    }

    #[test]
    fn test_unsupported_version_keeps_common_fields() {
        let json = r#"{
            "id": "future",
            "type": "snapshot",
            "mainClass": "a.B",
            "minimumLauncherVersion": 99,
            "arguments": {"game": [42]},
            "minecraftArguments": "--demo"
        }"#;
        let manifest = parse(json.as_bytes()).unwrap();
        assert_eq!(manifest.id, "future");
        assert_eq!(manifest.main_class, "a.B");
        assert!(manifest.game_arguments.is_empty());
        // Default JVM template still applies, no explicit JVM args were read
        assert_eq!(manifest.jvm_arguments.len(), 13);

        match manifest.support_status() {
            Err(LauncherError::UnsupportedManifestVersion { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, 21);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_malformed_argument_is_fatal() {
        for bad in [
            r#"{"id": "x", "arguments": {"game": [42]}}"#,
            r#"{"id": "x", "arguments": {"jvm": [{"rules": []}]}}"#,
            r#"{"id": "x", "arguments": {"jvm": [{"value": ["-a", 1]}]}}"#,
        ] {
            let err = parse(bad.as_bytes()).unwrap_err();
            assert!(
                matches!(err, LauncherError::MalformedManifest(_)),
                "expected malformed manifest for {}",
                bad
            );
        }
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(matches!(
            parse(b"not json"),
            Err(LauncherError::MalformedManifest(_))
        ));
    }
}
