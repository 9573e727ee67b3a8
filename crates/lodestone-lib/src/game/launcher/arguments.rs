/// Command-line construction for a version launch
use crate::auth::AuthData;
use crate::error::{LauncherError, LauncherResult};
use crate::game::installer::config::{LAUNCHER_NAME, LAUNCHER_VERSION};
use crate::game::installer::types::PlatformContext;
use crate::game::launcher::classpath::build_classpath;
use crate::game::launcher::rules::{evaluate, RuleAction, RuleContext};
use crate::game::launcher::types::{CommandLine, LaunchDirs, Profile};
use crate::game::launcher::version_parser::{Argument, VersionManifest};
use crate::utils::java::JavaLocator;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Replace `${key}` placeholders in one pass. Unknown keys stay literal and
/// substituted values are never rescanned.
pub fn substitute_variables(text: &str, variables: &HashMap<&str, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match variables.get(key) {
                    Some(value) => result.push_str(value),
                    None => {
                        result.push_str("${");
                        result.push_str(key);
                        result.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    result.push_str(rest);
    result
}

/// Split a free-form argument string on spaces, dropping empty tokens
pub(crate) fn split_extra_args(s: &str) -> impl Iterator<Item = &str> {
    s.split(' ').filter(|t| !t.is_empty())
}

/// Absolute form of a directory, canonical when it already exists
fn absolute(path: &Path) -> LauncherResult<PathBuf> {
    match dunce::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(_) => std::path::absolute(path).map_err(|e| LauncherError::fs(path, e)),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

struct ResolvedDirs {
    game_dir: PathBuf,
    versions_dir: PathBuf,
    libraries_dir: PathBuf,
    natives_dir: PathBuf,
    assets_dir: PathBuf,
}

impl ResolvedDirs {
    fn resolve(profile: &Profile, dirs: &LaunchDirs) -> LauncherResult<Self> {
        Ok(Self {
            game_dir: absolute(&profile.game_dir)?,
            versions_dir: absolute(&dirs.versions_dir)?,
            libraries_dir: absolute(&dirs.libraries_dir)?,
            natives_dir: absolute(&dirs.natives_dir)?,
            assets_dir: absolute(&dirs.assets_dir)?,
        })
    }
}

fn build_variables<'a>(
    manifest: &VersionManifest,
    profile: &Profile,
    auth: &AuthData,
    dirs: &ResolvedDirs,
    classpath: String,
) -> HashMap<&'a str, String> {
    let mut vars = HashMap::new();
    vars.insert("natives_directory", path_string(&dirs.natives_dir));
    vars.insert("launcher_name", LAUNCHER_NAME.to_string());
    vars.insert("launcher_version", LAUNCHER_VERSION.to_string());
    vars.insert("classpath", classpath);
    vars.insert("auth_player_name", auth.player_name.clone());
    vars.insert("auth_uuid", auth.uuid.clone());
    vars.insert("auth_access_token", auth.token.clone());
    vars.insert("user_type", auth.user_type.clone());
    vars.insert("version_name", manifest.id.clone());
    vars.insert("version_type", manifest.version_type.clone());
    vars.insert("game_directory", path_string(&dirs.game_dir));
    vars.insert("assets_root", path_string(&dirs.assets_dir));
    vars.insert("assets_index_name", manifest.assets_index_name().to_string());

    if profile.resolution_width != 0 {
        vars.insert("resolution_width", profile.resolution_width.to_string());
    }
    if profile.resolution_height != 0 {
        vars.insert("resolution_height", profile.resolution_height.to_string());
    }
    vars
}

fn push_included(
    out: &mut Vec<String>,
    args: &[Argument],
    ctx: &RuleContext<'_>,
    vars: &HashMap<&str, String>,
) {
    for arg in args {
        if evaluate(&arg.rules, ctx) != RuleAction::Allow {
            continue;
        }
        out.extend(arg.values.iter().map(|v| substitute_variables(v, vars)));
    }
}

fn push_extra(out: &mut Vec<String>, extra: &str, vars: &HashMap<&str, String>) {
    out.extend(split_extra_args(extra).map(|t| substitute_variables(t, vars)));
}

/// Build the program path and ordered argument list for a launch.
pub fn build_command_line(
    manifest: &VersionManifest,
    profile: &Profile,
    auth: &AuthData,
    dirs: &LaunchDirs,
    platform: &PlatformContext,
    java: &dyn JavaLocator,
) -> Result<CommandLine> {
    let resolved = ResolvedDirs::resolve(profile, dirs).context("Failed to resolve launch directories")?;

    let classpath = build_classpath(
        manifest,
        &resolved.libraries_dir,
        &resolved.versions_dir,
        platform,
    )
    .context("Failed to build classpath")?;

    let program = match profile.java_path {
        Some(ref path) => path.clone(),
        None => java.locate().context("Failed to detect system java")?,
    };

    let vars = build_variables(manifest, profile, auth, &resolved, classpath);
    let ctx = RuleContext::new(platform, profile.features());

    let mut args = Vec::with_capacity(manifest.jvm_arguments.len() + manifest.game_arguments.len() + 8);

    push_included(&mut args, &manifest.jvm_arguments, &ctx, &vars);
    push_extra(&mut args, &profile.extra_jvm_args, &vars);
    if profile.heap_max_mb != 0 {
        args.push(format!("-Xmx{}M", profile.heap_max_mb));
    }

    args.push(manifest.main_class.clone());

    push_included(&mut args, &manifest.game_arguments, &ctx, &vars);
    push_extra(&mut args, &profile.extra_game_args, &vars);

    log::debug!("Command line for {}: {:?} {:?}", manifest.id, program, args);

    Ok(CommandLine { program, args })
}
