/// Conditional rules gating libraries and arguments
use crate::game::installer::types::PlatformContext;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rule for conditional arguments/libraries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Feature flags derived from the launch profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureState {
    pub is_demo_user: bool,
    pub has_custom_resolution: bool,
}

impl FeatureState {
    pub fn new(is_demo_user: bool, resolution_width: u32, resolution_height: u32) -> Self {
        Self {
            is_demo_user,
            has_custom_resolution: resolution_width != 0 && resolution_height != 0,
        }
    }

    fn lookup(&self, key: &str) -> Option<bool> {
        match key {
            "is_demo_user" => Some(self.is_demo_user),
            "has_custom_resolution" => Some(self.has_custom_resolution),
            _ => None,
        }
    }
}

/// Everything a rule may be evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub platform: &'a PlatformContext,
    pub features: FeatureState,
}

impl<'a> RuleContext<'a> {
    pub fn new(platform: &'a PlatformContext, features: FeatureState) -> Self {
        Self { platform, features }
    }

    /// Context used for library inclusion: no profile features set.
    pub fn for_libraries(platform: &'a PlatformContext) -> Self {
        Self::new(platform, FeatureState::default())
    }
}

fn regex_matches(pattern: &str, haystack: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(haystack),
        Err(e) => {
            log::warn!("Invalid rule pattern '{}': {}", pattern, e);
            false
        }
    }
}

/// Whether every populated predicate of `rule` matches `ctx`.
pub fn applies(rule: &Rule, ctx: &RuleContext<'_>) -> bool {
    if let Some(ref os_rule) = rule.os {
        if let Some(ref name) = os_rule.name {
            if !regex_matches(name, ctx.platform.os.as_str()) {
                return false;
            }
        }

        if let Some(ref version) = os_rule.version {
            match ctx.platform.os_version {
                Some(ref host_version) => {
                    if !regex_matches(version, host_version) {
                        return false;
                    }
                }
                None => {
                    log::info!(
                        "OS version unknown, rule on version '{}' does not match",
                        version
                    );
                    return false;
                }
            }
        }

        if let Some(ref arch) = os_rule.arch {
            match ctx.platform.arch.rule_name() {
                Some(host_arch) if host_arch == arch => {}
                _ => return false,
            }
        }
    }

    if let Some(ref features) = rule.features {
        for (key, wanted) in features {
            // Unknown features never match
            match ctx.features.lookup(key) {
                Some(actual) if actual == *wanted => {}
                _ => return false,
            }
        }
    }

    true
}

/// Fold a rule list: last applying rule wins, nothing applying means
/// Disallow, and an empty list means Allow.
pub fn evaluate(rules: &[Rule], ctx: &RuleContext<'_>) -> RuleAction {
    if rules.is_empty() {
        return RuleAction::Allow;
    }

    rules
        .iter()
        .fold(RuleAction::Disallow, |acc, rule| {
            if applies(rule, ctx) {
                rule.action
            } else {
                acc
            }
        })
}

/// Convenience for optional rule lists; `None` means Allow.
pub fn is_allowed(rules: Option<&[Rule]>, ctx: &RuleContext<'_>) -> bool {
    match rules {
        Some(rules) => evaluate(rules, ctx) == RuleAction::Allow,
        None => true,
    }
}
