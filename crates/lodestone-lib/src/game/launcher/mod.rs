//! Rules, manifests and command-line assembly
pub mod arguments;
pub mod classpath;
pub mod natives;
pub mod process;
pub mod rules;
pub mod types;
pub mod version_parser;

// Re-export commonly used types
pub use arguments::{build_command_line, substitute_variables};
pub use classpath::build_classpath;
pub use natives::{extract_native, extract_natives};
pub use process::{run_command, LogCallback};
pub use rules::{applies, evaluate, is_allowed, FeatureState, Rule, RuleAction, RuleContext};
pub use types::{CommandLine, LaunchDirs, Profile};
pub use version_parser::{parse, Argument, Library, VersionManifest};
