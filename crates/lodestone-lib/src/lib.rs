//! Launcher core: resolves a version manifest into verified files on disk
//! and a ready-to-run JVM command line.
pub mod auth;
pub mod error;
pub mod game;
pub mod utils;

pub use error::{LauncherError, LauncherResult};
