//! Install and launch a version into a launcher directory.
//!
//! cargo run --example launch_version -- <root-dir> [version|latest] [player]

use std::sync::Arc;

use anyhow::Result;

use lodestone_lib::auth::{AuthProvider, OfflineAuth};
use lodestone_lib::game::installer::ProgressReporter;
use lodestone_lib::game::launcher::{LogCallback, Profile};
use lodestone_lib::game::GameRoot;

struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn start_step(&self, name: &str, total_steps: Option<u32>) {
        println!("[STEP START] {} (total: {:?})", name, total_steps);
    }

    fn set_step_count(&self, current: u32, total: Option<u32>) {
        println!("[STEP COUNT] {}/{:?}", current, total);
    }

    fn done(&self, success: bool, message: Option<&str>) {
        println!("[DONE] success={} message={:?}", success, message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let root_dir = match args.next() {
        Some(dir) => dir,
        None => {
            eprintln!("usage: launch_version <root-dir> [version|latest] [player]");
            std::process::exit(2);
        }
    };
    let requested = args.next().unwrap_or_else(|| "latest".to_string());
    let player = args.next().unwrap_or_else(|| "Player".to_string());

    let auth = OfflineAuth.login(&player, "").await?;
    let mut root = GameRoot::new(&root_dir, auth)?.with_reporter(Arc::new(ConsoleReporter));

    let versions = root.versions().await?;
    println!("{} versions known", versions.len());

    let version_id = if requested == "latest" {
        root.latest_release().to_string()
    } else {
        requested
    };

    let manifest = root.get_version(&version_id).await?;
    root.update_version(&manifest).await?;

    let profile = Profile::new(&version_id, std::path::Path::new(&root_dir).join("game"));
    let log_callback: LogCallback = Arc::new(|_version, line, stream| {
        println!("[{}] {}", stream, line);
    });

    let status = root.run_version(&manifest, &profile, Some(log_callback)).await?;
    println!("Game exited with {}", status);
    Ok(())
}
