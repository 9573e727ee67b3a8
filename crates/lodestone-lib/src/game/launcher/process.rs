/// Child process spawning and output tee
use crate::game::launcher::types::CommandLine;
use anyhow::{Context, Result};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead};
use tokio::task::JoinHandle;

/// Log callback type - receives (version_id, line, stream_type)
/// stream_type is "stdout" or "stderr"
pub type LogCallback = Arc<dyn Fn(String, String, String) + Send + Sync + 'static>;

fn forward_lines<R>(reader: R, version_id: String, stream: &'static str, callback: LogCallback) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => callback(version_id.clone(), line, stream.to_string()),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Failed to read {} of {}: {}", stream, version_id, e);
                    break;
                }
            }
        }
    })
}

/// Spawn the command in `working_dir` and wait for it to exit.
///
/// With a callback every stdout/stderr line is forwarded to it; without one
/// the child inherits this process's streams.
pub async fn run_command(
    command_line: &CommandLine,
    working_dir: &Path,
    version_id: &str,
    log_callback: Option<LogCallback>,
) -> Result<ExitStatus> {
    tokio::fs::create_dir_all(working_dir)
        .await
        .with_context(|| format!("Failed to create game directory {:?}", working_dir))?;

    let mut command = tokio::process::Command::new(&command_line.program);
    command.args(&command_line.args).current_dir(working_dir);

    if log_callback.is_some() {
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
    } else {
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
    }

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {:?}", command_line.program))?;

    match child.id() {
        Some(pid) => log::info!("Game process for {} started with PID: {}", version_id, pid),
        None => log::info!("Game process for {} started", version_id),
    }

    let mut readers = Vec::new();
    if let Some(callback) = log_callback {
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, version_id.to_string(), "stdout", callback.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, version_id.to_string(), "stderr", callback));
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for game process of {}", version_id))?;

    // Drain remaining output before reporting the exit
    for reader in readers {
        if let Err(e) = reader.await {
            log::warn!("Output reader for {} failed: {}", version_id, e);
        }
    }

    if status.success() {
        log::info!("Game process for {} exited successfully", version_id);
    } else {
        log::error!("Game process for {} exited with error: {}", version_id, status);
    }

    Ok(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tee_stdout_and_stderr() {
        let tmp = TempDir::new().unwrap();
        let lines: Arc<Mutex<Vec<(String, String, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = lines.clone();
        let callback: LogCallback = Arc::new(move |id, line, stream| {
            sink.lock().unwrap().push((id, line, stream));
        });

        let cmd = CommandLine {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo hello; echo oops 1>&2; exit 3".to_string()],
        };

        let status = run_command(&cmd, tmp.path(), "1.20.1", Some(callback))
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));

        let lines = lines.lock().unwrap();
        assert!(lines.contains(&("1.20.1".to_string(), "hello".to_string(), "stdout".to_string())));
        assert!(lines.contains(&("1.20.1".to_string(), "oops".to_string(), "stderr".to_string())));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() {
        let tmp = TempDir::new().unwrap();
        let game_dir = tmp.path().join("game");
        let cmd = CommandLine {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "touch marker".to_string()],
        };
        let status = run_command(&cmd, &game_dir, "x", None).await.unwrap();
        assert!(status.success());
        assert!(game_dir.join("marker").exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let tmp = TempDir::new().unwrap();
        let cmd = CommandLine {
            program: PathBuf::from("/definitely/not/java"),
            args: vec![],
        };
        assert!(run_command(&cmd, tmp.path(), "x", None).await.is_err());
    }
}
