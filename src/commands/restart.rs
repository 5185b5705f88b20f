use crate::cli::OutputFormat;
use crate::config::{find_claude_executable, Preferences};
use crate::error::ManagerError;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub async fn restart_claude(prefs: &Preferences, format: OutputFormat) -> Result<()> {
    let executable = find_claude_executable(&prefs.claude_executable_paths);
    tracing::debug!("Claude executable: {:?}", executable);

    let was_running = stop_claude().await?;
    if was_running {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    let launched = launch_claude(executable.as_deref()).await?;

    match format {
        OutputFormat::Human => {
            if was_running {
                println!("{} Stopped Claude Desktop", "✓".green());
            }
            println!("{} Started Claude Desktop: {}", "✓".green(), launched.display());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "stopped": was_running,
                "launched": launched,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Returns whether a running instance was found and signalled.
async fn stop_claude() -> Result<bool> {
    let (program, args) = stop_command();
    let mut command = Command::new(program);
    command.args(&args);

    let output = command
        .output()
        .await
        .map_err(|e| ManagerError::io(program, e))?;

    tracing::debug!("stop exited with {}", output.status);
    Ok(output.status.success())
}

async fn launch_claude(executable: Option<&Path>) -> Result<PathBuf> {
    let target = if cfg!(target_os = "macos") {
        let app = executable
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("Claude"));
        let status = Command::new("open")
            .arg("-a")
            .arg(&app)
            .status()
            .await
            .map_err(|e| ManagerError::io("open", e))?;
        if !status.success() {
            return Err(not_found().into());
        }
        app
    } else {
        let program = match executable {
            Some(path) => path.to_path_buf(),
            None if cfg!(windows) => return Err(not_found().into()),
            None => PathBuf::from("claude"),
        };
        Command::new(&program)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => not_found(),
                _ => ManagerError::io(&program, e),
            })?;
        program
    };

    Ok(target)
}

// Exact process name; a command-line match would also hit this process
fn stop_command() -> (&'static str, Vec<&'static str>) {
    if cfg!(windows) {
        ("taskkill", vec!["/F", "/IM", "Claude.exe"])
    } else {
        ("pkill", vec!["-x", process_name()])
    }
}

fn process_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "Claude"
    } else {
        "claude"
    }
}

fn not_found() -> ManagerError {
    ManagerError::Validation(
        "Could not find Claude Desktop. Add its location with `mcp-manager settings add-exe-path <path>`."
            .to_string(),
    )
}
