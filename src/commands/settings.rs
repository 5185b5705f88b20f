use crate::cli::OutputFormat;
use crate::config::{
    default_desktop_config_path, expand_path, find_claude_executable, AppDirs, Preferences,
};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn show_settings(
    dirs: &AppDirs,
    prefs: &Preferences,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    let executable = find_claude_executable(&prefs.claude_executable_paths);

    match format {
        OutputFormat::Human => {
            println!("{}", "Paths".bold());
            println!("  {:<18} {}", "Claude config:", config_path.display());
            if let Some(default) = default_desktop_config_path() {
                println!("  {:<18} {}", "Auto-detected:", default.display().dimmed());
            }
            println!("  {:<18} {}", "Preferences:", dirs.preferences_path().display());
            println!("  {:<18} {}", "Backups:", dirs.backup_dir().display());
            println!("  {:<18} {}", "Catalog cache:", dirs.catalog_path().display());
            match &executable {
                Some(path) => println!("  {:<18} {}", "Claude app:", path.display()),
                None => println!("  {:<18} {}", "Claude app:", "not found".yellow()),
            }

            println!();
            println!("{}", "Preferences".bold());
            let custom = prefs.custom_config_path().unwrap_or("(auto-detect)");
            println!("  {:<18} {}", "Config path:", custom);
            if prefs.claude_executable_paths.is_empty() {
                println!("  {:<18} {}", "Executables:", "(defaults)".dimmed());
            } else {
                println!("  {}", "Executables:");
                for path in &prefs.claude_executable_paths {
                    println!("    {}", path);
                }
            }
            println!("  {:<18} {}", "Catalog URL:", prefs.marketplace_db_url);
            println!("  {:<18} {}", "Version URL:", prefs.marketplace_version_url);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "preferences": prefs,
                "config_path": config_path,
                "preferences_path": dirs.preferences_path(),
                "backup_dir": dirs.backup_dir(),
                "catalog_path": dirs.catalog_path(),
                "claude_executable": executable,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn set_config_path(
    dirs: &AppDirs,
    prefs: &mut Preferences,
    path: String,
    format: OutputFormat,
) -> Result<()> {
    let path = path.trim().to_string();
    if !path.is_empty() && !expand_path(&path).exists() {
        tracing::warn!("{} does not exist yet; it will be created on first save", path);
    }
    prefs.claude_desktop_config_path = path.clone();
    prefs.save(&dirs.preferences_path())?;

    match format {
        OutputFormat::Human => {
            if path.is_empty() {
                println!("{} Config path reset to auto-detection", "✓".green());
            } else {
                println!("{} Config path set to {}", "✓".green(), path.cyan());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "claude_desktop_config_path": path });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn add_executable_path(
    dirs: &AppDirs,
    prefs: &mut Preferences,
    path: String,
    format: OutputFormat,
) -> Result<()> {
    let added = prefs.add_executable_path(path.trim().to_string());
    if added {
        prefs.save(&dirs.preferences_path())?;
    }

    match format {
        OutputFormat::Human => {
            if added {
                println!("{} Added executable path: {}", "✓".green(), path.cyan());
            } else {
                println!("{}", format!("Already listed: {}", path).dimmed());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "added": added,
                "claude_executable_paths": prefs.claude_executable_paths,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn remove_executable_path(
    dirs: &AppDirs,
    prefs: &mut Preferences,
    path: String,
    format: OutputFormat,
) -> Result<()> {
    let before = prefs.claude_executable_paths.len();
    prefs.claude_executable_paths.retain(|p| p != path.trim());
    let removed = prefs.claude_executable_paths.len() != before;
    if removed {
        prefs.save(&dirs.preferences_path())?;
    }

    match format {
        OutputFormat::Human => {
            if removed {
                println!("{} Removed executable path: {}", "✓".green(), path.cyan());
            } else {
                println!("{}", format!("Not listed: {}", path).dimmed());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "removed": removed,
                "claude_executable_paths": prefs.claude_executable_paths,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn reset_settings(dirs: &AppDirs, format: OutputFormat) -> Result<()> {
    let prefs = Preferences::default();
    prefs.save(&dirs.preferences_path())?;

    match format {
        OutputFormat::Human => println!("{} Preferences reset to defaults", "✓".green()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&prefs)?),
    }

    Ok(())
}
