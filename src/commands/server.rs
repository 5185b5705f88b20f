use crate::cli::OutputFormat;
use crate::config::{document, ConfigStore, ServerRecord};
use crate::error::ManagerError;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::Path;

pub struct ServerEdit {
    pub rename: Option<String>,
    pub cmd: Option<String>,
    pub args: Vec<String>,
    pub clear_args: bool,
    pub env: Vec<(String, String)>,
    pub unset_env: Vec<String>,
    pub clear_env: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn add_server(
    store: &mut ConfigStore,
    name: String,
    cmd: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    paused: bool,
    overwrite: bool,
    format: OutputFormat,
) -> Result<()> {
    store.reload()?;

    if store.contains(&name) && !overwrite {
        return Err(ManagerError::Validation(format!(
            "Server '{}' already exists. Re-run with --yes to replace it.",
            name
        ))
        .into());
    }

    let mut record = ServerRecord::new(name.clone(), cmd)
        .with_args(args)
        .with_env(env);
    record.active = !paused;

    let replaced = store.upsert(record)?;
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            let verb = if replaced { "Replaced" } else { "Added" };
            println!("{} {} server: {}", "✓".green(), verb, name.cyan());
            if paused {
                println!("  {}", "(paused: not visible to Claude Desktop)".dimmed());
            }
            print_backup(backup.as_deref());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "added": name,
                "replaced": replaced,
                "backup": backup,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn edit_server(
    store: &mut ConfigStore,
    name: String,
    edit: ServerEdit,
    format: OutputFormat,
) -> Result<()> {
    store.reload()?;

    let mut record = store
        .get(&name)
        .cloned()
        .ok_or_else(|| ManagerError::server_not_found(&name))?;

    if let Some(cmd) = edit.cmd {
        record.command = cmd;
    }
    if edit.clear_args {
        record.args.clear();
    } else if !edit.args.is_empty() {
        record.args = edit.args;
    }
    if edit.clear_env {
        record.env.clear();
    }
    for key in &edit.unset_env {
        record.env.remove(key);
    }
    record.env.extend(edit.env);

    store.upsert(record)?;
    let final_name = match edit.rename {
        Some(new_name) => {
            store.rename(&name, &new_name)?;
            new_name
        }
        None => name.clone(),
    };
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            if final_name != name {
                println!(
                    "{} Updated server: {} (renamed from {})",
                    "✓".green(),
                    final_name.cyan(),
                    name.dimmed()
                );
            } else {
                println!("{} Updated server: {}", "✓".green(), final_name.cyan());
            }
            print_backup(backup.as_deref());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "updated": final_name,
                "server": store.get(&final_name),
                "backup": backup,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn list_servers(store: &mut ConfigStore, format: OutputFormat) -> Result<()> {
    store.reload()?;

    match format {
        OutputFormat::Human => {
            if store.records().is_empty() {
                println!(
                    "{}",
                    "No servers configured. Use `mcp-manager add` or `mcp-manager market install` to add one."
                        .dimmed()
                );
                return Ok(());
            }

            println!(
                "{:<24} {:<8} {:<20} {}",
                "NAME".bold(),
                "STATUS".bold(),
                "COMMAND".bold(),
                "ARGS".bold()
            );
            println!("{}", "─".repeat(80).dimmed());

            for record in store.records() {
                let status = if record.active {
                    format!("{:<8}", "active").green().to_string()
                } else {
                    format!("{:<8}", "paused").yellow().to_string()
                };
                println!(
                    "{:<24} {} {:<20} {}",
                    record.name.cyan().to_string(),
                    status,
                    record.command,
                    record.args.join(" ").dimmed()
                );
            }

            let active = store.active_count();
            println!();
            println!(
                "{}",
                format!(
                    "{} active, {} paused - {}",
                    active,
                    store.records().len() - active,
                    store.path().display()
                )
                .dimmed()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "config": store.path(),
                "servers": store.records(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn show_server(store: &mut ConfigStore, name: &str, format: OutputFormat) -> Result<()> {
    store.reload()?;
    let record = store
        .get(name)
        .ok_or_else(|| ManagerError::server_not_found(name))?;

    match format {
        OutputFormat::Human => {
            println!("{}: {}", "Server".bold(), record.name.cyan());
            let status = if record.active {
                record.status().green().to_string()
            } else {
                record.status().yellow().to_string()
            };
            println!("{}: {}", "Status".bold(), status);
            println!("{}: {}", "Command".bold(), record.command);
            if !record.args.is_empty() {
                println!("{}:", "Args".bold());
                for arg in &record.args {
                    println!("  {}", arg);
                }
            }
            if !record.env.is_empty() {
                println!("{}:", "Env".bold());
                for (key, value) in &record.env {
                    println!("  {}={}", key.yellow(), value);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
    }

    Ok(())
}

pub fn remove_server(store: &mut ConfigStore, name: String, format: OutputFormat) -> Result<()> {
    store.reload()?;

    if store.remove(&name).is_none() {
        return Err(ManagerError::server_not_found(&name).into());
    }
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            println!("{} Removed server: {}", "✓".green(), name.cyan());
            print_backup(backup.as_deref());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "removed": name, "backup": backup });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn set_paused(
    store: &mut ConfigStore,
    name: String,
    paused: bool,
    format: OutputFormat,
) -> Result<()> {
    store.reload()?;
    store.set_active(&name, !paused)?;
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            let verb = if paused { "Paused" } else { "Resumed" };
            println!("{} {} server: {}", "✓".green(), verb, name.cyan());
            print_backup(backup.as_deref());
            println!(
                "  {}",
                "Restart Claude Desktop to apply (`mcp-manager restart`).".dimmed()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "server": name,
                "status": if paused { "paused" } else { "active" },
                "backup": backup,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn import_servers(
    store: &mut ConfigStore,
    source: &str,
    overwrite: bool,
    format: OutputFormat,
) -> Result<()> {
    let contents = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read snippet from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read snippet from {}", source))?
    };

    let records = document::parse_snippet(&contents)?;
    store.reload()?;

    let collisions: Vec<&str> = records
        .iter()
        .filter(|r| store.contains(&r.name))
        .map(|r| r.name.as_str())
        .collect();
    if !collisions.is_empty() && !overwrite {
        return Err(ManagerError::Validation(format!(
            "Already configured: {}. Re-run with --yes to overwrite.",
            collisions.join(", ")
        ))
        .into());
    }

    let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();
    for record in records {
        store.upsert(record)?;
    }
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            for name in &names {
                println!("{} Imported server: {}", "✓".green(), name.cyan());
            }
            print_backup(backup.as_deref());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "imported": names, "backup": backup });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn backup_config(store: &ConfigStore, format: OutputFormat) -> Result<()> {
    let backup = store.backup()?;

    match format {
        OutputFormat::Human => match &backup {
            Some(path) => println!("{} Backup created: {}", "✓".green(), path.display()),
            None => println!(
                "{}",
                format!(
                    "No config file to back up at {} (backups go to {})",
                    store.path().display(),
                    store.backup_dir().display()
                )
                .dimmed()
            ),
        },
        OutputFormat::Json => {
            let output = serde_json::json!({
                "backup": backup,
                "backup_dir": store.backup_dir(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_backup(backup: Option<&Path>) {
    if let Some(path) = backup {
        println!("  {}", format!("Backup: {}", path.display()).dimmed());
    }
}
