use crate::cli::OutputFormat;
use crate::config::ConfigStore;
use crate::error::ManagerError;
use crate::marketplace::{
    confirm_import, import_entry, CatalogSource, ImportOutcome, MarketplaceEntry, MarketplaceSync,
};
use anyhow::{anyhow, bail, Result};
use owo_colors::OwoColorize;

pub async fn market_status<S: CatalogSource>(
    sync: &MarketplaceSync<S>,
    format: OutputFormat,
) -> Result<()> {
    let status = sync.status().await;
    let available = status.update_available();

    match format {
        OutputFormat::Human => {
            let local_display = match &status.local {
                Some(version) => version.to_string(),
                None if sync.catalog().exists() => "unreadable".to_string(),
                None => "not downloaded".to_string(),
            };
            println!("{:<12} {}", "Local:".bold(), local_display);
            match &status.remote {
                Ok(version) => println!("{:<12} {}", "Remote:".bold(), version),
                Err(e) => println!("{:<12} {} ({})", "Remote:".bold(), "N/A".red(), e),
            }
            match available {
                Some(true) => println!(
                    "\n{} Run `mcp-manager market update` to download it.",
                    "Update available.".yellow().bold()
                ),
                Some(false) => println!("\n{}", "Catalog is up to date.".green()),
                None => {}
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "local": status.local,
                "remote": status.remote.as_ref().ok(),
                "remote_error": status.remote.as_ref().err().map(|e| e.to_string()),
                "update_available": available,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub async fn market_update<S: CatalogSource>(
    sync: &MarketplaceSync<S>,
    force: bool,
    format: OutputFormat,
) -> Result<()> {
    if !force {
        match sync.is_update_available().await {
            Ok(false) => {
                match format {
                    OutputFormat::Human => {
                        println!("{}", "Catalog is already up to date.".green())
                    }
                    OutputFormat::Json => {
                        let output = serde_json::json!({
                            "updated": false,
                            "version": sync.local_version()?,
                        });
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    }
                }
                return Ok(());
            }
            Ok(true) => {}
            Err(e) => tracing::warn!("Could not check the catalog version, downloading anyway: {}", e),
        }
    }

    if let OutputFormat::Human = format {
        println!("Downloading marketplace catalog...");
    }

    let update = tokio::select! {
        result = sync.update_catalog() => result?,
        _ = tokio::signal::ctrl_c() => {
            bail!("Catalog update cancelled; the existing catalog was kept");
        }
    };

    match format {
        OutputFormat::Human => {
            let version = update
                .version
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unversioned".to_string());
            println!(
                "{} Marketplace catalog updated to {}",
                "✓".green(),
                version.cyan()
            );
            println!(
                "  {}",
                format!("{} bytes, sha256 {}", update.bytes, update.sha256).dimmed()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&update)?);
        }
    }

    Ok(())
}

pub fn market_list<S: CatalogSource>(
    sync: &MarketplaceSync<S>,
    query: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let entries = sync.list_entries(query.as_deref())?;

    match format {
        OutputFormat::Human => {
            if !sync.catalog().exists() {
                println!(
                    "{}",
                    "No marketplace catalog yet. Run `mcp-manager market update` first.".dimmed()
                );
                return Ok(());
            }
            if entries.is_empty() {
                println!("{}", "No servers found.".dimmed());
                return Ok(());
            }

            for entry in &entries {
                println!("  {}", entry.name.green().bold());
                if !entry.owner_name.is_empty() {
                    println!("    {}", format!("by {}", entry.owner_name).dimmed());
                }
                for line in textwrap::wrap(&entry.description, 70) {
                    println!("    {}", line.dimmed());
                }
                println!();
            }

            println!("{}", format!("Total: {} server(s)", entries.len()).dimmed());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

pub fn market_show<S: CatalogSource>(
    sync: &MarketplaceSync<S>,
    name: &str,
    format: OutputFormat,
) -> Result<()> {
    let entry = find_entry(sync, name)?;

    match format {
        OutputFormat::Human => {
            println!("{}: {}", "Server".bold(), entry.name.cyan());
            if !entry.description.is_empty() {
                println!();
                for line in textwrap::wrap(&entry.description, 76) {
                    println!("{}", line);
                }
            }
            println!();
            if !entry.owner_name.is_empty() || !entry.owner_link.is_empty() {
                println!("{}: {} {}", "Owner".bold(), entry.owner_name, entry.owner_link.dimmed());
            }
            if !entry.repo_link.is_empty() {
                println!("{}: {}", "Repository".bold(), entry.repo_link);
            }
            if let Some(date) = &entry.date_added {
                println!("{}: {}", "Added".bold(), date);
            }
            println!("{}: {}", "Command".bold(), entry.command);
            println!("{}: {}", "Args".bold(), entry.args);
            println!("{}: {}", "Env".bold(), entry.env_vars);
            if !entry.instructions.is_empty() {
                println!();
                println!("{}", "Instructions".bold());
                for line in entry.instructions.lines() {
                    for wrapped in textwrap::wrap(line, 76) {
                        println!("  {}", wrapped);
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
    }

    Ok(())
}

pub fn market_install<S: CatalogSource>(
    sync: &MarketplaceSync<S>,
    store: &mut ConfigStore,
    name: &str,
    overwrite: bool,
    format: OutputFormat,
) -> Result<()> {
    let entry = find_entry(sync, name)?;
    store.reload()?;

    let outcome = match import_entry(&entry, store)? {
        ImportOutcome::NeedsConfirmation if overwrite => confirm_import(&entry, store)?,
        ImportOutcome::NeedsConfirmation => {
            return Err(ManagerError::Validation(format!(
                "Server '{}' already exists in your config. Re-run with --yes to overwrite it.",
                entry.name
            ))
            .into());
        }
        outcome => outcome,
    };
    let backup = store.save()?;

    match format {
        OutputFormat::Human => {
            let verb = match outcome {
                ImportOutcome::Replaced => "Replaced",
                _ => "Installed",
            };
            println!("{} {} server: {}", "✓".green(), verb, entry.name.cyan());
            if let Some(path) = &backup {
                println!("  {}", format!("Backup: {}", path.display()).dimmed());
            }
            if !entry.instructions.is_empty() {
                println!();
                println!("{}", "Setup instructions:".bold());
                for line in entry.instructions.lines() {
                    println!("  {}", line);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "server": entry.name,
                "outcome": outcome,
                "backup": backup,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn find_entry<S: CatalogSource>(sync: &MarketplaceSync<S>, name: &str) -> Result<MarketplaceEntry> {
    sync.entry(name)?.ok_or_else(|| {
        if sync.catalog().exists() {
            anyhow!("Server '{}' not found in the marketplace catalog", name)
        } else {
            anyhow!("No marketplace catalog yet. Run `mcp-manager market update` first.")
        }
    })
}
