mod cli;
mod commands;
mod config;
mod error;
mod marketplace;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, MarketCommands, SettingsCommands};
use commands::ServerEdit;
use config::{resolve_desktop_config_path, AppDirs, ConfigStore, Preferences, CONFIG_ENV};
use marketplace::{HttpCatalogSource, MarketplaceSync};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(if cli.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::WARN.into()
                }),
        )
        .init();

    let dirs = AppDirs::from_env()?;
    dirs.ensure()?;
    let mut prefs = Preferences::load_or_init(&dirs.preferences_path())?;

    // --config, then MCP_MANAGER_CONFIG, then preferences / OS default
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => resolve_desktop_config_path(prefs.custom_config_path())
                .context("Could not locate claude_desktop_config.json; set it with `mcp-manager settings set-config-path <path>`")?,
        },
    };
    tracing::debug!("Using config file {:?}", config_path);

    let mut store = ConfigStore::with_paths(config_path.clone(), dirs.backup_dir());
    let sync = MarketplaceSync::new(
        HttpCatalogSource::new(
            prefs.marketplace_db_url.clone(),
            prefs.marketplace_version_url.clone(),
        ),
        dirs.catalog_path(),
    );

    match cli.command {
        Commands::List => {
            commands::list_servers(&mut store, cli.format)?;
        }
        Commands::Show { name } => {
            commands::show_server(&mut store, &name, cli.format)?;
        }
        Commands::Add { name, cmd, args, env, paused, yes } => {
            commands::add_server(&mut store, name, cmd, args, env, paused, yes, cli.format)?;
        }
        Commands::Edit {
            name,
            rename,
            cmd,
            args,
            clear_args,
            env,
            unset_env,
            clear_env,
        } => {
            let edit = ServerEdit {
                rename,
                cmd,
                args,
                clear_args,
                env,
                unset_env,
                clear_env,
            };
            commands::edit_server(&mut store, name, edit, cli.format)?;
        }
        Commands::Remove { name } => {
            commands::remove_server(&mut store, name, cli.format)?;
        }
        Commands::Pause { name } => {
            commands::set_paused(&mut store, name, true, cli.format)?;
        }
        Commands::Resume { name } => {
            commands::set_paused(&mut store, name, false, cli.format)?;
        }
        Commands::Import { source, yes } => {
            commands::import_servers(&mut store, &source, yes, cli.format)?;
        }
        Commands::Backup => {
            commands::backup_config(&store, cli.format)?;
        }
        Commands::Restart => {
            commands::restart_claude(&prefs, cli.format).await?;
        }
        Commands::CheckUpdate => {
            commands::check_update(&prefs.app_version_url, cli.format).await?;
        }
        Commands::Market { command } => match command {
            MarketCommands::Status => {
                commands::market_status(&sync, cli.format).await?;
            }
            MarketCommands::Update { force } => {
                commands::market_update(&sync, force, cli.format).await?;
            }
            MarketCommands::List { query } => {
                commands::market_list(&sync, query, cli.format)?;
            }
            MarketCommands::Show { name } => {
                commands::market_show(&sync, &name, cli.format)?;
            }
            MarketCommands::Install { name, yes } => {
                commands::market_install(&sync, &mut store, &name, yes, cli.format)?;
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show => {
                commands::show_settings(&dirs, &prefs, &config_path, cli.format)?;
            }
            SettingsCommands::SetConfigPath { path } => {
                commands::set_config_path(&dirs, &mut prefs, path, cli.format)?;
            }
            SettingsCommands::AddExePath { path } => {
                commands::add_executable_path(&dirs, &mut prefs, path, cli.format)?;
            }
            SettingsCommands::RemoveExePath { path } => {
                commands::remove_executable_path(&dirs, &mut prefs, path, cli.format)?;
            }
            SettingsCommands::Reset => {
                commands::reset_settings(&dirs, cli.format)?;
            }
        },
    }

    Ok(())
}
