use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcp-manager")]
#[command(version, about = "Manage MCP servers in Claude Desktop's config", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Path to claude_desktop_config.json (skips auto-detection)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured servers, active and paused
    List,
    /// Show one server's full configuration
    Show {
        /// Server name
        name: String,
    },
    /// Add a new MCP server
    Add {
        /// Server name
        name: String,
        /// Command to spawn
        #[arg(long)]
        cmd: String,
        /// Argument passed to the command (repeatable, order is kept)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Environment variables (KEY=value format)
        #[arg(long, value_parser = parse_env_var)]
        env: Vec<(String, String)>,
        /// Add the server paused
        #[arg(long)]
        paused: bool,
        /// Overwrite an existing server with the same name
        #[arg(short, long)]
        yes: bool,
    },
    /// Edit an existing server
    Edit {
        /// Server name
        name: String,
        /// New name for the server
        #[arg(long)]
        rename: Option<String>,
        /// New command
        #[arg(long)]
        cmd: Option<String>,
        /// Replace the argument list (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,
        /// Remove all arguments
        #[arg(long, conflicts_with = "args")]
        clear_args: bool,
        /// Set environment variables (KEY=value format)
        #[arg(long, value_parser = parse_env_var)]
        env: Vec<(String, String)>,
        /// Remove an environment variable
        #[arg(long)]
        unset_env: Vec<String>,
        /// Remove all environment variables before applying --env
        #[arg(long)]
        clear_env: bool,
    },
    /// Remove a server completely
    Remove {
        /// Server name
        name: String,
    },
    /// Pause a server: keep its configuration but hide it from Claude Desktop
    Pause {
        /// Server name
        name: String,
    },
    /// Resume a paused server
    Resume {
        /// Server name
        name: String,
    },
    /// Import servers from an {"mcpServers": {...}} JSON snippet
    Import {
        /// File to read, or `-` for stdin
        source: String,
        /// Overwrite existing servers with the same names
        #[arg(short, long)]
        yes: bool,
    },
    /// Back up the current config file
    Backup,
    /// Restart Claude Desktop so it picks up config changes
    Restart,
    /// Check whether a newer mcp-manager release exists
    CheckUpdate,
    /// Browse and install servers from the marketplace catalog
    Market {
        #[command(subcommand)]
        command: MarketCommands,
    },
    /// View or change preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
pub enum MarketCommands {
    /// Compare local and remote catalog versions
    Status,
    /// Download the latest catalog
    Update {
        /// Download even when the local version matches the remote one
        #[arg(short, long)]
        force: bool,
    },
    /// List catalog servers
    List {
        /// Case-insensitive filter on name and description
        query: Option<String>,
    },
    /// Show a catalog server's details and setup instructions
    Show {
        /// Catalog server name
        name: String,
    },
    /// Copy a catalog server into the config
    Install {
        /// Catalog server name
        name: String,
        /// Overwrite an existing server with the same name
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show preferences and the paths in use
    Show,
    /// Use a custom claude_desktop_config.json location (empty to auto-detect)
    SetConfigPath {
        path: String,
    },
    /// Add a Claude Desktop executable location, tried before the defaults
    AddExePath {
        path: String,
    },
    /// Remove a custom executable location
    RemoveExePath {
        path: String,
    },
    /// Restore default preferences
    Reset,
}

fn parse_env_var(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    let key = s[..pos].trim();
    if key.is_empty() {
        return Err(format!("invalid KEY=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), s[pos + 1..].to_string()))
}
