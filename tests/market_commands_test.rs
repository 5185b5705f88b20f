use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::{params, Connection};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Env {
    home: TempDir,
    config: PathBuf,
}

impl Env {
    fn new() -> Self {
        let home = tempdir().unwrap();
        let config = home.path().join("claude_desktop_config.json");
        std::fs::create_dir_all(home.path().join("app")).unwrap();
        Self { home, config }
    }

    fn app_dir(&self) -> PathBuf {
        self.home.path().join("app")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mcp-manager").unwrap();
        cmd.env("MCP_MANAGER_HOME", self.app_dir());
        cmd.env("MCP_MANAGER_CONFIG", &self.config);
        cmd
    }

    fn read_config(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(&self.config).unwrap()).unwrap()
    }
}

fn seed_catalog(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT);
         CREATE TABLE servers (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             name TEXT UNIQUE NOT NULL,
             description TEXT,
             instructions TEXT,
             owner_name TEXT,
             owner_link TEXT,
             repo_link TEXT,
             command TEXT,
             args TEXT,
             env_vars TEXT,
             date_added TEXT
         );
         INSERT INTO metadata (key, value) VALUES ('version', '1.0.0');",
    )
    .unwrap();

    let rows = [
        (
            "memory",
            "Knowledge graph based persistent memory",
            "npx",
            r#"["-y", "@modelcontextprotocol/server-memory"]"#,
            "{}",
        ),
        (
            "brave-search",
            "Web search through the Brave API",
            "npx",
            r#"["-y", "@modelcontextprotocol/server-brave-search"]"#,
            r#"{"BRAVE_API_KEY": "YOUR_KEY"}"#,
        ),
        ("broken", "Bad args column", "npx", "not json", "{}"),
    ];
    for (name, description, command, args, env) in rows {
        conn.execute(
            "INSERT INTO servers (name, description, instructions, owner_name, owner_link, repo_link, command, args, env_vars, date_added)
             VALUES (?1, ?2, 'Get an API key first.', 'Anthropic', '', '', ?3, ?4, ?5, '2024-12-01')",
            params![name, description, command, args, env],
        )
        .unwrap();
    }
}

/// Answer a single HTTP request with `body`, returning the URL to hit.
fn serve_version(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{}/marketplace_ver.txt", addr)
}

fn write_preferences(env: &Env, version_url: &str) {
    std::fs::write(
        env.app_dir().join("preferences.json"),
        serde_json::json!({ "marketplace_version_url": version_url }).to_string(),
    )
    .unwrap();
}

#[test]
fn test_list_without_catalog() {
    let env = Env::new();

    env.cmd()
        .args(["market", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("market update"));

    env.cmd()
        .args(["market", "install", "memory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("market update"));
}

#[test]
fn test_list_and_filter() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));

    env.cmd()
        .args(["market", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("brave-search"))
        .stdout(predicate::str::contains("memory"))
        .stdout(predicate::str::contains("Total: 3"));

    env.cmd()
        .args(["market", "list", "WEB SEARCH"])
        .assert()
        .success()
        .stdout(predicate::str::contains("brave-search"))
        .stdout(predicate::str::contains("memory").not());

    env.cmd()
        .args(["market", "show", "brave-search"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BRAVE_API_KEY"))
        .stdout(predicate::str::contains("Get an API key first."));
}

#[test]
fn test_install_and_confirm_overwrite() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));

    env.cmd()
        .args(["market", "install", "brave-search"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed server: brave-search"));

    let root = env.read_config();
    assert_eq!(
        root["mcpServers"]["brave-search"]["env"]["BRAVE_API_KEY"],
        "YOUR_KEY"
    );

    env.cmd()
        .args(["edit", "brave-search", "--env", "BRAVE_API_KEY=real"])
        .assert()
        .success();

    env.cmd()
        .args(["market", "install", "brave-search"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
    assert_eq!(
        env.read_config()["mcpServers"]["brave-search"]["env"]["BRAVE_API_KEY"],
        "real"
    );

    env.cmd()
        .args(["--format", "json", "market", "install", "brave-search", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"replaced\""));
    assert_eq!(
        env.read_config()["mcpServers"]["brave-search"]["env"]["BRAVE_API_KEY"],
        "YOUR_KEY"
    );
}

#[test]
fn test_install_malformed_entry_leaves_config_alone() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));

    env.cmd()
        .args(["add", "keep", "--cmd", "npx"])
        .assert()
        .success();
    let before = std::fs::read_to_string(&env.config).unwrap();

    env.cmd()
        .args(["market", "install", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format error"));

    assert_eq!(std::fs::read_to_string(&env.config).unwrap(), before);
}

#[test]
fn test_status_reports_unreachable_remote() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));
    write_preferences(&env, "http://127.0.0.1:9/version.txt");

    env.cmd()
        .args(["--format", "json", "market", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local\": \"1.0.0\""))
        .stdout(predicate::str::contains("\"remote\": null"));
}

#[test]
fn test_status_with_corrupt_catalog_offers_update() {
    let env = Env::new();
    std::fs::write(
        env.app_dir().join("marketplace.db"),
        "<html>404: Not Found</html>",
    )
    .unwrap();
    write_preferences(&env, &serve_version("1.0.1\n"));

    env.cmd()
        .args(["--format", "json", "market", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"local\": null"))
        .stdout(predicate::str::contains("\"remote\": \"1.0.1\""))
        .stdout(predicate::str::contains("\"update_available\": true"));
}

#[test]
fn test_status_with_current_catalog() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));
    write_preferences(&env, &serve_version("1.0.0"));

    env.cmd()
        .args(["market", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_update_skips_download_when_current() {
    let env = Env::new();
    seed_catalog(&env.app_dir().join("marketplace.db"));
    let before = std::fs::read(env.app_dir().join("marketplace.db")).unwrap();
    write_preferences(&env, &serve_version("1.0.0"));

    env.cmd()
        .args(["market", "update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));

    assert_eq!(std::fs::read(env.app_dir().join("marketplace.db")).unwrap(), before);
}
