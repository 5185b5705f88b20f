//! On-disk layout of `claude_desktop_config.json`.
//!
//! Active servers live under `mcpServers`, which is the only key Claude
//! Desktop reads. Paused servers and the overall record order are kept in a
//! side section of the same file:
//!
//! ```json
//! {
//!   "mcpServers": { "fetch": { "command": "uvx", "args": ["mcp-server-fetch"] } },
//!   "mcpManager": {
//!     "pausedServers": { "sqlite": { "command": "uvx", "args": ["mcp-server-sqlite"] } },
//!     "order": ["sqlite", "fetch"]
//!   }
//! }
//! ```
//!
//! Every other top-level key belongs to Claude Desktop and is left alone.

use super::{ServerRecord, ServerSpec};
use crate::error::{ManagerError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

pub const SERVERS_KEY: &str = "mcpServers";
pub const MANAGER_KEY: &str = "mcpManager";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManagerSection {
    #[serde(default)]
    paused_servers: Map<String, Value>,
    #[serde(default)]
    order: Vec<String>,
}

/// Parse a config file's contents into its top-level JSON object.
pub fn parse_root(contents: &str) -> Result<Map<String, Value>> {
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| ManagerError::Parse(format!("config is not valid JSON: {}", e)))?;
    match value {
        Value::Object(root) => Ok(root),
        _ => Err(ManagerError::Parse(
            "config root must be a JSON object".to_string(),
        )),
    }
}

/// Decode all records, active and paused, from a config file's contents.
pub fn decode(contents: &str) -> Result<Vec<ServerRecord>> {
    let root = parse_root(contents)?;

    let active = match root.get(SERVERS_KEY) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(servers)) => servers.clone(),
        Some(_) => {
            return Err(ManagerError::Parse(format!(
                "`{}` must be an object keyed by server name",
                SERVERS_KEY
            )))
        }
    };

    let section: ManagerSection = match root.get(MANAGER_KEY) {
        None | Some(Value::Null) => ManagerSection::default(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| ManagerError::Parse(format!("`{}` section: {}", MANAGER_KEY, e)))?,
    };

    let mut records = Vec::with_capacity(active.len() + section.paused_servers.len());
    let mut seen = HashSet::new();

    let entries = active
        .into_iter()
        .map(|entry| (entry, true))
        .chain(section.paused_servers.into_iter().map(|entry| (entry, false)));

    for ((name, value), is_active) in entries {
        if !seen.insert(name.clone()) {
            return Err(ManagerError::Parse(format!(
                "server '{}' is listed as both active and paused",
                name
            )));
        }
        records.push(decode_record(name, value, is_active)?);
    }

    apply_order(&mut records, &section.order);
    Ok(records)
}

/// Write `records` into `root`, keeping unrelated keys and their positions.
pub fn encode(mut root: Map<String, Value>, records: &[ServerRecord]) -> Map<String, Value> {
    let mut active = Map::new();
    let mut paused = Map::new();

    for record in records {
        let spec = spec_value(&record.to_spec());
        if record.active {
            active.insert(record.name.clone(), spec);
        } else {
            paused.insert(record.name.clone(), spec);
        }
    }

    root.insert(SERVERS_KEY.to_string(), Value::Object(active));

    if paused.is_empty() {
        root.shift_remove(MANAGER_KEY);
    } else {
        let order = records.iter().map(|r| Value::String(r.name.clone())).collect();
        let mut section = Map::new();
        section.insert("pausedServers".to_string(), Value::Object(paused));
        section.insert("order".to_string(), Value::Array(order));
        root.insert(MANAGER_KEY.to_string(), Value::Object(section));
    }

    root
}

/// Parse a pasted `{"mcpServers": {...}}` snippet into active records.
pub fn parse_snippet(contents: &str) -> Result<Vec<ServerRecord>> {
    let root = parse_root(contents)?;
    let servers = match root.get(SERVERS_KEY) {
        Some(Value::Object(servers)) => servers.clone(),
        Some(_) => {
            return Err(ManagerError::Parse(format!(
                "`{}` value must be an object",
                SERVERS_KEY
            )))
        }
        None => {
            return Err(ManagerError::Parse(format!(
                "snippet must be an object with an `{}` key",
                SERVERS_KEY
            )))
        }
    };
    if servers.is_empty() {
        return Err(ManagerError::Parse(format!(
            "`{}` contains no server entries",
            SERVERS_KEY
        )));
    }

    servers
        .into_iter()
        .map(|(name, value)| decode_record(name, value, true))
        .collect()
}

fn decode_record(name: String, value: Value, active: bool) -> Result<ServerRecord> {
    if name.trim().is_empty() {
        return Err(ManagerError::Parse("server with an empty name".to_string()));
    }
    let spec: ServerSpec = serde_json::from_value(value)
        .map_err(|e| ManagerError::Parse(format!("server '{}': {}", name, e)))?;
    if spec.command.trim().is_empty() {
        return Err(ManagerError::Parse(format!(
            "server '{}' has an empty command",
            name
        )));
    }
    Ok(ServerRecord::from_spec(name, spec, active))
}

fn spec_value(spec: &ServerSpec) -> Value {
    let mut map = Map::new();
    map.insert("command".to_string(), Value::String(spec.command.clone()));
    if !spec.args.is_empty() {
        map.insert(
            "args".to_string(),
            Value::Array(spec.args.iter().cloned().map(Value::String).collect()),
        );
    }
    if !spec.env.is_empty() {
        let env = spec
            .env
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        map.insert("env".to_string(), Value::Object(env));
    }
    Value::Object(map)
}

// Names missing from `order` keep their file position after the listed ones.
fn apply_order(records: &mut [ServerRecord], order: &[String]) {
    if order.is_empty() {
        return;
    }
    let rank: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    records.sort_by_key(|r| rank.get(r.name.as_str()).copied().unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_active_and_paused() {
        let contents = json!({
            "mcpServers": {
                "fetch": { "command": "uvx", "args": ["mcp-server-fetch"] }
            },
            "mcpManager": {
                "pausedServers": {
                    "sqlite": { "command": "uvx", "env": { "DB": "/tmp/a.db" } }
                },
                "order": ["sqlite", "fetch"]
            }
        })
        .to_string();

        let records = decode(&contents).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "sqlite");
        assert!(!records[0].active);
        assert_eq!(records[0].env.get("DB").unwrap(), "/tmp/a.db");
        assert_eq!(records[1].name, "fetch");
        assert!(records[1].active);
        assert_eq!(records[1].args, vec!["mcp-server-fetch"]);
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let cases = [
            "not json",
            "[1, 2]",
            r#"{"mcpServers": []}"#,
            r#"{"mcpServers": {"a": {"args": []}}}"#,
            r#"{"mcpServers": {"a": {"command": "x", "args": "oops"}}}"#,
            r#"{"mcpServers": {"a": {"command": "x", "args": [1]}}}"#,
            r#"{"mcpServers": {"a": {"command": "x", "env": {"K": 1}}}}"#,
            r#"{"mcpServers": {"a": {"command": "x", "disabled": true}}}"#,
            r#"{"mcpServers": {"a": {"command": ""}}}"#,
            r#"{"mcpServers": {"a": {"command": "x"}}, "mcpManager": {"pausedServers": {"a": {"command": "y"}}}}"#,
        ];
        for contents in cases {
            let err = decode(contents).unwrap_err();
            assert!(
                matches!(err, ManagerError::Parse(_)),
                "expected parse error for {contents}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_encode_preserves_foreign_keys() {
        let root = parse_root(
            r#"{"globalShortcut": "Ctrl+Space", "mcpServers": {}, "theme": "dark"}"#,
        )
        .unwrap();
        let records = vec![ServerRecord::new("fetch", "uvx")];

        let encoded = encode(root, &records);
        let keys: Vec<&str> = encoded.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["globalShortcut", "mcpServers", "theme"]);
        assert_eq!(encoded["mcpServers"]["fetch"], json!({ "command": "uvx" }));
    }

    #[test]
    fn test_encode_drops_manager_section_without_paused() {
        let root = parse_root(r#"{"mcpManager": {"order": ["old"]}}"#).unwrap();
        let encoded = encode(root, &[ServerRecord::new("a", "b")]);
        assert!(!encoded.contains_key(MANAGER_KEY));
    }

    #[test]
    fn test_unlisted_names_follow_file_order() {
        let contents = json!({
            "mcpServers": {
                "b": { "command": "b" },
                "c": { "command": "c" }
            },
            "mcpManager": {
                "pausedServers": { "a": { "command": "a" } },
                "order": ["a", "ghost"]
            }
        })
        .to_string();

        let names: Vec<String> = decode(&contents).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_snippet() {
        let snippet = r#"{
            "mcpServers": {
                "memory": { "command": "npx", "args": ["-y", "@modelcontextprotocol/server-memory"] }
            }
        }"#;
        let records = parse_snippet(snippet).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "memory");
        assert!(records[0].active);

        assert!(matches!(
            parse_snippet(r#"{"mcpServers": {}}"#),
            Err(ManagerError::Parse(_))
        ));
        assert!(matches!(
            parse_snippet(r#"{"servers": {}}"#),
            Err(ManagerError::Parse(_))
        ));
    }
}
