use crate::cli::OutputFormat;
use crate::error::ManagerError;
use anyhow::Result;
use owo_colors::OwoColorize;
use semver::Version;
use std::time::Duration;

const RELEASES_PAGE: &str = "https://github.com/dawid-ai/MCP-manager";

pub async fn check_update(version_url: &str, format: OutputFormat) -> Result<()> {
    let current = parse_version(env!("CARGO_PKG_VERSION"))?;

    let client = reqwest::Client::new();
    let response = client
        .get(version_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| {
            ManagerError::Network(format!(
                "Failed to fetch latest version from {}: {}",
                version_url, e
            ))
        })?;

    if !response.status().is_success() {
        return Err(ManagerError::Network(format!(
            "Failed to fetch latest version: HTTP {}",
            response.status()
        ))
        .into());
    }

    let body = response.text().await.map_err(|e| {
        ManagerError::Network(format!("Failed to read latest version: {}", e))
    })?;
    let latest = parse_version(&body)?;
    let newer = latest > current;

    match format {
        OutputFormat::Human => {
            println!("  Current: {}", current);
            println!("  Latest:  {}", latest);
            println!();
            if newer {
                println!(
                    "{} Download it from {}",
                    format!("mcp-manager {} is available.", latest).yellow().bold(),
                    RELEASES_PAGE.cyan()
                );
            } else {
                println!("{}", "mcp-manager is up to date.".green());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "current": current.to_string(),
                "latest": latest.to_string(),
                "update_available": newer,
                "releases_page": RELEASES_PAGE,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Parse `1.2.3` or `v1.2.3`; a missing minor/patch counts as zero.
fn parse_version(raw: &str) -> Result<Version, ManagerError> {
    let trimmed = raw.trim();
    let token = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let parts = token.split('.').count();
    let padded = match parts {
        1 => format!("{}.0.0", token),
        2 => format!("{}.0", token),
        _ => token.to_string(),
    };
    Version::parse(&padded)
        .map_err(|e| ManagerError::Format(format!("Invalid version string {:?}: {}", trimmed, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.0.1\n").unwrap(), Version::new(1, 0, 1));
        assert_eq!(parse_version("v2.3.0").unwrap(), Version::new(2, 3, 0));
        assert_eq!(parse_version("v2").unwrap(), Version::new(2, 0, 0));
        assert_eq!(parse_version("1.4").unwrap(), Version::new(1, 4, 0));
        assert!(parse_version("<html>").is_err());
        assert!(parse_version("").is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(parse_version("v1.0.10").unwrap() > parse_version("1.0.9").unwrap());
        assert!(parse_version("1.0.0").unwrap() == parse_version("v1.0").unwrap());
    }
}
