// ABOUTME: Integration token discovery with precedence chain
// ABOUTME: CLI flag → NOTION_TOKEN env var → XDG config file

use crate::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "NOTION_TOKEN";

pub fn resolve_token(cli_token: Option<String>) -> Result<String> {
    // 1. CLI flag
    if let Some(token) = cli_token.filter(|t| !t.trim().is_empty()) {
        return Ok(token);
    }

    // 2. Environment variable
    if let Ok(token) = env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(token);
        }
    }

    // 3. Config file
    if let Some(path) = config_file_path() {
        if let Some(token) = parse_config_file(&path)? {
            return Ok(token);
        }
    }

    Err(Error::Auth(format!(
        "No Notion token found. Provide via --token, {} env var, or config file",
        TOKEN_ENV
    )))
}

fn config_file_path() -> Option<PathBuf> {
    let config_home = env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))?;

    Some(config_home.join("notion2md").join("config.json"))
}

fn parse_config_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&content)?;

    Ok(json
        .get("token")
        .and_then(|v| v.as_str())
        .filter(|t| !t.trim().is_empty())
        .map(String::from))
}
