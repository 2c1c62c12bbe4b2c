//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.ai-cli/config.json`) and environment.
//! Holds provider API keys plus the custom/excluded CLI tool lists that discovery merges.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::candidate::CloudProvider;

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider name (lowercase, e.g. "claude") -> API key. Overridden by `<PROVIDER>_API_KEY`.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,

    /// Tool names to offer even when the name patterns don't match them.
    #[serde(default)]
    pub custom_cli_tools: Vec<String>,

    /// Tool names never offered, even when a pattern matches.
    #[serde(default)]
    pub excluded_cli_tools: Vec<String>,

    /// Advisory: tools seen on the last scan that look like they come from a versioned
    /// runtime (e.g. npm globals) and may vanish when the runtime version changes.
    #[serde(default)]
    pub known_node_tools: Vec<String>,

    /// Replaces the built-in tool name patterns when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_tool_patterns: Option<ToolPatternsConfig>,

    /// Keys this version does not know; written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Name patterns for AI tool detection, as stored in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPatternsConfig {
    #[serde(default)]
    pub exact_matches: Vec<String>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub suffixes: Vec<String>,
    #[serde(default)]
    pub suffix_exclusions: Vec<String>,
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("AI_CLI_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".ai-cli").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the given path (or the default). Missing file => default config.
/// A file that exists but does not parse is logged and treated as empty.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = match read_config(&path)? {
        Some(Ok(c)) => c,
        Some(Err(e)) => {
            log::warn!("ignoring unparsable config {}: {}", path.display(), e);
            Config::default()
        }
        None => {
            log::debug!("config file not found, using defaults: {}", path.display());
            Config::default()
        }
    };
    Ok((config, path))
}

/// `None` when the file is missing; the inner result is the parse outcome.
fn read_config(path: &Path) -> Result<Option<serde_json::Result<Config>>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    Ok(Some(serde_json::from_str(&s)))
}

/// Write config as pretty JSON, creating the parent directory if needed.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config).context("serializing config")?;
    std::fs::write(path, json).with_context(|| format!("writing config to {}", path.display()))?;
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Resolve a provider's API key: env `<PROVIDER>_API_KEY` overrides config.
pub fn resolve_api_key(config: &Config, provider: CloudProvider) -> Option<String> {
    std::env::var(provider.env_var())
        .ok()
        .and_then(|s| non_empty(&s))
        .or_else(|| config.api_keys.get(provider.id()).and_then(|s| non_empty(s)))
}

/// Whether a provider has a key, and a short preview of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider: CloudProvider,
    pub configured: bool,
    pub key_preview: String,
}

/// Key status for every cloud provider, in listing order.
pub fn providers_status(config: &Config) -> Vec<ProviderStatus> {
    CloudProvider::ALL
        .into_iter()
        .map(|provider| {
            let key = resolve_api_key(config, provider);
            let key_preview = match &key {
                Some(k) if k.chars().count() > 4 => {
                    format!("{}...", k.chars().take(4).collect::<String>())
                }
                _ => "Not set".to_string(),
            };
            ProviderStatus {
                provider,
                configured: key.is_some(),
                key_preview,
            }
        })
        .collect()
}

/// A config file bound to its path. Every mutation loads, edits and saves, so concurrent
/// edits from another process are not lost between commands.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `AI_CLI_CONFIG_PATH` or `~/.ai-cli/config.json`.
    pub fn open_default() -> Self {
        Self::new(default_config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        load_config(Some(self.path.clone())).map(|(c, _)| c)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        save_config(config, &self.path)
    }

    /// Load for modification. Unlike [`ConfigStore::load`], a file that exists but does not
    /// parse is an error, so a later save cannot replace it with defaults.
    fn load_for_update(&self) -> Result<Config> {
        match read_config(&self.path)? {
            Some(parsed) => parsed.with_context(|| {
                format!(
                    "config {} is not valid JSON; fix it before changing settings",
                    self.path.display()
                )
            }),
            None => Ok(Config::default()),
        }
    }

    /// Apply `f` and save when it reports a change.
    fn update(&self, f: impl FnOnce(&mut Config) -> bool) -> Result<bool> {
        let mut config = self.load_for_update()?;
        let changed = f(&mut config);
        if changed {
            self.save(&config)?;
        }
        Ok(changed)
    }

    pub fn set_api_key(&self, provider: CloudProvider, key: &str) -> Result<()> {
        self.update(|c| {
            c.api_keys.insert(provider.id().to_string(), key.trim().to_string());
            true
        })
        .map(|_| ())
    }

    /// Returns false when the tool was already registered.
    pub fn add_custom_tool(&self, tool: &str) -> Result<bool> {
        let tool = tool.trim();
        self.update(|c| push_unique(&mut c.custom_cli_tools, tool))
    }

    /// Returns false when the tool was not registered.
    pub fn remove_custom_tool(&self, tool: &str) -> Result<bool> {
        let tool = tool.trim();
        self.update(|c| remove_all(&mut c.custom_cli_tools, tool))
    }

    /// Returns false when the tool was already excluded.
    pub fn exclude_tool(&self, tool: &str) -> Result<bool> {
        let tool = tool.trim();
        self.update(|c| push_unique(&mut c.excluded_cli_tools, tool))
    }

    /// Returns false when the tool was not excluded.
    pub fn include_tool(&self, tool: &str) -> Result<bool> {
        let tool = tool.trim();
        self.update(|c| remove_all(&mut c.excluded_cli_tools, tool))
    }

    /// Replace the advisory volatile-tool list (deduplicated, sorted). The file is only
    /// rewritten when the list changed.
    pub fn set_known_node_tools(&self, tools: &[String]) -> Result<()> {
        let mut tools = tools.to_vec();
        tools.sort();
        tools.dedup();
        self.update(|c| {
            if c.known_node_tools == tools {
                return false;
            }
            c.known_node_tools = tools;
            true
        })
        .map(|_| ())
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) -> bool {
    if list.iter().any(|t| t == item) {
        return false;
    }
    list.push(item.to_string());
    true
}

fn remove_all(list: &mut Vec<String>, item: &str) -> bool {
    let before = list.len();
    list.retain(|t| t != item);
    list.len() != before
}
