//! Integration tests: tool discovery over scratch search-path directories, driven through
//! the config file the way the binary does it.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use aicli::config::{Config, ConfigStore, ToolPatternsConfig};
use aicli::context::{self, AppContext};
use aicli::discovery::{discover, PatternRuleSet};

fn touch_exec(dir: &Path, name: &str) {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

fn bin_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        touch_exec(dir.path(), name);
    }
    dir
}

fn context_with(config: Config) -> (tempfile::TempDir, AppContext) {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    store.save(&config).unwrap();
    let ctx = AppContext::load(Some(store.path().to_path_buf())).unwrap();
    (dir, ctx)
}

#[test]
fn configured_patterns_replace_the_defaults() {
    let bin = bin_dir(&["claude-helper", "foo", "myai-tool"]);
    let config = Config {
        ai_tool_patterns: Some(ToolPatternsConfig {
            exact_matches: vec!["claude".into()],
            prefixes: vec!["ai-".into()],
            suffixes: vec!["-tool".into()],
            suffix_exclusions: vec![],
        }),
        ..Config::default()
    };
    let (_cfg, ctx) = context_with(config);
    let found = ctx.discover_tools(&[bin.path().to_path_buf()]);
    assert_eq!(found.names(), vec!["myai-tool"]);
}

#[test]
fn a_name_in_several_dirs_is_listed_once() {
    let first = bin_dir(&["aider", "gemini"]);
    let second = bin_dir(&["aider", "ollama"]);
    let dirs: Vec<PathBuf> = vec![first.path().into(), second.path().into()];
    let names = discover(&dirs, &PatternRuleSet::default_rules(), &[] as &[String]);
    assert_eq!(names, vec!["aider", "gemini", "ollama"]);
}

#[test]
fn suffix_exclusions_only_drop_the_excluded_fragment() {
    let bin = bin_dir(&["myandroid-ai", "myhelper-ai"]);
    let names = discover(
        &[bin.path().to_path_buf()],
        &PatternRuleSet::default_rules(),
        &[] as &[String],
    );
    assert_eq!(names, vec!["myhelper-ai"]);
}

#[test]
fn custom_tools_must_exist_on_the_search_path() {
    let bin = bin_dir(&["house-bot"]);
    let config = Config {
        custom_cli_tools: vec!["house-bot".into(), "gone-bot".into()],
        ..Config::default()
    };
    let (_cfg, ctx) = context_with(config);
    let found = ctx.discover_tools(&[bin.path().to_path_buf()]);
    assert_eq!(found.names(), vec!["house-bot"]);
    assert_eq!(found.tools[0].display_label(), "house-bot (custom tool)");
}

#[test]
fn excluded_tools_from_config_are_hidden() {
    let bin = bin_dir(&["aider", "claude"]);
    let config = Config {
        excluded_cli_tools: vec!["Aider".into()],
        ..Config::default()
    };
    let (_cfg, ctx) = context_with(config);
    assert_eq!(ctx.discover_tools(&[bin.path().to_path_buf()]).names(), vec!["claude"]);
}

#[test]
fn runtime_provided_tools_are_recorded_in_the_config() {
    let bin = bin_dir(&["claude", "goose"]);
    let (_cfg, ctx) = context_with(Config::default());
    ctx.discover_tools(&[bin.path().to_path_buf()]);
    let saved = ctx.store.load().unwrap();
    assert_eq!(saved.known_node_tools, vec!["claude"]);
}

#[test]
fn discovery_never_rewrites_an_unparsable_config() {
    let bin = bin_dir(&["claude"]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let broken = r#"{"api_keys":{"claude":"sk-ant-SECRET"},"custom_cli_tools":["house-bot"],}"#;
    std::fs::write(&path, broken).unwrap();

    let ctx = AppContext::load(Some(path.clone())).unwrap();
    let found = ctx.discover_tools(&[bin.path().to_path_buf()]);
    assert_eq!(found.volatile, vec!["claude"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn recording_known_tools_keeps_unknown_keys() {
    let bin = bin_dir(&["claude"]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"api_keys":{"openai":"sk-x"},"theme":"dark"}"#).unwrap();

    let ctx = AppContext::load(Some(path.clone())).unwrap();
    ctx.discover_tools(&[bin.path().to_path_buf()]);
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["theme"], "dark");
    assert_eq!(saved["api_keys"]["openai"], "sk-x");
    assert_eq!(saved["known_node_tools"][0], "claude");
}

#[test]
fn menu_payloads_round_trip_to_discovered_tools() {
    let bin = bin_dir(&["codex"]);
    let (_cfg, ctx) = context_with(Config::default());
    let tools = ctx.discover_tools(&[bin.path().to_path_buf()]).tools;
    let options = context::menu_options(&tools);
    assert_eq!(options, vec![("codex (cli tool)".to_string(), "tool/codex".to_string())]);
    let picked = context::candidate_for_payload(&tools, &options[0].1).unwrap();
    assert_eq!(picked.name(), "codex");
}
