//! Name patterns that decide which executables count as AI tools.

use std::collections::HashSet;

use crate::config::{Config, ToolPatternsConfig};

const DEFAULT_EXACT: &[&str] = &[
    "aichat",
    "aider",
    "amp",
    "chatgpt",
    "claude",
    "codex",
    "copilot",
    "crush",
    "cursor-agent",
    "fabric",
    "gemini",
    "goose",
    "llm",
    "mods",
    "ollama",
    "opencode",
    "qwen",
    "sgpt",
    "tgpt",
];

const DEFAULT_PREFIXES: &[&str] = &["ai-", "gpt-", "llm-", "ollama-"];

const DEFAULT_SUFFIXES: &[&str] = &["-ai", "-gpt", "-llm", "-copilot", "-agent"];

/// Substrings that veto a suffix match (e.g. `ssh-agent` is not an AI agent).
const DEFAULT_SUFFIX_EXCLUSIONS: &[&str] = &["ssh-agent", "gpg-agent", "polkit", "keyring", "android"];

/// Never offered: this binary itself.
const DEFAULT_EXCLUDED: &[&str] = &["ai-cli"];

/// Which rule accepted a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    Prefix,
    Suffix,
}

/// Matching policy for tool names. All entries are stored lowercase and names are
/// lowercased before matching; `excluded` wins over every positive rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternRuleSet {
    exact: HashSet<String>,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
    suffix_exclusions: Vec<String>,
    excluded: HashSet<String>,
}

fn lowered<I, S>(items: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

impl PatternRuleSet {
    /// Built-in curated policy.
    pub fn default_rules() -> Self {
        Self::default()
            .exact(DEFAULT_EXACT)
            .prefixes(DEFAULT_PREFIXES)
            .suffixes(DEFAULT_SUFFIXES)
            .suffix_exclusions(DEFAULT_SUFFIX_EXCLUSIONS)
            .excluded(DEFAULT_EXCLUDED)
    }

    /// Built-in policy with `ai_tool_patterns` from config replacing the positive rules when
    /// present, and the config's `excluded_cli_tools` added to the built-in exclusions.
    pub fn from_config(config: &Config) -> Self {
        let rules = match &config.ai_tool_patterns {
            Some(p) => Self::from_patterns(p).excluded(DEFAULT_EXCLUDED),
            None => Self::default_rules(),
        };
        rules.excluded(&config.excluded_cli_tools)
    }

    fn from_patterns(p: &ToolPatternsConfig) -> Self {
        Self::default()
            .exact(&p.exact_matches)
            .prefixes(&p.prefixes)
            .suffixes(&p.suffixes)
            .suffix_exclusions(&p.suffix_exclusions)
    }

    pub fn exact<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exact.extend(lowered(names));
        self
    }

    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefixes.extend(lowered(prefixes));
        self
    }

    pub fn suffixes<I, S>(mut self, suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.suffixes.extend(lowered(suffixes));
        self
    }

    pub fn suffix_exclusions<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.suffix_exclusions.extend(lowered(fragments));
        self
    }

    pub fn excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded.extend(lowered(names));
        self
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(&name.to_lowercase())
    }

    /// Classify a name with priority exact > prefix > suffix. Suffix exclusions only veto
    /// the suffix tier. Does not consult `excluded`; callers check that first.
    pub fn classify(&self, name: &str) -> Option<MatchRule> {
        let lower = name.to_lowercase();
        if self.exact.contains(&lower) {
            return Some(MatchRule::Exact);
        }
        if self.prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return Some(MatchRule::Prefix);
        }
        if self.suffixes.iter().any(|s| lower.ends_with(s.as_str()))
            && !self.suffix_exclusions.iter().any(|x| lower.contains(x.as_str()))
        {
            return Some(MatchRule::Suffix);
        }
        None
    }

    /// True when the name is not excluded and some rule accepts it.
    pub fn matches(&self, name: &str) -> bool {
        !self.is_excluded(name) && self.classify(name).is_some()
    }
}
