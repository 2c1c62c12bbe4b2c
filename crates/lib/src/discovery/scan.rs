//! Search-path walk: find executables whose names match the rule set.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::rules::PatternRuleSet;
use crate::candidate::Candidate;

/// Name fragments suggesting a tool is installed by a versioned runtime (npm globals and
/// similar) and may disappear when that runtime is switched.
const VOLATILE_INDICATORS: &[&str] = &[
    "node_modules",
    "npm",
    "yarn",
    "pnpm",
    "claude",
    "gemini",
    "chatgpt",
    "gpt",
    "ai",
    "llm",
];

/// Result of a tool scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Found tools, sorted by name, each name at most once.
    pub tools: Vec<Candidate>,
    /// Names in `tools` that look runtime-provided; the caller may persist them.
    pub volatile: Vec<String>,
}

impl Discovery {
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(Candidate::name).collect()
    }
}

/// Directories listed in `PATH`, in order. Unset or empty `PATH` yields none.
pub fn search_path_dirs() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|p| {
            std::env::split_paths(&p)
                .filter(|d| !d.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// `which`-style lookup: first executable named `name` in `dirs`. A name containing a path
/// separator is checked as a path instead.
pub fn resolve_on_path(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        let path = PathBuf::from(name);
        return is_executable(&path).then_some(path);
    }
    for dir in dirs {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let with_ext = dir.join(format!("{}.exe", name));
            if is_executable(&with_ext) {
                return Some(with_ext);
            }
        }
    }
    None
}

/// Scan one directory, adding matches not already seen. Unreadable directories and
/// entries contribute nothing.
fn scan_dir(
    dir: &Path,
    rules: &PatternRuleSet,
    seen: &mut HashSet<String>,
    found: &mut BTreeMap<String, Candidate>,
) {
    if !dir.is_dir() {
        return;
    }
    let read_dir = match std::fs::read_dir(dir) {
        Ok(d) => d,
        Err(e) => {
            log::debug!("skipping unreadable search path dir {}: {}", dir.display(), e);
            return;
        }
    };
    for entry in read_dir.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if seen.contains(&name) || rules.is_excluded(&name) {
            continue;
        }
        let path = entry.path();
        if !is_executable(&path) {
            continue;
        }
        if let Some(rule) = rules.classify(&name) {
            log::debug!("found {} in {} ({:?} match)", name, dir.display(), rule);
            seen.insert(name.clone());
            found.insert(name.clone(), Candidate::detected_tool(name));
        }
    }
}

/// Scan `dirs` in order for AI tools, then merge in `custom_tools` that still resolve on
/// the same search path. The first directory providing a name wins.
pub fn discover_tools<S: AsRef<str>>(
    dirs: &[PathBuf],
    rules: &PatternRuleSet,
    custom_tools: &[S],
) -> Discovery {
    let mut seen = HashSet::new();
    let mut found = BTreeMap::new();

    for dir in dirs {
        scan_dir(dir, rules, &mut seen, &mut found);
    }

    for tool in custom_tools {
        let tool = tool.as_ref().trim();
        if tool.is_empty() || seen.contains(tool) || rules.is_excluded(tool) {
            continue;
        }
        if resolve_on_path(tool, dirs).is_none() {
            log::debug!("custom tool {} is not on the search path, skipping", tool);
            continue;
        }
        seen.insert(tool.to_string());
        found.insert(tool.to_string(), Candidate::custom_tool(tool));
    }

    let tools: Vec<Candidate> = found.into_values().collect();
    let volatile = tools
        .iter()
        .map(Candidate::name)
        .filter(|n| is_volatile(n))
        .collect();
    log::info!("discovered {} cli tools across {} dirs", tools.len(), dirs.len());
    Discovery { tools, volatile }
}

/// Sorted, unique tool names found on `dirs` plus resolvable `custom_tools`.
pub fn discover<S: AsRef<str>>(
    dirs: &[PathBuf],
    rules: &PatternRuleSet,
    custom_tools: &[S],
) -> Vec<String> {
    discover_tools(dirs, rules, custom_tools).names()
}

fn is_volatile(name: &str) -> bool {
    let lower = name.to_lowercase();
    VOLATILE_INDICATORS.iter().any(|i| lower.contains(i))
}
