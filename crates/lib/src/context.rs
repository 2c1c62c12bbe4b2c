//! Per-invocation application context.
//!
//! Built once by the binary and passed down, so discovery, selection and dispatch share one
//! config snapshot and one set of clients without process-wide state.

use std::path::PathBuf;

use anyhow::Result;

use crate::candidate::{Candidate, CandidateKind};
use crate::config::{Config, ConfigStore};
use crate::discovery::{self, Discovery, PatternRuleSet};
use crate::exec::SystemLauncher;
use crate::llm::ProviderHub;

#[derive(Debug)]
pub struct AppContext<P = ProviderHub, L = SystemLauncher> {
    pub store: ConfigStore,
    pub config: Config,
    pub provider: P,
    pub launcher: L,
}

impl AppContext {
    /// Load config from `config_path` (or the default) and build the real clients.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let store = config_path
            .map(ConfigStore::new)
            .unwrap_or_else(ConfigStore::open_default);
        let config = store.load()?;
        let provider = ProviderHub::from_config(&config);
        Ok(Self {
            store,
            config,
            provider,
            launcher: SystemLauncher,
        })
    }

    /// Cloud models with keys and local Ollama models, then CLI tools on `PATH`.
    pub async fn candidates(&self) -> Vec<Candidate> {
        let mut all = self.provider.available_models().await;
        all.extend(self.discover_tools(&discovery::search_path_dirs()).tools);
        all
    }
}

impl<P, L> AppContext<P, L> {
    /// Scan `dirs` with the configured rules and custom tools. Volatile tool names are
    /// written back to the config as `known_node_tools`; a failed write is only logged.
    pub fn discover_tools(&self, dirs: &[PathBuf]) -> Discovery {
        let rules = PatternRuleSet::from_config(&self.config);
        let found = discovery::discover_tools(dirs, &rules, &self.config.custom_cli_tools);
        if !found.volatile.is_empty() {
            if let Err(e) = self.store.set_known_node_tools(&found.volatile) {
                log::warn!("could not record runtime-provided tools: {:#}", e);
            }
        }
        found
    }
}

fn kind_tag(kind: CandidateKind) -> &'static str {
    match kind {
        CandidateKind::Model => "model",
        CandidateKind::CliTool => "tool",
    }
}

/// Selector payload for a candidate; distinct for a model and a tool sharing a name.
pub fn payload_for(candidate: &Candidate) -> String {
    format!("{}/{}", kind_tag(candidate.kind()), candidate.name())
}

/// (display, payload) pairs for the selector, in candidate order.
pub fn menu_options(candidates: &[Candidate]) -> Vec<(String, String)> {
    candidates
        .iter()
        .map(|c| (c.display_label(), payload_for(c)))
        .collect()
}

/// The candidate a selector payload refers to.
pub fn candidate_for_payload<'a>(candidates: &'a [Candidate], payload: &str) -> Option<&'a Candidate> {
    candidates.iter().find(|c| payload_for(c) == payload)
}
