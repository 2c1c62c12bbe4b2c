//! Candidates: the runnable things (chat models and CLI tools) that discovery produces
//! and the selector offers.
//!
//! A candidate carries a typed [`Target`] so dispatch never has to re-parse its name.

use std::fmt;

/// Cloud-hosted chat providers reachable with an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CloudProvider {
    Claude,
    Gemini,
    Qwen,
}

impl CloudProvider {
    /// Listing order used by `list` and the selector.
    pub const ALL: [CloudProvider; 3] = [CloudProvider::Qwen, CloudProvider::Claude, CloudProvider::Gemini];

    /// Bare logical name (also the config key under `api_keys`).
    pub fn id(self) -> &'static str {
        match self {
            CloudProvider::Claude => "claude",
            CloudProvider::Gemini => "gemini",
            CloudProvider::Qwen => "qwen",
        }
    }

    /// Environment variable that overrides the stored key, e.g. `CLAUDE_API_KEY`.
    pub fn env_var(self) -> String {
        format!("{}_API_KEY", self.id().to_ascii_uppercase())
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.into_iter().find(|p| p.id().eq_ignore_ascii_case(id))
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// What a candidate resolves to when dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    CloudModel(CloudProvider),
    /// A model served by a local backend (e.g. `ollama`).
    LocalModel { backend: String, model: String },
    CliTool(String),
}

impl Target {
    /// Parse a user-facing model name: `claude`, `gemini`, `qwen` or `<backend>:<model>`.
    /// Returns None for anything else. Only the first `:` separates the backend, so
    /// `ollama:llama3.2:latest` keeps its tag.
    pub fn parse_model(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(provider) = CloudProvider::from_id(name) {
            return Some(Target::CloudModel(provider));
        }
        let (backend, model) = name.split_once(':')?;
        if backend.is_empty() || model.is_empty() {
            return None;
        }
        Some(Target::LocalModel {
            backend: backend.to_string(),
            model: model.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Model,
    CliTool,
}

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    CloudModel,
    LocalModel,
    AutoDetectedTool,
    CustomTool,
}

/// A discovered, invocable chat model or CLI tool. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    target: Target,
    origin: Origin,
}

impl Candidate {
    pub fn cloud(provider: CloudProvider) -> Self {
        Self {
            target: Target::CloudModel(provider),
            origin: Origin::CloudModel,
        }
    }

    pub fn local(backend: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            target: Target::LocalModel {
                backend: backend.into(),
                model: model.into(),
            },
            origin: Origin::LocalModel,
        }
    }

    pub fn detected_tool(name: impl Into<String>) -> Self {
        Self {
            target: Target::CliTool(name.into()),
            origin: Origin::AutoDetectedTool,
        }
    }

    pub fn custom_tool(name: impl Into<String>) -> Self {
        Self {
            target: Target::CliTool(name.into()),
            origin: Origin::CustomTool,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn kind(&self) -> CandidateKind {
        match self.target {
            Target::CloudModel(_) | Target::LocalModel { .. } => CandidateKind::Model,
            Target::CliTool(_) => CandidateKind::CliTool,
        }
    }

    /// User-facing identifier; local models are namespaced `<backend>:<model>`.
    pub fn name(&self) -> String {
        match &self.target {
            Target::CloudModel(p) => p.id().to_string(),
            Target::LocalModel { backend, model } => format!("{}:{}", backend, model),
            Target::CliTool(name) => name.clone(),
        }
    }

    /// Menu label: name plus a short tag describing where it came from.
    pub fn display_label(&self) -> String {
        let tag = match self.origin {
            Origin::CloudModel => "model",
            Origin::LocalModel => "local model",
            Origin::AutoDetectedTool => "cli tool",
            Origin::CustomTool => "custom tool",
        };
        format!("{} ({})", self.name(), tag)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
