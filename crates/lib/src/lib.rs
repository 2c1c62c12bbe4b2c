//! ai-cli core library: candidate discovery, the raw-mode terminal selector, and the
//! chat/tool sessions behind the `ai-cli` binary.

pub mod candidate;
pub mod config;
pub mod context;
pub mod discovery;
pub mod exec;
pub mod init;
pub mod llm;
pub mod selector;
pub mod session;
