//! Discovery: find AI CLI tools on the search path.
//!
//! Each `PATH` directory is scanned in order; executables are matched against a
//! [`PatternRuleSet`] (exact > prefix > suffix), deduplicated with first-directory-wins,
//! then merged with the user's custom tools. Nothing is cached between calls.

mod rules;
mod scan;

pub use rules::{MatchRule, PatternRuleSet};
pub use scan::{discover, discover_tools, resolve_on_path, search_path_dirs, Discovery};
