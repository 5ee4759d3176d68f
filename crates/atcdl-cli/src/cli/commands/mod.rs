//! CLI command handlers, one file per command.

mod completions;
mod download;
mod man;
mod search;

pub use completions::run_completions;
pub use download::run_download;
pub use man::run_man;
pub use search::run_search;
