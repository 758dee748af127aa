//! Command implementations for the examscan CLI.
//!
//! Each subcommand is implemented in its own module.

pub mod completions;
pub mod history;
pub mod upload;

pub use completions::generate_completions;
pub use history::run_history;
pub use upload::run_upload;
