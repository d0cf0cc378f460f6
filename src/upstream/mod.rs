pub mod git;
pub mod which;

pub use git::{ensure_upstream, GitAction, GitClient, SyncOutcome};
pub use which::which;
