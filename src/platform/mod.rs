//! Seven Bridges platform integration
//!
//! - `hints`: `sbg:` hint classes and the process hint list entry
//! - `session`: install/revise apps and run tasks through an [`AppRegistry`]

mod hints;
mod session;

pub use hints::{ProcessHint, SbgHint};
pub use session::{AppRegistry, InstalledApp, MemoryRegistry, RunHandle, Session, TaskStatus, HASH_KEY};

use crate::process::ProcessLike;

pub const SBG_NAMESPACE: &str = "https://sevenbridges.com";

/// Declare the `sbg` prefix in `$namespaces`.
pub fn add_sbg_namespace<P: ProcessLike>(process: &mut P) {
    process
        .base_mut()
        .namespaces
        .insert("sbg".to_string(), SBG_NAMESPACE.to_string());
}
