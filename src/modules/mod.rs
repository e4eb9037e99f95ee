//! Cloud-config building blocks
//!
//! Each module produces one piece of the generated document: the build PPA
//! lines spliced into `runcmd`, and the hook files materialized through
//! `write_files`.

pub mod ppa;
pub mod write_files;

pub use ppa::{PpaSource, ppa_snippet};
pub use write_files::{HookScripts, HookStanza, HookType, build_write_files};
