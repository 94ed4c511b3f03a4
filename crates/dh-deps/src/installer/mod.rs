//! Artifact installation.
//!
//! This module copies the artifacts the downstream native build links
//! against from extracted dependency trees into the library directory,
//! running the external wrapper build first where one is needed.

mod artifact;
mod build_step;
mod library;

pub use artifact::{wrapper_artifacts, Artifact};
pub use build_step::BuildStep;
pub use library::{InstallReport, LibraryInstaller};
