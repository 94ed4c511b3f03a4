//! Artifacts installed from the browser-engine wrapper.

use std::path::PathBuf;

use crate::config::PlatformConfig;

/// A single file copied from an extracted dependency into the library directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Path relative to the dependency's extracted tree
    pub source: PathBuf,
    /// File name under the library directory
    pub target: String,
    /// Whether a missing source aborts installation
    pub required: bool,
    /// Produced by the external build step rather than shipped in the archive
    pub built: bool,
}

impl Artifact {
    fn required(source: PathBuf, target: String) -> Self {
        Self { source, target, required: true, built: false }
    }

    fn optional(source: PathBuf, target: String) -> Self {
        Self { source, target, required: false, built: false }
    }

    fn built_by_step(mut self, built: bool) -> Self {
        self.built = built;
        self
    }
}

/// Artifacts of the wrapper dependency for `config`
///
/// Windows archives ship a prebuilt wrapper under a `Release` subdirectory;
/// elsewhere the wrapper is built in place by the external build step.
pub fn wrapper_artifacts(config: &PlatformConfig) -> Vec<Artifact> {
    let shared = &config.shared_lib_extension;
    let static_ext = &config.static_lib_extension;

    let wrapper_dir = if config.operating_system.is_windows() {
        PathBuf::from("build/libcef_dll_wrapper/Release")
    } else {
        PathBuf::from("build/libcef_dll_wrapper")
    };
    let release_dir = PathBuf::from("Release");

    let auxiliary = if config.operating_system.is_windows() {
        format!("chrome_elf.{}", shared)
    } else {
        format!("libEGL.{}", shared)
    };

    vec![
        Artifact::required(
            wrapper_dir.join(format!("libcef_dll_wrapper.{}", static_ext)),
            format!("libcef_dll_wrapper.{}", static_ext),
        )
        .built_by_step(!config.operating_system.is_windows()),
        Artifact::required(
            release_dir.join(format!("libcef.{}", shared)),
            format!("libcef.{}", shared),
        ),
        Artifact::optional(release_dir.join(&auxiliary), auxiliary),
    ]
}
