//! Library installer - copies built artifacts into the library directory.

use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, WRAPPER_KEY};
use crate::config::PlatformConfig;
use crate::{Result, SetupError};

use super::artifact::{wrapper_artifacts, Artifact};
use super::build_step::BuildStep;

/// What an installation run did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Files written under the library directory
    pub installed: Vec<PathBuf>,
    /// Optional artifacts that were not present
    pub skipped: Vec<PathBuf>,
    /// Whether the external build step ran
    pub built: bool,
}

/// Installs artifacts from extracted dependencies into the library directory
pub struct LibraryInstaller {
    deps_dir: PathBuf,
    lib_dir: PathBuf,
    build_step: Option<BuildStep>,
}

impl LibraryInstaller {
    /// Create a new library installer
    pub fn new(deps_dir: impl Into<PathBuf>, lib_dir: impl Into<PathBuf>) -> Self {
        Self {
            deps_dir: deps_dir.into(),
            lib_dir: lib_dir.into(),
            build_step: None,
        }
    }

    /// Run `script` to build the wrapper on platforms without a prebuilt one
    pub fn with_build_script(mut self, script: impl Into<PathBuf>) -> Self {
        let working_dir = self.deps_dir.join(WRAPPER_KEY);
        self.build_step = Some(BuildStep::new(script, working_dir));
        self
    }

    /// Install everything `catalog` provides for `config`
    pub async fn install(&self, config: &PlatformConfig, catalog: &Catalog) -> Result<InstallReport> {
        tokio::fs::create_dir_all(&self.lib_dir).await?;

        let mut report = InstallReport::default();

        if !catalog.contains(WRAPPER_KEY) {
            log::debug!("{} not in catalog, nothing to install", WRAPPER_KEY);
            return Ok(report);
        }

        if BuildStep::required_for(config) {
            match &self.build_step {
                Some(step) => {
                    step.run(config)?;
                    report.built = true;
                }
                None => log::info!("Skipping {} wrapper build step", WRAPPER_KEY),
            }
        } else {
            log::info!(
                "Not building {} wrapper: a prebuilt library is distributed for {}",
                WRAPPER_KEY,
                config.operating_system
            );
        }

        let source_dir = self.deps_dir.join(WRAPPER_KEY);
        for artifact in wrapper_artifacts(config) {
            if artifact.built && !report.built {
                log::warn!(
                    "{} wrapper build step disabled, not installing {}",
                    WRAPPER_KEY,
                    artifact.target
                );
                report.skipped.push(artifact.source.clone());
                continue;
            }

            match self.copy_artifact(&source_dir, &artifact).await? {
                Some(installed) => report.installed.push(installed),
                None => report.skipped.push(artifact.source.clone()),
            }
        }

        Ok(report)
    }

    /// Copy one artifact; `None` when an optional one is missing
    async fn copy_artifact(&self, source_dir: &Path, artifact: &Artifact) -> Result<Option<PathBuf>> {
        let source = source_dir.join(&artifact.source);
        let target = self.lib_dir.join(&artifact.target);

        let exists = tokio::fs::try_exists(&source).await.map_err(|e| {
            SetupError::Install(format!("Failed to access {}: {}", source.display(), e))
        })?;

        if !exists {
            if artifact.required {
                return Err(SetupError::Install(format!(
                    "Required artifact {} is missing",
                    source.display()
                )));
            }

            log::warn!("Optional artifact {} not found, skipping", source.display());
            return Ok(None);
        }

        tokio::fs::copy(&source, &target).await.map_err(|e| {
            SetupError::Install(format!(
                "Failed to copy {} to {}: {}",
                source.display(),
                target.display(),
                e
            ))
        })?;

        log::debug!("Installed {}", target.display());
        Ok(Some(target))
    }

    pub fn lib_dir(&self) -> &Path {
        &self.lib_dir
    }
}
