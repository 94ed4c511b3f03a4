//! External build step for the browser-engine wrapper.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::PlatformConfig;
use crate::{Result, SetupError};

/// One synchronous run of an external shell script
#[derive(Debug, Clone)]
pub struct BuildStep {
    script: PathBuf,
    working_dir: PathBuf,
}

impl BuildStep {
    pub fn new(script: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            working_dir: working_dir.into(),
        }
    }

    /// Whether `config` needs the wrapper built locally
    ///
    /// Only Windows archives carry a prebuilt wrapper library.
    pub fn required_for(config: &PlatformConfig) -> bool {
        !config.operating_system.is_windows()
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Run the script with `sh`, failing on a non-zero exit status
    ///
    /// The script sees the resolved configuration through `DH_BUILD_TYPE`,
    /// `DH_COMPILER`, `DH_COMPILER_VERSION` and `DH_PLATFORM`.
    pub fn run(&self, config: &PlatformConfig) -> Result<()> {
        if !self.script.is_file() {
            return Err(SetupError::Install(format!(
                "Build script not found: {}",
                self.script.display()
            )));
        }

        // The script runs from the dependency directory
        let script = self.script.canonicalize()?;

        log::info!(
            "Running {} in {}",
            script.display(),
            self.working_dir.display()
        );

        let status = Command::new("sh")
            .arg(&script)
            .current_dir(&self.working_dir)
            .env("DH_BUILD_TYPE", config.build_type.as_str())
            .env("DH_COMPILER", config.compiler.as_str())
            .env("DH_COMPILER_VERSION", &config.compiler_version)
            .env("DH_PLATFORM", config.operating_system.as_str())
            .status()
            .map_err(|e| {
                SetupError::Install(format!("Failed to run {}: {}", script.display(), e))
            })?;

        if !status.success() {
            return Err(SetupError::Install(format!(
                "Build script {} failed with {}",
                script.display(),
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OperatingSystem, PlatformOverrides};
    use std::fs;
    use tempfile::TempDir;

    fn linux() -> PlatformConfig {
        PlatformConfig::resolve(OperatingSystem::Linux, &PlatformOverrides::default()).unwrap()
    }

    #[test]
    fn test_required_for() {
        let windows = PlatformConfig::resolve(OperatingSystem::Windows, &PlatformOverrides::default()).unwrap();
        let mac = PlatformConfig::resolve(OperatingSystem::Mac, &PlatformOverrides::default()).unwrap();

        assert!(BuildStep::required_for(&linux()));
        assert!(BuildStep::required_for(&mac));
        assert!(!BuildStep::required_for(&windows));
    }

    #[test]
    fn test_missing_script() {
        let temp = TempDir::new().unwrap();
        let step = BuildStep::new(temp.path().join("nope.sh"), temp.path());

        match step.run(&linux()) {
            Err(SetupError::Install(reason)) => assert!(reason.contains("not found")),
            other => panic!("Expected install error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_script_runs_in_working_dir() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("cef");
        fs::create_dir_all(&work).unwrap();
        let script = temp.path().join("build.sh");
        fs::write(&script, "echo \"$DH_COMPILER$DH_COMPILER_VERSION\" > built.txt\n").unwrap();

        BuildStep::new(&script, &work).run(&linux()).unwrap();

        assert_eq!(fs::read_to_string(work.join("built.txt")).unwrap().trim(), "gcc6");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_script() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("build.sh");
        fs::write(&script, "exit 3\n").unwrap();

        let result = BuildStep::new(&script, temp.path()).run(&linux());

        assert!(matches!(result, Err(SetupError::Install(_))));
    }
}
