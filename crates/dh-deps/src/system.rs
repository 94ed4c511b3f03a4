//! Host package checks.

use std::process::{Command, Stdio};

use crate::config::OperatingSystem;
use crate::{Result, SetupError};

/// Host packages the native build needs on `os`
pub fn required_packages(os: OperatingSystem) -> &'static [&'static str] {
    match os {
        OperatingSystem::Linux => &["build-essential"],
        _ => &[],
    }
}

/// Fail if any package `required_packages` lists is missing
///
/// Packages are looked up with `dpkg -s`; a missing `dpkg` counts as a
/// missing package.
pub fn check_system_dependencies(os: OperatingSystem) -> Result<()> {
    for package in required_packages(os) {
        log::debug!("Checking for system package {}", package);

        let installed = Command::new("dpkg")
            .args(["-s", package])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false);

        if !installed {
            return Err(SetupError::MissingSystemPackage(package.to_string()));
        }
    }

    Ok(())
}
