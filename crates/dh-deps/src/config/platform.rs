//! Platform resolution.
//!
//! Turns the detected host operating system plus whatever the user typed on
//! the command line into a validated [`PlatformConfig`]. The config is built
//! once and handed by reference to every later stage.

use std::fmt;
use std::str::FromStr;

use crate::{Result, SetupError};

/// Operating systems we distribute archives for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatingSystem {
    Linux,
    Windows,
    Mac,
}

impl OperatingSystem {
    /// Detect the operating system we are running on
    pub fn detect() -> Option<Self> {
        Self::from_rust_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value
    pub fn from_rust_os(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(OperatingSystem::Linux),
            "windows" => Some(OperatingSystem::Windows),
            "macos" => Some(OperatingSystem::Mac),
            _ => None,
        }
    }

    /// Name used in artifact repository paths
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatingSystem::Linux => "linux",
            OperatingSystem::Windows => "windows",
            OperatingSystem::Mac => "mac",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, OperatingSystem::Windows)
    }

    /// Compiler used when none is given
    pub fn default_compiler(&self) -> Compiler {
        match self {
            OperatingSystem::Linux => Compiler::Gcc,
            OperatingSystem::Windows => Compiler::Msvc,
            OperatingSystem::Mac => Compiler::Clang,
        }
    }

    /// Extension of the archives published for this platform
    pub fn archive_extension(&self) -> &'static str {
        match self {
            OperatingSystem::Windows => "zip",
            _ => "tar.gz",
        }
    }

    pub fn shared_lib_extension(&self) -> &'static str {
        match self {
            OperatingSystem::Linux => "so",
            OperatingSystem::Windows => "dll",
            OperatingSystem::Mac => "dylib",
        }
    }

    pub fn static_lib_extension(&self) -> &'static str {
        match self {
            OperatingSystem::Windows => "lib",
            _ => "a",
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    X86,
    X64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }
}

impl FromStr for Architecture {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x86" => Ok(Architecture::X86),
            "x64" => Ok(Architecture::X64),
            _ => Err(SetupError::Config(
                "Invalid architecture - must be either \"x86\" or \"x64\"".to_string(),
            )),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compiler {
    Gcc,
    Clang,
    Msvc,
}

impl Compiler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::Msvc => "msvc",
        }
    }

    /// Compiler version the archives published for `os` were built with
    ///
    /// Mac archives were all built against version 8, so gcc there is 8 too.
    pub fn version_for(&self, os: OperatingSystem) -> &'static str {
        match (self, os) {
            (Compiler::Msvc, _) => "16",
            (Compiler::Clang, _) => "8",
            (Compiler::Gcc, OperatingSystem::Mac) => "8",
            (Compiler::Gcc, _) => "6",
        }
    }
}

impl FromStr for Compiler {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "msvc" => Ok(Compiler::Msvc),
            _ => Err(SetupError::Config(
                "Invalid compiler - must be either \"gcc\", \"clang\" or \"msvc\"".to_string(),
            )),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildType {
    #[default]
    Release,
    Debug,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Release => "release",
            BuildType::Debug => "debug",
        }
    }
}

impl FromStr for BuildType {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "release" => Ok(BuildType::Release),
            "debug" => Ok(BuildType::Debug),
            _ => Err(SetupError::Config(
                "Invalid buildType - must be either \"release\" or \"debug\"".to_string(),
            )),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values the user may override, exactly as typed
#[derive(Debug, Clone, Default)]
pub struct PlatformOverrides {
    pub build_type: Option<String>,
    pub architecture: Option<String>,
    pub compiler: Option<String>,
}

/// Fully resolved, validated build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    pub operating_system: OperatingSystem,
    pub architecture: Architecture,
    pub compiler: Compiler,
    pub compiler_version: String,
    pub build_type: BuildType,
    pub archive_extension: String,
    pub shared_lib_extension: String,
    pub static_lib_extension: String,
}

impl PlatformConfig {
    /// Resolve the configuration for the machine we are running on
    pub fn detect(overrides: &PlatformOverrides) -> Result<Self> {
        let host = OperatingSystem::detect().ok_or_else(|| {
            SetupError::Config(format!(
                "Unsupported host operating system: {}",
                std::env::consts::OS
            ))
        })?;

        Self::resolve(host, overrides)
    }

    /// Resolve the configuration for `host`, applying and validating overrides
    ///
    /// Checks run in a fixed order so the first complaint the user sees is
    /// the same one regardless of what else is wrong.
    pub fn resolve(host: OperatingSystem, overrides: &PlatformOverrides) -> Result<Self> {
        let build_type = match overrides.build_type.as_deref() {
            Some(value) => value.parse::<BuildType>()?,
            None => BuildType::default(),
        };
        let architecture = match overrides.architecture.as_deref() {
            Some(value) => value.parse::<Architecture>()?,
            None => Architecture::X64,
        };
        let compiler = match overrides.compiler.as_deref() {
            Some(value) => value.parse::<Compiler>()?,
            None => host.default_compiler(),
        };

        if architecture == Architecture::X86 {
            return Err(SetupError::Config(format!(
                "x86 architecture is not yet supported for {} - sorry!",
                host
            )));
        }

        if compiler == Compiler::Msvc && !host.is_windows() {
            return Err(SetupError::Config(format!(
                "msvc compiler is not available for {}",
                host
            )));
        }

        if build_type == BuildType::Debug {
            return Err(SetupError::Config(
                "Debug build type is not ready yet - sorry!".to_string(),
            ));
        }

        Ok(Self {
            operating_system: host,
            architecture,
            compiler,
            compiler_version: compiler.version_for(host).to_string(),
            build_type,
            archive_extension: host.archive_extension().to_string(),
            shared_lib_extension: host.shared_lib_extension().to_string(),
            static_lib_extension: host.static_lib_extension().to_string(),
        })
    }

    /// Banner lines describing this configuration
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Platform", self.operating_system.to_string()),
            ("Architecture", self.architecture.to_string()),
            ("Build Type", self.build_type.to_string()),
            (
                "Compiler",
                format!("{} (Version {})", self.compiler, self.compiler_version),
            ),
        ]
    }
}
