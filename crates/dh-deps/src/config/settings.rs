use std::env;
use std::path::{Path, PathBuf};

use url::Url;

use crate::{Result, SetupError};

pub const DEFAULT_DEPS_URL: &str = "https://artifact-repo.icebreakersentertainment.com/files";
pub const DEFAULT_DEPS_DIR: &str = "deps";
pub const DEFAULT_LIB_DIR: &str = "lib";
pub const DEFAULT_BUILD_SCRIPT: &str = "scripts/build_cef_wrapper.sh";

/// Where things come from and where they go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the artifact repository
    pub deps_url: String,
    /// Staging area for downloaded and extracted archives
    pub deps_dir: PathBuf,
    /// Final installed library layout
    pub lib_dir: PathBuf,
    /// External script building the browser-engine wrapper
    pub build_script: PathBuf,
    /// Run the external build step where one is needed
    pub run_build_step: bool,
    /// HTTP proxy used for every download
    pub proxy: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deps_url: DEFAULT_DEPS_URL.to_string(),
            deps_dir: PathBuf::from(DEFAULT_DEPS_DIR),
            lib_dir: PathBuf::from(DEFAULT_LIB_DIR),
            build_script: PathBuf::from(DEFAULT_BUILD_SCRIPT),
            run_build_step: true,
            proxy: None,
        }
    }
}

impl Settings {
    /// Resolve relative workspace paths against `base_dir`
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        if self.deps_dir.is_relative() {
            self.deps_dir = base_dir.join(&self.deps_dir);
        }
        if self.lib_dir.is_relative() {
            self.lib_dir = base_dir.join(&self.lib_dir);
        }
        if self.build_script.is_relative() {
            self.build_script = base_dir.join(&self.build_script);
        }
        self
    }

    /// Apply `DH_SETUP_*` environment overrides
    pub fn apply_env(mut self, loader: &SettingsLoader) -> Self {
        if let Some(url) = loader.get_env("DH_SETUP_DEPS_URL") {
            self.deps_url = url;
        }
        if let Some(dir) = loader.get_env("DH_SETUP_DEPS_DIR") {
            self.deps_dir = PathBuf::from(dir);
        }
        if let Some(dir) = loader.get_env("DH_SETUP_LIB_DIR") {
            self.lib_dir = PathBuf::from(dir);
        }
        if let Some(script) = loader.get_env("DH_SETUP_BUILD_SCRIPT") {
            self.build_script = PathBuf::from(script);
        }
        if let Some(proxy) = loader.get_env("DH_SETUP_PROXY") {
            self.proxy = Some(proxy);
        }
        self
    }

    /// Check the settings make sense before anything touches the network
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.deps_url).map_err(|e| {
            SetupError::Config(format!("Invalid dependency URL '{}': {}", self.deps_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(SetupError::Config(format!(
                "Invalid dependency URL '{}': only http and https are supported",
                self.deps_url
            )));
        }

        if let Some(proxy) = &self.proxy {
            let proxy_url = Url::parse(proxy).map_err(|e| {
                SetupError::Config(format!("Invalid proxy URL '{}': {}", proxy, e))
            })?;
            if !matches!(proxy_url.scheme(), "http" | "https") {
                return Err(SetupError::Config(format!(
                    "Invalid proxy URL '{}': only http and https proxies are supported",
                    proxy
                )));
            }
        }

        if self.deps_dir.as_os_str().is_empty() || self.lib_dir.as_os_str().is_empty() {
            return Err(SetupError::Config(
                "Dependency and library directories must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Reads settings overrides from the environment
#[derive(Debug)]
pub struct SettingsLoader {
    use_environment: bool,
}

impl SettingsLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a non-empty environment variable
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.deps_url, DEFAULT_DEPS_URL);
        assert_eq!(settings.deps_dir, PathBuf::from("deps"));
        assert_eq!(settings.lib_dir, PathBuf::from("lib"));
        assert!(settings.run_build_step);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_with_base_dir() {
        let settings = Settings {
            lib_dir: PathBuf::from("/opt/lib"),
            ..Default::default()
        }
        .with_base_dir(Path::new("/project"));

        assert_eq!(settings.deps_dir, PathBuf::from("/project/deps"));
        assert_eq!(settings.build_script, PathBuf::from("/project/scripts/build_cef_wrapper.sh"));
        // Absolute paths are left alone
        assert_eq!(settings.lib_dir, PathBuf::from("/opt/lib"));
    }

    #[test]
    fn test_env_disabled() {
        let loader = SettingsLoader::new(false);
        assert_eq!(loader.get_env("PATH"), None);

        let settings = Settings::default().apply_env(&loader);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("DH_SETUP_DEPS_URL", "http://mirror.example.com/files");
        env::set_var("DH_SETUP_LIB_DIR", "/tmp/dh-lib");
        env::set_var("DH_SETUP_PROXY", "http://proxy.example.com:3128");

        let settings = Settings::default().apply_env(&SettingsLoader::new(true));

        assert_eq!(settings.deps_url, "http://mirror.example.com/files");
        assert_eq!(settings.lib_dir, PathBuf::from("/tmp/dh-lib"));
        assert_eq!(settings.deps_dir, PathBuf::from("deps"));
        assert_eq!(settings.proxy.as_deref(), Some("http://proxy.example.com:3128"));

        env::remove_var("DH_SETUP_DEPS_URL");
        env::remove_var("DH_SETUP_LIB_DIR");
        env::remove_var("DH_SETUP_PROXY");
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let settings = Settings {
            deps_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SetupError::Config(_))));

        let settings = Settings {
            deps_url: "ftp://example.com/files".to_string(),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SetupError::Config(_))));
    }

    #[test]
    fn test_validate_proxy() {
        let settings = Settings {
            proxy: Some("http://proxy.example.com:3128".to_string()),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        let settings = Settings {
            proxy: Some("proxy.example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SetupError::Config(_))));
    }
}
