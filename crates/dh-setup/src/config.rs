use anyhow::{Context, Result};
use dh_deps::Settings;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the project-level settings file
pub const CONFIG_FILE_NAME: &str = "dh-setup.toml";

/// The dh-setup configuration file structure (dh-setup.toml)
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DhSetupConfig {
    /// Where dependencies come from and where they go
    pub setup: SetupSection,
}

/// The `[setup]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupSection {
    /// Base URL of the artifact repository
    pub deps_url: Option<String>,

    /// Staging directory for archives
    pub deps_dir: Option<PathBuf>,

    /// Installed library directory
    pub lib_dir: Option<PathBuf>,

    /// Script building the browser-engine wrapper
    pub build_script: Option<PathBuf>,

    /// Never run the wrapper build step
    pub skip_build: Option<bool>,

    /// HTTP proxy for downloads
    pub proxy: Option<String>,
}

/// A configuration file together with the directory it was found in
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: DhSetupConfig,
    pub path: PathBuf,
}

impl LoadedConfig {
    /// Directory relative paths in the file are resolved against
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Layer the file's values over `settings`
    pub fn apply(&self, mut settings: Settings) -> Settings {
        let section = &self.config.setup;
        let base_dir = self.base_dir();

        if let Some(url) = &section.deps_url {
            settings.deps_url = url.clone();
        }
        if let Some(dir) = &section.deps_dir {
            settings.deps_dir = base_dir.join(dir);
        }
        if let Some(dir) = &section.lib_dir {
            settings.lib_dir = base_dir.join(dir);
        }
        if let Some(script) = &section.build_script {
            settings.build_script = base_dir.join(script);
        }
        if let Some(skip) = section.skip_build {
            settings.run_build_step = !skip;
        }
        if let Some(proxy) = &section.proxy {
            settings.proxy = Some(proxy.clone());
        }

        settings
    }
}

impl DhSetupConfig {
    /// Load configuration from dh-setup.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<LoadedConfig>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let content = std::fs::read_to_string(&config_path)
                    .with_context(|| format!("Failed to read {}", config_path.display()))?;
                let config: DhSetupConfig = toml::from_str(&content)
                    .with_context(|| format!("Invalid {}", config_path.display()))?;

                log::debug!("Loaded settings from {}", config_path.display());
                return Ok(Some(LoadedConfig {
                    config,
                    path: config_path,
                }));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_empty_config() {
        let config: DhSetupConfig = toml::from_str("").unwrap();
        assert!(config.setup.deps_url.is_none());
        assert!(config.setup.skip_build.is_none());
    }

    #[test]
    fn test_parse_setup_section() {
        let toml = r#"
[setup]
deps_url = "https://mirror.example.com/files"
deps_dir = "third_party"
lib_dir = "out/lib"
build_script = "tools/build_wrapper.sh"
skip_build = true
proxy = "http://proxy.internal:3128"
"#;
        let config: DhSetupConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.setup.deps_url,
            Some("https://mirror.example.com/files".to_string())
        );
        assert_eq!(config.setup.deps_dir, Some(PathBuf::from("third_party")));
        assert_eq!(config.setup.lib_dir, Some(PathBuf::from("out/lib")));
        assert_eq!(
            config.setup.build_script,
            Some(PathBuf::from("tools/build_wrapper.sh"))
        );
        assert_eq!(config.setup.skip_build, Some(true));
        assert_eq!(config.setup.proxy, Some("http://proxy.internal:3128".to_string()));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: std::result::Result<DhSetupConfig, _> =
            toml::from_str("[setup]\ndeps_ulr = \"http://x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_searches_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("engine/src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[setup]\nlib_dir = \"build/lib\"\n",
        )
        .unwrap();

        let loaded = DhSetupConfig::load(&nested).unwrap().unwrap();
        assert_eq!(loaded.base_dir(), temp.path());

        let settings = loaded.apply(Settings::default());
        assert_eq!(settings.lib_dir, temp.path().join("build/lib"));
        assert_eq!(settings.deps_dir, PathBuf::from("deps"));
    }

    #[test]
    fn test_load_invalid_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "[setup\n").unwrap();

        let err = DhSetupConfig::load(temp.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid"));
    }

    #[test]
    fn test_skip_build_disables_step() {
        let loaded = LoadedConfig {
            config: toml::from_str("[setup]\nskip_build = true\n").unwrap(),
            path: PathBuf::from("/project/dh-setup.toml"),
        };

        let settings = loaded.apply(Settings::default());
        assert!(!settings.run_build_step);
        assert_eq!(settings.build_script, Settings::default().build_script);
    }
}
