//! Run configuration.
//!
//! Two pieces make up a run's configuration:
//!
//! 1. [`PlatformConfig`]: what we are building for (operating system,
//!    architecture, compiler, build type). Resolved from host detection plus
//!    command line overrides.
//! 2. [`Settings`]: where artifacts come from and where they end up. Merged
//!    from built-in defaults, `DH_SETUP_*` environment variables and whatever
//!    the caller layers on top.
//!
//! Both are plain values built once at startup and passed down explicitly.
//!
//! # Example
//!
//! ```rust,no_run
//! use dh_deps::config::{PlatformConfig, PlatformOverrides, Settings, SettingsLoader};
//!
//! let platform = PlatformConfig::detect(&PlatformOverrides::default()).unwrap();
//! let settings = Settings::default().apply_env(&SettingsLoader::new(true));
//!
//! println!("Fetching {} archives from {}", platform.operating_system, settings.deps_url);
//! ```

mod platform;
mod settings;

pub use platform::{
    Architecture, BuildType, Compiler, OperatingSystem, PlatformConfig, PlatformOverrides,
};
pub use settings::{
    Settings, SettingsLoader, DEFAULT_BUILD_SCRIPT, DEFAULT_DEPS_DIR, DEFAULT_DEPS_URL,
    DEFAULT_LIB_DIR,
};
