mod config;

use anyhow::{Context, Result};
use clap::Parser;
use config::{DhSetupConfig, LoadedConfig};
use console::style;
use dh_deps::cli::{format_bytes, Output, Verbosity};
use dh_deps::system::check_system_dependencies;
use dh_deps::{PlatformConfig, PlatformOverrides, Settings, SettingsLoader, Setup};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "dh-setup")]
#[command(version)]
#[command(about = "Download and install the native libraries the engine build links against")]
struct Args {
    /// Build type: release or debug
    #[arg(value_name = "BUILD_TYPE")]
    build_type: Option<String>,

    /// Compiler: gcc, clang or msvc (default depends on the platform)
    #[arg(value_name = "COMPILER")]
    compiler: Option<String>,

    /// Target architecture: x86 or x64
    #[arg(short = 'a', long)]
    architecture: Option<String>,

    /// Base URL of the artifact repository
    #[arg(long, value_name = "URL")]
    deps_url: Option<String>,

    /// Directory archives are downloaded and extracted into
    #[arg(long, value_name = "DIR")]
    deps_dir: Option<PathBuf>,

    /// Directory installed libraries are copied into
    #[arg(long, value_name = "DIR")]
    lib_dir: Option<PathBuf>,

    /// Script building the browser-engine wrapper
    #[arg(long, value_name = "PATH")]
    build_script: Option<PathBuf>,

    /// HTTP proxy for downloads
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Never run the wrapper build step
    #[arg(long)]
    skip_build: bool,

    /// Check required host packages before starting
    #[arg(long)]
    check_system: bool,

    /// Disable progress output
    #[arg(long)]
    no_progress: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Do not output any message
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Args {
    fn overrides(&self) -> PlatformOverrides {
        PlatformOverrides {
            build_type: self.build_type.clone(),
            architecture: self.architecture.clone(),
            compiler: self.compiler.clone(),
        }
    }

    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Build settings from defaults, the config file, the environment and the command line
///
/// Later sources win. Relative paths from the environment or the command line
/// are resolved against `cwd`; those from the config file against its directory.
fn resolve_settings(
    args: &Args,
    file: Option<&LoadedConfig>,
    loader: &SettingsLoader,
    cwd: &Path,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file) = file {
        settings = file.apply(settings);
    }

    settings = settings.apply_env(loader);

    if let Some(url) = &args.deps_url {
        settings.deps_url = url.clone();
    }
    if let Some(dir) = &args.deps_dir {
        settings.deps_dir = dir.clone();
    }
    if let Some(dir) = &args.lib_dir {
        settings.lib_dir = dir.clone();
    }
    if let Some(script) = &args.build_script {
        settings.build_script = script.clone();
    }
    if let Some(proxy) = &args.proxy {
        settings.proxy = Some(proxy.clone());
    }
    if args.skip_build {
        settings.run_build_step = false;
    }

    settings.with_base_dir(cwd)
}

fn init_logging(args: &Args) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let platform = PlatformConfig::detect(&args.overrides())?;

    if args.check_system {
        check_system_dependencies(platform.operating_system)?;
    }

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let file = DhSetupConfig::load(&cwd)?;
    let settings = resolve_settings(&args, file.as_ref(), &SettingsLoader::new(true), &cwd);

    let setup = Setup::builder(platform, settings)
        .with_progress(!args.no_progress && !args.quiet)
        .with_output(Output::new(args.verbosity()))
        .build()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let report = runtime.block_on(setup.run())?;

    let output = Output::new(args.verbosity());
    let total: u64 = report.downloaded.iter().map(|(_, bytes)| bytes).sum();
    output.success(&format!(
        "Installed {} dependencies ({} downloaded), {} libraries in {}",
        report.downloaded.len(),
        format_bytes(total),
        report.install.installed.len(),
        setup.settings().lib_dir.display()
    ));

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dh-setup").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_positional_overrides() {
        let args = parse(&["release", "clang", "-a", "x64"]);
        let overrides = args.overrides();

        assert_eq!(overrides.build_type.as_deref(), Some("release"));
        assert_eq!(overrides.compiler.as_deref(), Some("clang"));
        assert_eq!(overrides.architecture.as_deref(), Some("x64"));
    }

    #[test]
    fn test_no_arguments_means_defaults() {
        let overrides = parse(&[]).overrides();
        assert!(overrides.build_type.is_none());
        assert!(overrides.compiler.is_none());
        assert!(overrides.architecture.is_none());
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&[]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["-vv"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv"]).log_filter(), "debug");
        assert_eq!(parse(&["-q"]).log_filter(), "error");
        assert!(Args::try_parse_from(["dh-setup", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_settings_defaults_resolved_against_cwd() {
        let cwd = Path::new("/work/engine");
        let settings = resolve_settings(&parse(&[]), None, &SettingsLoader::new(false), cwd);

        assert_eq!(settings.deps_dir, cwd.join("deps"));
        assert_eq!(settings.lib_dir, cwd.join("lib"));
        assert_eq!(settings.build_script, cwd.join("scripts/build_cef_wrapper.sh"));
        assert!(settings.run_build_step);
    }

    #[test]
    fn test_command_line_beats_config_file() {
        let file = LoadedConfig {
            config: toml::from_str(
                "[setup]\ndeps_url = \"https://file.example.com\"\nlib_dir = \"file-lib\"\nproxy = \"http://file-proxy:3128\"\n",
            )
            .unwrap(),
            path: PathBuf::from("/project/dh-setup.toml"),
        };
        let args = parse(&[
            "--deps-url",
            "http://cli.example.com",
            "--proxy",
            "http://cli-proxy:8080",
            "--skip-build",
        ]);

        let settings = resolve_settings(
            &args,
            Some(&file),
            &SettingsLoader::new(false),
            Path::new("/project/sub"),
        );

        assert_eq!(settings.deps_url, "http://cli.example.com");
        assert_eq!(settings.lib_dir, PathBuf::from("/project/file-lib"));
        assert_eq!(settings.deps_dir, PathBuf::from("/project/sub/deps"));
        assert!(!settings.run_build_step);
        assert_eq!(settings.proxy.as_deref(), Some("http://cli-proxy:8080"));
    }

    #[test]
    fn test_proxy_from_config_file() {
        let file = LoadedConfig {
            config: toml::from_str("[setup]\nproxy = \"http://file-proxy:3128\"\n").unwrap(),
            path: PathBuf::from("/project/dh-setup.toml"),
        };

        let settings = resolve_settings(
            &parse(&[]),
            Some(&file),
            &SettingsLoader::new(false),
            Path::new("/project"),
        );

        assert_eq!(settings.proxy.as_deref(), Some("http://file-proxy:3128"));
    }
}
