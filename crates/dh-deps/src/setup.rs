use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;

use crate::catalog::{artifact_filename, download_url, Catalog, DependencySpec};
use crate::cli::{format_bytes, Output, ProgressManager};
use crate::config::{PlatformConfig, Settings};
use crate::downloader::{ArchiveExtractor, ArchiveFormat, FileDownloader};
use crate::http::{HttpClient, HttpClientConfig};
use crate::installer::{InstallReport, LibraryInstaller};
use crate::{Result, SetupError};

/// Outcome of a complete run
#[derive(Debug, Default)]
pub struct SetupReport {
    /// `(key, bytes downloaded)` in catalog order
    pub downloaded: Vec<(String, u64)>,
    /// Normalized dependency trees under the staging directory
    pub extracted: Vec<PathBuf>,
    pub install: InstallReport,
}

/// The provisioning pipeline: download and extract every catalog entry in
/// order, then install artifacts.
pub struct Setup {
    platform: PlatformConfig,
    settings: Settings,
    catalog: Catalog,
    downloader: FileDownloader,
    installer: LibraryInstaller,
    progress: ProgressManager,
    output: Output,
}

impl Setup {
    pub fn builder(platform: PlatformConfig, settings: Settings) -> SetupBuilder {
        SetupBuilder::new(platform, settings)
    }

    pub fn platform(&self) -> &PlatformConfig {
        &self.platform
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline, stopping at the first failure
    pub async fn run(&self) -> Result<SetupReport> {
        self.print_banner();

        tokio::fs::create_dir_all(&self.settings.deps_dir).await?;

        let mut report = SetupReport::default();

        for spec in self.catalog.entries() {
            let (archive, bytes) = self.download(spec).await?;
            report.downloaded.push((spec.key.clone(), bytes));

            let tree = self.extract(spec, &archive)?;
            report.extracted.push(tree);
        }

        self.output.info("Installing libraries");
        report.install = self.installer.install(&self.platform, &self.catalog).await?;

        for skipped in &report.install.skipped {
            self.output
                .warning(&format!("{} not installed", skipped.display()));
        }

        Ok(report)
    }

    /// Download the archive for `spec` into the staging directory
    pub async fn download(&self, spec: &DependencySpec) -> Result<(PathBuf, u64)> {
        self.output.info(&format!("Downloading {}", spec.name));

        let filename = artifact_filename(spec, &self.platform);
        let url = download_url(&self.settings.deps_url, spec, &self.platform);
        let dest = self.settings.deps_dir.join(&filename);

        self.output.verbose(&format!("url: {}", url));

        let mut bar: Option<ProgressBar> = None;
        let bytes = self
            .downloader
            .fetch(
                &spec.key,
                &url,
                &dest,
                Some(|downloaded: u64, total: Option<u64>| {
                    bar.get_or_insert_with(|| self.progress.create_download_bar(&spec.name, total))
                        .set_position(downloaded);
                }),
            )
            .await;

        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        let bytes = bytes?;

        log::info!("Downloaded {} ({})", filename, format_bytes(bytes));
        Ok((dest, bytes))
    }

    /// Extract a downloaded archive to `deps/<key>`
    pub fn extract(&self, spec: &DependencySpec, archive: &std::path::Path) -> Result<PathBuf> {
        self.output.info(&format!("Extracting {}", spec.name));

        let format = ArchiveFormat::for_os(self.platform.operating_system);
        ArchiveExtractor::extract(archive, &self.settings.deps_dir, &spec.key, format)
    }

    fn print_banner(&self) {
        self.output.section("Setup running");
        for (label, value) in self.platform.summary() {
            self.output.field(label, &value);
        }
        self.output.writeln("");
    }
}

/// Builder for [`Setup`]
pub struct SetupBuilder {
    platform: PlatformConfig,
    settings: Settings,
    catalog: Option<Catalog>,
    http_client: Option<Arc<HttpClient>>,
    progress: bool,
    output: Option<Output>,
}

impl SetupBuilder {
    pub fn new(platform: PlatformConfig, settings: Settings) -> Self {
        Self {
            platform,
            settings,
            catalog: None,
            http_client: None,
            progress: true,
            output: None,
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.output = Some(output);
        self
    }

    pub fn build(self) -> Result<Setup> {
        self.settings.validate()?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut config = HttpClientConfig::default();
                if let Some(proxy) = &self.settings.proxy {
                    config = config.with_proxy(proxy.clone());
                }
                Arc::new(HttpClient::with_config(config).map_err(|e| {
                    SetupError::Config(format!("Failed to create HTTP client: {}", e))
                })?)
            }
        };

        let mut installer =
            LibraryInstaller::new(&self.settings.deps_dir, &self.settings.lib_dir);
        if self.settings.run_build_step {
            installer = installer.with_build_script(&self.settings.build_script);
        }

        Ok(Setup {
            platform: self.platform,
            settings: self.settings,
            catalog: self.catalog.unwrap_or_default(),
            downloader: FileDownloader::new(http_client),
            installer,
            progress: ProgressManager::new(self.progress),
            output: self.output.unwrap_or_default(),
        })
    }
}
