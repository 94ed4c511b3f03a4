//! The fixed set of third-party libraries we know how to fetch.

use indexmap::IndexMap;

use crate::config::PlatformConfig;

/// Key of the browser-engine wrapper handled specially by the installer
pub const WRAPPER_KEY: &str = "cef";

/// One third-party library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Stable identifier, also the directory name under `deps/`
    pub key: String,
    /// Human readable name
    pub name: String,
    pub version: String,
}

impl DependencySpec {
    pub fn new(key: &str, name: &str, version: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

/// Ordered catalog of dependencies
///
/// Iteration order is insertion order. Later entries may rely on earlier
/// ones having been extracted already.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: IndexMap<String, DependencySpec>,
}

impl Catalog {
    /// The libraries the engine build links against
    pub fn builtin() -> Self {
        Self::from_specs([
            DependencySpec::new("boost", "Boost", "1.68.0"),
            DependencySpec::new("glm", "GLM", "0.9.8.3"),
            DependencySpec::new("angelscript", "Angelscript", "2.32.0"),
            DependencySpec::new("assimp", "Asset Importer", "v5.0.1"),
            DependencySpec::new("entityx", "Entityx", "master"),
            DependencySpec::new("glew", "GLEW", "2.1.0"),
            DependencySpec::new("sdl", "SDL", "2.0.8"),
            DependencySpec::new("ctpl", "CTPL", "master"),
            DependencySpec::new("freeimage", "Free Image", "3.18.0"),
            DependencySpec::new("celero", "Celero", "v2.1.0"),
            DependencySpec::new(WRAPPER_KEY, "Chromium Embedded Framework", "3.3578.1870"),
        ])
    }

    /// Build a catalog from specs; a repeated key replaces the earlier spec in place
    pub fn from_specs(specs: impl IntoIterator<Item = DependencySpec>) -> Self {
        let entries = specs
            .into_iter()
            .map(|spec| (spec.key.clone(), spec))
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> impl Iterator<Item = &DependencySpec> {
        self.entries.values()
    }

    pub fn get(&self, key: &str) -> Option<&DependencySpec> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Archive filename published for `spec` on `config`
///
/// Format: `{key}_{version}_{buildType}_{compiler}{compilerVersion}.{archiveExtension}`
pub fn artifact_filename(spec: &DependencySpec, config: &PlatformConfig) -> String {
    format!(
        "{}_{}_{}_{}{}.{}",
        spec.key,
        spec.version,
        config.build_type,
        config.compiler,
        config.compiler_version,
        config.archive_extension
    )
}

/// Remote location of the archive for `spec` on `config`
pub fn download_url(base_url: &str, spec: &DependencySpec, config: &PlatformConfig) -> String {
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        spec.key,
        config.operating_system,
        artifact_filename(spec, config)
    )
}
