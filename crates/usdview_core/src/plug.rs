//! Plugin discovery from `plugInfo.json` files.
//!
//! The native libraries find their schemas, file formats and render
//! delegates through `plugInfo.json` manifests. [`PlugRegistry`] reads those
//! manifests from explicit paths, from `PXR_PLUGINPATH_NAME`, or from a
//! directory of framework bundles, and records each plugin once.
//!
//! Manifests within one registration call are parsed in parallel; plugins
//! are recorded in the order the paths were given. Core bundles (`sdf`, `ar`,
//! `usd`) are always registered in a call of their own before every other
//! bundle so that their metadata is present when the rest load.

use std::collections::{HashMap, HashSet};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding extra plugin search paths.
pub const PLUGIN_PATH_ENV: &str = "PXR_PLUGINPATH_NAME";

/// MaterialX node definition search path (the `libraries` directory).
pub const MTLX_STDLIB_ENV: &str = "PXR_MTLX_STDLIB_SEARCH_PATHS";

/// MaterialX shader include search path (parent of `libraries`).
pub const MTLX_PLUGIN_ENV: &str = "PXR_MTLX_PLUGIN_SEARCH_PATHS";

const PLUG_INFO: &str = "plugInfo.json";

/// Errors that can occur while reading plugin manifests.
#[derive(Error, Debug)]
pub enum PlugError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plugin manifest {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What a plugin provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Library,
    Resource,
    Python,
}

/// One entry of a manifest's `Plugins` array, as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginInfo {
    pub name: String,

    #[serde(rename = "Type")]
    pub kind: PluginKind,

    #[serde(default)]
    pub root: Option<String>,

    #[serde(default)]
    pub library_path: Option<String>,

    #[serde(default)]
    pub resource_path: Option<String>,

    #[serde(default)]
    pub info: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Manifest {
    #[serde(default)]
    plugins: Vec<PluginInfo>,

    #[serde(default)]
    includes: Vec<String>,
}

/// A registered plugin with paths resolved against its manifest.
#[derive(Debug, Clone)]
pub struct Plugin {
    pub name: String,
    pub kind: PluginKind,
    pub root: PathBuf,
    pub library_path: Option<PathBuf>,
    pub resource_path: PathBuf,
    pub info: serde_json::Value,
    /// Manifest the plugin was declared in
    pub manifest: PathBuf,
}

impl Plugin {
    fn resolve(info: PluginInfo, manifest: &Path) -> Self {
        let dir = manifest.parent().unwrap_or(Path::new("."));
        let root = dir.join(info.root.as_deref().unwrap_or("."));
        let library_path = info.library_path.as_deref().map(|p| root.join(p));
        let resource_path = root.join(info.resource_path.as_deref().unwrap_or("."));

        Self {
            name: info.name,
            kind: info.kind,
            root,
            library_path,
            resource_path,
            info: info.info,
            manifest: manifest.to_path_buf(),
        }
    }
}

/// Parse one manifest. Lines starting with `#` are comments.
pub fn read_manifest(path: &Path) -> Result<(Vec<PluginInfo>, Vec<String>), PlugError> {
    let content = fs::read_to_string(path).map_err(|source| PlugError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let json: String = content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let manifest: Manifest = serde_json::from_str(&json).map_err(|source| PlugError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    Ok((manifest.plugins, manifest.includes))
}

/// Registry of discovered plugins, in registration order.
#[derive(Debug, Default)]
pub struct PlugRegistry {
    plugins: Vec<Plugin>,
    by_name: HashMap<String, usize>,
    seen_manifests: HashSet<PathBuf>,
}

impl PlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search paths listed in `PXR_PLUGINPATH_NAME`.
    pub fn paths_from_env() -> Vec<PathBuf> {
        env::var_os(PLUGIN_PATH_ENV)
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default()
    }

    /// Register every manifest reachable from `paths`.
    ///
    /// A path may name a manifest file or a directory holding
    /// `plugInfo.json`. Unreadable or malformed manifests are logged and
    /// skipped. Returns the number of newly registered plugins.
    pub fn register_plugins(&mut self, paths: &[PathBuf]) -> usize {
        let mut pending: Vec<PathBuf> = paths.iter().map(|p| manifest_path(p)).collect();
        let mut added = 0;

        while !pending.is_empty() {
            let batch: Vec<PathBuf> = pending
                .drain(..)
                .filter(|p| self.seen_manifests.insert(p.clone()))
                .collect();

            let results: Vec<_> = batch
                .par_iter()
                .map(|path| (path, read_manifest(path)))
                .collect();

            for (path, result) in results {
                let (infos, includes) = match result {
                    Ok(parsed) => parsed,
                    Err(PlugError::Io { source, .. })
                        if source.kind() == std::io::ErrorKind::NotFound =>
                    {
                        log::debug!("No plugin manifest at {}", path.display());
                        continue;
                    }
                    Err(e) => {
                        log::warn!("{}", e);
                        continue;
                    }
                };

                for info in infos {
                    if self.insert(Plugin::resolve(info, path)) {
                        added += 1;
                    }
                }

                let dir = path.parent().unwrap_or(Path::new("."));
                for pattern in includes {
                    pending.extend(expand_include(dir, &pattern).iter().map(|p| manifest_path(p)));
                }
            }
        }

        added
    }

    /// Register framework bundles under `root`: core bundles first, then
    /// the rest. Returns the MaterialX environment to apply.
    pub fn register_bundles(&mut self, root: &Path) -> EnvPlan {
        let core: Vec<PathBuf> = BundleFramework::CORE
            .iter()
            .filter_map(|b| b.resource_path(root))
            .collect();
        for path in &core {
            log::debug!("Adding core usd resource -> {}", path.display());
        }
        let core_count = self.register_plugins(&core);

        let others: Vec<PathBuf> = BundleFramework::ALL
            .iter()
            .filter(|b| !BundleFramework::CORE.contains(b))
            .filter_map(|b| b.resource_path(root))
            .collect();
        for path in &others {
            log::debug!("Adding usd resource -> {}", path.display());
        }
        let other_count = self.register_plugins(&others);

        log::info!(
            "Registered {} core and {} additional plugins from {}",
            core_count,
            other_count,
            root.display()
        );

        EnvPlan::materialx(root)
    }

    fn insert(&mut self, plugin: Plugin) -> bool {
        if let Some(&index) = self.by_name.get(&plugin.name) {
            log::warn!(
                "Plugin '{}' from {} already registered from {}",
                plugin.name,
                plugin.manifest.display(),
                self.plugins[index].manifest.display()
            );
            return false;
        }
        self.by_name.insert(plugin.name.clone(), self.plugins.len());
        self.plugins.push(plugin);
        true
    }

    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.by_name.get(name).map(|&i| &self.plugins[i])
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

fn manifest_path(path: &Path) -> PathBuf {
    if path.file_name().is_some_and(|n| n == PLUG_INFO) {
        path.to_path_buf()
    } else {
        path.join(PLUG_INFO)
    }
}

/// Expand an `Includes` entry relative to `dir`. A `*` component matches
/// every subdirectory.
fn expand_include(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let mut matches = vec![dir.to_path_buf()];

    for component in Path::new(pattern).components() {
        let part = component.as_os_str();
        if part == "*" {
            matches = matches
                .iter()
                .filter_map(|m| fs::read_dir(m).ok())
                .flat_map(|entries| entries.filter_map(Result::ok))
                .map(|entry| entry.path())
                .filter(|p| p.is_dir())
                .collect();
            matches.sort();
        } else {
            for m in &mut matches {
                m.push(part);
            }
        }
    }

    matches
}

/// Framework bundles shipped alongside the native libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleFramework {
    Ar,
    Sdf,
    Usd,
    Ndr,
    UsdGeom,
    UsdShade,
    UsdShaders,
    UsdLux,
    UsdHydra,
    SdrOsl,
    SdrGlslfx,
    UsdAbc,
    UsdDraco,
    UsdMedia,
    UsdMtlx,
    UsdPhysics,
    UsdProc,
    UsdRender,
    UsdRi,
    UsdSkel,
    UsdUI,
    UsdVol,
    Hd,
    HgiMetal,
    HgiVulkan,
    HgiGL,
    HdSi,
    HdSt,
    HdStorm,
    Hdx,
    Hio,
    Glf,
    UsdImaging,
    UsdImagingGL,
}

impl BundleFramework {
    /// Bundles that define layer metadata and must register first.
    pub const CORE: [BundleFramework; 3] =
        [BundleFramework::Sdf, BundleFramework::Ar, BundleFramework::Usd];

    pub const ALL: [BundleFramework; 34] = [
        BundleFramework::Ar,
        BundleFramework::Sdf,
        BundleFramework::Usd,
        BundleFramework::Ndr,
        BundleFramework::UsdGeom,
        BundleFramework::UsdShade,
        BundleFramework::UsdShaders,
        BundleFramework::UsdLux,
        BundleFramework::UsdHydra,
        BundleFramework::SdrOsl,
        BundleFramework::SdrGlslfx,
        BundleFramework::UsdAbc,
        BundleFramework::UsdDraco,
        BundleFramework::UsdMedia,
        BundleFramework::UsdMtlx,
        BundleFramework::UsdPhysics,
        BundleFramework::UsdProc,
        BundleFramework::UsdRender,
        BundleFramework::UsdRi,
        BundleFramework::UsdSkel,
        BundleFramework::UsdUI,
        BundleFramework::UsdVol,
        BundleFramework::Hd,
        BundleFramework::HgiMetal,
        BundleFramework::HgiVulkan,
        BundleFramework::HgiGL,
        BundleFramework::HdSi,
        BundleFramework::HdSt,
        BundleFramework::HdStorm,
        BundleFramework::Hdx,
        BundleFramework::Hio,
        BundleFramework::Glf,
        BundleFramework::UsdImaging,
        BundleFramework::UsdImagingGL,
    ];

    /// Directory name of the bundle under the bundle root
    pub fn dir_name(self) -> &'static str {
        match self {
            BundleFramework::Ar => "ar",
            BundleFramework::Sdf => "sdf",
            BundleFramework::Usd => "usd",
            BundleFramework::Ndr => "ndr",
            BundleFramework::UsdGeom => "usdGeom",
            BundleFramework::UsdShade => "usdShade",
            BundleFramework::UsdShaders => "usdShaders",
            BundleFramework::UsdLux => "usdLux",
            BundleFramework::UsdHydra => "usdHydra",
            BundleFramework::SdrOsl => "sdrOsl",
            BundleFramework::SdrGlslfx => "sdrGlslfx",
            BundleFramework::UsdAbc => "usdAbc",
            BundleFramework::UsdDraco => "usdDraco",
            BundleFramework::UsdMedia => "usdMedia",
            BundleFramework::UsdMtlx => "usdMtlx",
            BundleFramework::UsdPhysics => "usdPhysics",
            BundleFramework::UsdProc => "usdProc",
            BundleFramework::UsdRender => "usdRender",
            BundleFramework::UsdRi => "usdRi",
            BundleFramework::UsdSkel => "usdSkel",
            BundleFramework::UsdUI => "usdUI",
            BundleFramework::UsdVol => "usdVol",
            BundleFramework::Hd => "hd",
            BundleFramework::HgiMetal => "hgiMetal",
            BundleFramework::HgiVulkan => "hgiVulkan",
            BundleFramework::HgiGL => "hgiGL",
            BundleFramework::HdSi => "hdSi",
            BundleFramework::HdSt => "hdSt",
            BundleFramework::HdStorm => "hdStorm",
            BundleFramework::Hdx => "hdx",
            BundleFramework::Hio => "hio",
            BundleFramework::Glf => "glf",
            BundleFramework::UsdImaging => "usdImaging",
            BundleFramework::UsdImagingGL => "usdImagingGL",
        }
    }

    /// Resource directory of this bundle under `root`, if installed.
    ///
    /// Bundles that copy their resources keep the manifest one level down
    /// in `Resources/`; that nested directory wins when it has a manifest.
    pub fn resource_path(self, root: &Path) -> Option<PathBuf> {
        let base = root.join(self.dir_name());
        if !base.is_dir() {
            return None;
        }

        let nested = base.join("Resources");
        if nested.join(PLUG_INFO).is_file() {
            return Some(nested);
        }
        Some(base)
    }
}

/// Environment variables to set once at startup, before any native
/// library reads them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvPlan {
    pub vars: Vec<(&'static str, OsString)>,
}

impl EnvPlan {
    /// MaterialX search paths for a `MaterialX/libraries` directory under
    /// `root`; empty when MaterialX is not installed there.
    pub fn materialx(root: &Path) -> Self {
        let mtlx_root = root.join("MaterialX");
        let libraries = mtlx_root.join("libraries");
        if !libraries.is_dir() {
            return Self::default();
        }

        Self {
            vars: vec![
                (MTLX_STDLIB_ENV, libraries.into_os_string()),
                (MTLX_PLUGIN_ENV, mtlx_root.into_os_string()),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&OsString> {
        self.vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Export every variable into this process' environment.
    pub fn apply(&self) {
        for (name, value) in &self.vars {
            log::info!("Setting {} -> {}", name, Path::new(value).display());
            env::set_var(name, value);
        }
    }
}
