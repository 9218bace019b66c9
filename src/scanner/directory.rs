//! Convention-based plugin directories.
//!
//! A module path `a.b` maps onto each search root as follows:
//!
//! ```text
//! <root>/a/b/mod.toml      package module (directory with a package marker)
//! <root>/a/b/              namespace package (directory without a marker)
//! <root>/a/b.toml          leaf module
//! <root>/main.toml         the entry module
//! ```
//!
//! A module file lists the actor symbols it exports and optional plain values:
//!
//! ```toml
//! exports = ["send_email", "send_digest"]
//!
//! [values]
//! retries = 3
//! ```
//!
//! Exports resolve against a [`SymbolTable`] of compiled actor definitions. A
//! namespace package may span several search roots; each distinct directory is
//! walked once.

use super::{Member, Module, ModuleSource, DEFAULT_ENTRY_MODULE};
use crate::error::DiscoveryError;
use crate::handler::ActorDefinition;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File marking a directory as a package module
pub const PACKAGE_MARKER: &str = "mod.toml";

/// File holding the entry module; never listed as a submodule
pub const ENTRY_FILE: &str = "main.toml";

const MODULE_EXTENSION: &str = "toml";

/// Actor definitions addressable by symbol from module files
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Arc<ActorDefinition>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under its own symbol, returning any definition it replaced
    pub fn insert(&mut self, definition: Arc<ActorDefinition>) -> Option<Arc<ActorDefinition>> {
        let symbol = definition.symbol().to_string();
        self.insert_as(symbol, definition)
    }

    pub fn insert_as(
        &mut self,
        symbol: impl Into<String>,
        definition: Arc<ActorDefinition>,
    ) -> Option<Arc<ActorDefinition>> {
        let symbol = symbol.into();
        let previous = self.symbols.insert(symbol.clone(), definition);
        if previous.is_some() {
            warn!(symbol = %symbol, "Symbol re-registered, replacing previous definition");
        }
        previous
    }

    pub fn get(&self, symbol: &str) -> Option<&Arc<ActorDefinition>> {
        self.symbols.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl FromIterator<Arc<ActorDefinition>> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = Arc<ActorDefinition>>>(iter: I) -> Self {
        let mut table = Self::new();
        for definition in iter {
            table.insert(definition);
        }
        table
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleManifest {
    #[serde(default)]
    exports: Vec<String>,
    #[serde(default)]
    values: toml::Table,
}

/// [`ModuleSource`] reading module files from one or more search roots
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    search_paths: Vec<PathBuf>,
    symbols: SymbolTable,
    entry_module: String,
}

impl PluginDirectory {
    pub fn new<I, P>(search_paths: I, symbols: SymbolTable) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            symbols,
            entry_module: DEFAULT_ENTRY_MODULE.to_string(),
        }
    }

    pub fn with_entry_module(mut self, entry_module: impl Into<String>) -> Self {
        self.entry_module = entry_module.into();
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Existing directories for `path` across all search roots, each once
    fn package_dirs(&self, path: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut dirs = Vec::new();
        for root in &self.search_paths {
            let candidate = path.split('.').fold(root.clone(), |dir, part| dir.join(part));
            if !candidate.is_dir() {
                continue;
            }
            let canonical = candidate
                .canonicalize()
                .map_err(|e| DiscoveryError::import(path, e.to_string()))?;
            if seen.insert(canonical.clone()) {
                dirs.push(canonical);
            }
        }
        Ok(dirs)
    }

    fn leaf_file(&self, path: &str) -> Option<PathBuf> {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        self.search_paths.iter().find_map(|root| {
            let dir = parent
                .map(|p| p.split('.').fold(root.clone(), |dir, part| dir.join(part)))
                .unwrap_or_else(|| root.clone());
            let file = dir.join(format!("{leaf}.{MODULE_EXTENSION}"));
            file.is_file().then_some(file)
        })
    }

    fn entry_file(&self) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|root| root.join(ENTRY_FILE))
            .find(|file| file.is_file())
    }

    fn read_manifest(&self, path: &str, file: &Path) -> Result<ModuleManifest, DiscoveryError> {
        let content = fs::read_to_string(file)
            .map_err(|e| DiscoveryError::import(path, format!("{}: {e}", file.display())))?;
        toml::from_str(&content)
            .map_err(|e| DiscoveryError::import(path, format!("{}: {e}", file.display())))
    }

    fn populate(
        &self,
        mut module: Module,
        manifest: ModuleManifest,
    ) -> Result<Module, DiscoveryError> {
        for symbol in manifest.exports {
            let definition = self.symbols.get(&symbol).ok_or_else(|| {
                DiscoveryError::import(module.path(), format!("unknown export '{symbol}'"))
            })?;
            module
                .members
                .push((symbol, Member::Actor(Arc::clone(definition))));
        }
        for (key, value) in manifest.values {
            let value = serde_json::to_value(value)
                .map_err(|e| DiscoveryError::import(module.path(), e.to_string()))?;
            module.members.push((key, Member::Value(value)));
        }
        Ok(module)
    }

    fn module_path(root: &str, relative: &Path) -> String {
        let mut path = root.to_string();
        for component in relative.components() {
            path.push('.');
            path.push_str(&component.as_os_str().to_string_lossy());
        }
        path
    }
}

impl ModuleSource for PluginDirectory {
    fn load(&self, path: &str) -> Result<Arc<Module>, DiscoveryError> {
        if path == self.entry_module {
            let file = self
                .entry_file()
                .ok_or_else(|| DiscoveryError::module_not_found(path))?;
            let manifest = self.read_manifest(path, &file)?;
            return self.populate(Module::new(path), manifest).map(Arc::new);
        }

        let dirs = self.package_dirs(path)?;
        if !dirs.is_empty() {
            let mut module = Module::new(path);
            for dir in dirs {
                let marker = dir.join(PACKAGE_MARKER);
                if marker.is_file() {
                    let manifest = self.read_manifest(path, &marker)?;
                    module = self.populate(module, manifest)?;
                }
            }
            debug!(module = %path, members = module.members().len(), "Loaded package module");
            return Ok(Arc::new(module));
        }

        let file = self
            .leaf_file(path)
            .ok_or_else(|| DiscoveryError::module_not_found(path))?;
        let manifest = self.read_manifest(path, &file)?;
        let module = self.populate(Module::new(path), manifest)?;
        debug!(module = %path, file = %file.display(), "Loaded leaf module");
        Ok(Arc::new(module))
    }

    fn submodules(&self, root: &str) -> Result<Vec<String>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for dir in self.package_dirs(root)? {
            for entry in WalkDir::new(&dir).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(|e| DiscoveryError::import(root, e.to_string()))?;
                let Ok(relative) = entry.path().strip_prefix(&dir) else {
                    continue;
                };

                let module_path = if entry.file_type().is_dir() {
                    if !entry.path().join(PACKAGE_MARKER).is_file() {
                        continue;
                    }
                    Self::module_path(root, relative)
                } else {
                    let file_name = entry.file_name().to_string_lossy();
                    let is_module = entry.path().extension().and_then(|e| e.to_str())
                        == Some(MODULE_EXTENSION);
                    if !is_module || file_name == PACKAGE_MARKER || file_name == ENTRY_FILE {
                        continue;
                    }
                    Self::module_path(root, &relative.with_extension(""))
                };

                if seen.insert(module_path.clone()) {
                    paths.push(module_path);
                }
            }
        }

        Ok(paths)
    }

    fn entry_module(&self) -> &str {
        &self.entry_module
    }
}
