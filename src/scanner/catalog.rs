//! Static module manifest.
//!
//! Modules are registered up front, either as already-built [`Module`] values
//! or as deferred loaders that run on first load. A deferred loader runs at
//! most once; later loads return the same module.

use super::{Module, ModuleSource, DEFAULT_ENTRY_MODULE};
use crate::error::DiscoveryError;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

type Loader = Box<dyn Fn() -> Result<Module, DiscoveryError> + Send + Sync>;

enum Entry {
    Loaded(Arc<Module>),
    Deferred {
        loader: Loader,
        module: OnceLock<Arc<Module>>,
    },
}

/// In-memory [`ModuleSource`] built from explicit registrations
pub struct ModuleCatalog {
    modules: BTreeMap<String, Entry>,
    entry_module: String,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self {
            modules: BTreeMap::new(),
            entry_module: DEFAULT_ENTRY_MODULE.to_string(),
        }
    }

    pub fn with_entry_module(mut self, entry_module: impl Into<String>) -> Self {
        self.entry_module = entry_module.into();
        self
    }

    /// Register a module; replaces any earlier registration at the same path
    pub fn add_module(&mut self, module: Module) -> &mut Self {
        let path = module.path().to_string();
        debug!(module = %path, members = module.members().len(), "Registering module");
        self.modules.insert(path, Entry::Loaded(Arc::new(module)));
        self
    }

    /// Register a module built on first load
    pub fn add_loader<F>(&mut self, path: impl Into<String>, loader: F) -> &mut Self
    where
        F: Fn() -> Result<Module, DiscoveryError> + Send + Sync + 'static,
    {
        self.modules.insert(
            path.into(),
            Entry::Deferred {
                loader: Box::new(loader),
                module: OnceLock::new(),
            },
        );
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered module paths, sorted
    pub fn paths(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    fn descendants<'a>(&'a self, root: &str) -> impl Iterator<Item = &'a String> + 'a {
        let prefix = format!("{root}.");
        self.modules
            .range(prefix.clone()..)
            .map(|(path, _)| path)
            .take_while(move |path| path.starts_with(&prefix))
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleSource for ModuleCatalog {
    fn load(&self, path: &str) -> Result<Arc<Module>, DiscoveryError> {
        match self.modules.get(path) {
            Some(Entry::Loaded(module)) => Ok(Arc::clone(module)),
            Some(Entry::Deferred { loader, module }) => {
                if let Some(loaded) = module.get() {
                    return Ok(Arc::clone(loaded));
                }
                let built = loader().map_err(|e| match e {
                    DiscoveryError::Import { .. } => e,
                    other => DiscoveryError::import(path, other.to_string()),
                })?;
                Ok(Arc::clone(module.get_or_init(|| Arc::new(built))))
            }
            // Namespace package: nothing registered at the path itself
            None if self.descendants(path).next().is_some() => Ok(Arc::new(Module::new(path))),
            None => Err(DiscoveryError::module_not_found(path)),
        }
    }

    fn submodules(&self, root: &str) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.descendants(root).cloned().collect())
    }

    fn entry_module(&self) -> &str {
        &self.entry_module
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("module_count", &self.modules.len())
            .field("modules", &self.paths())
            .field("entry_module", &self.entry_module)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_submodules_are_strict_descendants() {
        let mut catalog = ModuleCatalog::new();
        catalog
            .add_module(Module::new("app"))
            .add_module(Module::new("app.tasks"))
            .add_module(Module::new("app.tasks.email"))
            .add_module(Module::new("apples"))
            .add_module(Module::new("other.app"));

        let subs = catalog.submodules("app").unwrap();
        assert_eq!(subs, vec!["app.tasks", "app.tasks.email"]);
    }

    #[test]
    fn test_namespace_root_loads_empty_module() {
        let mut catalog = ModuleCatalog::new();
        catalog.add_module(Module::new("plugins.billing"));

        let root = catalog.load("plugins").unwrap();
        assert_eq!(root.path(), "plugins");
        assert!(root.members().is_empty());
        assert!(matches!(
            catalog.load("missing"),
            Err(DiscoveryError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_deferred_loader_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut catalog = ModuleCatalog::new();
        catalog.add_loader("lazy", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Module::new("lazy"))
        });

        let first = catalog.load("lazy").unwrap();
        let second = catalog.load("lazy").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_loader_failures_become_import_errors() {
        let mut catalog = ModuleCatalog::new();
        catalog.add_loader("broken", || Err(DiscoveryError::module_not_found("dependency")));

        let err = catalog.load("broken").unwrap_err();
        assert!(matches!(err, DiscoveryError::Import { ref module, .. } if module == "broken"));
    }

    #[test]
    fn test_custom_entry_module() {
        let catalog = ModuleCatalog::new().with_entry_module("app.cli");
        assert_eq!(catalog.entry_module(), "app.cli");
    }
}
