//! # Module Scanner
//!
//! Enumerates every module beneath a root module path. Modules come from a
//! [`ModuleSource`]:
//!
//! - [`ModuleCatalog`]: a static manifest of modules registered in code
//! - [`PluginDirectory`]: a directory convention of module files on disk whose
//!   exports resolve against a [`SymbolTable`] of compiled actor definitions
//!
//! ## Scan order
//!
//! ```text
//! root                     (always first)
//! ├── stop here if root is the entry module
//! └── every submodule      (each path once, order unspecified)
//! ```
//!
//! The scan is lazy: modules are loaded as the iterator advances. The first
//! load failure is yielded as an error and ends the scan.

pub mod catalog;
pub mod directory;

pub use catalog::ModuleCatalog;
pub use directory::{PluginDirectory, SymbolTable, ENTRY_FILE, PACKAGE_MARKER};

use crate::error::DiscoveryError;
use crate::handler::ActorDefinition;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;
use tracing::debug;

/// Name of the program's top-level entry module
pub const DEFAULT_ENTRY_MODULE: &str = "main";

/// A named attribute of a module
#[derive(Clone)]
pub enum Member {
    /// A declared actor handler
    Actor(Arc<ActorDefinition>),
    /// Any other attribute
    Value(Value),
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actor(definition) => f
                .debug_tuple("Actor")
                .field(&definition.symbol())
                .finish(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// A loaded module: a dotted path and its attributes
#[derive(Debug, Clone)]
pub struct Module {
    path: String,
    members: Vec<(String, Member)>,
}

impl Module {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            members: Vec::new(),
        }
    }

    /// Expose an actor definition under the definition's own symbol
    pub fn with_actor(self, definition: Arc<ActorDefinition>) -> Self {
        let attribute = definition.symbol().to_string();
        self.with_actor_as(attribute, definition)
    }

    /// Expose an actor definition under a different attribute name
    pub fn with_actor_as(
        mut self,
        attribute: impl Into<String>,
        definition: Arc<ActorDefinition>,
    ) -> Self {
        self.members
            .push((attribute.into(), Member::Actor(definition)));
        self
    }

    pub fn with_value(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.members.push((attribute.into(), Member::Value(value)));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    /// Actor definitions among this module's members
    pub fn actors(&self) -> impl Iterator<Item = &Arc<ActorDefinition>> {
        self.members.iter().filter_map(|(_, member)| match member {
            Member::Actor(definition) => Some(definition),
            Member::Value(_) => None,
        })
    }
}

/// Where modules come from
pub trait ModuleSource: Send + Sync {
    /// Load the module at `path`
    fn load(&self, path: &str) -> Result<Arc<Module>, DiscoveryError>;

    /// Every module path below `root`, excluding `root` itself
    fn submodules(&self, root: &str) -> Result<Vec<String>, DiscoveryError>;

    /// Module path of the program entry point
    fn entry_module(&self) -> &str {
        DEFAULT_ENTRY_MODULE
    }
}

/// Lazily scan `root` and everything below it
pub fn scan_modules<'a>(source: &'a dyn ModuleSource, root: &str) -> ModuleScan<'a> {
    ModuleScan {
        source,
        root: root.to_string(),
        state: ScanState::Root,
    }
}

enum ScanState {
    Root,
    Listing,
    Submodules(std::vec::IntoIter<String>),
    Done,
}

/// Iterator returned by [`scan_modules`]
pub struct ModuleScan<'a> {
    source: &'a dyn ModuleSource,
    root: String,
    state: ScanState,
}

impl ModuleScan<'_> {
    fn load(&self, path: &str) -> Result<Arc<Module>, DiscoveryError> {
        debug!(module = %path, root = %self.root, "Loading module");
        self.source.load(path)
    }
}

impl Iterator for ModuleScan<'_> {
    type Item = Result<Arc<Module>, DiscoveryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // Any early return leaves the state at Done, fusing the scan on error
            match std::mem::replace(&mut self.state, ScanState::Done) {
                ScanState::Root => {
                    let module = match self.load(&self.root) {
                        Ok(module) => module,
                        Err(e) => return Some(Err(e)),
                    };
                    if self.root != self.source.entry_module() {
                        self.state = ScanState::Listing;
                    }
                    return Some(Ok(module));
                }
                ScanState::Listing => {
                    let paths = match self.source.submodules(&self.root) {
                        Ok(paths) => paths,
                        Err(e) => return Some(Err(e)),
                    };
                    let mut seen = HashSet::new();
                    seen.insert(self.root.clone());
                    let unique: Vec<String> = paths
                        .into_iter()
                        .filter(|path| seen.insert(path.clone()))
                        .collect();
                    self.state = ScanState::Submodules(unique.into_iter());
                }
                ScanState::Submodules(mut paths) => {
                    let path = paths.next()?;
                    let module = match self.load(&path) {
                        Ok(module) => module,
                        Err(DiscoveryError::ModuleNotFound { module }) => {
                            return Some(Err(DiscoveryError::import(
                                module,
                                "listed as a submodule but could not be found",
                            )))
                        }
                        Err(e) => return Some(Err(e)),
                    };
                    self.state = ScanState::Submodules(paths);
                    return Some(Ok(module));
                }
                ScanState::Done => return None,
            }
        }
    }
}

impl FusedIterator for ModuleScan<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::actor;
    use serde_json::json;

    fn catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog
            .add_module(Module::new("app").with_value("VERSION", json!("1.0")))
            .add_module(Module::new("app.tasks"))
            .add_module(Module::new("app.tasks.email"))
            .add_module(Module::new("main"))
            .add_module(Module::new("main.helpers"));
        catalog
    }

    fn paths(scan: ModuleScan<'_>) -> Vec<String> {
        scan.map(|m| m.unwrap().path().to_string()).collect()
    }

    #[test]
    fn test_root_is_yielded_first() {
        let catalog = catalog();
        let scanned = paths(scan_modules(&catalog, "app"));
        assert_eq!(scanned[0], "app");
        assert_eq!(scanned.len(), 3);
        assert!(scanned.contains(&"app.tasks.email".to_string()));
    }

    #[test]
    fn test_entry_module_stops_after_root() {
        let catalog = catalog();
        assert_eq!(paths(scan_modules(&catalog, "main")), vec!["main"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let catalog = catalog();
        let mut scan = scan_modules(&catalog, "nope");
        assert!(matches!(
            scan.next(),
            Some(Err(DiscoveryError::ModuleNotFound { .. }))
        ));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_scan_stops_at_first_failure() {
        let mut catalog = catalog();
        catalog.add_loader("app.broken", || {
            Err(DiscoveryError::import("app.broken", "syntax error"))
        });

        let results: Vec<_> = scan_modules(&catalog, "app").collect();
        let last = results.last().unwrap();
        assert!(matches!(last, Err(DiscoveryError::Import { .. })));
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    }

    #[test]
    fn test_module_actors_skip_plain_values() {
        let definition = actor("app.ping")
            .sync_fn("ping", |_, _| Ok(json!("pong")))
            .unwrap();
        let module = Module::new("app")
            .with_value("LIMIT", json!(10))
            .with_actor(definition.clone())
            .with_actor_as("ping_alias", definition);

        assert_eq!(module.members().len(), 3);
        assert_eq!(module.actors().count(), 2);
    }
}
