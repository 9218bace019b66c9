//! # Actor Discovery
//!
//! Walks the modules beneath one or more roots and collects every actor
//! definition whose symbol fully matches a pattern. A definition reachable
//! from several modules (re-exports, overlapping roots) is collected once, in
//! first-seen order.
//!
//! Discovery is all-or-nothing: the first module that fails to load aborts
//! the whole call.

use crate::error::DiscoveryError;
use crate::handler::ActorDefinition;
use crate::logging::log_discovery_operation;
use crate::scanner::{scan_modules, ModuleSource};
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Pattern matching every symbol
pub const MATCH_ALL: &str = ".*";

/// Compile `pattern` so that it must match a whole symbol
pub fn compile_pattern(pattern: &str) -> Result<Regex, DiscoveryError> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| DiscoveryError::invalid_pattern(pattern, e.to_string()))
}

/// Definitions in first-seen order, deduplicated by identity
#[derive(Default)]
struct Collected {
    seen: HashSet<*const ActorDefinition>,
    definitions: Vec<Arc<ActorDefinition>>,
}

impl Collected {
    fn contains(&self, definition: &Arc<ActorDefinition>) -> bool {
        self.seen.contains(&Arc::as_ptr(definition))
    }

    fn push(&mut self, definition: &Arc<ActorDefinition>) {
        if self.seen.insert(Arc::as_ptr(definition)) {
            self.definitions.push(Arc::clone(definition));
        }
    }
}

fn scan_into(
    source: &dyn ModuleSource,
    root: &str,
    matcher: &Regex,
    collected: &mut Collected,
) -> Result<(), DiscoveryError> {
    for module in scan_modules(source, root) {
        let module = module?;
        for definition in module.actors() {
            if collected.contains(definition) {
                continue;
            }
            if matcher.is_match(definition.symbol()) {
                debug!(
                    actor = %definition.name(),
                    symbol = %definition.symbol(),
                    module = %module.path(),
                    "Discovered actor"
                );
                collected.push(definition);
            }
        }
    }
    Ok(())
}

/// Every actor definition beneath `root` whose symbol fully matches `pattern`
pub fn import_all_actors(
    source: &dyn ModuleSource,
    root: &str,
    pattern: &str,
) -> Result<Vec<Arc<ActorDefinition>>, DiscoveryError> {
    let matcher = compile_pattern(pattern)?;
    let mut collected = Collected::default();

    if let Err(e) = scan_into(source, root, &matcher, &mut collected) {
        log_discovery_operation("import_all_actors", root, Some(pattern), "failed", None);
        return Err(e);
    }

    log_discovery_operation(
        "import_all_actors",
        root,
        Some(pattern),
        "completed",
        Some(collected.definitions.len()),
    );
    Ok(collected.definitions)
}

/// Every actor definition beneath any of `roots`, each definition once
pub fn collect_actors<S: AsRef<str>>(
    source: &dyn ModuleSource,
    roots: &[S],
) -> Result<Vec<Arc<ActorDefinition>>, DiscoveryError> {
    collect_actors_matching(source, roots, MATCH_ALL)
}

/// [`collect_actors`] restricted to symbols fully matching `pattern`
pub fn collect_actors_matching<S: AsRef<str>>(
    source: &dyn ModuleSource,
    roots: &[S],
    pattern: &str,
) -> Result<Vec<Arc<ActorDefinition>>, DiscoveryError> {
    let matcher = compile_pattern(pattern)?;
    let mut collected = Collected::default();

    for root in roots {
        let root = root.as_ref();
        if let Err(e) = scan_into(source, root, &matcher, &mut collected) {
            log_discovery_operation("collect_actors", root, Some(pattern), "failed", None);
            return Err(e);
        }
    }

    debug!(
        roots = roots.len(),
        actors = collected.definitions.len(),
        "Actor collection complete"
    );
    Ok(collected.definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::actor;
    use crate::scanner::{Module, ModuleCatalog};
    use serde_json::Value;

    fn definition(name: &str, symbol: &str) -> Arc<ActorDefinition> {
        actor(name).sync_fn(symbol, |_, _| Ok(Value::Null)).unwrap()
    }

    #[test]
    fn test_pattern_must_match_whole_symbol() {
        let matcher = compile_pattern("task_.*").unwrap();
        assert!(matcher.is_match("task_a"));
        assert!(!matcher.is_match("my_task_a"));

        let alternation = compile_pattern("a|b").unwrap();
        assert!(alternation.is_match("a"));
        assert!(!alternation.is_match("ab"));
    }

    #[test]
    fn test_invalid_pattern() {
        let catalog = ModuleCatalog::new();
        let err = import_all_actors(&catalog, "app", "task_(").unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidPattern { .. }));
    }

    #[test]
    fn test_reexported_definition_is_collected_once() {
        let shared = definition("app.shared", "shared");
        let mut catalog = ModuleCatalog::new();
        catalog
            .add_module(Module::new("app").with_actor(shared.clone()))
            .add_module(Module::new("app.sub").with_actor_as("alias", shared.clone()));

        let found = import_all_actors(&catalog, "app", MATCH_ALL).unwrap();
        assert_eq!(found.len(), 1);
        assert!(Arc::ptr_eq(&found[0], &shared));
    }

    #[test]
    fn test_distinct_definitions_with_same_symbol_are_kept() {
        let mut catalog = ModuleCatalog::new();
        catalog
            .add_module(Module::new("a").with_actor(definition("a.run", "run")))
            .add_module(Module::new("b").with_actor(definition("b.run", "run")));

        let found = collect_actors(&catalog, &["a", "b"]).unwrap();
        assert_eq!(found.len(), 2);
    }
}
