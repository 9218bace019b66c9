//! # Actor Registry
//!
//! Central, immutable index of constructed actors. Lookups never allocate
//! beyond the returned collections; the registry can be shared behind an `Arc`.
//!
//! ## Usage
//!
//! ```rust
//! use actorlib::context::{ActorContext, ActorMessage};
//! use actorlib::registry::ActorRegistry;
//! use actorlib::schema::JsonSchemaCompiler;
//! use actorlib::{actor, TypeDescriptor};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let double = actor("math.double")
//!     .param("x", TypeDescriptor::Int)
//!     .sync_fn("double", |_, params| Ok(json!(params.get::<i64>("x")? * 2)))?;
//!
//! let registry = ActorRegistry::build([double], &JsonSchemaCompiler::new())?;
//! let ctx = ActorContext::from(ActorMessage::from_json("math.double", json!({"x": 4})));
//! let result = registry.invoke(ctx)?.into_ready();
//! assert_eq!(result, Some(json!(8)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::actor::{Actor, Invocation};
use crate::context::ActorContext;
use crate::discovery::{collect_actors_matching, MATCH_ALL};
use crate::error::{ActorError, ConfigurationError, Result};
use crate::handler::ActorDefinition;
use crate::logging::{log_error, log_registry_operation};
use crate::scanner::ModuleSource;
use crate::schema::SchemaCompiler;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registry statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_actors: usize,
    pub async_actors: usize,
    pub sync_actors: usize,
    pub timer_actors: usize,
    pub modules: usize,
}

/// Immutable collection of constructed actors
pub struct ActorRegistry {
    actors: Vec<Arc<Actor>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ActorRegistry {
    /// Construct an actor for every definition.
    ///
    /// Fails on the first definition whose signature is invalid or whose
    /// schemas do not compile.
    pub fn build<I>(
        definitions: I,
        compiler: &dyn SchemaCompiler,
    ) -> std::result::Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = Arc<ActorDefinition>>,
    {
        let mut registry = Self {
            actors: Vec::new(),
            by_name: HashMap::new(),
        };

        for definition in definitions {
            let actor = Actor::new(definition, compiler).inspect_err(|e| {
                log_error("registry", "build", &e.to_string(), e.actor());
            })?;
            registry.insert(actor);
        }

        info!(
            actor_count = registry.actors.len(),
            module_count = registry.modules().len(),
            "✅ Actor registry built"
        );
        Ok(registry)
    }

    /// Discover every actor beneath `roots` and construct the registry
    pub fn discover<S: AsRef<str>>(
        source: &dyn ModuleSource,
        roots: &[S],
        compiler: &dyn SchemaCompiler,
    ) -> Result<Self> {
        Self::discover_matching(source, roots, MATCH_ALL, compiler)
    }

    /// [`discover`](Self::discover) restricted to symbols fully matching `pattern`
    pub fn discover_matching<S: AsRef<str>>(
        source: &dyn ModuleSource,
        roots: &[S],
        pattern: &str,
        compiler: &dyn SchemaCompiler,
    ) -> Result<Self> {
        let definitions = collect_actors_matching(source, roots, pattern).inspect_err(|e| {
            log_error("registry", "discover", &e.to_string(), None);
        })?;
        Ok(Self::build(definitions, compiler)?)
    }

    fn insert(&mut self, actor: Actor) {
        let name = actor.name().to_string();
        let indexes = self.by_name.entry(name.clone()).or_default();
        if !indexes.is_empty() {
            warn!(
                actor = %name,
                existing = indexes.len(),
                "Multiple actors share a name; lookups by name return the first"
            );
        }
        indexes.push(self.actors.len());

        log_registry_operation(
            "register",
            Some(&name),
            Some(actor.module()),
            "registered",
            actor.timer().map(|t| t.expression()),
        );
        self.actors.push(Arc::new(actor));
    }

    /// First actor registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<Actor>> {
        self.by_name
            .get(name)
            .and_then(|indexes| indexes.first())
            .map(|&index| &self.actors[index])
    }

    /// Every actor registered under `name`, in registration order
    pub fn get_all(&self, name: &str) -> Vec<&Arc<Actor>> {
        self.by_name
            .get(name)
            .map(|indexes| indexes.iter().map(|&index| &self.actors[index]).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All actors in registration order
    pub fn actors(&self) -> &[Arc<Actor>] {
        &self.actors
    }

    /// Distinct actor names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Distinct actor modules, sorted
    pub fn modules(&self) -> Vec<&str> {
        self.actors
            .iter()
            .map(|actor| actor.module())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn actors_in_module(&self, module: &str) -> Vec<&Arc<Actor>> {
        self.actors
            .iter()
            .filter(|actor| actor.module() == module)
            .collect()
    }

    /// Actors declaring a timer
    pub fn timer_actors(&self) -> Vec<&Arc<Actor>> {
        self.actors
            .iter()
            .filter(|actor| actor.timer().is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Route `ctx` to the actor named by its destination
    pub fn invoke(&self, ctx: ActorContext) -> Result<Invocation> {
        let name = ctx.message.dst.clone();
        let actor = self
            .get(&name)
            .ok_or_else(|| ActorError::UnknownActor { name: name.clone() })?;
        debug!(actor = %name, message_id = %ctx.message.id, "Dispatching message");
        actor.invoke(ctx)
    }

    pub fn stats(&self) -> RegistryStats {
        let async_actors = self.actors.iter().filter(|a| a.is_async()).count();
        RegistryStats {
            total_actors: self.actors.len(),
            async_actors,
            sync_actors: self.actors.len() - async_actors,
            timer_actors: self.timer_actors().len(),
            modules: self.modules().len(),
        }
    }
}

impl fmt::Debug for ActorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorRegistry")
            .field("actor_count", &self.actors.len())
            .field("actor_names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActorMessage;
    use crate::handler::actor;
    use crate::schema::{JsonSchemaCompiler, TypeDescriptor};
    use serde_json::{json, Value};

    fn noop(name: &str) -> Arc<ActorDefinition> {
        actor(name).sync_fn("noop", |_, _| Ok(Value::Null)).unwrap()
    }

    #[test]
    fn test_indexes_by_name_and_module() {
        let registry = ActorRegistry::build(
            [noop("mail.send"), noop("mail.digest"), noop("billing.charge")],
            &JsonSchemaCompiler::new(),
        )
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.modules(), vec!["billing", "mail"]);
        assert_eq!(registry.actors_in_module("mail").len(), 2);
        assert_eq!(registry.names(), vec!["billing.charge", "mail.digest", "mail.send"]);
        assert!(registry.get("mail.send").is_some());
        assert!(registry.get("mail.missing").is_none());
    }

    #[test]
    fn test_same_name_keeps_both_and_get_returns_first() {
        let first = noop("dup.actor");
        let second = noop("dup.actor");
        let registry =
            ActorRegistry::build([first.clone(), second], &JsonSchemaCompiler::new()).unwrap();

        assert_eq!(registry.get_all("dup.actor").len(), 2);
        assert!(Arc::ptr_eq(
            registry.get("dup.actor").unwrap().definition(),
            &first
        ));
    }

    #[test]
    fn test_build_aborts_on_first_invalid_definition() {
        let bad = actor("bad.one")
            .param_decl(crate::signature::ParamDecl {
                name: "x".to_string(),
                ty: None,
                default: None,
            })
            .sync_fn("bad", |_, _| Ok(Value::Null))
            .unwrap();

        let err = ActorRegistry::build([noop("ok.one"), bad], &JsonSchemaCompiler::new())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingTypeDescriptor { .. }));
    }

    #[test]
    fn test_invoke_routes_by_destination() {
        let echo = actor("util.echo")
            .param("text", TypeDescriptor::Str)
            .sync_fn("echo", |_, params| Ok(params.value("text").cloned().unwrap_or_default()))
            .unwrap();
        let registry = ActorRegistry::build([echo], &JsonSchemaCompiler::new()).unwrap();

        let ctx = ActorContext::from(ActorMessage::from_json("util.echo", json!({"text": "hi"})));
        assert_eq!(registry.invoke(ctx).unwrap().into_ready(), Some(json!("hi")));

        let unknown = ActorContext::from(ActorMessage::from_json("util.nope", json!({})));
        assert!(matches!(
            registry.invoke(unknown),
            Err(ActorError::UnknownActor { .. })
        ));
    }

    #[test]
    fn test_stats() {
        let ticker = actor("sched.tick")
            .timer("30s")
            .async_fn("tick", |_, _| async { Ok(Value::Null) })
            .unwrap();
        let registry =
            ActorRegistry::build([ticker, noop("sched.other")], &JsonSchemaCompiler::new())
                .unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total_actors, 2);
        assert_eq!(stats.async_actors, 1);
        assert_eq!(stats.sync_actors, 1);
        assert_eq!(stats.timer_actors, 1);
        assert_eq!(stats.modules, 1);
    }
}
