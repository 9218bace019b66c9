use actorlib::context::{ActorContext, ActorMessage};
use actorlib::handler::{ActorDefinition, HandlerResult};
use actorlib::scanner::{Module, ModuleCatalog};
use actorlib::{actor, AsyncHandler, Params, TypeDescriptor};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Context addressed to `dst` with the given JSON content
pub fn ctx(dst: &str, content: Value) -> ActorContext {
    ActorContext::from(ActorMessage::from_json(dst, content))
}

/// `math.double(x: int) -> int`
pub fn double_actor() -> Arc<ActorDefinition> {
    actor("math.double")
        .param("x", TypeDescriptor::Int)
        .returns(TypeDescriptor::Int)
        .sync_fn("double", |_ctx, params| {
            Ok(json!(params.get::<i64>("x")? * 2))
        })
        .unwrap()
}

pub fn noop_actor(name: &str, symbol: &str) -> Arc<ActorDefinition> {
    actor(name)
        .sync_fn(symbol, |_ctx, _params| Ok(Value::Null))
        .unwrap()
}

/// Async handler object greeting `name`
pub struct Greeter;

#[async_trait]
impl AsyncHandler for Greeter {
    async fn handle(&self, _ctx: ActorContext, params: Params) -> HandlerResult {
        let name: String = params.get("name")?;
        Ok(json!(format!("hello {name}")))
    }
}

pub fn greeter_actor() -> Arc<ActorDefinition> {
    actor("greet.hello")
        .param("name", TypeDescriptor::Str)
        .returns(TypeDescriptor::Str)
        .async_handler("Greeter", Greeter)
        .unwrap()
}

/// Definitions placed in [`sample_catalog`]
pub struct SampleActors {
    pub task_a: Arc<ActorDefinition>,
    pub task_b: Arc<ActorDefinition>,
    pub other: Arc<ActorDefinition>,
    pub entry: Arc<ActorDefinition>,
}

/// ```text
/// app                 VERSION
/// app.tasks           task_a, task_b, other
/// app.tasks.reexport  task_a (as alias)
/// main                run_main
/// ```
pub fn sample_catalog() -> (ModuleCatalog, SampleActors) {
    let actors = SampleActors {
        task_a: noop_actor("app.task_a", "task_a"),
        task_b: noop_actor("app.task_b", "task_b"),
        other: noop_actor("app.other", "other"),
        entry: noop_actor("main.run", "run_main"),
    };

    let mut catalog = ModuleCatalog::new();
    catalog
        .add_module(Module::new("app").with_value("VERSION", json!("1.0")))
        .add_module(
            Module::new("app.tasks")
                .with_actor(actors.task_a.clone())
                .with_actor(actors.task_b.clone())
                .with_actor(actors.other.clone()),
        )
        .add_module(Module::new("app.tasks.reexport").with_actor_as("alias", actors.task_a.clone()))
        .add_module(Module::new("main").with_actor(actors.entry.clone()));

    (catalog, actors)
}

pub fn write_module(root: &Path, relative: &str, content: &str) {
    let file = root.join(relative);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}
