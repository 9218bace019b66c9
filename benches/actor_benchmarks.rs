use actorlib::context::{ActorContext, ActorMessage};
use actorlib::discovery::MATCH_ALL;
use actorlib::scanner::{Module, ModuleCatalog};
use actorlib::schema::JsonSchemaCompiler;
use actorlib::{actor, import_all_actors, Actor, TypeDescriptor};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

fn benchmark_sync_invoke(c: &mut Criterion) {
    let definition = actor("math.double")
        .param("x", TypeDescriptor::Int)
        .returns(TypeDescriptor::Int)
        .sync_fn("double", |_ctx, params| Ok(json!(params.get::<i64>("x")? * 2)))
        .unwrap();
    let double = Actor::new(definition, &JsonSchemaCompiler::new()).unwrap();
    let ctx = ActorContext::from(ActorMessage::from_json("math.double", json!({"x": "5"})));

    c.bench_function("sync_invoke_with_coercion", |b| {
        b.iter(|| double.invoke(black_box(ctx.clone())).unwrap())
    });
}

fn benchmark_discovery(c: &mut Criterion) {
    let mut catalog = ModuleCatalog::new();
    catalog.add_module(Module::new("bench"));
    for i in 0..50 {
        let definition = actor(format!("bench.actor_{i}"))
            .sync_fn(format!("actor_{i}"), |_ctx, _params| Ok(Value::Null))
            .unwrap();
        catalog.add_module(Module::new(format!("bench.m{i}")).with_actor(definition));
    }

    c.bench_function("discover_50_modules", |b| {
        b.iter(|| import_all_actors(&catalog, black_box("bench"), MATCH_ALL).unwrap())
    });
}

criterion_group!(benches, benchmark_sync_invoke, benchmark_discovery);
criterion_main!(benches);
