//! Discovery over on-disk plugin directories.

mod common;

use actorlib::discovery::MATCH_ALL;
use actorlib::scanner::{scan_modules, PluginDirectory, SymbolTable};
use actorlib::schema::JsonSchemaCompiler;
use actorlib::{import_all_actors, ActorError, ActorRegistry, ActorlibConfig, DiscoveryError};
use common::*;
use serde_json::json;
use tempfile::TempDir;

fn symbol_table() -> SymbolTable {
    [
        double_actor(),
        greeter_actor(),
        noop_actor("billing.charge", "charge"),
        noop_actor("billing.refund", "refund"),
        noop_actor("main.boot", "boot"),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_namespace_package_spans_search_roots() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_module(first.path(), "plugins/math.toml", "exports = [\"double\"]\n");
    write_module(second.path(), "plugins/greet/mod.toml", "exports = [\"Greeter\"]\n");
    write_module(
        second.path(),
        "plugins/greet/billing.toml",
        "exports = [\"charge\", \"refund\"]\n",
    );

    let directory = PluginDirectory::new([first.path(), second.path()], symbol_table());
    let found = import_all_actors(&directory, "plugins", MATCH_ALL).unwrap();

    let mut names: Vec<&str> = found.iter().map(|d| d.name()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["billing.charge", "billing.refund", "greet.hello", "math.double"]
    );
}

#[test]
fn test_scan_yields_root_then_each_module_once() {
    let tmp = TempDir::new().unwrap();
    write_module(tmp.path(), "plugins/mod.toml", "");
    write_module(tmp.path(), "plugins/a.toml", "");
    write_module(tmp.path(), "plugins/nested/mod.toml", "");
    write_module(tmp.path(), "plugins/nested/b.toml", "");

    let directory = PluginDirectory::new([tmp.path(), tmp.path()], SymbolTable::new());
    let paths: Vec<String> = scan_modules(&directory, "plugins")
        .map(|m| m.unwrap().path().to_string())
        .collect();

    assert_eq!(paths[0], "plugins");
    let mut rest = paths[1..].to_vec();
    rest.sort();
    assert_eq!(rest, vec!["plugins.a", "plugins.nested", "plugins.nested.b"]);
}

#[test]
fn test_pattern_applies_to_exported_symbols() {
    let tmp = TempDir::new().unwrap();
    write_module(
        tmp.path(),
        "plugins/billing.toml",
        "exports = [\"charge\", \"refund\", \"double\"]\n",
    );

    let directory = PluginDirectory::new([tmp.path()], symbol_table());
    let found = import_all_actors(&directory, "plugins", "charge|refund").unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn test_broken_module_file_aborts_discovery() {
    let tmp = TempDir::new().unwrap();
    write_module(tmp.path(), "plugins/good.toml", "exports = [\"double\"]\n");
    write_module(tmp.path(), "plugins/zz_broken.toml", "exports = [\n");

    let directory = PluginDirectory::new([tmp.path()], symbol_table());
    let err = import_all_actors(&directory, "plugins", MATCH_ALL).unwrap_err();
    assert!(matches!(
        err,
        DiscoveryError::Import { ref module, .. } if module == "plugins.zz_broken"
    ));
}

#[test]
fn test_entry_file_is_only_loaded_as_entry_module() {
    let tmp = TempDir::new().unwrap();
    write_module(tmp.path(), "main.toml", "exports = [\"boot\"]\n");
    write_module(tmp.path(), "plugins/main.toml", "exports = [\"boot\"]\n");
    write_module(tmp.path(), "plugins/math.toml", "exports = [\"double\"]\n");

    let directory = PluginDirectory::new([tmp.path()], symbol_table());

    let plugins = import_all_actors(&directory, "plugins", MATCH_ALL).unwrap();
    assert_eq!(plugins.len(), 1);
    assert_eq!(plugins[0].symbol(), "double");

    let entry = import_all_actors(&directory, "main", MATCH_ALL).unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry[0].symbol(), "boot");
}

#[tokio::test]
async fn test_registry_from_configured_plugin_directory() {
    let tmp = TempDir::new().unwrap();
    write_module(tmp.path(), "plugins/math.toml", "exports = [\"double\"]\n");
    write_module(tmp.path(), "plugins/greet.toml", "exports = [\"Greeter\"]\n");

    let config = ActorlibConfig {
        plugin_paths: vec![tmp.path().to_path_buf()],
        discovery_roots: vec!["plugins".to_string()],
        ..ActorlibConfig::default()
    };
    let directory = config.plugin_directory(symbol_table());
    let registry = ActorRegistry::discover_matching(
        &directory,
        &config.discovery_roots,
        &config.discovery_pattern,
        &config.schema_compiler(),
    )
    .unwrap();

    assert_eq!(registry.names(), vec!["greet.hello", "math.double"]);
    let greeting = registry
        .invoke(ctx("greet.hello", json!({"name": "plugins"})))
        .unwrap()
        .resolve()
        .await
        .unwrap();
    assert_eq!(greeting, json!("hello plugins"));
}

#[test]
fn test_missing_root_directory_is_module_not_found() {
    let tmp = TempDir::new().unwrap();
    let directory = PluginDirectory::new([tmp.path()], symbol_table());

    let err = ActorRegistry::discover(&directory, &["plugins"], &JsonSchemaCompiler::new())
        .unwrap_err();
    assert!(matches!(
        err,
        ActorError::Discovery(DiscoveryError::ModuleNotFound { .. })
    ));
}
