//! # Configuration
//!
//! Settings for discovery and validation. Sources, lowest precedence first:
//!
//! 1. [`ActorlibConfig::default`]
//! 2. A config file (`actorlib.toml`), then its environment overlay
//!    (`actorlib.production.toml`), via [`ActorlibConfig::load`]
//! 3. `ACTORLIB_*` environment variables
//!
//! [`ActorlibConfig::from_env`] skips the file layers entirely.

use crate::discovery::{compile_pattern, MATCH_ALL};
use crate::error::ConfigurationError;
use crate::logging::get_environment;
use crate::scanner::{PluginDirectory, SymbolTable, DEFAULT_ENTRY_MODULE};
use crate::schema::JsonSchemaCompiler;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ACTORLIB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorlibConfig {
    pub environment: String,
    /// Search roots for plugin module files
    pub plugin_paths: Vec<PathBuf>,
    /// Module roots scanned for actors
    pub discovery_roots: Vec<String>,
    /// Symbols must fully match this pattern to be collected
    pub discovery_pattern: String,
    pub entry_module: String,
    /// Convert string-encoded scalars in message content before validation
    pub coerce_params: bool,
}

impl Default for ActorlibConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            plugin_paths: vec![PathBuf::from("plugins")],
            discovery_roots: Vec::new(),
            discovery_pattern: MATCH_ALL.to_string(),
            entry_module: DEFAULT_ENTRY_MODULE.to_string(),
            coerce_params: true,
        }
    }
}

impl ActorlibConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Self {
            environment: get_environment(),
            ..Self::default()
        };

        if let Some(paths) = Self::env_plugin_paths() {
            config.plugin_paths = paths;
        }

        if let Ok(roots) = std::env::var("ACTORLIB_DISCOVERY_ROOTS") {
            config.discovery_roots = Self::normalize_roots(roots.split(','));
        }

        if let Ok(pattern) = std::env::var("ACTORLIB_DISCOVERY_PATTERN") {
            config.discovery_pattern = pattern;
        }

        if let Ok(entry_module) = std::env::var("ACTORLIB_ENTRY_MODULE") {
            config.entry_module = entry_module;
        }

        if let Ok(coerce) = std::env::var("ACTORLIB_COERCE_PARAMS") {
            config.coerce_params = coerce.parse().map_err(|e| {
                ConfigurationError::invalid_setting("coerce_params", format!("{e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load `path`, its optional environment overlay, then `ACTORLIB_*` variables
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let environment = get_environment();

        let mut builder = config::Config::builder()
            .set_default("environment", environment.clone())
            .map_err(|e| ConfigurationError::invalid_setting("environment", e.to_string()))?
            .add_source(config::File::from(path));
        if let Some(overlay) = Self::overlay_path(path, &environment) {
            builder = builder.add_source(config::File::from(overlay).required(false));
        }

        let plugin_paths = Self::env_plugin_paths().map(|paths| {
            paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
        });

        let mut config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("discovery_roots"),
            )
            .set_override_option("plugin_paths", plugin_paths)
            .and_then(|builder| builder.build())
            .and_then(|settings| settings.try_deserialize())
            .map_err(|e| {
                ConfigurationError::invalid_setting(path.display().to_string(), e.to_string())
            })?;
        config.discovery_roots = Self::normalize_roots(&config.discovery_roots);

        config.validate()?;
        Ok(config)
    }

    /// `ACTORLIB_PLUGIN_PATH`, split like `PATH`
    fn env_plugin_paths() -> Option<Vec<PathBuf>> {
        std::env::var_os("ACTORLIB_PLUGIN_PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
    }

    /// Trim roots and drop empty entries left by trailing separators
    fn normalize_roots<I, S>(roots: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roots
            .into_iter()
            .map(|root| root.as_ref().trim().to_string())
            .filter(|root| !root.is_empty())
            .collect()
    }

    /// `actorlib.toml` -> `actorlib.<environment>.toml`
    fn overlay_path(path: &Path, environment: &str) -> Option<PathBuf> {
        let stem = path.file_stem()?.to_str()?;
        let file_name = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}.{environment}.{ext}"),
            None => format!("{stem}.{environment}"),
        };
        Some(path.with_file_name(file_name))
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        compile_pattern(&self.discovery_pattern).map_err(|e| {
            ConfigurationError::invalid_setting("discovery_pattern", e.to_string())
        })?;

        if self.entry_module.trim().is_empty() {
            return Err(ConfigurationError::invalid_setting(
                "entry_module",
                "must not be empty",
            ));
        }

        if let Some(root) = self
            .discovery_roots
            .iter()
            .find(|root| root.is_empty() || root.split('.').any(str::is_empty))
        {
            return Err(ConfigurationError::invalid_setting(
                "discovery_roots",
                format!("'{root}' is not a valid module path"),
            ));
        }

        Ok(())
    }

    pub fn schema_compiler(&self) -> JsonSchemaCompiler {
        if self.coerce_params {
            JsonSchemaCompiler::new()
        } else {
            JsonSchemaCompiler::new().strict()
        }
    }

    /// Plugin directory over the configured search roots
    pub fn plugin_directory(&self, symbols: SymbolTable) -> PluginDirectory {
        PluginDirectory::new(self.plugin_paths.iter().cloned(), symbols)
            .with_entry_module(self.entry_module.clone())
    }
}
