//! # Error Types
//!
//! Structured error handling for actor declaration, registration, discovery and
//! invocation using thiserror.
//!
//! Errors fall into three families with different lifetimes:
//!
//! - [`ConfigurationError`] is raised while declaring or constructing actors and
//!   must halt the whole registration pass.
//! - [`ValidationError`] is raised while invoking an actor, when message content
//!   or a handler result does not conform to its schema.
//! - [`DiscoveryError`] is raised while scanning modules and aborts the scan.
//!
//! [`ActorError`] wraps all of them, plus handler failures.

use thiserror::Error;

/// Construction-time errors. A partially registered actor set is invalid, so
/// callers treat any of these as a startup failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Parameter '{parameter}' of actor '{actor}' must not declare a default value")]
    DefaultNotAllowed { actor: String, parameter: String },

    #[error("Parameter '{parameter}' of actor '{actor}' is missing a type descriptor")]
    MissingTypeDescriptor { actor: String, parameter: String },

    #[error("Invalid timer '{expression}' for actor '{actor}': {reason}")]
    InvalidTimer {
        actor: String,
        expression: String,
        reason: String,
    },

    #[error("Invalid type descriptor '{descriptor}': {reason}")]
    InvalidTypeDescriptor { descriptor: String, reason: String },

    #[error("Failed to compile schema for actor '{actor}': {reason}")]
    SchemaCompilation { actor: String, reason: String },

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl ConfigurationError {
    /// Create a default-not-allowed error
    pub fn default_not_allowed(actor: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::DefaultNotAllowed {
            actor: actor.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a missing-type-descriptor error
    pub fn missing_type_descriptor(
        actor: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self::MissingTypeDescriptor {
            actor: actor.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an invalid timer error
    pub fn invalid_timer(
        actor: impl Into<String>,
        expression: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTimer {
            actor: actor.into(),
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid type descriptor error
    pub fn invalid_type_descriptor(
        descriptor: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTypeDescriptor {
            descriptor: descriptor.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema compilation error
    pub fn schema_compilation(actor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaCompilation {
            actor: actor.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Name of the actor this error refers to, if any
    pub fn actor(&self) -> Option<&str> {
        match self {
            Self::DefaultNotAllowed { actor, .. }
            | Self::MissingTypeDescriptor { actor, .. }
            | Self::InvalidTimer { actor, .. }
            | Self::SchemaCompilation { actor, .. } => Some(actor),
            Self::InvalidTypeDescriptor { .. } | Self::InvalidSetting { .. } => None,
        }
    }
}

/// A single schema violation: where it happened and which constraint failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON pointer to the offending value (`""` for the root)
    pub path: String,
    /// Human readable description of the violated constraint
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Invocation-time schema violation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Validation failed: {}", .issues.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Create a validation error from collected issues
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Create a validation error with a single issue
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue {
                path: path.into(),
                message: message.into(),
            }],
        }
    }

    /// Whether any issue points at the given field (matched by pointer segment)
    pub fn mentions_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| {
            issue.path.split('/').any(|segment| segment == field) || issue.message.contains(field)
        })
    }
}

/// Module scanning and discovery failures. Fatal: no partial result is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Failed to import module '{module}': {reason}")]
    Import { module: String, reason: String },

    #[error("No module named '{module}'")]
    ModuleNotFound { module: String },

    #[error("Invalid discovery pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl DiscoveryError {
    /// Create an import error
    pub fn import(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Import {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create a module-not-found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            module: module.into(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Umbrella error for the crate
#[derive(Error, Debug)]
pub enum ActorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Actor '{actor}' handler failed: {source}")]
    Handler {
        actor: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Actor '{actor}' is synchronous but its handler produced a pending result")]
    ModeMismatch { actor: String },

    #[error("No actor registered under '{name}'")]
    UnknownActor { name: String },
}

impl ActorError {
    /// Create a handler failure error
    pub fn handler(actor: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Handler {
            actor: actor.into(),
            source,
        }
    }

    /// Whether this error is a schema validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Borrow the validation error, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = ActorError> = std::result::Result<T, E>;
