//! # Schema Compiler
//!
//! The boundary between actors and the schema engine. Actors only depend on the
//! contract:
//!
//! ```text
//! compile(schema) -> validator
//! validator(raw)  -> coerced | ValidationError
//! ```
//!
//! [`JsonSchemaCompiler`] is the bundled implementation. It first coerces raw
//! message values toward the declared types (`"5"` becomes `5` for an `int`
//! field, undeclared object keys are dropped) and then validates the result
//! against a draft-07 JSON Schema compiled once with `jsonschema`.

use crate::error::{ValidationError, ValidationIssue};
use crate::schema::types::TypeDescriptor;
use jsonschema::{Draft, JSONSchema};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A compiled validator: checks raw data and returns its coerced form
pub trait Validator: Send + Sync {
    fn validate(&self, data: Value) -> Result<Value, ValidationError>;
}

/// Failure to turn a schema description into a validator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct CompileError {
    pub reason: String,
}

/// Turns schema descriptions into validators
pub trait SchemaCompiler: Send + Sync {
    fn compile(&self, schema: &TypeDescriptor) -> Result<Arc<dyn Validator>, CompileError>;
}

/// Schema compiler backed by the `jsonschema` crate
#[derive(Debug, Clone)]
pub struct JsonSchemaCompiler {
    draft: Draft,
    coerce: bool,
}

impl JsonSchemaCompiler {
    /// Draft-07 compiler with coercion enabled
    pub fn new() -> Self {
        Self {
            draft: Draft::Draft7,
            coerce: true,
        }
    }

    /// Use a different JSON Schema draft
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = draft;
        self
    }

    /// Disable coercion: values must already have the declared JSON types
    pub fn strict(mut self) -> Self {
        self.coerce = false;
        self
    }
}

impl Default for JsonSchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCompiler for JsonSchemaCompiler {
    fn compile(&self, schema: &TypeDescriptor) -> Result<Arc<dyn Validator>, CompileError> {
        let document = schema.to_json_schema();
        let compiled = JSONSchema::options()
            .with_draft(self.draft)
            .compile(&document)
            .map_err(|e| CompileError {
                reason: e.to_string(),
            })?;

        Ok(Arc::new(JsonSchemaValidator {
            descriptor: schema.clone(),
            compiled,
            coerce: self.coerce,
        }))
    }
}

/// Validator produced by [`JsonSchemaCompiler`]
pub struct JsonSchemaValidator {
    descriptor: TypeDescriptor,
    compiled: JSONSchema,
    coerce: bool,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("descriptor", &self.descriptor.to_string())
            .field("coerce", &self.coerce)
            .finish()
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, data: Value) -> Result<Value, ValidationError> {
        let value = if self.coerce {
            coerce(&self.descriptor, data)
        } else {
            data
        };

        if let Err(errors) = self.compiled.validate(&value) {
            let issues = errors
                .map(|e| ValidationIssue {
                    path: e.instance_path.to_string(),
                    message: e.to_string().replace('\n', " "),
                })
                .collect();
            return Err(ValidationError::new(issues));
        }

        Ok(value)
    }
}

/// Best-effort conversion of raw values toward the declared type.
///
/// Values that cannot be converted are returned untouched so the schema check
/// reports them with their original content.
pub fn coerce(descriptor: &TypeDescriptor, value: Value) -> Value {
    match (descriptor, value) {
        (TypeDescriptor::Optional(_), Value::Null) => Value::Null,
        (TypeDescriptor::Optional(inner), other) => coerce(inner, other),
        (TypeDescriptor::Int, Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(s),
        },
        (TypeDescriptor::Int, Value::Number(n)) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                Value::Number((f as i64).into())
            }
            _ => Value::Number(n),
        },
        (TypeDescriptor::Float, Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) => Number::from_f64(f).map_or(Value::String(s), Value::Number),
            Err(_) => Value::String(s),
        },
        (TypeDescriptor::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "on" | "1" => Value::Bool(true),
            "false" | "no" | "n" | "off" | "0" => Value::Bool(false),
            _ => Value::String(s),
        },
        (TypeDescriptor::Bool, Value::Number(n)) => match n.as_i64() {
            Some(1) => Value::Bool(true),
            Some(0) => Value::Bool(false),
            _ => Value::Number(n),
        },
        (TypeDescriptor::List(item), Value::Array(items)) => {
            Value::Array(items.into_iter().map(|v| coerce(item, v)).collect())
        }
        (TypeDescriptor::Dict(fields), Value::Object(mut map)) => {
            let mut coerced = Map::new();
            for (name, ty) in fields {
                if let Some(raw) = map.remove(name) {
                    coerced.insert(name.clone(), coerce(ty, raw));
                }
            }
            Value::Object(coerced)
        }
        (_, other) => other,
    }
}
