//! # Type Descriptors
//!
//! The structural type language handlers use to declare what they accept and
//! return. Descriptors are built in code (`TypeDescriptor::Int`) or parsed from
//! the compact string form used in plugin manifests:
//!
//! ```text
//! int | float | bool | str | any
//! list(<descriptor>)
//! dict{<name>: <descriptor>, ...}
//! <descriptor>.optional
//! ```

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

const OPTIONAL_SUFFIX: &str = ".optional";

/// Structural description of a value's expected shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeDescriptor {
    Int,
    Float,
    Bool,
    Str,
    Any,
    List(Box<TypeDescriptor>),
    /// Ordered fields; every field is required
    Dict(Vec<(String, TypeDescriptor)>),
    /// Accepts `null` in addition to the inner type
    Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// List of the given item type
    pub fn list(item: TypeDescriptor) -> Self {
        Self::List(Box::new(item))
    }

    /// Object with the given ordered fields
    pub fn dict<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeDescriptor)>,
        S: Into<String>,
    {
        Self::Dict(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Wrap this descriptor so `null` is accepted too
    pub fn optional(self) -> Self {
        match self {
            Self::Optional(_) => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Field names of a `Dict`, in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            Self::Dict(fields) => fields.iter().map(|(name, _)| name.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Render as a draft-07 JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::Int => json!({"type": "integer"}),
            Self::Float => json!({"type": "number"}),
            Self::Bool => json!({"type": "boolean"}),
            Self::Str => json!({"type": "string"}),
            Self::Any => json!({}),
            Self::List(item) => json!({"type": "array", "items": item.to_json_schema()}),
            Self::Dict(fields) => {
                let mut properties = Map::new();
                let mut required = Vec::with_capacity(fields.len());
                for (name, ty) in fields {
                    properties.insert(name.clone(), ty.to_json_schema());
                    required.push(Value::String(name.clone()));
                }
                json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                })
            }
            Self::Optional(inner) => json!({"anyOf": [inner.to_json_schema(), {"type": "null"}]}),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Str => write!(f, "str"),
            Self::Any => write!(f, "any"),
            Self::List(item) => write!(f, "list({item})"),
            Self::Dict(fields) => {
                write!(f, "dict{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
            Self::Optional(inner) => write!(f, "{inner}{OPTIONAL_SUFFIX}"),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(inner) = trimmed.strip_suffix(OPTIONAL_SUFFIX) {
            return Ok(inner.parse::<TypeDescriptor>()?.optional());
        }

        if let Some(rest) = trimmed.strip_prefix("list(") {
            let inner = rest.strip_suffix(')').ok_or_else(|| {
                ConfigurationError::invalid_type_descriptor(s, "unbalanced parentheses")
            })?;
            return Ok(Self::list(inner.parse()?));
        }

        if let Some(rest) = trimmed.strip_prefix("dict{") {
            let body = rest.strip_suffix('}').ok_or_else(|| {
                ConfigurationError::invalid_type_descriptor(s, "unbalanced braces")
            })?;
            let mut fields = Vec::new();
            for field in split_top_level(body).into_iter().filter(|f| !f.trim().is_empty()) {
                let (name, ty) = field.split_once(':').ok_or_else(|| {
                    ConfigurationError::invalid_type_descriptor(
                        s,
                        format!("field '{}' has no type", field.trim()),
                    )
                })?;
                fields.push((name.trim().to_string(), ty.parse()?));
            }
            return Ok(Self::Dict(fields));
        }

        match trimmed {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "str" => Ok(Self::Str),
            "any" => Ok(Self::Any),
            "" => Err(ConfigurationError::invalid_type_descriptor(
                s,
                "empty type descriptor",
            )),
            other => Err(ConfigurationError::invalid_type_descriptor(
                s,
                format!("unknown type '{other}'"),
            )),
        }
    }
}

/// Split on commas that are not nested inside `()` or `{}`
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in body.char_indices() {
        match ch {
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

impl TryFrom<String> for TypeDescriptor {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeDescriptor> for String {
    fn from(value: TypeDescriptor) -> Self {
        value.to_string()
    }
}
