//! # Handler Signatures
//!
//! A [`Signature`] is the explicit declaration of what a handler accepts and
//! returns, attached to the handler when it is declared. The invocation context
//! is always the handler's first argument and is never listed here.
//!
//! The extractor functions turn a signature into the schemas an actor compiles:
//!
//! - [`extract_params`] builds a composite `dict` schema from the declared
//!   parameters, or `None` when there are none.
//! - [`extract_returns`] yields the declared return type, or `None`.

use crate::error::ConfigurationError;
use crate::schema::TypeDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declared keyword parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeDescriptor>,
    #[serde(default)]
    pub default: Option<Value>,
}

impl ParamDecl {
    /// Typed parameter without a default
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            default: None,
        }
    }
}

/// Declared parameters and return type of a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default)]
    pub returns: Option<TypeDescriptor>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed parameter
    pub fn param(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.params.push(ParamDecl::new(name, ty));
        self
    }

    /// Add a parameter exactly as declared, including any default or missing type
    pub fn with_decl(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Declare the return type
    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.returns = Some(ty);
        self
    }

    /// Declared parameter names, in order
    pub fn param_names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Derive the parameter schema for `actor_name` from its signature.
///
/// Parameters may not declare defaults and must carry a type descriptor.
pub fn extract_params(
    signature: &Signature,
    actor_name: &str,
) -> Result<Option<TypeDescriptor>, ConfigurationError> {
    let mut fields = Vec::with_capacity(signature.params.len());

    for param in &signature.params {
        if param.default.is_some() {
            return Err(ConfigurationError::default_not_allowed(
                actor_name,
                &param.name,
            ));
        }
        let ty = param.ty.as_ref().ok_or_else(|| {
            ConfigurationError::missing_type_descriptor(actor_name, &param.name)
        })?;
        fields.push((param.name.clone(), ty.clone()));
    }

    if fields.is_empty() {
        Ok(None)
    } else {
        Ok(Some(TypeDescriptor::Dict(fields)))
    }
}

/// Derive the return schema, if one was declared
pub fn extract_returns(signature: &Signature) -> Option<TypeDescriptor> {
    signature.returns.clone()
}
