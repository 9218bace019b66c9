//! # Schemas
//!
//! Type descriptors declared by handlers and the compiler boundary that turns
//! them into validators.

pub mod compiler;
pub mod types;

pub use compiler::{
    coerce, CompileError, JsonSchemaCompiler, JsonSchemaValidator, SchemaCompiler, Validator,
};
pub use types::TypeDescriptor;
