#![allow(clippy::doc_markdown)] // Allow technical terms like JSONSchema in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Actorlib
//!
//! Validated, uniformly invokable actors for message-driven processing.
//!
//! ## Overview
//!
//! An actor is a named handler that receives an invocation context carrying an
//! inbound message. Handlers declare their keyword parameters and return type
//! up front; the library derives schemas from those declarations, validates the
//! message content before the handler runs and the handler's result after it
//! returns, and exposes sync and async handlers through one calling convention.
//!
//! Actors are found by scanning module roots, either a static
//! [`ModuleCatalog`](scanner::ModuleCatalog) or a convention-based
//! [`PluginDirectory`](scanner::PluginDirectory) on disk.
//!
//! ## Module Organization
//!
//! - [`schema`] - Type descriptors and the schema compiler boundary
//! - [`signature`] - Parameter and return declarations, schema extraction
//! - [`handler`] - Handler traits, definitions and the [`actor()`] declaration builder
//! - [`actor`](mod@actor) - The [`Actor`] wrapper and [`Invocation`]
//! - [`scanner`] - Module sources and the lazy module scan
//! - [`discovery`] - Pattern-filtered, identity-deduplicated actor collection
//! - [`registry`] - Indexed collection of constructed actors
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use actorlib::context::{ActorContext, ActorMessage};
//! use actorlib::schema::JsonSchemaCompiler;
//! use actorlib::{actor, Actor, TypeDescriptor};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let definition = actor("math.double")
//!     .param("x", TypeDescriptor::Int)
//!     .returns(TypeDescriptor::Int)
//!     .sync_fn("double", |_ctx, params| Ok(json!(params.get::<i64>("x")? * 2)))?;
//!
//! let double = Actor::new(definition, &JsonSchemaCompiler::new())?;
//! assert_eq!(double.to_string(), "<Actor math.double>");
//!
//! // String-encoded scalars are coerced before validation
//! let ctx = ActorContext::from(ActorMessage::from_json("math.double", json!({"x": "5"})));
//! assert_eq!(double.invoke(ctx)?.into_ready(), Some(json!(10)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod actor;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod handler;
pub mod logging;
pub mod registry;
pub mod scanner;
pub mod schema;
pub mod signature;
pub mod timer;

pub use actor::{Actor, ActorMode, Invocation};
pub use config::ActorlibConfig;
pub use context::{ActorContext, ActorMessage};
pub use discovery::{collect_actors, import_all_actors};
pub use error::{ActorError, ConfigurationError, DiscoveryError, Result, ValidationError};
pub use handler::{actor, ActorDefinition, AsyncHandler, Handler, Params, SyncHandler};
pub use registry::ActorRegistry;
pub use schema::TypeDescriptor;
pub use signature::Signature;
pub use timer::TimerSpec;
