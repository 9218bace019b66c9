//! # Registry Infrastructure
//!
//! Builds [`Actor`](crate::actor::Actor) wrappers for discovered or explicitly
//! listed definitions and indexes them by name and module.
//!
//! ```text
//! ActorRegistry
//! ├── build      (explicit definitions -> actors)
//! └── discover   (module roots -> definitions -> actors)
//! ```
//!
//! Construction is all-or-nothing: the first definition that fails to build
//! aborts the registry.

pub mod actor_registry;

pub use actor_registry::{ActorRegistry, RegistryStats};
