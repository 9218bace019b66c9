//! # Handlers and Actor Declarations
//!
//! A handler is the callable that supplies an actor's behavior. It is either
//! synchronous ([`SyncHandler`]) or asynchronous ([`AsyncHandler`]), and either
//! a plain function (closure) or an object implementing one of the traits.
//!
//! Handlers are declared with [`actor`], which attaches the actor metadata and
//! the handler's [`Signature`] and produces a shared [`ActorDefinition`]:
//!
//! ```rust
//! use actorlib::{actor, TypeDescriptor};
//! use serde_json::json;
//!
//! let double = actor("math.double")
//!     .param("x", TypeDescriptor::Int)
//!     .returns(TypeDescriptor::Int)
//!     .sync_fn("double", |_ctx, params| {
//!         let x: i64 = params.get("x")?;
//!         Ok(json!(x * 2))
//!     })
//!     .expect("valid declaration");
//!
//! assert_eq!(double.name(), "math.double");
//! assert_eq!(double.symbol(), "double");
//! ```

use crate::context::ActorContext;
use crate::error::ConfigurationError;
use crate::schema::TypeDescriptor;
use crate::signature::{ParamDecl, Signature};
use crate::timer::TimerSpec;
use anyhow::Context as _;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result type returned by handlers
pub type HandlerResult = anyhow::Result<Value>;

/// Validated keyword arguments passed to a handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Deserialize one parameter into `T`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("missing parameter '{name}'"))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("parameter '{name}' has an unexpected shape"))
    }

    /// Raw value of one parameter
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Synchronous handler: runs to completion on the calling thread
pub trait SyncHandler: Send + Sync {
    fn handle(&self, ctx: &ActorContext, params: Params) -> HandlerResult;
}

/// Asynchronous handler: produces a future the caller drives
#[async_trait]
pub trait AsyncHandler: Send + Sync {
    async fn handle(&self, ctx: ActorContext, params: Params) -> HandlerResult;
}

struct FnHandler<F>(F);

impl<F> SyncHandler for FnHandler<F>
where
    F: Fn(&ActorContext, Params) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &ActorContext, params: Params) -> HandlerResult {
        (self.0)(ctx, params)
    }
}

struct AsyncFnHandler<F>(F);

#[async_trait]
impl<F, Fut> AsyncHandler for AsyncFnHandler<F>
where
    F: Fn(ActorContext, Params) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: ActorContext, params: Params) -> HandlerResult {
        (self.0)(ctx, params).await
    }
}

/// How a handler was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// A plain function or closure
    Function,
    /// An object implementing a handler trait
    Object,
}

/// A handler tagged with its calling convention
#[derive(Clone)]
pub enum Handler {
    Sync {
        kind: HandlerKind,
        inner: Arc<dyn SyncHandler>,
    },
    Async {
        kind: HandlerKind,
        inner: Arc<dyn AsyncHandler>,
    },
}

impl Handler {
    /// Wrap a synchronous closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ActorContext, Params) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync {
            kind: HandlerKind::Function,
            inner: Arc::new(FnHandler(f)),
        }
    }

    /// Wrap an asynchronous closure
    pub fn from_async_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(ActorContext, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Async {
            kind: HandlerKind::Function,
            inner: Arc::new(AsyncFnHandler(f)),
        }
    }

    /// Wrap an object whose call is synchronous
    pub fn sync_object(handler: impl SyncHandler + 'static) -> Self {
        Self::Sync {
            kind: HandlerKind::Object,
            inner: Arc::new(handler),
        }
    }

    /// Wrap an object whose call is asynchronous
    pub fn async_object(handler: impl AsyncHandler + 'static) -> Self {
        Self::Async {
            kind: HandlerKind::Object,
            inner: Arc::new(handler),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Self::Sync { kind, .. } | Self::Async { kind, .. } => *kind,
        }
    }

    /// Whether calling this handler produces a future
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async { .. })
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.is_async() { "async" } else { "sync" };
        f.debug_struct("Handler")
            .field("mode", &mode)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Metadata attached by the declaration mechanism
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerMetadata {
    /// Dot-namespaced actor name
    pub name: String,
    pub timer: Option<TimerSpec>,
    /// Explicit async override; `None` means infer from the handler
    pub is_async: Option<bool>,
}

/// A declared actor handler, ready to be discovered and registered.
///
/// Definitions are shared as `Arc<ActorDefinition>`; the `Arc` pointer is the
/// definition's identity during discovery.
pub struct ActorDefinition {
    symbol: String,
    metadata: HandlerMetadata,
    signature: Signature,
    handler: Handler,
}

impl ActorDefinition {
    /// The handler's own name, matched by discovery patterns
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The declared actor name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn metadata(&self) -> &HandlerMetadata {
        &self.metadata
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for ActorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorDefinition")
            .field("symbol", &self.symbol)
            .field("metadata", &self.metadata)
            .field("signature", &self.signature)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Start declaring an actor named `name`
pub fn actor(name: impl Into<String>) -> ActorDeclaration {
    ActorDeclaration {
        name: name.into(),
        is_async: None,
        timer: None,
        signature: Signature::new(),
    }
}

/// Builder returned by [`actor`]
#[derive(Debug, Clone)]
pub struct ActorDeclaration {
    name: String,
    is_async: Option<bool>,
    timer: Option<String>,
    signature: Signature,
}

impl ActorDeclaration {
    /// Override async inference
    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    /// Timer expression, parsed when the declaration is finished
    pub fn timer(mut self, expression: impl Into<String>) -> Self {
        self.timer = Some(expression.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: TypeDescriptor) -> Self {
        self.signature = self.signature.param(name, ty);
        self
    }

    /// Declare a parameter verbatim; rule violations surface at registration
    pub fn param_decl(mut self, decl: ParamDecl) -> Self {
        self.signature = self.signature.with_decl(decl);
        self
    }

    pub fn returns(mut self, ty: TypeDescriptor) -> Self {
        self.signature = self.signature.returns(ty);
        self
    }

    /// Replace the whole signature
    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Finish with an already tagged handler
    pub fn handler(
        self,
        symbol: impl Into<String>,
        handler: Handler,
    ) -> Result<Arc<ActorDefinition>, ConfigurationError> {
        let timer = match self.timer {
            Some(expression) => Some(expression.parse::<TimerSpec>().map_err(|reason| {
                ConfigurationError::invalid_timer(&self.name, &expression, reason)
            })?),
            None => None,
        };

        Ok(Arc::new(ActorDefinition {
            symbol: symbol.into(),
            metadata: HandlerMetadata {
                name: self.name,
                timer,
                is_async: self.is_async,
            },
            signature: self.signature,
            handler,
        }))
    }

    pub fn sync_fn<F>(
        self,
        symbol: impl Into<String>,
        f: F,
    ) -> Result<Arc<ActorDefinition>, ConfigurationError>
    where
        F: Fn(&ActorContext, Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler(symbol, Handler::from_fn(f))
    }

    pub fn async_fn<F, Fut>(
        self,
        symbol: impl Into<String>,
        f: F,
    ) -> Result<Arc<ActorDefinition>, ConfigurationError>
    where
        F: Fn(ActorContext, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handler(symbol, Handler::from_async_fn(f))
    }

    pub fn sync_handler(
        self,
        symbol: impl Into<String>,
        handler: impl SyncHandler + 'static,
    ) -> Result<Arc<ActorDefinition>, ConfigurationError> {
        self.handler(symbol, Handler::sync_object(handler))
    }

    pub fn async_handler(
        self,
        symbol: impl Into<String>,
        handler: impl AsyncHandler + 'static,
    ) -> Result<Arc<ActorDefinition>, ConfigurationError> {
        self.handler(symbol, Handler::async_object(handler))
    }
}
