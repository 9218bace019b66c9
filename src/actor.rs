//! # Actor
//!
//! An [`Actor`] wraps one [`ActorDefinition`] with its compiled validators and a
//! mode resolved once at construction. Every actor, sync or async, is invoked
//! through [`Actor::invoke`]:
//!
//! ```text
//! caller -> invoke(ctx) -> validate params -> handler -> validate return -> caller
//! ```
//!
//! `invoke` returns an [`Invocation`]: a ready value, or a pending future the
//! caller must drive. Parameter validation always happens synchronously inside
//! `invoke`, before the handler is called.
//!
//! Actors are immutable after construction and can be shared across tasks and
//! threads behind an `Arc`.

use crate::context::ActorContext;
use crate::error::{ActorError, ConfigurationError, Result, ValidationError};
use crate::handler::{ActorDefinition, Handler, HandlerResult, Params};
use crate::schema::{SchemaCompiler, TypeDescriptor, Validator};
use crate::signature::{extract_params, extract_returns};
use crate::timer::TimerSpec;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Calling convention resolved at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorMode {
    Sync,
    Async,
}

impl From<bool> for ActorMode {
    fn from(is_async: bool) -> Self {
        if is_async {
            Self::Async
        } else {
            Self::Sync
        }
    }
}

/// Outcome of [`Actor::invoke`]
pub enum Invocation {
    /// The handler already ran; this is its (validated) result
    Ready(Value),
    /// The handler's work has not run yet; drive the future to get the result
    Pending(BoxFuture<'static, Result<Value>>),
}

impl Invocation {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Drive the invocation to completion
    pub async fn resolve(self) -> Result<Value> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Pending(future) => future.await,
        }
    }

    /// Run the invocation as a Tokio task. Must be called within a runtime.
    pub fn spawn(self) -> JoinHandle<Result<Value>> {
        match self {
            Self::Ready(value) => tokio::spawn(async move { Ok(value) }),
            Self::Pending(future) => tokio::spawn(future),
        }
    }

    /// The value, if the invocation already completed
    pub fn into_ready(self) -> Option<Value> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A validated, uniformly invokable handler
pub struct Actor {
    definition: Arc<ActorDefinition>,
    module: String,
    mode: ActorMode,
    params_schema: Option<TypeDescriptor>,
    returns_schema: Option<TypeDescriptor>,
    validate_params: Option<Arc<dyn Validator>>,
    validate_returns: Option<Arc<dyn Validator>>,
}

impl Actor {
    /// Wrap a definition, deriving and compiling its schemas.
    ///
    /// Fails if a declared parameter has a default or no type descriptor, or if
    /// the compiler rejects a derived schema.
    pub fn new(
        definition: Arc<ActorDefinition>,
        compiler: &dyn SchemaCompiler,
    ) -> std::result::Result<Self, ConfigurationError> {
        let name = definition.name();
        let params_schema = extract_params(definition.signature(), name)?;
        let returns_schema = extract_returns(definition.signature());

        let compile = |schema: &TypeDescriptor| {
            compiler
                .compile(schema)
                .map_err(|e| ConfigurationError::schema_compilation(name, e.reason))
        };
        let validate_params = params_schema.as_ref().map(compile).transpose()?;
        let validate_returns = returns_schema.as_ref().map(compile).transpose()?;

        Ok(Self {
            module: Self::module_of(name).to_string(),
            mode: Self::resolve_mode(&definition),
            params_schema,
            returns_schema,
            validate_params,
            validate_returns,
            definition,
        })
    }

    /// Leading namespace segment of an actor name
    pub fn module_of(name: &str) -> &str {
        name.split_once('.').map_or(name, |(module, _)| module)
    }

    /// Explicit hint first, then the handler's own calling convention
    fn resolve_mode(definition: &ActorDefinition) -> ActorMode {
        if let Some(is_async) = definition.metadata().is_async {
            return ActorMode::from(is_async);
        }
        match definition.handler() {
            Handler::Async { .. } => ActorMode::Async,
            Handler::Sync { .. } => ActorMode::Sync,
        }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn timer(&self) -> Option<&TimerSpec> {
        self.definition.metadata().timer.as_ref()
    }

    pub fn mode(&self) -> ActorMode {
        self.mode
    }

    pub fn is_async(&self) -> bool {
        self.mode == ActorMode::Async
    }

    pub fn definition(&self) -> &Arc<ActorDefinition> {
        &self.definition
    }

    /// Derived parameter schema (`None` when the handler takes no parameters)
    pub fn params_schema(&self) -> Option<&TypeDescriptor> {
        self.params_schema.as_ref()
    }

    /// Declared return schema
    pub fn returns_schema(&self) -> Option<&TypeDescriptor> {
        self.returns_schema.as_ref()
    }

    /// Invoke the handler for the message carried by `ctx`.
    ///
    /// Parameter validation errors are returned before the handler runs. For
    /// sync actors with a return schema the result is validated immediately;
    /// for async actors it is validated when the pending future completes.
    /// Without a return schema the raw handler result is returned as is.
    pub fn invoke(&self, ctx: ActorContext) -> Result<Invocation> {
        let params = match &self.validate_params {
            None => Params::new(),
            Some(validator) => {
                let content = Value::Object(ctx.message.content.clone());
                match validator.validate(content)? {
                    Value::Object(map) => Params::from_map(map),
                    other => {
                        return Err(ValidationError::single(
                            "",
                            format!("expected an object, got {other}"),
                        )
                        .into())
                    }
                }
            }
        };

        match (&self.validate_returns, self.mode) {
            (None, _) => self.call_raw(ctx, params),
            (Some(validator), ActorMode::Async) => Ok(Invocation::Pending(
                self.call_async(ctx, params, Arc::clone(validator)),
            )),
            (Some(validator), ActorMode::Sync) => self.call_sync(ctx, params, validator.as_ref()),
        }
    }

    /// Invoke and drive the result to completion
    pub async fn call(&self, ctx: ActorContext) -> Result<Value> {
        self.invoke(ctx)?.resolve().await
    }

    fn call_raw(&self, ctx: ActorContext, params: Params) -> Result<Invocation> {
        match self.definition.handler() {
            Handler::Sync { inner, .. } => inner
                .handle(&ctx, params)
                .map(Invocation::Ready)
                .map_err(|e| ActorError::handler(self.name(), e)),
            Handler::Async { inner, .. } => {
                let inner = Arc::clone(inner);
                let actor = self.name().to_string();
                Ok(Invocation::Pending(
                    async move {
                        inner
                            .handle(ctx, params)
                            .await
                            .map_err(|e| ActorError::handler(actor, e))
                    }
                    .boxed(),
                ))
            }
        }
    }

    fn call_async(
        &self,
        ctx: ActorContext,
        params: Params,
        validator: Arc<dyn Validator>,
    ) -> BoxFuture<'static, Result<Value>> {
        let handler = self.definition.handler().clone();
        let actor = self.name().to_string();

        async move {
            let ret: HandlerResult = match handler {
                Handler::Async { inner, .. } => inner.handle(ctx, params).await,
                Handler::Sync { inner, .. } => inner.handle(&ctx, params),
            };
            let ret = ret.map_err(|e| ActorError::handler(actor, e))?;
            Ok(validator.validate(ret)?)
        }
        .boxed()
    }

    fn call_sync(
        &self,
        ctx: ActorContext,
        params: Params,
        validator: &dyn Validator,
    ) -> Result<Invocation> {
        match self.definition.handler() {
            Handler::Sync { inner, .. } => {
                let ret = inner
                    .handle(&ctx, params)
                    .map_err(|e| ActorError::handler(self.name(), e))?;
                Ok(Invocation::Ready(validator.validate(ret)?))
            }
            Handler::Async { .. } => Err(ActorError::ModeMismatch {
                actor: self.name().to_string(),
            }),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.is_async() { "async " } else { "" };
        write!(f, "<Actor {}{}>", prefix, self.name())
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("name", &self.name())
            .field("module", &self.module)
            .field("mode", &self.mode)
            .field("params_schema", &self.params_schema)
            .field("returns_schema", &self.returns_schema)
            .finish()
    }
}
