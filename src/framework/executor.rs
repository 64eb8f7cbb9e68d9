//! # Lifecycle Executor
//!
//! Runs one CRUD operation against one resource as a fixed hook sequence
//! around exactly one transport call:
//!
//! ```text
//! before-X -> before-request -> [transport] -> after-request       -> after-X
//!                                            \-> after-request-error -> after-X-error
//! ```
//!
//! `save` wraps `create` or `update` in `before-save` / `after-save`
//! (`after-save-error` on failure). `destroy` evicts the instance from its
//! collections once `after-destroy` has run.
//!
//! Everything up to and including issuing the request happens synchronously
//! inside the call that started the operation. Once the request is out, the
//! after phase runs on its own local task (`tokio::task::spawn_local`), so
//! operations are started from inside a [`tokio::task::LocalSet`]. The
//! returned [`Completion`] only observes that task: dropping it does not
//! cancel the operation, and the after-hooks fire either way.

use crate::framework::error::ResourceError;
use crate::framework::events::{names, HookContext};
use crate::framework::resource::Resource;
use crate::framework::transport::{Method, Request, Response, TransportError, TransportFuture};
use crate::lifecycle::EngineConfig;
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::{debug, debug_span, info, warn, Instrument};

/// A primitive operation: one request, one before/after event pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    Create,
    Update,
    Destroy,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Fetch => "fetch",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Destroy => "destroy",
        }
    }

    pub fn before_event(self) -> &'static str {
        match self {
            Operation::Fetch => names::BEFORE_FETCH,
            Operation::Create => names::BEFORE_CREATE,
            Operation::Update => names::BEFORE_UPDATE,
            Operation::Destroy => names::BEFORE_DESTROY,
        }
    }

    pub fn after_event(self) -> &'static str {
        match self {
            Operation::Fetch => names::AFTER_FETCH,
            Operation::Create => names::AFTER_CREATE,
            Operation::Update => names::AFTER_UPDATE,
            Operation::Destroy => names::AFTER_DESTROY,
        }
    }

    pub fn error_event(self) -> &'static str {
        match self {
            Operation::Fetch => names::AFTER_FETCH_ERROR,
            Operation::Create => names::AFTER_CREATE_ERROR,
            Operation::Update => names::AFTER_UPDATE_ERROR,
            Operation::Destroy => names::AFTER_DESTROY_ERROR,
        }
    }

    fn method(self, config: &EngineConfig) -> Method {
        match self {
            Operation::Fetch => Method::Get,
            Operation::Create => Method::Post,
            Operation::Update => config.update_method,
            Operation::Destroy => Method::Delete,
        }
    }

    fn sends_body(self) -> bool {
        matches!(self, Operation::Create | Operation::Update)
    }

    fn decodes_response(self) -> bool {
        matches!(self, Operation::Fetch | Operation::Create | Operation::Update)
    }
}

/// An event pair surrounding a primitive operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrapper {
    /// `save`, around `create` or `update`.
    Save,
}

impl Wrapper {
    pub fn before_event(self) -> &'static str {
        match self {
            Wrapper::Save => names::BEFORE_SAVE,
        }
    }

    pub fn after_event(self) -> &'static str {
        match self {
            Wrapper::Save => names::AFTER_SAVE,
        }
    }

    pub fn error_event(self) -> &'static str {
        match self {
            Wrapper::Save => names::AFTER_SAVE_ERROR,
        }
    }
}

/// Outcome of the synchronous half of an operation.
enum Dispatch {
    InFlight(TransportFuture),
    Refused(TransportError),
}

pub struct LifecycleExecutor {
    resource: Resource,
    operation: Operation,
    wrapper: Option<Wrapper>,
}

impl LifecycleExecutor {
    pub fn new(resource: Resource, operation: Operation) -> Self {
        Self {
            resource,
            operation,
            wrapper: None,
        }
    }

    /// Surrounds the operation with the wrapper's before/after events.
    pub fn wrapped_in(mut self, wrapper: Wrapper) -> Self {
        self.wrapper = Some(wrapper);
        self
    }

    /// Runs the before phase now and returns the completion of the rest.
    ///
    /// A hook or codec failure in the before phase settles the completion
    /// with that error without issuing any request. Otherwise the after
    /// phase is spawned on the current `LocalSet` and runs to the end even
    /// if the completion is dropped.
    ///
    /// # Panics
    ///
    /// Panics when a request is issued outside a `LocalSet`.
    pub fn execute(self) -> Completion {
        let span = debug_span!(
            "operation",
            model = %self.resource.model().name(),
            instance = %self.resource.instance_id(),
            op = self.operation.name(),
        );
        let mut ctx = HookContext::new(self.resource.clone());
        self.resource.begin_pending();
        let dispatched = match span.in_scope(|| self.dispatch(&mut ctx)) {
            Ok(dispatched) => dispatched,
            Err(error) => {
                self.resource.end_pending();
                span.in_scope(|| warn!(%error, "Operation aborted"));
                return Completion::ready(Err(error));
            }
        };

        let after = async move {
            let reply = match dispatched {
                Dispatch::InFlight(request) => request.await,
                Dispatch::Refused(error) => Err(error),
            };
            let result = self.settle(&mut ctx, reply);
            self.resource.end_pending();
            match &result {
                Ok(response) => info!(status = response.status, "Operation completed"),
                Err(error) => warn!(%error, "Operation failed"),
            }
            result
        };
        let task = tokio::task::spawn_local(after.instrument(span));
        Completion::new(async move { task.await.unwrap_or_else(|e| Err(ResourceError::from(e))) })
    }

    fn dispatch(&self, ctx: &mut HookContext) -> Result<Dispatch, ResourceError> {
        let events = self.resource.events();
        if let Some(wrapper) = self.wrapper {
            events.emit(wrapper.before_event(), ctx)?;
        }
        events.emit(self.operation.before_event(), ctx)?;

        let request = match self.build_request()? {
            Ok(request) => request,
            Err(error) => return Ok(Dispatch::Refused(error)),
        };
        ctx.request = Some(request);
        events.emit(names::BEFORE_REQUEST, ctx)?;

        let Some(request) = ctx.request.clone() else {
            return Ok(Dispatch::Refused(TransportError::Malformed(
                "request removed by a before-request hook".into(),
            )));
        };
        debug!(method = %request.method, url = %request.url, "Dispatching request");
        Ok(match self.resource.model().transport().request(request) {
            Ok(in_flight) => Dispatch::InFlight(in_flight),
            Err(error) => Dispatch::Refused(error),
        })
    }

    /// The outer `Err` is fatal (encoding failed); the inner one is a request
    /// that cannot be issued and takes the failure branch.
    fn build_request(&self) -> Result<Result<Request, TransportError>, ResourceError> {
        let model = self.resource.model();
        let url = match self.operation {
            Operation::Create => model.url().map(str::to_string),
            _ => self.resource.url(),
        };
        let Some(url) = url else {
            return Ok(Err(TransportError::Malformed(format!(
                "{} has no url to {}",
                model.name(),
                self.operation.name()
            ))));
        };

        let mut request = Request::new(self.operation.method(model.config()), url);
        if self.operation.sends_body() {
            request = request.with_body(self.resource.encode_json()?);
        }
        Ok(Ok(request))
    }

    fn settle(
        &self,
        ctx: &mut HookContext,
        reply: Result<Response, TransportError>,
    ) -> Result<Response, ResourceError> {
        let events = self.resource.events();
        match reply {
            Ok(response) => {
                ctx.response = Some(response);
                events.emit(names::AFTER_REQUEST, ctx)?;

                if self.operation.decodes_response() {
                    if let Some(body) = ctx.response.as_ref().map(|r| &r.body) {
                        if body.is_object() {
                            self.resource.decode(body)?;
                        }
                    }
                }
                events.emit(self.operation.after_event(), ctx)?;

                if self.operation == Operation::Destroy {
                    let model = self.resource.model();
                    let removed = model.collections().borrow_mut().untrack(&self.resource);
                    debug!(removed, "Evicted from collections");
                }
                if let Some(wrapper) = self.wrapper {
                    events.emit(wrapper.after_event(), ctx)?;
                }
                Ok(ctx.response.take().unwrap_or_default())
            }
            Err(error) => {
                ctx.error = Some(error.clone());
                events.emit(names::AFTER_REQUEST_ERROR, ctx)?;
                events.emit(self.operation.error_event(), ctx)?;
                if let Some(wrapper) = self.wrapper {
                    events.emit(wrapper.error_event(), ctx)?;
                }
                Err(ResourceError::Transport(error))
            }
        }
    }
}

/// The completion signal of an operation.
///
/// Awaiting it yields the response, or the error that ended the operation.
/// Continuations attached with [`finally`], [`on_success`] and [`on_error`]
/// run once, right after it settles. The operation itself does not depend on
/// the completion being awaited.
///
/// [`finally`]: Completion::finally
/// [`on_success`]: Completion::on_success
/// [`on_error`]: Completion::on_error
#[must_use = "the outcome of the operation is only observable through its completion"]
pub struct Completion {
    inner: LocalBoxFuture<'static, Result<Response, ResourceError>>,
}

impl Completion {
    pub(crate) fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<Response, ResourceError>> + 'static,
    {
        Self {
            inner: future.boxed_local(),
        }
    }

    pub(crate) fn ready(result: Result<Response, ResourceError>) -> Self {
        Self::new(async move { result })
    }

    /// Runs `callback` once the operation settles, whatever the outcome.
    ///
    /// The callback's return value is discarded; the outcome passes through.
    pub fn finally<F, R>(self, callback: F) -> Self
    where
        F: FnOnce() -> R + 'static,
    {
        Self::new(async move {
            let result = self.await;
            let _ = callback();
            result
        })
    }

    pub fn on_success<F>(self, callback: F) -> Self
    where
        F: FnOnce(&Response) + 'static,
    {
        Self::new(async move {
            let result = self.await;
            if let Ok(response) = &result {
                callback(response);
            }
            result
        })
    }

    pub fn on_error<F>(self, callback: F) -> Self
    where
        F: FnOnce(&ResourceError) + 'static,
    {
        Self::new(async move {
            let result = self.await;
            if let Err(error) = &result {
                callback(error);
            }
            result
        })
    }
}

impl Future for Completion {
    type Output = Result<Response, ResourceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}
