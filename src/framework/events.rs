//! # Event Bus
//!
//! Named hooks in two scopes. Type-scope hooks are shared by every instance of
//! a model; instance-scope hooks belong to one resource. On emission the
//! type-scope hooks run first, then the instance-scope hooks, each in
//! registration order, all against the same [`HookContext`].
//!
//! Emission is synchronous. A failing hook stops the emission and its error
//! propagates to whoever emitted.

use crate::framework::error::ResourceError;
use crate::framework::resource::Resource;
use crate::framework::transport::{Request, Response, TransportError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Names of the events emitted by the lifecycle executor.
pub mod names {
    pub const BEFORE_FETCH: &str = "before-fetch";
    pub const AFTER_FETCH: &str = "after-fetch";
    pub const AFTER_FETCH_ERROR: &str = "after-fetch-error";
    pub const BEFORE_CREATE: &str = "before-create";
    pub const AFTER_CREATE: &str = "after-create";
    pub const AFTER_CREATE_ERROR: &str = "after-create-error";
    pub const BEFORE_UPDATE: &str = "before-update";
    pub const AFTER_UPDATE: &str = "after-update";
    pub const AFTER_UPDATE_ERROR: &str = "after-update-error";
    pub const BEFORE_SAVE: &str = "before-save";
    pub const AFTER_SAVE: &str = "after-save";
    pub const AFTER_SAVE_ERROR: &str = "after-save-error";
    pub const BEFORE_DESTROY: &str = "before-destroy";
    pub const AFTER_DESTROY: &str = "after-destroy";
    pub const AFTER_DESTROY_ERROR: &str = "after-destroy-error";
    pub const BEFORE_REQUEST: &str = "before-request";
    pub const AFTER_REQUEST: &str = "after-request";
    pub const AFTER_REQUEST_ERROR: &str = "after-request-error";
}

/// A hook callback. Returning `Err` aborts the current lifecycle step.
pub type Hook = Rc<dyn Fn(&mut HookContext) -> Result<(), String>>;

/// Where a hook is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Shared by every instance of the model.
    Type,
    /// Private to one instance.
    Instance,
}

/// State shared by every hook of an operation.
///
/// Hooks may read and replace `request` during `before-request` and
/// `response` during `after-request`; the executor uses what they leave.
pub struct HookContext {
    pub event: String,
    pub resource: Resource,
    pub request: Option<Request>,
    pub response: Option<Response>,
    pub error: Option<TransportError>,
    /// Payload of a custom event fired through [`Resource::callback`].
    pub data: Option<serde_json::Value>,
}

impl HookContext {
    pub fn new(resource: Resource) -> Self {
        Self {
            event: String::new(),
            resource,
            request: None,
            response: None,
            error: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("event", &self.event)
            .field("resource", &self.resource.instance_id())
            .field("request", &self.request)
            .field("response", &self.response)
            .field("error", &self.error)
            .field("data", &self.data)
            .finish()
    }
}

/// Ordered hooks keyed by event name.
#[derive(Clone, Default)]
pub struct HookTable {
    hooks: HashMap<String, Vec<Hook>>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<String>, hook: Hook) {
        self.hooks.entry(event.into()).or_default().push(hook);
    }

    /// Hooks registered for `event`, in registration order.
    pub fn hooks(&self, event: &str) -> &[Hook] {
        self.hooks.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<_> = self
            .hooks
            .iter()
            .map(|(event, hooks)| (event.as_str(), hooks.len()))
            .collect();
        events.sort();
        f.debug_map().entries(events).finish()
    }
}

/// Dispatches events to the type scope and then the instance scope.
pub struct EventBus {
    type_scope: Rc<RefCell<HookTable>>,
    instance_scope: RefCell<HookTable>,
}

impl EventBus {
    pub fn new(type_scope: Rc<RefCell<HookTable>>) -> Self {
        Self {
            type_scope,
            instance_scope: RefCell::new(HookTable::new()),
        }
    }

    pub fn on(&self, event: impl Into<String>, hook: Hook, scope: Scope) {
        match scope {
            Scope::Type => self.type_scope.borrow_mut().push(event, hook),
            Scope::Instance => self.instance_scope.borrow_mut().push(event, hook),
        }
    }

    /// Runs every hook registered for `event`.
    ///
    /// The hook list is captured before the first hook runs, so hooks
    /// registered during an emission only see later emissions.
    pub fn emit(&self, event: &str, ctx: &mut HookContext) -> Result<(), ResourceError> {
        let hooks: Vec<Hook> = {
            let type_scope = self.type_scope.borrow();
            let instance_scope = self.instance_scope.borrow();
            type_scope
                .hooks(event)
                .iter()
                .chain(instance_scope.hooks(event))
                .cloned()
                .collect()
        };
        trace!(event, hooks = hooks.len(), "Emit");

        ctx.event = event.to_string();
        for hook in hooks {
            hook(ctx).map_err(|reason| ResourceError::Hook {
                event: event.to_string(),
                reason,
            })?;
        }
        Ok(())
    }

    /// Number of hooks registered for `event` across both scopes.
    pub fn count(&self, event: &str) -> usize {
        self.type_scope.borrow().hooks(event).len() + self.instance_scope.borrow().hooks(event).len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("type_scope", &self.type_scope.borrow())
            .field("instance_scope", &self.instance_scope.borrow())
            .finish()
    }
}
