//! # Resource Instances
//!
//! A [`Resource`] is one remote entity held in memory. Its data attributes
//! live in an attribute map; its bookkeeping (bound URL, pending operations,
//! instance hooks) lives beside it and never shows up in [`Resource::each`]
//! or in encoded payloads.
//!
//! `Resource` is a cheap handle: clones point at the same instance, which is
//! how collections and hook contexts refer to it.

use crate::framework::error::{CodecError, ResourceError};
use crate::framework::events::{EventBus, HookContext, Scope};
use crate::framework::executor::{Completion, LifecycleExecutor, Operation, Wrapper};
use crate::framework::model::Model;
use crate::framework::value::{Attributes, Value};
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Identity of an instance within its model, independent of its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub(crate) u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct ResourceInner {
    id: InstanceId,
    model: Model,
    attributes: RefCell<Attributes>,
    url: OnceCell<String>,
    pending: Cell<usize>,
    events: EventBus,
}

#[derive(Clone)]
pub struct Resource {
    inner: Rc<ResourceInner>,
}

impl Resource {
    pub(crate) fn new(model: Model) -> Self {
        let events = EventBus::new(model.type_hooks());
        Self {
            inner: Rc::new(ResourceInner {
                id: model.next_instance_id(),
                model,
                attributes: RefCell::new(Attributes::new()),
                url: OnceCell::new(),
                pending: Cell::new(0),
                events,
            }),
        }
    }

    pub fn instance_id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    /// Whether two handles point at the same instance.
    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Attributes ---

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.attributes.borrow().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.inner
            .attributes
            .borrow_mut()
            .insert(key.into(), value.into());
        self
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.attributes.borrow_mut().remove(key)
    }

    /// Snapshot of the data attributes, without system attributes.
    pub fn attributes(&self) -> Attributes {
        let prefix = &self.model().config().system_prefix;
        self.inner
            .attributes
            .borrow()
            .iter()
            .filter(|(key, _)| !key.starts_with(prefix.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Visits every data attribute. System attributes are skipped.
    ///
    /// The visitor sees a snapshot, so it may modify the resource freely.
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &Value),
    {
        for (key, value) in self.attributes() {
            visit(&key, &value);
        }
    }

    /// Value of the primary key attribute, when set and not null.
    pub fn identity(&self) -> Option<Value> {
        self.get(self.model().primary_key()).filter(|id| !id.is_null())
    }

    pub fn has_identity(&self) -> bool {
        self.identity().is_some()
    }

    // --- Codec ---

    /// Merges a wire payload into the attributes.
    ///
    /// Keys in the payload overwrite; attributes absent from it stay.
    pub fn decode(&self, raw: &serde_json::Value) -> Result<(), CodecError> {
        let decoded = self.model().codec().decode(raw)?;
        debug!(instance = %self.instance_id(), keys = decoded.len(), "Decoded");
        self.inner.attributes.borrow_mut().extend(decoded);
        Ok(())
    }

    /// Produces the wire form of the attributes. Opaque values stay opaque.
    pub fn encode(&self) -> Result<Attributes, CodecError> {
        let snapshot = self.inner.attributes.borrow().clone();
        self.model().codec().encode(&snapshot)
    }

    /// Produces the wire form as plain JSON, ready for a request body.
    pub fn encode_json(&self) -> Result<serde_json::Value, CodecError> {
        self.encode()
            .map(|encoded| crate::framework::value::attributes_to_json(&encoded))
    }

    // --- Events ---

    /// Registers an instance-scope hook.
    pub fn on<F>(&self, event: &str, hook: F) -> &Self
    where
        F: Fn(&mut HookContext) -> Result<(), String> + 'static,
    {
        self.inner.events.on(event, Rc::new(hook), Scope::Instance);
        self
    }

    /// Fires `event` on this instance: type-scope hooks, then instance hooks.
    pub fn callback(&self, event: &str) -> Result<(), ResourceError> {
        let mut ctx = HookContext::new(self.clone());
        self.inner.events.emit(event, &mut ctx)
    }

    /// Fires `event` with a payload visible to hooks as `ctx.data`.
    pub fn callback_with(&self, event: &str, data: serde_json::Value) -> Result<(), ResourceError> {
        let mut ctx = HookContext::new(self.clone()).with_data(data);
        self.inner.events.emit(event, &mut ctx)
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.inner.events
    }

    // --- URL & lifecycle ---

    /// The bound URL, or `<base>/<id>` once the instance has an identity.
    pub fn url(&self) -> Option<String> {
        if let Some(url) = self.inner.url.get() {
            return Some(url.clone());
        }
        self.identity().and_then(|id| self.model().member_url(&id))
    }

    /// Binds the URL once; later calls leave the first binding in place.
    pub(crate) fn bind_url(&self, url: String) {
        let _ = self.inner.url.set(url);
    }

    /// Whether an operation on this instance has not settled yet.
    pub fn is_pending(&self) -> bool {
        self.inner.pending.get() > 0
    }

    pub(crate) fn begin_pending(&self) {
        self.inner.pending.set(self.inner.pending.get() + 1);
    }

    pub(crate) fn end_pending(&self) {
        self.inner
            .pending
            .set(self.inner.pending.get().saturating_sub(1));
    }

    /// Reloads the attributes from the remote side.
    pub fn fetch(&self) -> Completion {
        LifecycleExecutor::new(self.clone(), Operation::Fetch).execute()
    }

    /// Creates the remote entity, or updates it once the instance has an identity.
    pub fn save(&self) -> Completion {
        let operation = if self.has_identity() {
            Operation::Update
        } else {
            Operation::Create
        };
        LifecycleExecutor::new(self.clone(), operation)
            .wrapped_in(Wrapper::Save)
            .execute()
    }

    /// Deletes the remote entity and, on success, evicts it from every collection.
    pub fn destroy(&self) -> Completion {
        LifecycleExecutor::new(self.clone(), Operation::Destroy).execute()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("model", &self.model().name())
            .field("instance", &self.inner.id)
            .field("url", &self.url())
            .field("pending", &self.is_pending())
            .field("attributes", &self.inner.attributes.borrow())
            .finish()
    }
}
