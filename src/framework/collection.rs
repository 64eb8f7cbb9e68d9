//! # Collections
//!
//! A [`Collection`] is an ordered list of instances of one model. Each model
//! keeps a [`CollectionIndex`] recording which collections every instance
//! belongs to, so a successful `destroy` can evict the instance from all of
//! them at once.

use crate::framework::error::CodecError;
use crate::framework::model::Model;
use crate::framework::resource::{InstanceId, Resource};
use crate::framework::value::Attributes;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) struct CollectionInner {
    model: Model,
    members: RefCell<Vec<Resource>>,
}

#[derive(Clone)]
pub struct Collection {
    inner: Rc<CollectionInner>,
}

impl Collection {
    pub(crate) fn new(model: Model) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                model,
                members: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    /// Builds an instance and appends it.
    pub fn build(&self, attributes: Attributes) -> Resource {
        let resource = self.inner.model.build(attributes);
        self.push(&resource);
        resource
    }

    /// Builds an instance from a wire payload and appends it.
    pub fn build_raw(&self, raw: &serde_json::Value) -> Result<Resource, CodecError> {
        let resource = self.inner.model.build_raw(raw)?;
        self.push(&resource);
        Ok(resource)
    }

    /// Appends an existing instance. Returns `false` if it was already a member.
    pub fn push(&self, resource: &Resource) -> bool {
        resource
            .model()
            .collections()
            .borrow_mut()
            .track(self, resource)
    }

    pub fn len(&self) -> usize {
        self.inner.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Resource> {
        self.inner.members.borrow().get(index).cloned()
    }

    pub fn contains(&self, resource: &Resource) -> bool {
        self.inner
            .members
            .borrow()
            .iter()
            .any(|member| member.ptr_eq(resource))
    }

    /// Snapshot of the members, in order.
    pub fn members(&self) -> Vec<Resource> {
        self.inner.members.borrow().clone()
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<InstanceId> = self
            .inner
            .members
            .borrow()
            .iter()
            .map(Resource::instance_id)
            .collect();
        f.debug_struct("Collection")
            .field("model", &self.inner.model.name())
            .field("members", &members)
            .finish()
    }
}

/// Which collections hold which instances.
#[derive(Default)]
pub struct CollectionIndex {
    memberships: HashMap<InstanceId, Vec<Weak<CollectionInner>>>,
}

impl CollectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `instance` to `collection` and records the membership.
    pub fn track(&mut self, collection: &Collection, instance: &Resource) -> bool {
        if collection.contains(instance) {
            return false;
        }
        collection.inner.members.borrow_mut().push(instance.clone());
        self.prune();

        let owners = self.memberships.entry(instance.instance_id()).or_default();
        owners.retain(|owner| owner.strong_count() > 0);
        owners.push(Rc::downgrade(&collection.inner));
        true
    }

    /// Removes `instance` from every collection holding it, keeping the order
    /// of the remaining members. Returns how many collections it left.
    pub fn untrack(&mut self, instance: &Resource) -> usize {
        let Some(owners) = self.memberships.remove(&instance.instance_id()) else {
            return 0;
        };
        let mut removed = 0;
        for owner in owners.iter().filter_map(Weak::upgrade) {
            let mut members = owner.members.borrow_mut();
            let before = members.len();
            members.retain(|member| !member.ptr_eq(instance));
            removed += before - members.len();
        }
        removed
    }

    /// Number of instances that still belong to a live collection.
    pub fn len(&self) -> usize {
        self.memberships
            .values()
            .filter(|owners| owners.iter().any(|owner| owner.strong_count() > 0))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entries whose collections are all gone.
    fn prune(&mut self) {
        self.memberships.retain(|_, owners| {
            owners.retain(|owner| owner.strong_count() > 0);
            !owners.is_empty()
        });
    }

    /// Number of live collections holding `instance`.
    pub fn memberships(&self, instance: &Resource) -> usize {
        self.memberships
            .get(&instance.instance_id())
            .map_or(0, |owners| {
                owners.iter().filter(|owner| owner.strong_count() > 0).count()
            })
    }
}
