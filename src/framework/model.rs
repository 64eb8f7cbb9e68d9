//! # Model Descriptors
//!
//! A [`Model`] describes one resource type: where it lives, how its
//! attributes are transformed, which attributes are relations and which hooks
//! every instance shares. It is assembled once through a [`ModelBuilder`] and
//! read-only afterwards, apart from type-scope hooks added with [`Model::on`]
//! and the collection membership it keeps for its instances.

use crate::framework::codec::Codec;
use crate::framework::collection::{Collection, CollectionIndex};
use crate::framework::error::CodecError;
use crate::framework::events::{HookContext, HookTable};
use crate::framework::executor::Completion;
use crate::framework::relations::{RelationKind, RelationRegistry};
use crate::framework::resource::{InstanceId, Resource};
use crate::framework::rules::{transform, Direction, PathRuleTable};
use crate::framework::transport::Transport;
use crate::framework::value::{Attributes, Value};
use crate::lifecycle::EngineConfig;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Fluent definition of a model.
///
/// ```rust
/// use resource_recipe::framework::mock::MockTransport;
/// use resource_recipe::framework::value::Value;
/// use resource_recipe::lifecycle::ResourceSystem;
///
/// let system = ResourceSystem::new(MockTransport::new());
/// let bikes = system
///     .define("Bike", Some("/api/bikes"), |model| {
///         model
///             .attr_decoder("size", |v| Ok(Value::from(if v.as_str() == Some("S") { "small" } else { "regular" })))
///             .has_one("owner", "User");
///     })
///     .unwrap();
///
/// let bike = bikes.build_raw(&serde_json::json!({ "size": "S" })).unwrap();
/// assert_eq!(bike.get("size"), Some(Value::from("small")));
/// ```
pub struct ModelBuilder {
    name: String,
    url: Option<String>,
    primary_key: Option<String>,
    rules: PathRuleTable,
    relations: RelationRegistry,
    hooks: HookTable,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            name: name.into(),
            url: url.map(|u| u.trim_end_matches('/').to_string()),
            primary_key: None,
            rules: PathRuleTable::new(),
            relations: RelationRegistry::new(),
            hooks: HookTable::new(),
        }
    }

    /// Transforms the value at `path` when decoding.
    pub fn attr_decoder<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, String> + 'static,
    {
        self.rules.insert(path, Direction::Decode, transform(f));
        self
    }

    /// Transforms the value at `path` when encoding.
    pub fn attr_encoder<F>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, String> + 'static,
    {
        self.rules.insert(path, Direction::Encode, transform(f));
        self
    }

    /// Keeps the key at `path` as it is in both directions.
    pub fn attr_verbatim(&mut self, path: &str) -> &mut Self {
        self.rules.keep_name(path);
        self
    }

    pub fn has_one(&mut self, attribute: &str, target: &str) -> &mut Self {
        self.relations
            .mark_relation(attribute, RelationKind::HasOne(target.to_string()));
        self
    }

    pub fn has_many(&mut self, attribute: &str, target: &str) -> &mut Self {
        self.relations
            .mark_relation(attribute, RelationKind::HasMany(target.to_string()));
        self
    }

    /// Registers a type-scope hook.
    pub fn on<F>(&mut self, event: &str, hook: F) -> &mut Self
    where
        F: Fn(&mut HookContext) -> Result<(), String> + 'static,
    {
        self.hooks.push(event, Rc::new(hook));
        self
    }

    /// Overrides the configured primary key attribute for this model.
    pub fn primary_key(&mut self, attribute: &str) -> &mut Self {
        self.primary_key = Some(attribute.to_string());
        self
    }

    pub(crate) fn finish(self, transport: Rc<dyn Transport>, config: Rc<EngineConfig>) -> Model {
        let primary_key = self
            .primary_key
            .unwrap_or_else(|| config.primary_key.clone());
        debug!(
            model = %self.name,
            url = ?self.url,
            rules = self.rules.len(),
            relations = self.relations.len(),
            "Model defined"
        );
        Model {
            inner: Rc::new(ModelDescriptor {
                name: self.name,
                url: self.url,
                primary_key,
                rules: self.rules,
                relations: self.relations,
                hooks: Rc::new(RefCell::new(self.hooks)),
                collections: RefCell::new(CollectionIndex::new()),
                transport,
                config,
                next_instance: Cell::new(1),
            }),
        }
    }
}

struct ModelDescriptor {
    name: String,
    url: Option<String>,
    primary_key: String,
    rules: PathRuleTable,
    relations: RelationRegistry,
    hooks: Rc<RefCell<HookTable>>,
    collections: RefCell<CollectionIndex>,
    transport: Rc<dyn Transport>,
    config: Rc<EngineConfig>,
    next_instance: Cell<u64>,
}

/// A cheap handle to a model descriptor.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelDescriptor>,
}

impl Model {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Base URL of the model, if it has one.
    pub fn url(&self) -> Option<&str> {
        self.inner.url.as_deref()
    }

    pub fn primary_key(&self) -> &str {
        &self.inner.primary_key
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.inner.relations
    }

    pub fn codec(&self) -> Codec<'_> {
        Codec::new(
            &self.inner.rules,
            &self.inner.relations,
            &self.inner.config.system_prefix,
            self.inner.config.rename_keys,
        )
    }

    /// Registers a hook shared by every instance, existing and future.
    pub fn on<F>(&self, event: &str, hook: F) -> &Self
    where
        F: Fn(&mut HookContext) -> Result<(), String> + 'static,
    {
        self.inner.hooks.borrow_mut().push(event, Rc::new(hook));
        self
    }

    // --- Instances ---

    /// Builds an instance seeded with internal attributes.
    pub fn build(&self, attributes: Attributes) -> Resource {
        let resource = Resource::new(self.clone());
        for (key, value) in attributes {
            resource.set(key, value);
        }
        if let Some(url) = resource.identity().and_then(|id| self.member_url(&id)) {
            resource.bind_url(url);
        }
        resource
    }

    pub fn build_empty(&self) -> Resource {
        self.build(Attributes::new())
    }

    /// Builds an instance from a wire payload.
    pub fn build_raw(&self, raw: &serde_json::Value) -> Result<Resource, CodecError> {
        let attributes = self.codec().decode(raw)?;
        Ok(self.build(attributes))
    }

    /// Returns an empty shell for `id` and starts fetching it.
    ///
    /// The shell's attributes fill in when the completion settles.
    pub fn find(&self, id: impl Into<Value>) -> (Resource, Completion) {
        let id = id.into();
        let resource = Resource::new(self.clone());
        if let Some(url) = self.member_url(&id) {
            resource.bind_url(url);
        }
        resource.set(self.primary_key().to_string(), id);
        let completion = resource.fetch();
        (resource, completion)
    }

    /// Returns an instance bound to an explicit URL.
    pub fn single(&self, url: &str) -> Resource {
        let resource = Resource::new(self.clone());
        resource.bind_url(url.to_string());
        resource
    }

    /// Creates an empty collection of this model.
    pub fn collection(&self) -> Collection {
        Collection::new(self.clone())
    }

    /// Number of live collections holding `resource`.
    pub fn memberships(&self, resource: &Resource) -> usize {
        self.inner.collections.borrow().memberships(resource)
    }

    /// `<base>/<id>` for models with a base URL.
    pub(crate) fn member_url(&self, id: &Value) -> Option<String> {
        let base = self.url()?;
        let segment = id.url_segment()?;
        Some(format!("{base}/{segment}"))
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub(crate) fn type_hooks(&self) -> Rc<RefCell<HookTable>> {
        self.inner.hooks.clone()
    }

    pub(crate) fn collections(&self) -> &RefCell<CollectionIndex> {
        &self.inner.collections
    }

    pub(crate) fn next_instance_id(&self) -> InstanceId {
        let id = self.inner.next_instance.get();
        self.inner.next_instance.set(id + 1);
        InstanceId(id)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("url", &self.inner.url)
            .field("primary_key", &self.inner.primary_key)
            .field("rules", &self.inner.rules)
            .field("relations", &self.inner.relations)
            .finish()
    }
}
