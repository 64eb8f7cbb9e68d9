use crate::framework::error::ResourceError;
use crate::framework::model::{Model, ModelBuilder};
use crate::framework::transport::Transport;
use crate::lifecycle::EngineConfig;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::info;

/// The registry of model definitions and the transport they share.
///
/// `ResourceSystem` is responsible for:
/// - **Dependency Wiring**: every model it defines gets the same transport and config
/// - **Model Registry**: named models are defined once and looked up by name afterwards
///
/// # Example
///
/// ```rust
/// use resource_recipe::framework::mock::MockTransport;
/// use resource_recipe::lifecycle::ResourceSystem;
///
/// let system = ResourceSystem::new(MockTransport::new());
/// let users = system.define("User", Some("/api/users"), |_| {}).unwrap();
///
/// assert_eq!(system.get("User").unwrap().url(), users.url());
/// assert!(system.define("User", None, |_| {}).is_err());
/// ```
pub struct ResourceSystem {
    transport: Rc<dyn Transport>,
    config: Rc<EngineConfig>,
    models: RefCell<HashMap<String, Model>>,
}

impl ResourceSystem {
    /// Creates a system with the default config.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_config(transport, EngineConfig::default())
    }

    pub fn with_config(transport: impl Transport + 'static, config: EngineConfig) -> Self {
        info!(?config, "Resource system ready");
        Self {
            transport: Rc::new(transport),
            config: Rc::new(config),
            models: RefCell::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// An unregistered model rooted at `url`, with no rules.
    pub fn model(&self, url: &str) -> Model {
        self.model_with(Some(url), |_| {})
    }

    /// An unregistered model with no URL. Useful for pure codec work.
    pub fn anonymous(&self) -> Model {
        self.model_with(None, |_| {})
    }

    /// An unregistered model configured through a builder.
    pub fn model_with<F>(&self, url: Option<&str>, configure: F) -> Model
    where
        F: FnOnce(&mut ModelBuilder),
    {
        let name = url.unwrap_or("anonymous");
        let mut builder = ModelBuilder::new(name, url);
        configure(&mut builder);
        builder.finish(self.transport.clone(), self.config.clone())
    }

    /// Defines and registers a named model. Each name can be defined once.
    pub fn define<F>(&self, name: &str, url: Option<&str>, configure: F) -> Result<Model, ResourceError>
    where
        F: FnOnce(&mut ModelBuilder),
    {
        if self.models.borrow().contains_key(name) {
            return Err(ResourceError::DuplicateModel(name.to_string()));
        }
        let mut builder = ModelBuilder::new(name, url);
        configure(&mut builder);
        let model = builder.finish(self.transport.clone(), self.config.clone());
        self.models
            .borrow_mut()
            .insert(name.to_string(), model.clone());
        Ok(model)
    }

    pub fn get(&self, name: &str) -> Option<Model> {
        self.models.borrow().get(name).cloned()
    }

    /// Names of the registered models, sorted.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}
