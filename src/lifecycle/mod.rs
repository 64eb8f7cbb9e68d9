//! # System Lifecycle & Wiring
//!
//! The engine in [`framework`](crate::framework) never reaches for globals:
//! every model is handed its transport and configuration when it is defined.
//! This module is the place where that wiring happens.
//!
//! **Key Responsibilities:**
//! 1. **Configuration** - [`EngineConfig`], from defaults, JSON or the environment
//! 2. **Model Registry** - [`ResourceSystem`] defines models once and shares them by name
//! 3. **Dependency Injection** - the transport is injected once and reused by every model
//! 4. **Observability Setup** - [`setup_tracing`]
//!
//! ```rust
//! use resource_recipe::framework::mock::MockTransport;
//! use resource_recipe::lifecycle::{EngineConfig, ResourceSystem};
//!
//! let config = EngineConfig::from_env().unwrap();
//! let system = ResourceSystem::with_config(MockTransport::new(), config);
//! let bikes = system.model("/api/bikes");
//! assert_eq!(bikes.url(), Some("/api/bikes"));
//! ```
//!
//! Hook callbacks and the transport run on one thread; the system is not
//! `Send` and holds no locks.

pub mod config;
pub mod resource_system;
pub mod tracing;

pub use self::config::*;
pub use self::resource_system::*;
pub use self::tracing::*;
