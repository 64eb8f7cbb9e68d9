//! Resource engine: models, instances, the hook pipeline and the codec.
//!
//! # Main Components
//!
//! - [`Model`] / [`ModelBuilder`] - Type descriptor: URL, path rules, relations, type hooks
//! - [`Resource`] - One instance with its attributes, hooks and lifecycle operations
//! - [`EventBus`] - Type-scope then instance-scope hook dispatch
//! - [`LifecycleExecutor`] / [`Completion`] - The fetch/save/destroy pipeline
//! - [`Codec`] / [`PathRuleTable`] - Wire <-> internal conversion
//! - [`RelationRegistry`] - Attributes left out of outbound payloads
//! - [`Collection`] / [`CollectionIndex`] - Ordered membership kept in sync with destroy
//! - [`Transport`] - The one external collaborator
//!
//! # Testing
//!
//! See the [`mock`] module for an in-memory transport.

pub mod codec;
pub mod collection;
pub mod error;
pub mod events;
pub mod executor;
pub mod mock;
pub mod model;
pub mod relations;
pub mod resource;
pub mod rules;
pub mod transport;
pub mod value;

// Re-export core types for convenience
pub use codec::{camel_to_snake, snake_to_camel, Codec};
pub use collection::{Collection, CollectionIndex};
pub use error::{CodecError, ResourceError};
pub use events::{names, EventBus, Hook, HookContext, HookTable, Scope};
pub use executor::{Completion, LifecycleExecutor, Operation, Wrapper};
pub use model::{Model, ModelBuilder};
pub use relations::{RelationKind, RelationRegistry};
pub use resource::{InstanceId, Resource};
pub use rules::{Direction, PathRuleTable, Transform};
pub use transport::{Method, Request, Response, Transport, TransportError, TransportFuture};
pub use value::{Attributes, Value, WireValue};
