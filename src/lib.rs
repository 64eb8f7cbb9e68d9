//! # Resource Recipe
//!
//! > **A recipe for hook-driven REST resources in Rust.**
//!
//! This crate wraps remote CRUD operations (fetch, save, destroy) in an
//! extensible hook pipeline and converts payloads between the wire shape
//! (`snake_case`) and the in-memory shape (`camelCase`) through a recursive,
//! path-addressable codec.
//!
//! ## Core Concepts
//!
//! ### Models and instances
//! A [`Model`](framework::Model) is defined once through a builder: base URL,
//! per-path transforms, relations and type-scope hooks. Instances
//! ([`Resource`](framework::Resource)) are plain attribute records with a
//! fixed capability set: `decode`, `encode`, `each`, `on`, `callback`,
//! `fetch`, `save`, `destroy`.
//!
//! ### The hook pipeline
//! Every operation emits a fixed sequence of events around exactly one
//! transport call. For `fetch`:
//!
//! ```text
//! before-fetch, before-request, [request], after-request, after-fetch
//! ```
//!
//! and on failure `after-request-error, after-fetch-error`. Type-scope hooks
//! run before instance hooks, each in registration order.
//!
//! ### The codec
//! Decoding renames keys to camel case and applies registered decoders by
//! dotted path (`user.name`, or `users.name` for every element of an array).
//! Encoding does the inverse, leaves relations out and copies self-serializing
//! values (timestamps) untouched.
//!
//! ## Concurrency Model
//!
//! Single-threaded and cooperative. The transport future is the only
//! suspension point of an operation; hooks run synchronously. Nothing here is
//! `Send`, and nothing needs a lock.
//!
//! Once a request is issued, the rest of the operation runs on a local task,
//! so operations are started inside a [`tokio::task::LocalSet`]. Dropping a
//! completion never cancels an operation: the after-hooks, the decode and the
//! collection eviction still happen.
//!
//! ## Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Models, instances, the event bus, the executor, the codec and collections.
//!
//! ### 2. The Wiring ([`lifecycle`])
//! [`ResourceSystem`](lifecycle::ResourceSystem) injects one transport and one
//! [`EngineConfig`](lifecycle::EngineConfig) into every model, and keeps the
//! registry of named models.
//!
//! ### 3. The Definitions ([`model`])
//! The `Bike` and `User` models used by the demo and the tests.
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_recipe::framework::mock::MockTransport;
//! use resource_recipe::framework::{Attributes, Method, Value};
//! use resource_recipe::lifecycle::ResourceSystem;
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let local = tokio::task::LocalSet::new();
//!     local
//!         .run_until(async {
//!             let mock = MockTransport::new();
//!             mock.expect(Method::Post, "/api/bikes")
//!                 .respond(201, json!({ "id": 7, "frame_size": 54 }));
//!
//!             let system = ResourceSystem::new(mock.clone());
//!             let bikes = system.model("/api/bikes");
//!
//!             let calls = Rc::new(RefCell::new(Vec::new()));
//!             let log = calls.clone();
//!             let bike = bikes.build(Attributes::from([("brand".to_string(), Value::from("Trek"))]));
//!             bike.on("after-save", move |_| {
//!                 log.borrow_mut().push("saved");
//!                 Ok(())
//!             });
//!
//!             bike.save().await.unwrap();
//!
//!             assert_eq!(*calls.borrow(), vec!["saved"]);
//!             assert_eq!(bike.get("frameSize"), Some(Value::from(54)));
//!             assert_eq!(bike.url().as_deref(), Some("/api/bikes/7"));
//!         })
//!         .await;
//! }
//! ```
//!
//! ### Running the Demo
//!
//! ```bash
//! RUST_LOG=debug cargo run
//! ```

pub mod framework;
pub mod lifecycle;
pub mod model;
