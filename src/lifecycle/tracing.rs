//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the subscriber used by the demo binary.
//!
//! ## What Gets Traced
//!
//! - **Models**: definition, with rule and relation counts
//! - **Operations**: one `operation` span per fetch/save/destroy carrying the
//!   model, instance and operation name; dispatch at `debug`, completion at
//!   `info`, failure at `warn`
//! - **Hooks**: every emission at `trace`, with the number of hooks run
//! - **Codec**: decoded key counts at `debug`
//!
//! ## Usage Examples
//!
//! ```bash
//! # Completions and failures only
//! RUST_LOG=info cargo run
//!
//! # Requests, decodes and collection evictions
//! RUST_LOG=debug cargo run
//!
//! # Every hook emission
//! RUST_LOG=resource_recipe=trace cargo run
//! ```
//!
//! With `RUST_LOG=debug` a successful fetch reads:
//!
//! ```text
//! DEBUG operation{model=Bike instance=#1 op=fetch}: Dispatching request method=GET url=/api/bikes/1
//! DEBUG operation{model=Bike instance=#1 op=fetch}: Decoded instance=#1 keys=3
//! INFO operation{model=Bike instance=#1 op=fetch}: Operation completed status=200
//! ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Model and operation names are carried by the span
        .compact()
        .init();
}
