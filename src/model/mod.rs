//! Model definitions used by the demo binary and the integration tests.

pub mod bike;
pub mod user;

pub use bike::*;
pub use user::*;
