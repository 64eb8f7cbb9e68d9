use crate::framework::{Model, ResourceError, Value};
use crate::lifecycle::ResourceSystem;
use chrono::NaiveDate;

pub const USER: &str = "User";

/// Registers the `User` model.
///
/// `joinedOn` travels as `YYYY-MM-DD` and is held as a [`NaiveDate`].
pub fn define_user(system: &ResourceSystem) -> Result<Model, ResourceError> {
    system.define(USER, Some("/api/users"), |model| {
        model.attr_decoder("joinedOn", parse_date);
    })
}

fn parse_date(value: Value) -> Result<Value, String> {
    match value.as_str() {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Value::opaque)
            .map_err(|e| format!("invalid date '{text}': {e}")),
        None => Ok(value),
    }
}
