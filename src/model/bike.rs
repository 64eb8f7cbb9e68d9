use crate::framework::{names, Model, ResourceError, Value};
use crate::lifecycle::ResourceSystem;
use crate::model::user::USER;
use chrono::{DateTime, Utc};

pub const BIKE: &str = "Bike";

/// Wire size codes and their internal names.
const SIZES: [(&str, &str); 3] = [("S", "small"), ("M", "medium"), ("L", "large")];

/// Registers the `Bike` model.
///
/// - `size` travels as a one-letter code (`S`, `M`, `L`).
/// - `createdAt` is held as a UTC timestamp.
/// - `parts.serial` is normalised to uppercase on the way in.
/// - `owner` is a `User` relation and never sent back.
/// - saving a bike without a `brand` is refused before any request.
pub fn define_bike(system: &ResourceSystem) -> Result<Model, ResourceError> {
    system.define(BIKE, Some("/api/bikes"), |model| {
        model
            .attr_decoder("size", |value| Ok(map_size(value, |(code, name)| (code, name))))
            .attr_encoder("size", |value| Ok(map_size(value, |(code, name)| (name, code))))
            .attr_decoder("createdAt", parse_timestamp)
            .attr_decoder("parts.serial", |value| {
                Ok(value
                    .as_str()
                    .map(|serial| Value::from(serial.to_uppercase()))
                    .unwrap_or(value))
            })
            .has_one("owner", USER)
            .on(names::BEFORE_SAVE, |ctx| match ctx.resource.get("brand") {
                Some(brand) if !brand.is_null() => Ok(()),
                _ => Err("brand is required".to_string()),
            });
    })
}

/// Maps a size through `SIZES`, oriented by `orient` as (from, to).
/// Unknown values pass through untouched.
fn map_size(value: Value, orient: fn((&'static str, &'static str)) -> (&'static str, &'static str)) -> Value {
    let mapped = value.as_str().and_then(|text| {
        SIZES
            .iter()
            .map(|pair| orient(*pair))
            .find(|(from, _)| *from == text)
            .map(|(_, to)| Value::from(to))
    });
    mapped.unwrap_or(value)
}

fn parse_timestamp(value: Value) -> Result<Value, String> {
    match value.as_str() {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|at| Value::opaque(at.with_timezone(&Utc)))
            .map_err(|e| format!("invalid timestamp '{text}': {e}")),
        None => Ok(value),
    }
}
