//! # Resource Recipe Demo
//!
//! Walks a `Bike` through its lifecycle against an in-memory transport:
//! find, update, create inside a collection, a refused save and a destroy.

use resource_recipe::framework::mock::MockTransport;
use resource_recipe::framework::{names, Attributes, Method, Value};
use resource_recipe::lifecycle::{setup_tracing, EngineConfig, ResourceSystem};
use resource_recipe::model::{define_bike, define_user};
use serde_json::json;
use tokio::task::LocalSet;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    setup_tracing();

    // Operations settle on local tasks.
    LocalSet::new().run_until(run()).await
}

async fn run() -> Result<(), String> {
    let config = EngineConfig::from_env().map_err(|e| e.to_string())?;
    let update = config.update_method;
    let mock = MockTransport::new();
    mock.expect(Method::Get, "/api/bikes/1").respond(
        200,
        json!({
            "id": 1,
            "brand": "Trek",
            "size": "M",
            "created_at": "2024-03-01T09:30:00Z",
            "owner": { "id": 9, "full_name": "Petty" },
            "parts": [{ "part_name": "chain", "serial": "ch-01" }]
        }),
    );
    mock.expect(update, "/api/bikes/1").respond(200, json!({}));
    mock.expect(Method::Post, "/api/bikes").respond(201, json!({ "id": 2 }));
    mock.expect(Method::Delete, "/api/bikes/2").respond(204, json!(null));

    let system = ResourceSystem::with_config(mock.clone(), config);
    define_user(&system).map_err(|e| e.to_string())?;
    let bikes = define_bike(&system).map_err(|e| e.to_string())?;

    bikes.on(names::AFTER_REQUEST, |ctx| {
        if let Some(response) = &ctx.response {
            info!(event = %ctx.event, status = response.status, "Response received");
        }
        Ok(())
    });

    // 1. Find
    let (bike, done) = bikes.find(1);
    done.finally(|| info!("Fetch settled"))
        .await
        .map_err(|e| e.to_string())?;
    bike.each(|key, value| info!(key, value = %value.to_json(), "Attribute"));

    // 2. Update
    bike.set("size", "large");
    bike.save().await.map_err(|e| e.to_string())?;
    if let Some(sent) = mock.requests().last() {
        info!(body = ?sent.body, "Update payload");
    }

    // 3. Create inside a collection
    let rack = bikes.collection();
    let fresh = rack.build(Attributes::from([("brand".to_string(), Value::from("Giant"))]));
    fresh.save().await.map_err(|e| e.to_string())?;
    info!(url = ?fresh.url(), members = rack.len(), "Created");

    // 4. A save refused by a hook never reaches the transport
    let nameless = bikes.build_empty();
    if let Err(e) = nameless.save().await {
        error!(error = %e, "Save refused");
    }

    // 5. Destroy evicts from the collection
    fresh.destroy().await.map_err(|e| e.to_string())?;
    info!(members = rack.len(), "Destroyed");

    mock.verify();
    info!("Demo completed successfully");
    Ok(())
}
