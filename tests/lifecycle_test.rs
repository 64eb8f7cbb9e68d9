use resource_recipe::framework::mock::MockTransport;
use resource_recipe::framework::{names, Attributes, Method, Resource, ResourceError, TransportError, Value};
use resource_recipe::lifecycle::{EngineConfig, ResourceSystem};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

const ALL_EVENTS: [&str; 18] = [
    names::BEFORE_FETCH,
    names::AFTER_FETCH,
    names::AFTER_FETCH_ERROR,
    names::BEFORE_CREATE,
    names::AFTER_CREATE,
    names::AFTER_CREATE_ERROR,
    names::BEFORE_UPDATE,
    names::AFTER_UPDATE,
    names::AFTER_UPDATE_ERROR,
    names::BEFORE_SAVE,
    names::AFTER_SAVE,
    names::AFTER_SAVE_ERROR,
    names::BEFORE_DESTROY,
    names::AFTER_DESTROY,
    names::AFTER_DESTROY_ERROR,
    names::BEFORE_REQUEST,
    names::AFTER_REQUEST,
    names::AFTER_REQUEST_ERROR,
];

/// Records every lifecycle event emitted on `resource`, in order.
fn record(resource: &Resource) -> Rc<RefCell<Vec<String>>> {
    let calls = Rc::new(RefCell::new(Vec::new()));
    for event in ALL_EVENTS {
        let calls = calls.clone();
        resource.on(event, move |ctx| {
            calls.borrow_mut().push(ctx.event.clone());
            Ok(())
        });
    }
    calls
}

/// Yields until every operation on `resource` has settled.
async fn settle(resource: &Resource) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while resource.is_pending() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("operations did not settle");
}

fn with_id(id: i64) -> Attributes {
    Attributes::from([("id".to_string(), Value::from(id))])
}

fn setup() -> (MockTransport, ResourceSystem) {
    let mock = MockTransport::new();
    let system = ResourceSystem::new(mock.clone());
    (mock, system)
}

#[tokio::test]
async fn test_fetch_calls_hooks_in_order() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({}));

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            bike.fetch().await.unwrap();

            assert_eq!(
                *calls.borrow(),
                vec!["before-fetch", "before-request", "after-request", "after-fetch"]
            );
            mock.verify();
        })
        .await;
}

#[tokio::test]
async fn test_fetch_calls_error_hooks_in_order() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(400, json!({}));

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            let err = bike.fetch().await.unwrap_err();

            assert_eq!(
                *calls.borrow(),
                vec!["before-fetch", "before-request", "after-request-error", "after-fetch-error"]
            );
            assert_eq!(err.transport().and_then(TransportError::status), Some(400));
        })
        .await;
}

#[tokio::test]
async fn test_save_creates_when_there_is_no_identity() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Post, "/api/bikes").respond(200, json!({ "id": 5 }));

            let bike = system.model("/api/bikes").build_empty();
            let calls = record(&bike);
            bike.save().await.unwrap();

            assert_eq!(
                *calls.borrow(),
                vec![
                    "before-save",
                    "before-create",
                    "before-request",
                    "after-request",
                    "after-create",
                    "after-save"
                ]
            );
            assert_eq!(bike.get("id"), Some(Value::from(5)));
            assert_eq!(bike.url().as_deref(), Some("/api/bikes/5"));
        })
        .await;
}

#[tokio::test]
async fn test_save_updates_when_there_is_an_identity() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Put, "/api/bikes/3").respond(200, json!({}));

            let bike = system.model("/api/bikes").build(with_id(3));
            bike.set("frameSize", 54);
            let calls = record(&bike);
            bike.save().await.unwrap();

            assert_eq!(
                *calls.borrow(),
                vec![
                    "before-save",
                    "before-update",
                    "before-request",
                    "after-request",
                    "after-update",
                    "after-save"
                ]
            );
            let sent = mock.requests();
            assert_eq!(sent[0].body, Some(json!({ "id": 3, "frame_size": 54 })));
        })
        .await;
}

#[tokio::test]
async fn test_update_method_follows_config() {
    LocalSet::new()
        .run_until(async {
            let mock = MockTransport::new();
            mock.expect(Method::Patch, "/api/bikes/3").respond(200, json!({}));
            let config = EngineConfig::from_json(r#"{ "update_method": "PATCH" }"#).unwrap();
            let system = ResourceSystem::with_config(mock.clone(), config);

            system.model("/api/bikes").build(with_id(3)).save().await.unwrap();
            mock.verify();
        })
        .await;
}

#[tokio::test]
async fn test_failed_save_reports_every_error_event() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Post, "/api/bikes").respond(422, json!({ "errors": ["brand"] }));

            let bike = system.model("/api/bikes").build_empty();
            let calls = record(&bike);
            assert!(bike.save().await.is_err());

            assert_eq!(
                *calls.borrow(),
                vec![
                    "before-save",
                    "before-create",
                    "before-request",
                    "after-request-error",
                    "after-create-error",
                    "after-save-error"
                ]
            );
        })
        .await;
}

#[tokio::test]
async fn test_destroy_calls_hooks_in_order() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Delete, "/api/bikes/1").respond(200, json!({}));

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            bike.destroy().await.unwrap();

            assert_eq!(
                *calls.borrow(),
                vec!["before-destroy", "before-request", "after-request", "after-destroy"]
            );
        })
        .await;
}

#[tokio::test]
async fn test_destroy_removes_item_from_every_collection() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Delete, "/api/bikes/1").respond(200, json!({}));

            let bikes = system.model("/api/bikes");
            let col = bikes.collection();
            let other = bikes.collection();
            let bike = col.build(with_id(1));
            let keeper = col.build(with_id(2));
            let last = col.build(with_id(3));
            other.push(&bike);

            assert_eq!(col.len(), 3);
            assert_eq!(other.len(), 1);
            bike.destroy().await.unwrap();

            assert_eq!(col.len(), 2);
            assert!(other.is_empty());
            // Remaining members keep their order.
            assert!(col.get(0).unwrap().ptr_eq(&keeper));
            assert!(col.get(1).unwrap().ptr_eq(&last));
        })
        .await;
}

#[tokio::test]
async fn test_failed_destroy_keeps_collection_membership() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Delete, "/api/bikes/1").respond(500, json!({}));

            let col = system.model("/api/bikes").collection();
            let bike = col.build(with_id(1));
            assert!(bike.destroy().await.is_err());

            assert_eq!(col.len(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_finally_is_called_on_success() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({}));

            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            let (_bike, done) = system.model("/api/bikes").find(1);
            let result = done.finally(move || counter.set(counter.get() + 1)).await;

            assert!(result.is_ok());
            assert_eq!(calls.get(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_finally_is_called_on_error() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(404, json!(null));

            let calls = Rc::new(Cell::new(0));
            let counter = calls.clone();
            let (_bike, done) = system.model("/api/bikes").find(1);
            let result = done.finally(move || counter.set(counter.get() + 1)).await;

            assert!(result.is_err());
            assert_eq!(calls.get(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_finally_runs_after_the_error_hooks() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(500, json!(null));

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            let log = calls.clone();
            let _ = bike
                .fetch()
                .finally(move || log.borrow_mut().push("finally".to_string()))
                .await;

            assert_eq!(calls.borrow().last().map(String::as_str), Some("finally"));
        })
        .await;
}

#[tokio::test]
async fn test_success_and_error_continuations() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({}));
            mock.expect(Method::Get, "/api/bikes/1").respond(503, json!({}));

            let bike = system.model("/api/bikes").build(with_id(1));
            let seen = Rc::new(RefCell::new(Vec::new()));

            let (ok, err) = (seen.clone(), seen.clone());
            let _ = bike
                .fetch()
                .on_success(move |response| ok.borrow_mut().push(format!("ok {}", response.status)))
                .on_error(|_| unreachable!())
                .await;
            let _ = bike
                .fetch()
                .on_success(|_| unreachable!())
                .on_error(move |error| err.borrow_mut().push(format!("err {}", error)))
                .await;

            assert_eq!(seen.borrow()[0], "ok 200");
            assert!(seen.borrow()[1].starts_with("err transport error"));
        })
        .await;
}

#[tokio::test]
async fn test_synchronous_transport_failure_takes_the_error_branch() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            // Nothing expected: the mock refuses the request on the spot.
            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);

            let err = bike.fetch().await.unwrap_err();

            assert!(matches!(
                err,
                ResourceError::Transport(TransportError::Unexpected { method: Method::Get, .. })
            ));
            assert_eq!(
                *calls.borrow(),
                vec!["before-fetch", "before-request", "after-request-error", "after-fetch-error"]
            );
            assert_eq!(mock.requests().len(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_missing_url_fails_without_a_request() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            let bike = system.anonymous().build(with_id(1));
            let calls = record(&bike);

            let err = bike.fetch().await.unwrap_err();

            assert!(matches!(err, ResourceError::Transport(TransportError::Malformed(_))));
            assert_eq!(
                *calls.borrow(),
                vec!["before-fetch", "after-request-error", "after-fetch-error"]
            );
            assert!(mock.requests().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_before_hooks_run_before_the_request_is_issued() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            let responder = mock.expect(Method::Get, "/api/bikes/1").respond_later();

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            let done = bike.fetch();

            // The before phase already ran synchronously; the request is in flight.
            assert_eq!(*calls.borrow(), vec!["before-fetch", "before-request"]);
            assert_eq!(mock.requests().len(), 1);
            assert!(bike.is_pending());

            responder.respond(200, json!({ "brand": "Trek" }));
            done.await.unwrap();

            assert_eq!(calls.borrow().len(), 4);
            assert!(!bike.is_pending());
            assert_eq!(bike.get("brand"), Some(Value::from("Trek")));
            assert_eq!(mock.requests().len(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_failing_before_hook_aborts_the_operation() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            bike.on(names::BEFORE_FETCH, |_| Err("not today".to_string()));
            let never = Rc::new(Cell::new(false));
            let flag = never.clone();
            bike.on(names::BEFORE_FETCH, move |_| {
                flag.set(true);
                Ok(())
            });

            let err = bike.fetch().await.unwrap_err();

            assert!(matches!(
                err,
                ResourceError::Hook { ref event, ref reason } if event == "before-fetch" && reason == "not today"
            ));
            assert!(!never.get());
            assert_eq!(*calls.borrow(), vec!["before-fetch"]);
            assert!(mock.requests().is_empty());
            assert!(!bike.is_pending());
        })
        .await;
}

#[tokio::test]
async fn test_failing_after_hook_skips_the_rest() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Delete, "/api/bikes/1").respond(200, json!({}));

            let col = system.model("/api/bikes").collection();
            let bike = col.build(with_id(1));
            let calls = record(&bike);
            bike.on(names::AFTER_REQUEST, |_| Err("boom".to_string()));

            assert!(matches!(bike.destroy().await, Err(ResourceError::Hook { .. })));
            assert_eq!(
                *calls.borrow(),
                vec!["before-destroy", "before-request", "after-request"]
            );
            // after-destroy never ran, so the instance stays in its collection.
            assert_eq!(col.len(), 1);
        })
        .await;
}

#[tokio::test]
async fn test_type_hooks_run_before_instance_hooks() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({}));

            let order = Rc::new(RefCell::new(Vec::new()));
            let (first, second, third) = (order.clone(), order.clone(), order.clone());
            let bikes = system.model_with(Some("/api/bikes"), |model| {
                model.on(names::BEFORE_FETCH, move |_| {
                    first.borrow_mut().push("type-1");
                    Ok(())
                });
            });
            let bike = bikes.build(with_id(1));
            bike.on(names::BEFORE_FETCH, move |_| {
                second.borrow_mut().push("instance");
                Ok(())
            });
            // Registered on the type after the instance hook, still runs before it.
            bikes.on(names::BEFORE_FETCH, move |_| {
                third.borrow_mut().push("type-2");
                Ok(())
            });

            bike.fetch().await.unwrap();
            assert_eq!(*order.borrow(), vec!["type-1", "type-2", "instance"]);
        })
        .await;
}

#[tokio::test]
async fn test_hooks_can_rewrite_request_and_response() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1?expand=owner")
                .respond(200, json!({ "data": { "brand": "Trek" } }));

            let bike = system.model("/api/bikes").build(with_id(1));
            bike.on(names::BEFORE_REQUEST, |ctx| {
                if let Some(request) = ctx.request.as_mut() {
                    request.url.push_str("?expand=owner");
                }
                Ok(())
            });
            // Unwraps an envelope before the body is decoded.
            bike.on(names::AFTER_REQUEST, |ctx| {
                if let Some(response) = ctx.response.as_mut() {
                    let inner = response.body["data"].take();
                    response.body = inner;
                }
                Ok(())
            });

            bike.fetch().await.unwrap();
            assert_eq!(bike.get("brand"), Some(Value::from("Trek")));
            assert!(bike.get("data").is_none());
        })
        .await;
}

#[tokio::test]
async fn test_later_hooks_see_earlier_mutations() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({}));

            let bike = system.model("/api/bikes").build(with_id(1));
            bike.on(names::AFTER_FETCH, |ctx| {
                ctx.data = Some(json!("stamped"));
                Ok(())
            });
            let seen = Rc::new(RefCell::new(None));
            let slot = seen.clone();
            bike.on(names::AFTER_FETCH, move |ctx| {
                *slot.borrow_mut() = ctx.data.clone();
                Ok(())
            });

            bike.fetch().await.unwrap();
            assert_eq!(*seen.borrow(), Some(json!("stamped")));
        })
        .await;
}

#[tokio::test]
async fn test_find_fills_the_shell_after_fetch() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1")
                .respond(200, json!({ "brand": "Trek", "wheel_size": 29 }));

            let (bike, done) = system.model("/api/bikes").find(1);
            assert_eq!(bike.url().as_deref(), Some("/api/bikes/1"));
            assert!(bike.get("brand").is_none());

            done.await.unwrap();
            assert_eq!(bike.get("brand"), Some(Value::from("Trek")));
            assert_eq!(bike.get("wheelSize"), Some(Value::from(29)));
        })
        .await;
}

#[tokio::test]
async fn test_single_binds_an_explicit_url() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/user/bike").respond(200, json!({ "id": 12 }));

            let bike = system.model("/api/bikes").single("/user/bike");
            assert_eq!(bike.url().as_deref(), Some("/user/bike"));

            bike.fetch().await.unwrap();
            // The bound URL survives the instance acquiring an identity.
            assert_eq!(bike.url().as_deref(), Some("/user/bike"));
        })
        .await;
}

#[tokio::test]
async fn test_codec_failure_rejects_the_completion() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Get, "/api/bikes/1").respond(200, json!({ "size": 3 }));

            let bikes = system.model_with(Some("/api/bikes"), |model| {
                model.attr_decoder("size", |v| v.as_str().map(Value::from).ok_or("size must be text".to_string()));
            });
            let bike = bikes.build(with_id(1));
            let calls = record(&bike);

            let err = bike.fetch().await.unwrap_err();
            assert!(matches!(err, ResourceError::Codec(_)));
            assert_eq!(
                *calls.borrow(),
                vec!["before-fetch", "before-request", "after-request"]
            );
        })
        .await;
}

#[tokio::test]
async fn test_dropped_completion_still_runs_the_after_phase() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            mock.expect(Method::Delete, "/api/bikes/1").respond(200, json!({}));

            let col = system.model("/api/bikes").collection();
            let bike = col.build(with_id(1));
            let calls = record(&bike);

            drop(bike.destroy());
            settle(&bike).await;

            assert_eq!(mock.requests().len(), 1);
            assert_eq!(
                *calls.borrow(),
                vec!["before-destroy", "before-request", "after-request", "after-destroy"]
            );
            assert!(col.is_empty());
            assert!(!bike.is_pending());
        })
        .await;
}

#[tokio::test]
async fn test_ignored_find_completion_still_fills_the_shell() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            let responder = mock.expect(Method::Get, "/api/bikes/1").respond_later();

            let (bike, _) = system.model("/api/bikes").find(1);
            assert!(bike.is_pending());

            responder.respond(200, json!({ "brand": "Trek" }));
            settle(&bike).await;

            assert_eq!(bike.get("brand"), Some(Value::from("Trek")));
            mock.verify();
        })
        .await;
}

#[tokio::test]
async fn test_overlapping_operations_settle_in_any_order() {
    LocalSet::new()
        .run_until(async {
            let (mock, system) = setup();
            let first = mock.expect(Method::Get, "/api/bikes/1").respond_later();
            let second = mock.expect(Method::Get, "/api/bikes/1").respond_later();

            let bike = system.model("/api/bikes").build(with_id(1));
            let calls = record(&bike);
            let first_done = bike.fetch();
            let second_done = bike.fetch();
            assert!(bike.is_pending());

            // The later request answers first.
            second.respond(200, json!({ "brand": "Giant", "wheel_size": 27 }));
            second_done.await.unwrap();
            assert!(bike.is_pending());
            assert_eq!(bike.get("brand"), Some(Value::from("Giant")));

            first.respond(200, json!({ "brand": "Trek" }));
            first_done.await.unwrap();
            assert!(!bike.is_pending());

            // Last to resolve wins; keys it does not carry are kept.
            assert_eq!(bike.get("brand"), Some(Value::from("Trek")));
            assert_eq!(bike.get("wheelSize"), Some(Value::from(27)));
            assert_eq!(
                *calls.borrow(),
                vec![
                    "before-fetch",
                    "before-request",
                    "before-fetch",
                    "before-request",
                    "after-request",
                    "after-fetch",
                    "after-request",
                    "after-fetch"
                ]
            );
        })
        .await;
}
