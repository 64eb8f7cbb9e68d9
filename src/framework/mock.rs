//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`Transport`] entirely in memory. Tests queue
//! expectations in the order requests will be issued and decide how each one
//! resolves.
//!
//! | Reply | Builder call | Resolves |
//! |-------|--------------|----------|
//! | Immediate | `respond(status, body)` | on first poll, by status |
//! | Deferred | `respond_later()` | when the returned [`Responder`] is used |
//! | Rejected | `fail(error)` | on first poll, with `error` |
//!
//! A request that does not match the next expectation is refused
//! synchronously with [`TransportError::Unexpected`], which exercises the
//! same failure branch as a malformed request.
//!
//! ```rust
//! use resource_recipe::framework::mock::MockTransport;
//! use resource_recipe::framework::transport::Method;
//! use resource_recipe::lifecycle::ResourceSystem;
//! use serde_json::json;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let local = tokio::task::LocalSet::new();
//!     local
//!         .run_until(async {
//!             let mock = MockTransport::new();
//!             mock.expect(Method::Get, "/api/bikes/1")
//!                 .respond(200, json!({ "brand": "Trek" }));
//!
//!             let system = ResourceSystem::new(mock.clone());
//!             let bikes = system.model("/api/bikes");
//!             let (bike, done) = bikes.find(1);
//!             done.await.unwrap();
//!
//!             assert_eq!(bike.get("brand").unwrap().as_str(), Some("Trek"));
//!             mock.verify();
//!         })
//!         .await;
//! }
//! ```

use crate::framework::transport::{Method, Request, Response, Transport, TransportError, TransportFuture};
use futures_util::FutureExt;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::oneshot;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Reply {
    Immediate(Response),
    Deferred(oneshot::Receiver<Response>),
    Reject(TransportError),
}

struct Expectation {
    method: Method,
    url: String,
    reply: Reply,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<Request>,
}

/// An in-memory transport with expectation tracking.
///
/// Cloning shares the same expectation queue and request log.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    /// Creates a new mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a request with the given method and URL.
    pub fn expect(&self, method: Method, url: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            url: url.into(),
            state: self.state.clone(),
        }
    }

    /// Every request issued so far, matched or not.
    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        self.state.borrow().expectations.len()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.remaining();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

impl Transport for MockTransport {
    fn request(&self, request: Request) -> Result<TransportFuture, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        let matches = state
            .expectations
            .front()
            .is_some_and(|exp| exp.method == request.method && exp.url == request.url);
        let expectation = match state.expectations.pop_front() {
            Some(expectation) if matches => expectation,
            other => {
                if let Some(expectation) = other {
                    state.expectations.push_front(expectation);
                }
                return Err(TransportError::Unexpected {
                    method: request.method,
                    url: request.url,
                });
            }
        };

        let future: TransportFuture = match expectation.reply {
            Reply::Immediate(response) => async move { response.into_result() }.boxed_local(),
            Reply::Reject(error) => async move { Err::<Response, _>(error) }.boxed_local(),
            Reply::Deferred(receiver) => async move {
                receiver
                    .await
                    .map_err(|_| TransportError::Connection("responder dropped".into()))?
                    .into_result()
            }
            .boxed_local(),
        };
        Ok(future)
    }
}

/// Builder for one expected request.
pub struct ExpectationBuilder {
    method: Method,
    url: String,
    state: Rc<RefCell<MockState>>,
}

impl ExpectationBuilder {
    /// Resolves the request with this response as soon as it is awaited.
    pub fn respond(self, status: u16, body: serde_json::Value) {
        let reply = Reply::Immediate(Response::new(status, body));
        self.push(reply);
    }

    /// Leaves the request in flight until the returned responder is used.
    pub fn respond_later(self) -> Responder {
        let (sender, receiver) = oneshot::channel();
        self.push(Reply::Deferred(receiver));
        Responder { sender }
    }

    /// Rejects the request with a transport-level error.
    pub fn fail(self, error: TransportError) {
        self.push(Reply::Reject(error));
    }

    fn push(self, reply: Reply) {
        self.state.borrow_mut().expectations.push_back(Expectation {
            method: self.method,
            url: self.url,
            reply,
        });
    }
}

/// Completes a deferred request.
pub struct Responder {
    sender: oneshot::Sender<Response>,
}

impl Responder {
    pub fn respond(self, status: u16, body: serde_json::Value) {
        let _ = self.sender.send(Response::new(status, body));
    }
}
