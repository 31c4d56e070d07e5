// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Generic code for REST handlers.
//!
//! All services should implement an `app` function in this module that returns the `Router` for the
//! application.
//!
//! Every API should be put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This
//! may seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API should define a `route` method that
//! returns the HTTP method and the API path under test.  All integration tests within the module
//! then rely on `route` to obtain this information, ensuring that they all test the desired API.
//!
//! Requests flow through the layers in this order:
//!
//! 1.  `parse_json_body`, installed once for the whole application, buffers and parses the body.
//! 1.  The guards in the `guards` module, installed per route, reject requests whose body does not
//!     have the shape that the route expects.
//! 1.  The handler, which performs a single driver operation.
//!
//! Any error returned by these layers is a `RestError`, which knows how to render itself.

use crate::driver::DriverError;
use crate::model::ModelError;
use crate::schema::SchemaError;
use axum::Json;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::any::Any;

mod body;
pub use body::{MAX_BODY_SIZE, ParsedBody, is_json_content_type, parse_json_body};
pub mod guards;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// Indicates a request that cannot be served, answered without any details.
    #[error("{0}")]
    BadRequest(String),

    /// Catch-all error type for all unexpected errors.  The details are logged but not returned.
    #[error("{0}")]
    InternalError(String),

    /// Indicates a request that could not be processed at all, such as unparseable payloads.
    #[error("Bad Request")]
    MalformedRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have content did not.
    #[error("request body is empty")]
    PayloadEmpty,

    /// Indicates that a request that should have empty content did not.
    #[error("request body is not required for {0} method")]
    PayloadNotEmpty(Method),

    /// Indicates that the content of the request violates the constraints of the API.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// Indicates that the request declared a content type the API does not accept.
    #[error("Unsupported media type")]
    UnsupportedMediaType,
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::InternalError(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::BadRequest(e.to_string())
    }
}

impl From<SchemaError> for RestError {
    fn from(e: SchemaError) -> Self {
        RestError::UnprocessableEntity(e.message)
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::MalformedRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let (status, has_body) = match &self {
            RestError::BadRequest(message) => {
                debug!("Rejecting request: {}", message);
                (StatusCode::BAD_REQUEST, false)
            }
            RestError::InternalError(message) => {
                error!("Request failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, false)
            }
            RestError::MalformedRequest(cause) => {
                warn!("Rejecting malformed request: {}", cause);
                (StatusCode::BAD_REQUEST, true)
            }
            RestError::NotFound(_) => (StatusCode::NOT_FOUND, false),
            RestError::PayloadEmpty => (StatusCode::BAD_REQUEST, true),
            RestError::PayloadNotEmpty(_) => (StatusCode::BAD_REQUEST, true),
            RestError::UnprocessableEntity(_) => (StatusCode::UNPROCESSABLE_ENTITY, true),
            RestError::UnsupportedMediaType => (StatusCode::UNSUPPORTED_MEDIA_TYPE, false),
        };

        if has_body {
            (status, Json(ErrorResponse { error: self.to_string() })).into_response()
        } else {
            status.into_response()
        }
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Textual representation of the error message.
    pub error: String,
}

/// Envelope for successful responses that carry an entity.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct DataResponse<T> {
    /// The entity being returned.
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Wraps `data` in the envelope.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Fallback handler for requests that do not match any route or method.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Converts a panic raised while serving a request into a generic bad request response.
///
/// Meant to be used with `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn bad_request_on_panic(details: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = details.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = details.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    RestError::MalformedRequest(format!("Handler panicked: {}", details)).into_response()
}

/// Common test code for the REST server.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use axum::Router;
    use axum::http;
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    /// Maximum body size for responses read in tests.
    const MAX_RESPONSE_SIZE: usize = 64 * 1024;

    /// Builder for a single request to the API server.
    #[must_use]
    pub struct OneShotBuilder {
        /// The router for the app being tested.
        app: Router,

        /// Builder for the request that will be sent to the app.
        builder: axum::http::request::Builder,
    }

    impl OneShotBuilder {
        /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
        pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
            let builder = http::Request::builder().method(method).uri(uri.as_ref());
            Self { app, builder }
        }

        /// Sets the header `name` to `value` in the outgoing request.
        pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
        where
            HeaderName: TryFrom<K>,
            <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
            HeaderValue: TryFrom<V>,
            <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
        {
            self.builder = self.builder.header(name, value);
            self
        }

        /// Finishes building the request and sends it with an empty payload.
        pub async fn send_empty(self) -> ResponseChecker {
            let request = self.builder.body(axum::body::Body::empty()).unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a `body` of the given `content_type`.
        pub async fn send_raw<B>(self, content_type: &str, body: B) -> ResponseChecker
        where
            B: Into<Vec<u8>>,
        {
            let request = self
                .builder
                .header(http::header::CONTENT_TYPE, content_type)
                .body(axum::body::Body::from(body.into()))
                .unwrap();
            ResponseChecker::from(self.app.oneshot(request).await.unwrap())
        }

        /// Finishes building the request and sends it with a text payload.
        pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
            self.send_raw(mime::TEXT_PLAIN.as_ref(), text.into()).await
        }

        /// Finishes building the request and sends it with a JSON payload.
        pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
            let body = serde_json::to_vec(&request).unwrap();
            self.send_raw(mime::APPLICATION_JSON.as_ref(), body).await
        }
    }

    /// Validator for the outcome of a request sent by a `OneShotBuilder`.
    #[must_use]
    pub struct ResponseChecker {
        /// Actual response that we received from the app.
        response: Response,

        /// Expected HTTP status code in the response above.
        exp_status: http::StatusCode,
    }

    impl From<Response> for ResponseChecker {
        fn from(response: Response) -> Self {
            Self { response, exp_status: http::StatusCode::OK }
        }
    }

    impl ResponseChecker {
        /// Sets the expected exit HTTP status to `status`.
        pub fn expect_status(mut self, status: http::StatusCode) -> Self {
            self.exp_status = status;
            self
        }

        /// Performs common validation operations on the response.
        pub fn verify(&self) {
            assert_eq!(self.exp_status, self.response.status());
        }

        /// Finishes checking the response and returns the body of the response as UTF-8.
        pub async fn take_body_as_text(self) -> String {
            self.verify();

            let body =
                axum::body::to_bytes(self.response.into_body(), MAX_RESPONSE_SIZE).await.unwrap();
            String::from_utf8(body.to_vec()).unwrap()
        }

        /// Finishes checking the response and expects it to contain an empty body.
        pub async fn expect_empty(self) {
            let body = self.take_body_as_text().await;
            assert!(body.is_empty(), "Body not empty; got {}", body);
        }

        /// Finishes checking the response and expects its body to be an `ErrorResponse` that
        /// matches `exp_re`.
        pub async fn expect_error(self, exp_re: &str) {
            let body = self.take_body_as_text().await;
            let response: ErrorResponse = match serde_json::from_str(&body) {
                Ok(response) => response,
                Err(e) => panic!("Invalid error response due to {}; content was {}", e, body),
            };
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(
                re.is_match(&response.error),
                "Response content '{:?}' does not match re '{}'",
                response,
                exp_re
            );
        }

        /// Finishes checking the response and expects it to contain a valid JSON object of
        /// type `T`.
        pub async fn expect_json<T: DeserializeOwned>(self) -> T {
            let body = self.take_body_as_text().await;
            serde_json::from_str::<T>(&body).unwrap()
        }
    }

    /// Generates a test to verify that an API that expects JSON fails when it gets something else.
    #[macro_export]
    macro_rules! test_payload_must_be_json {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_json() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_text("this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                    .expect_empty()
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_raw("application/json", "this is not json")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("^Bad Request$")
                    .await;
            }
        };
    }

    pub use test_payload_must_be_json;

    /// Generates a test to verify that an API that does not expect a payload fails as necessary.
    #[macro_export]
    macro_rules! test_payload_must_be_empty {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_be_empty() {
                let (method, uri) = $route;
                let exp_error = format!("^request body is not required for {} method$", method);
                $crate::rest::testutils::OneShotBuilder::new($app, (method, uri))
                    .send_json(serde_json::json!({"key1": "value1"}))
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error(&exp_error)
                    .await;
            }
        };
    }

    pub use test_payload_must_be_empty;

    /// Generates a test to verify that an API that expects a payload fails when it gets none.
    #[macro_export]
    macro_rules! test_payload_must_not_be_empty {
        ( $app:expr, $route:expr ) => {
            #[tokio::test]
            async fn test_payload_must_not_be_empty() {
                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_json(serde_json::json!({}))
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("^request body is empty$")
                    .await;

                $crate::rest::testutils::OneShotBuilder::new($app, $route)
                    .send_raw("application/json", "")
                    .await
                    .expect_status(axum::http::StatusCode::BAD_REQUEST)
                    .expect_error("^request body is empty$")
                    .await;
            }
        };
    }

    pub use test_payload_must_not_be_empty;
}
