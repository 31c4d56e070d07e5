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

//! Request guards to compose in front of REST handlers.
//!
//! Every guard is an `axum` middleware function that either forwards the request to the next
//! layer or short-circuits with a `RestError`.  Guards rely on the `ParsedBody` that
//! `parse_json_body` attaches to every request, so that layer must wrap the whole application.
//!
//! Guards are meant to be attached to individual handlers via `Handler::layer` so that every
//! route declares the exact chain it needs, like this:
//!
//! ```rust,ignore
//! post(handler.layer(
//!     ServiceBuilder::new()
//!         .layer(from_fn(require_json_content))
//!         .layer(from_fn(require_non_empty_body))
//!         .layer(from_fn_with_state(SchemaGuard::new(schema, clock), validate_body)),
//! ))
//! ```

use crate::clocks::Clock;
use crate::rest::{ParsedBody, RestError, RestResult, is_json_content_type};
use crate::schema::Schema;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Rejects requests that carry a body with any content.
///
/// Meant for APIs that do not take a payload, so that we don't get garbage data that we don't
/// care about.
pub async fn require_empty_body(
    body: ParsedBody,
    request: Request,
    next: Next,
) -> RestResult<Response> {
    if !body.is_empty() {
        return Err(RestError::PayloadNotEmpty(request.method().clone()));
    }
    Ok(next.run(request).await)
}

/// Rejects requests whose body is absent or has no content.
pub async fn require_non_empty_body(
    body: ParsedBody,
    request: Request,
    next: Next,
) -> RestResult<Response> {
    if body.is_empty() {
        return Err(RestError::PayloadEmpty);
    }
    Ok(next.run(request).await)
}

/// Rejects requests that do not declare JSON content.
///
/// Only the first `Content-Type` value counts, which is also the one `parse_json_body` honors.
pub async fn require_json_content(request: Request, next: Next) -> RestResult<Response> {
    match request.headers().get(CONTENT_TYPE) {
        Some(value) if is_json_content_type(value) => Ok(next.run(request).await),
        _ => Err(RestError::UnsupportedMediaType),
    }
}

/// State for the `validate_body` guard: the schema to enforce and the clock that determines the
/// current date for date-relative rules.
#[derive(Clone)]
pub struct SchemaGuard {
    /// Schema that bodies must satisfy.
    schema: Arc<Schema>,

    /// Clock to evaluate date-relative rules.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SchemaGuard {
    /// Binds a guard to `schema`, evaluating date-relative rules with `clock`.
    pub fn new(schema: Schema, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { schema: Arc::from(schema), clock }
    }
}

/// Rejects requests whose body does not satisfy the schema in `guard`.
///
/// Install with `axum::middleware::from_fn_with_state` to bind a specific `SchemaGuard`.
pub async fn validate_body(
    State(guard): State<SchemaGuard>,
    body: ParsedBody,
    request: Request,
    next: Next,
) -> RestResult<Response> {
    guard.schema.validate(body.value(), guard.clock.now_utc())?;
    Ok(next.run(request).await)
}
