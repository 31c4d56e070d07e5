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

//! Application-wide parsing of JSON request bodies.

use crate::rest::{RestError, RestResult};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Maximum size of the request bodies that we accept.
pub const MAX_BODY_SIZE: usize = 100 * 1024;

/// Returns true if the `Content-Type` header `value` names the `application/json` media type.
///
/// Media type parameters like `charset` are ignored and the comparison is case-insensitive.
pub fn is_json_content_type(value: &HeaderValue) -> bool {
    value
        .to_str()
        .ok()
        .and_then(|s| s.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str().eq_ignore_ascii_case(mime::APPLICATION_JSON.as_ref()))
}

/// The request body as parsed by `parse_json_body`.
///
/// Requests that do not carry JSON content, and JSON requests with an empty payload, are
/// represented by an empty object.  Otherwise, the body holds the top-level object or array that
/// the client sent.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedBody(Arc<Value>);

impl ParsedBody {
    /// Returns the parsed document.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Returns the number of keys in the document, or elements if it is an array.
    pub fn len(&self) -> usize {
        match self.0.as_ref() {
            Value::Object(properties) => properties.len(),
            Value::Array(elements) => elements.len(),
            _ => 0,
        }
    }

    /// Returns true if the document has no keys nor elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Value> for ParsedBody {
    fn from(value: Value) -> Self {
        Self(Arc::from(value))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<ParsedBody>() {
            Some(body) => Ok(body.clone()),
            None => Err(RestError::InternalError(
                "Request body was not parsed; is the parse_json_body layer installed?".to_owned(),
            )),
        }
    }
}

/// Parses the raw `bytes` of a JSON payload.
fn parse_document(bytes: &[u8]) -> RestResult<Value> {
    if bytes.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => Ok(serde_json::from_slice(bytes)?),
        _ => Err(RestError::MalformedRequest(
            "JSON payload must be an object or an array".to_owned(),
        )),
    }
}

/// Returns true if the request described by `headers` claims to carry JSON.
fn has_json_content(headers: &HeaderMap) -> bool {
    headers.get(CONTENT_TYPE).is_some_and(is_json_content_type)
}

/// Middleware that buffers the request body and makes its parsed form available to the guards
/// and handlers downstream via the `ParsedBody` extractor.
///
/// Bodies larger than `MAX_BODY_SIZE` and JSON bodies that cannot be parsed are rejected with a
/// generic bad request error.  The raw body is forwarded unmodified.
pub async fn parse_json_body(request: Request, next: Next) -> RestResult<Response> {
    let (mut parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| RestError::MalformedRequest(format!("Cannot read request body: {}", e)))?;

    let document = if has_json_content(&parts.headers) {
        parse_document(&bytes)?
    } else {
        Value::Object(Map::new())
    };
    parts.extensions.insert(ParsedBody::from(document));

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
