//! Per-request state carried through a handler chain.
//!
//! A [`HandlerContext`] is created for exactly one request, owned by that
//! request's chain invocation, and dropped once the response is written.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json, RequestPartsExt,
    body::Bytes,
    extract::{Path, Query, Request},
    http::{
        Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE,
    },
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use forum_core::{ApplicationFailure, ValidationFailure, validation::ROOT};

use crate::app::errors;

/// Largest request body accepted by the transport.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Identifier of one request, for log correlation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Decoded inbound request.
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    path: String,
    params: HashMap<String, String>,
    query: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestParts {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body with a matching `Content-Type`.
    pub fn with_json(self, value: &Value) -> Self {
        self.with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(value.to_string())
    }

    /// Decode an axum request: path params, query string, headers and body.
    ///
    /// Failures here are transport-level and answered directly.
    pub async fn from_http(request: Request) -> Result<Self, Response> {
        let (mut parts, body) = request.into_parts();

        let params = parts
            .extract::<Option<Path<HashMap<String, String>>>>()
            .await
            .ok()
            .flatten()
            .map(|Path(p)| p)
            .unwrap_or_default();
        let query = parts
            .extract::<Option<Query<HashMap<String, String>>>>()
            .await
            .ok()
            .flatten()
            .map(|Query(q)| q)
            .unwrap_or_default();

        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| {
                errors::json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            })?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params,
            query,
            headers: parts.headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as JSON. An empty body reads as `{}`.
    pub fn json_body(&self) -> Result<Value, ValidationFailure> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_slice(&self.body)
            .map_err(|_| ValidationFailure::single(ROOT, "Malformed JSON body"))
    }
}

/// Returned when anything tries to change a response after it was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("response already committed")]
pub struct ResponseAlreadyCommitted;

/// Response fixed by [`ResponseSlot::commit`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// The in-progress response. Committing is a one-way transition.
#[derive(Debug, Default)]
pub struct ResponseSlot {
    headers: HeaderMap,
    committed: Option<CommittedResponse>,
}

impl ResponseSlot {
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    pub fn committed(&self) -> Option<&CommittedResponse> {
        self.committed.as_ref()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.committed.as_ref().map(|c| c.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn insert_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), ResponseAlreadyCommitted> {
        if self.is_committed() {
            return Err(ResponseAlreadyCommitted);
        }
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn commit(
        &mut self,
        status: StatusCode,
        body: Value,
    ) -> Result<(), ResponseAlreadyCommitted> {
        if self.is_committed() {
            return Err(ResponseAlreadyCommitted);
        }
        self.committed = Some(CommittedResponse { status, body });
        Ok(())
    }

    /// JSON response with the collected headers, if one was committed.
    pub fn into_response(self) -> Option<Response> {
        let CommittedResponse { status, body } = self.committed?;
        let mut response = (status, Json(body)).into_response();
        response.headers_mut().extend(self.headers);
        Some(response)
    }
}

/// State shared by the steps of one chain invocation.
#[derive(Debug)]
pub struct HandlerContext {
    request_id: RequestId,
    request: RequestParts,
    response: ResponseSlot,
    state: Extensions,
}

impl HandlerContext {
    pub fn new(request: RequestParts) -> Self {
        Self {
            request_id: RequestId::new(),
            request,
            response: ResponseSlot::default(),
            state: Extensions::new(),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn request(&self) -> &RequestParts {
        &self.request
    }

    pub fn response(&self) -> &ResponseSlot {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseSlot {
        &mut self.response
    }

    /// Parse a path parameter; a bad or missing value is a validation failure.
    pub fn param<T>(&self, name: &str) -> Result<T, ApplicationFailure>
    where
        T: FromStr<Err = ValidationFailure>,
    {
        let Some(raw) = self.request.param(name) else {
            let message = format!("{name} is required");
            return Err(ValidationFailure::single(name, message).into());
        };
        Ok(raw.parse()?)
    }

    /// Store chain-local state (one value per type).
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.state.insert(value);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.state.get::<T>()
    }

    pub fn take<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.state.remove::<T>()
    }

    pub fn into_response(self) -> Option<Response> {
        self.response.into_response()
    }
}
