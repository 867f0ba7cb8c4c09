//! Request, context and response shapes.
//!
//! [`Request`] and [`Context`] are built by the host and handed to handlers
//! by shared reference, so a handler can read them but never change them.
//! [`Response`] is the one value a handler builds and gives back.

use crate::error::{JetError, JetResult};
use serde::{Deserialize, Serialize};

/// One inbound invocation.
///
/// Unknown fields in host-supplied JSON are ignored when decoding.
///
/// # Example
///
/// ```
/// use jet_core::Request;
///
/// let request = Request::new("Alice");
/// assert_eq!(request.to(), "Alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    to: String,
}

impl Request {
    /// Creates a request addressed to `to`.
    ///
    /// Host-side constructor; handlers receive requests ready-made.
    #[must_use]
    pub fn new(to: impl Into<String>) -> Self {
        Self { to: to.into() }
    }

    /// Decodes a request from host-supplied JSON.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::InvalidInput`] if `to` is missing or not text.
    pub fn from_json(json: &str) -> JetResult<Self> {
        serde_json::from_str(json).map_err(|e| JetError::invalid_input("request", e.to_string()))
    }

    /// Returns the addressee of this invocation.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }
}

/// The user on whose behalf an invocation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentUser {
    name: String,
}

impl CurrentUser {
    /// Creates a user record.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the user's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ambient invocation metadata, distinct from the request payload.
///
/// Further user attributes may appear in host JSON over time; they are
/// tolerated on decode and not exposed.
///
/// # Example
///
/// ```
/// use jet_core::{Context, CurrentUser};
///
/// let context = Context::new(CurrentUser::new("Bob"));
/// assert_eq!(context.current_user().name(), "Bob");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    current_user: CurrentUser,
}

impl Context {
    /// Creates a context for `current_user`.
    ///
    /// Host-side constructor; handlers receive contexts ready-made.
    #[must_use]
    pub fn new(current_user: CurrentUser) -> Self {
        Self { current_user }
    }

    /// Shorthand for a context whose current user is called `name`.
    #[must_use]
    pub fn for_user(name: impl Into<String>) -> Self {
        Self::new(CurrentUser::new(name))
    }

    /// Decodes a context from host-supplied JSON.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::InvalidInput`] if `current_user.name` is missing
    /// or not text.
    pub fn from_json(json: &str) -> JetResult<Self> {
        serde_json::from_str(json).map_err(|e| JetError::invalid_input("context", e.to_string()))
    }

    /// Returns the current user.
    #[must_use]
    pub fn current_user(&self) -> &CurrentUser {
        &self.current_user
    }
}

/// The value a handler produces.
///
/// `status` is conventionally an HTTP status code but is not range-checked.
/// Both fields are set at construction and never change afterwards.
///
/// # Example
///
/// ```
/// use jet_core::Response;
///
/// let response = Response::new(200, "Hello Alice, this is Bob.");
/// assert_eq!(response.status(), 200);
/// assert_eq!(response.data(), "Hello Alice, this is Bob.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    status: i64,
    data: String,
}

impl Response {
    /// Builds a response. Never fails and performs no validation.
    #[must_use]
    pub fn new(status: i64, data: impl Into<String>) -> Self {
        Self {
            status,
            data: data.into(),
        }
    }

    /// Builds a `200` response.
    #[must_use]
    pub fn ok(data: impl Into<String>) -> Self {
        Self::new(200, data)
    }

    /// Converts a handler's JSON output into a response.
    ///
    /// This is the check applied at dynamically-typed boundaries, where a
    /// handler hands back a JSON value rather than a `Response`.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::NonConforming`] unless the value is an object with
    /// an integer `status` and a string `data`.
    pub fn from_value(value: serde_json::Value) -> JetResult<Self> {
        serde_json::from_value(value).map_err(|e| JetError::non_conforming(e.to_string()))
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> i64 {
        self.status
    }

    /// Returns the body.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Splits the response into `(status, data)`.
    #[must_use]
    pub fn into_parts(self) -> (i64, String) {
        (self.status, self.data)
    }
}
