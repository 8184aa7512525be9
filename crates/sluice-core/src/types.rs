//! Request and response records.
//!
//! Both types mirror the API-gateway proxy integration shape and serialize
//! with camelCase keys. The pipeline treats them as opaque values: each phase
//! receives one by value and returns the (possibly modified) value to feed
//! the next phase.
//!
//! Header maps are ordered so that serializing the same record always
//! produces the same bytes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Gateways send `null` for absent maps and bodies.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An inbound gateway request.
///
/// # Example
///
/// ```
/// use sluice_core::Request;
///
/// let request = Request::new("GET", "/users/42")
///     .with_header("Key", "123")
///     .with_body("{}");
///
/// assert_eq!(request.header("Key"), Some("123"));
/// assert_eq!(request.path, "/users/42");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    /// HTTP method as sent by the caller (e.g. `GET`).
    pub http_method: String,

    /// Request path.
    pub path: String,

    /// Header name to value.
    #[serde(deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,

    /// Query string parameters.
    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: BTreeMap<String, String>,

    /// Path parameters captured by the gateway route.
    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: BTreeMap<String, String>,

    /// Raw request body.
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,

    /// Whether `body` is base64 encoded.
    pub is_base64_encoded: bool,
}

impl Request {
    /// Creates a request with the given method and path and no headers or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a header, replacing any previous value with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds a query string parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string_parameters.insert(name.into(), value.into());
        self
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the body and marks it as base64 encoded.
    #[must_use]
    pub fn with_base64_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = true;
        self
    }

    /// Returns the value of the header with exactly this name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An outbound gateway response.
///
/// `Response::default()` is the empty response (status 0, no headers, empty
/// body). It is what the error phase starts from when a request-phase unit
/// fails before any response exists.
///
/// # Example
///
/// ```
/// use sluice_core::Response;
///
/// let response = Response::new(201)
///     .with_header("Location", "/users/42")
///     .with_body("created");
///
/// assert!(response.is_success());
/// assert_eq!(response.header("Location"), Some("/users/42"));
/// assert_eq!(response.header_ignore_case("location"), Some("/users/42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Response {
    /// HTTP status code.
    pub status_code: u16,

    /// Header name to value.
    #[serde(deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,

    /// Response body, possibly encoded.
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,

    /// Whether `body` is base64 encoded.
    pub is_base64_encoded: bool,
}

impl Response {
    /// Creates a response with the given status and no headers or body.
    #[must_use]
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// `200 OK` with a plain-text body.
    #[must_use]
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(http::StatusCode::OK.as_u16())
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// Builds a JSON response by serializing `value`.
    ///
    /// Sets `Content-Type: application/json`.
    pub fn json<T: Serialize + ?Sized>(
        status_code: u16,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(value)?;
        Ok(Self::new(status_code)
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    /// Adds a header, replacing any previous value with the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the value of the header with exactly this name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
