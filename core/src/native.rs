//! Host-native request/response shapes and the conversion seam.
//!
//! # Design
//! The host hands over plain records (decoded here from JSON with serde).
//! Conversion into an adapter goes through the `IntoRequest` /
//! `IntoResponse` traits rather than a type switch: anything that can become
//! an adapter is accepted, and an adapter itself converts to itself without
//! copying, so `from_native` is idempotent.
//!
//! Every field of a native shape is optional on the wire and defaults to its
//! empty value.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::body::Body;
use crate::config::AdapterConfig;
use crate::error::AdapterResult;
use crate::headers::{Headers, NativeHeaders};
use crate::message::Params;
use crate::request::Request;
use crate::response::Response;
use crate::status::{self, DEFAULT_STATUS};
use crate::upload::FileParams;

/// A host request record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeRequest {
    pub method: String,
    /// The matched route path.
    pub route: String,
    pub headers: Headers,
    pub query_params: Params,
    pub body_params: Params,
    #[serde(with = "keyed_descriptors")]
    pub file_params: FileParams,
    pub attributes: Params,
    /// Raw request body.
    pub body: String,
}

impl NativeRequest {
    pub fn from_json(raw: &str) -> AdapterResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> AdapterResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Convert into a request that routes params according to `config`.
    pub fn into_request_with(self, config: AdapterConfig) -> Request {
        log::debug!(
            "adapting native request {} {} ({} headers, {} file params)",
            self.method,
            self.route,
            self.headers.len(),
            self.file_params.len()
        );
        Request::builder()
            .config(config)
            .method(self.method)
            .route(self.route)
            .headers(self.headers)
            .query_params(self.query_params)
            .body_params(self.body_params)
            .file_params(self.file_params)
            .attributes(self.attributes)
            .body(Body::from(self.body))
            .build()
    }
}

/// A host response record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeResponse {
    pub data: Value,
    #[serde(deserialize_with = "coerced_status")]
    pub status: u16,
    pub headers: NativeHeaders,
}

impl Default for NativeResponse {
    fn default() -> Self {
        Self {
            data: Value::Null,
            status: DEFAULT_STATUS,
            headers: NativeHeaders::new(),
        }
    }
}

impl NativeResponse {
    pub fn from_json(raw: &str) -> AdapterResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> AdapterResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Anything that can be adapted into a [`Request`].
pub trait IntoRequest {
    fn into_request(self) -> Request;
}

impl IntoRequest for Request {
    fn into_request(self) -> Request {
        self
    }
}

impl IntoRequest for &Request {
    fn into_request(self) -> Request {
        self.clone()
    }
}

impl IntoRequest for NativeRequest {
    fn into_request(self) -> Request {
        self.into_request_with(AdapterConfig::default())
    }
}

/// Anything that can be adapted into a [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &Response {
    fn into_response(self) -> Response {
        self.clone()
    }
}

impl IntoResponse for NativeResponse {
    fn into_response(self) -> Response {
        log::debug!(
            "adapting native response {} ({} headers)",
            self.status,
            self.headers.len()
        );
        Response::builder()
            .data(self.data)
            .status(self.status)
            .headers(self.headers)
            .build()
    }
}

fn coerced_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(status::coerce_value(&raw))
}

/// File params travel as a JSON object keyed by form field. A plain list of
/// descriptors is accepted too; its entries are keyed by position.
mod keyed_descriptors {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::*;
    use crate::upload::FileDescriptor;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Keyed(serde_json::Map<String, Value>),
        Listed(Vec<Value>),
    }

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(params: &FileParams, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(params.len()))?;
        for (field, descriptor) in params {
            map.serialize_entry(field, descriptor)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FileParams, D::Error> {
        let entries: Vec<(String, Value)> = match Shape::deserialize(deserializer)? {
            Shape::Keyed(map) => map.into_iter().collect(),
            Shape::Listed(list) => list
                .into_iter()
                .enumerate()
                .map(|(i, value)| (i.to_string(), value))
                .collect(),
        };
        entries
            .into_iter()
            .map(|(field, value)| {
                serde_json::from_value::<FileDescriptor>(value)
                    .map(|descriptor| (field.clone(), descriptor))
                    .map_err(|e| D::Error::custom(format!("file_params.{field}: {e}")))
            })
            .collect()
    }
}
