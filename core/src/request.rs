//! Request adapter.
//!
//! # Design
//! `Request` is a reference-counted handle to one private `RequestData`
//! record. The host-style methods (`set_*`, `add_header`, ...) take
//! `&mut self` and write through `Rc::make_mut`, so a record shared with other
//! handles is copied first and the other handles never see the change. The
//! fluent methods of the message traits take `&self`: they hand back a clone
//! of the handle when nothing would change and otherwise copy the record once,
//! apply the change to the copy and wrap it in a new handle.
//!
//! Uploads are stored as native descriptors only; the fluent view converts on
//! every read and write (see `upload`).

use std::rc::Rc;

use serde_json::Value;

use crate::body::Body;
use crate::config::AdapterConfig;
use crate::headers::{Headers, IntoHeaderValues};
use crate::message::{Message, Params, RequestMessage, ServerRequestMessage};
use crate::native::{IntoRequest, NativeRequest};
use crate::upload::{descriptors_to_objects, objects_to_descriptors, FileParams, UploadedFiles};
use crate::uri::Uri;

#[derive(Debug, Clone)]
struct RequestData {
    config: Rc<AdapterConfig>,
    method: String,
    route: String,
    uri: Uri,
    protocol_version: String,
    headers: Headers,
    body: Body,
    query_params: Params,
    body_params: Params,
    file_params: FileParams,
    attributes: Params,
    cookie_params: Params,
    server_params: Params,
}

/// A REST request usable through both the host-style and the fluent API.
#[derive(Debug, Clone)]
pub struct Request {
    inner: Rc<RequestData>,
}

/// Parsed `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// `type/subtype`, lowercased.
    pub value: String,
    pub media_type: String,
    pub subtype: String,
    /// Everything after the first `;`, trimmed.
    pub parameters: String,
}

impl Default for Request {
    fn default() -> Self {
        RequestBuilder::new().build()
    }
}

impl Request {
    /// Build a request the way the host constructs one.
    pub fn new(method: &str, route: &str, attributes: Params) -> Self {
        RequestBuilder::new()
            .method(method)
            .route(route)
            .attributes(attributes)
            .build()
    }

    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Adapt a host request. A `Request` is returned as the same handle.
    pub fn from_native(source: impl IntoRequest) -> Self {
        source.into_request()
    }

    /// Snapshot of the state in the host's native shape.
    pub fn to_native(&self) -> NativeRequest {
        let data = &self.inner;
        NativeRequest {
            method: data.method.clone(),
            route: data.route.clone(),
            headers: data.headers.clone(),
            query_params: data.query_params.clone(),
            body_params: data.body_params.clone(),
            file_params: data.file_params.clone(),
            attributes: data.attributes.clone(),
            body: data.body.contents(),
        }
    }

    /// Whether both handles share one record.
    pub fn ptr_eq(a: &Request, b: &Request) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    fn data_mut(&mut self) -> &mut RequestData {
        Rc::make_mut(&mut self.inner)
    }

    fn fork(&self, apply: impl FnOnce(&mut RequestData)) -> Self {
        log::trace!("copying request {} {}", self.inner.method, self.inner.route);
        let mut data = RequestData::clone(&self.inner);
        apply(&mut data);
        Self { inner: Rc::new(data) }
    }

    fn is_body_method(&self) -> bool {
        self.inner.config.is_body_method(&self.inner.method)
    }

    // -----------------------------------------------------------------------
    // Host-style API
    // -----------------------------------------------------------------------

    pub fn get_method(&self) -> &str {
        &self.inner.method
    }

    pub fn set_method(&mut self, method: &str) {
        self.data_mut().method = method.to_string();
    }

    pub fn get_route(&self) -> &str {
        &self.inner.route
    }

    pub fn set_route(&mut self, route: &str) {
        self.data_mut().route = route.to_string();
    }

    pub fn get_headers(&self) -> &Headers {
        &self.inner.headers
    }

    /// The header line for `name`, if present.
    pub fn get_header(&self, name: &str) -> Option<String> {
        self.inner
            .headers
            .has(name)
            .then(|| self.inner.headers.get_line(name))
    }

    pub fn set_header(&mut self, name: &str, value: impl IntoHeaderValues) {
        self.data_mut().headers.set(name, value);
    }

    pub fn add_header(&mut self, name: &str, value: impl IntoHeaderValues) {
        let headers = &mut self.data_mut().headers;
        for value in value.into_header_values() {
            headers.add(name, value);
        }
    }

    pub fn remove_header(&mut self, name: &str) {
        self.data_mut().headers.remove(name);
    }

    /// Set several headers. With `replace` every existing header goes first;
    /// otherwise only the named ones are replaced.
    pub fn set_headers(&mut self, headers: Headers, replace: bool) {
        log::debug!("setting {} request headers (replace: {replace})", headers.len());
        let data = self.data_mut();
        if replace {
            data.headers = Headers::new();
        }
        for (name, values) in headers.iter() {
            data.headers.set(name, values.clone());
        }
    }

    pub fn get_content_type(&self) -> Option<ContentType> {
        let line = self.get_header("content-type")?.to_ascii_lowercase();
        let (value, parameters) = match line.split_once(';') {
            Some((value, parameters)) => (value, parameters),
            None => (line.as_str(), ""),
        };
        let (media_type, subtype) = value.split_once('/')?;
        Some(ContentType {
            value: value.trim().to_string(),
            media_type: media_type.trim().to_string(),
            subtype: subtype.trim().to_string(),
            parameters: parameters.trim().to_string(),
        })
    }

    pub fn is_json_content_type(&self) -> bool {
        self.get_content_type()
            .is_some_and(|ct| ct.subtype == "json" || ct.subtype.ends_with("+json"))
    }

    /// Read a param: body params first for body-bearing methods, then query
    /// params.
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        if self.is_body_method() {
            if let Some(value) = self.inner.body_params.get(name) {
                return Some(value);
            }
        }
        self.inner.query_params.get(name)
    }

    /// Write a param to body params for body-bearing methods, else to query
    /// params.
    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.is_body_method() {
            self.data_mut().body_params.insert(name.to_string(), value);
        } else {
            self.data_mut().query_params.insert(name.to_string(), value);
        }
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.get_param(name).is_some()
    }

    /// Remove a param from every store `get_param` consults. Returns the value
    /// `get_param` would have returned.
    pub fn unset_param(&mut self, name: &str) -> Option<Value> {
        let body_method = self.is_body_method();
        let data = self.data_mut();
        let from_body = if body_method {
            data.body_params.shift_remove(name)
        } else {
            None
        };
        let from_query = data.query_params.shift_remove(name);
        from_body.or(from_query)
    }

    /// Query params merged with body params for body-bearing methods; body
    /// params win on conflicts.
    pub fn get_params(&self) -> Params {
        let mut params = self.inner.query_params.clone();
        if self.is_body_method() {
            for (name, value) in &self.inner.body_params {
                params.insert(name.clone(), value.clone());
            }
        }
        params
    }

    pub fn get_query_params(&self) -> &Params {
        &self.inner.query_params
    }

    pub fn set_query_params(&mut self, params: Params) {
        self.data_mut().query_params = params;
    }

    pub fn get_body_params(&self) -> &Params {
        &self.inner.body_params
    }

    pub fn set_body_params(&mut self, params: Params) {
        self.data_mut().body_params = params;
    }

    pub fn get_file_params(&self) -> &FileParams {
        &self.inner.file_params
    }

    pub fn set_file_params(&mut self, params: FileParams) {
        log::debug!("setting {} file params", params.len());
        self.data_mut().file_params = params;
    }

    pub fn get_attributes(&self) -> &Params {
        &self.inner.attributes
    }

    pub fn set_attributes(&mut self, attributes: Params) {
        self.data_mut().attributes = attributes;
    }

    /// The raw body.
    pub fn get_body(&self) -> String {
        self.inner.body.contents()
    }

    /// Replace the body with `body`, on a new stream.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.data_mut().body = Body::from(body.into());
    }
}

impl Message for Request {
    fn protocol_version(&self) -> &str {
        &self.inner.protocol_version
    }

    fn with_protocol_version(&self, version: &str) -> Self {
        if self.inner.protocol_version == version {
            return self.clone();
        }
        self.fork(|data| data.protocol_version = version.to_string())
    }

    fn headers(&self) -> Headers {
        self.inner.headers.clone()
    }

    fn has_header(&self, name: &str) -> bool {
        self.inner.headers.has(name)
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.inner.headers.get(name)
    }

    fn with_header(&self, name: &str, value: impl IntoHeaderValues) -> Self {
        let values = value.into_header_values();
        if self.inner.headers.value(name) == Some(&values) {
            return self.clone();
        }
        self.fork(|data| data.headers.set(name, values))
    }

    fn with_added_header(&self, name: &str, value: impl IntoHeaderValues) -> Self {
        let values = value.into_header_values();
        if values.is_empty() {
            return self.clone();
        }
        self.fork(|data| {
            for value in values {
                data.headers.add(name, value);
            }
        })
    }

    fn without_header(&self, name: &str) -> Self {
        if !self.inner.headers.has(name) {
            return self.clone();
        }
        self.fork(|data| {
            data.headers.remove(name);
        })
    }

    fn body(&self) -> Body {
        self.inner.body.clone()
    }

    fn with_body(&self, body: Body) -> Self {
        if Body::ptr_eq(&self.inner.body, &body) {
            return self.clone();
        }
        self.fork(|data| data.body = body)
    }
}

impl RequestMessage for Request {
    fn request_target(&self) -> String {
        if self.inner.route.is_empty() {
            "/".to_string()
        } else {
            self.inner.route.clone()
        }
    }

    fn with_request_target(&self, target: &str) -> Self {
        if self.inner.route == target {
            return self.clone();
        }
        self.fork(|data| data.route = target.to_string())
    }

    fn method(&self) -> &str {
        &self.inner.method
    }

    fn with_method(&self, method: &str) -> Self {
        if self.inner.method == method {
            return self.clone();
        }
        self.fork(|data| data.method = method.to_string())
    }

    fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self {
        if self.inner.uri == uri {
            return self.clone();
        }
        self.fork(|data| {
            if !uri.path().is_empty() {
                data.route = uri.path().to_string();
            }
            if !preserve_host && !uri.host().is_empty() {
                data.headers.set_first("host", vec![uri.host_with_port()]);
            }
            data.uri = uri;
        })
    }
}

impl ServerRequestMessage for Request {
    fn server_params(&self) -> &Params {
        &self.inner.server_params
    }

    fn cookie_params(&self) -> &Params {
        &self.inner.cookie_params
    }

    fn with_cookie_params(&self, cookies: Params) -> Self {
        if self.inner.cookie_params == cookies {
            return self.clone();
        }
        self.fork(|data| data.cookie_params = cookies)
    }

    fn query_params(&self) -> &Params {
        &self.inner.query_params
    }

    fn with_query_params(&self, query: Params) -> Self {
        if self.inner.query_params == query {
            return self.clone();
        }
        self.fork(|data| data.query_params = query)
    }

    fn uploaded_files(&self) -> UploadedFiles {
        descriptors_to_objects(&self.inner.file_params)
    }

    fn with_uploaded_files(&self, files: UploadedFiles) -> Self {
        let descriptors = objects_to_descriptors(&files);
        if self.inner.file_params == descriptors {
            return self.clone();
        }
        self.fork(|data| data.file_params = descriptors)
    }

    fn parsed_body(&self) -> &Params {
        &self.inner.body_params
    }

    fn with_parsed_body(&self, body: Params) -> Self {
        if self.inner.body_params == body {
            return self.clone();
        }
        self.fork(|data| data.body_params = body)
    }

    fn attributes(&self) -> &Params {
        &self.inner.attributes
    }

    fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if self.inner.attributes.get(name) == Some(&value) {
            return self.clone();
        }
        self.fork(|data| {
            data.attributes.insert(name.to_string(), value);
        })
    }

    fn without_attribute(&self, name: &str) -> Self {
        if !self.inner.attributes.contains_key(name) {
            return self.clone();
        }
        self.fork(|data| {
            data.attributes.shift_remove(name);
        })
    }
}

/// Builder for [`Request`]; every field starts empty.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    config: AdapterConfig,
    method: String,
    route: String,
    protocol_version: Option<String>,
    headers: Headers,
    body: Body,
    query_params: Params,
    body_params: Params,
    file_params: FileParams,
    attributes: Params,
    cookie_params: Params,
    server_params: Params,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    /// Overrides the configured protocol version.
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn query_params(mut self, params: Params) -> Self {
        self.query_params = params;
        self
    }

    pub fn body_params(mut self, params: Params) -> Self {
        self.body_params = params;
        self
    }

    pub fn file_params(mut self, params: FileParams) -> Self {
        self.file_params = params;
        self
    }

    pub fn attributes(mut self, attributes: Params) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn cookie_params(mut self, params: Params) -> Self {
        self.cookie_params = params;
        self
    }

    pub fn server_params(mut self, params: Params) -> Self {
        self.server_params = params;
        self
    }

    pub fn build(self) -> Request {
        let protocol_version = self
            .protocol_version
            .unwrap_or_else(|| self.config.protocol_version.clone());
        Request {
            inner: Rc::new(RequestData {
                config: Rc::new(self.config),
                method: self.method,
                route: self.route,
                uri: Uri::default(),
                protocol_version,
                headers: self.headers,
                body: self.body,
                query_params: self.query_params,
                body_params: self.body_params,
                file_params: self.file_params,
                attributes: self.attributes,
                cookie_params: self.cookie_params,
                server_params: self.server_params,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn native_mutation_does_not_leak_into_clones() {
        let original = Request::default();
        let mut copy = original.clone();
        assert!(Request::ptr_eq(&original, &copy));

        copy.set_method("POST");
        assert!(!Request::ptr_eq(&original, &copy));
        assert_eq!(original.get_method(), "");
        assert_eq!(copy.get_method(), "POST");
    }

    #[test]
    fn fluent_copies_are_independent() {
        let original = Request::default().with_header("a", "1");
        let copy = original.with_added_header("a", "2");
        assert_eq!(original.header_values("a"), vec!["1"]);
        assert_eq!(copy.header_values("a"), vec!["1", "2"]);
    }

    #[test]
    fn fluent_copies_share_the_body_stream() {
        let original = Request::default().with_body(Body::from("x"));
        let copy = original.with_method("GET");
        assert!(Body::ptr_eq(&original.body(), &copy.body()));
    }

    #[test]
    fn content_type_is_parsed() {
        let mut request = Request::default();
        assert!(request.get_content_type().is_none());

        request.set_header("Content-Type", "Application/JSON; charset=UTF-8");
        let content_type = request.get_content_type().unwrap();
        assert_eq!(content_type.value, "application/json");
        assert_eq!(content_type.media_type, "application");
        assert_eq!(content_type.subtype, "json");
        assert_eq!(content_type.parameters, "charset=utf-8");
        assert!(request.is_json_content_type());

        request.set_header("content-type", "application/vnd.api+json");
        assert!(request.is_json_content_type());

        request.set_header("content-type", "text");
        assert!(request.get_content_type().is_none());
    }

    #[test]
    fn get_param_falls_back_to_query_for_body_methods() {
        let mut request = Request::builder()
            .method("POST")
            .query_params(params(json!({"q": 1, "shared": "query"})))
            .body_params(params(json!({"shared": "body"})))
            .build();

        assert_eq!(request.get_param("shared"), Some(&json!("body")));
        assert_eq!(request.get_param("q"), Some(&json!(1)));
        assert_eq!(request.get_params(), params(json!({"q": 1, "shared": "body"})));

        assert_eq!(request.unset_param("shared"), Some(json!("body")));
        assert!(!request.has_param("shared"));
        assert!(!request.get_query_params().contains_key("shared"));
        assert!(request.get_query_params().contains_key("q"));
    }

    #[test]
    fn get_params_ignores_body_for_query_methods() {
        let request = Request::builder()
            .method("GET")
            .query_params(params(json!({"q": 1})))
            .body_params(params(json!({"b": 2})))
            .build();
        assert_eq!(request.get_params(), params(json!({"q": 1})));
        assert!(request.get_param("b").is_none());
    }

    #[test]
    fn config_changes_routing() {
        let config = AdapterConfig {
            body_methods: vec!["PUT".into()],
            ..AdapterConfig::default()
        };
        let mut request = Request::builder().config(config).method("post").build();
        request.set_param("k", "v");
        assert!(request.get_body_params().is_empty());
        assert_eq!(request.get_query_params().get("k"), Some(&json!("v")));
    }

    #[test]
    fn set_headers_merges_or_replaces() {
        let mut request = Request::default();
        request.set_header("keep", "1");
        request.set_header("swap", "old");

        request.set_headers(Headers::from_iter([("Swap", "new")]), false);
        assert_eq!(request.get_header("keep"), Some("1".to_string()));
        assert_eq!(request.get_header("swap"), Some("new".to_string()));

        request.set_headers(Headers::from_iter([("only", "x")]), true);
        assert_eq!(request.get_headers().len(), 1);
        assert_eq!(request.get_header("keep"), None);
    }

    #[test]
    fn builder_protocol_version_overrides_config() {
        let request = Request::builder().protocol_version("2").build();
        assert_eq!(request.protocol_version(), "2");
        assert_eq!(Request::default().protocol_version(), "1.1");
    }
}
