//! Response adapter.
//!
//! # Design
//! Same handle/record split as `Request`. Headers are kept in the host's
//! representation: a single line per name unless the host supplied a list.
//! The fluent view splits lines on `", "`; the host view gets back exactly
//! what it stored.
//!
//! The body is rendered from `data` on demand. A stream handed to
//! `with_body` is remembered so the same handle can be returned (and
//! compared) later; while it is, `data` reads as the stream's current
//! contents, so writes to the stream show up in both views.

use std::rc::Rc;

use serde_json::Value;

use crate::body::Body;
use crate::config::DEFAULT_PROTOCOL_VERSION;
use crate::headers::{HeaderStorage, HeaderValue, Headers, IntoHeaderValues, NativeHeaders};
use crate::message::{Message, Params, ResponseMessage};
use crate::native::{IntoResponse, NativeResponse};
use crate::status::{self, canonical_reason, DEFAULT_STATUS};

/// One link attached to a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub href: String,
    pub attributes: Params,
}

/// Links grouped by relation, in insertion order.
pub type Links = Vec<(String, Vec<Link>)>;

#[derive(Debug, Clone)]
struct ResponseData {
    data: Value,
    status: u16,
    reason_phrase: String,
    headers: NativeHeaders,
    protocol_version: String,
    body: Option<Body>,
    matched_route: String,
    links: Links,
}

/// A REST response usable through both the host-style and the fluent API.
#[derive(Debug, Clone)]
pub struct Response {
    inner: Rc<ResponseData>,
}

impl Default for Response {
    fn default() -> Self {
        ResponseBuilder::new().build()
    }
}

impl Response {
    /// Build a response the way the host constructs one; `status` is
    /// coerced.
    pub fn new(data: impl Into<Value>, status: i64, headers: NativeHeaders) -> Self {
        ResponseBuilder::new()
            .data(data)
            .status(status::coerce(status))
            .headers(headers)
            .build()
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Adapt a host response. A `Response` is returned as the same handle.
    pub fn from_native(source: impl IntoResponse) -> Self {
        source.into_response()
    }

    /// Snapshot of the state in the host's native shape.
    pub fn to_native(&self) -> NativeResponse {
        NativeResponse {
            data: self.get_data(),
            status: self.inner.status,
            headers: self.inner.headers.clone(),
        }
    }

    /// Whether both handles share one record.
    pub fn ptr_eq(a: &Response, b: &Response) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    fn data_mut(&mut self) -> &mut ResponseData {
        Rc::make_mut(&mut self.inner)
    }

    fn fork(&self, apply: impl FnOnce(&mut ResponseData)) -> Self {
        log::trace!("copying response with status {}", self.inner.status);
        let mut data = ResponseData::clone(&self.inner);
        apply(&mut data);
        Self { inner: Rc::new(data) }
    }

    // -----------------------------------------------------------------------
    // Host-style API
    // -----------------------------------------------------------------------

    /// The response data; the current contents of a stream set through
    /// `with_body`.
    pub fn get_data(&self) -> Value {
        match &self.inner.body {
            Some(body) => Value::String(body.contents()),
            None => self.inner.data.clone(),
        }
    }

    pub fn set_data(&mut self, data: impl Into<Value>) {
        let record = self.data_mut();
        record.data = data.into();
        record.body = None;
    }

    pub fn get_status(&self) -> u16 {
        self.inner.status
    }

    /// Store a coerced status. The reason phrase is cleared, not derived.
    pub fn set_status(&mut self, code: i64) {
        let record = self.data_mut();
        record.status = status::coerce(code);
        record.reason_phrase.clear();
    }

    pub fn get_headers(&self) -> &NativeHeaders {
        &self.inner.headers
    }

    /// Replace every header.
    pub fn set_headers(&mut self, headers: NativeHeaders) {
        log::debug!("replacing response headers with {} entries", headers.len());
        self.data_mut().headers = headers;
    }

    /// Set one header. Without `replace` the value is appended to the
    /// existing line.
    pub fn header(&mut self, name: &str, value: &str, replace: bool) {
        let headers = &mut self.data_mut().headers;
        if replace || !headers.has(name) {
            headers.set_value(name, HeaderValue::from(value));
        } else {
            headers.add(name, value);
        }
    }

    pub fn get_matched_route(&self) -> &str {
        &self.inner.matched_route
    }

    pub fn set_matched_route(&mut self, route: &str) {
        self.data_mut().matched_route = route.to_string();
    }

    pub fn is_error(&self) -> bool {
        self.inner.status >= 400
    }

    pub fn get_links(&self) -> &Links {
        &self.inner.links
    }

    /// Attach a link under `rel`. An `href` key in `attributes` is dropped in
    /// favor of `href`.
    pub fn add_link(&mut self, rel: &str, href: &str, mut attributes: Params) {
        attributes.shift_remove("href");
        let link = Link {
            href: href.to_string(),
            attributes,
        };
        let links = &mut self.data_mut().links;
        match links.iter_mut().find(|(r, _)| r == rel) {
            Some((_, group)) => group.push(link),
            None => links.push((rel.to_string(), vec![link])),
        }
    }

    /// Remove the links of `rel`, or only the ones pointing at `href`.
    pub fn remove_link(&mut self, rel: &str, href: Option<&str>) {
        let links = &mut self.data_mut().links;
        match href {
            Some(href) => {
                for (r, group) in links.iter_mut() {
                    if r == rel {
                        group.retain(|link| link.href != href);
                    }
                }
                links.retain(|(_, group)| !group.is_empty());
            }
            None => links.retain(|(r, _)| r != rel),
        }
    }

    /// Append a `Link` header line for `href`.
    pub fn link_header(&mut self, rel: &str, href: &str, attributes: &Params) {
        let mut line = format!("<{href}>; rel=\"{rel}\"");
        for (key, value) in attributes {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if key == "title" {
                line.push_str(&format!("; {key}=\"{value}\""));
            } else {
                line.push_str(&format!("; {key}={value}"));
            }
        }
        self.header("Link", &line, false);
    }
}

/// Render response data as body text: strings as-is, null as nothing,
/// anything else as JSON.
fn render_data(data: &Value) -> String {
    match data {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Message for Response {
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
        self.inner.headers.to_lists()
    }

    fn has_header(&self, name: &str) -> bool {
        self.inner.headers.has(name)
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.inner.headers.get(name)
    }

    fn header_line(&self, name: &str) -> String {
        self.inner.headers.get_line(name)
    }

    fn with_header(&self, name: &str, value: impl IntoHeaderValues) -> Self {
        let value = HeaderValue::from_values(value.into_header_values());
        if self.inner.headers.value(name) == Some(&value) {
            return self.clone();
        }
        self.fork(|data| data.headers.set_value(name, value))
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
        match &self.inner.body {
            Some(body) => body.clone(),
            None => Body::from(render_data(&self.inner.data)),
        }
    }

    fn with_body(&self, body: Body) -> Self {
        if self
            .inner
            .body
            .as_ref()
            .is_some_and(|current| Body::ptr_eq(current, &body))
        {
            return self.clone();
        }
        self.fork(|data| {
            data.data = Value::Null;
            data.body = Some(body);
        })
    }
}

impl ResponseMessage for Response {
    fn status_code(&self) -> u16 {
        self.inner.status
    }

    fn with_status(&self, code: u16, reason: &str) -> Self {
        let code = status::coerce(i64::from(code));
        let reason = if reason.is_empty() {
            canonical_reason(code)
        } else {
            reason
        };
        if self.inner.status == code && self.inner.reason_phrase == reason {
            return self.clone();
        }
        self.fork(|data| {
            data.status = code;
            data.reason_phrase = reason.to_string();
        })
    }

    fn reason_phrase(&self) -> &str {
        &self.inner.reason_phrase
    }
}

/// Builder for [`Response`]. Defaults to null data, status 200 and no
/// headers; the reason phrase is the standard one for the final status.
#[derive(Debug)]
pub struct ResponseBuilder {
    data: Value,
    status: u16,
    headers: NativeHeaders,
    protocol_version: String,
    matched_route: String,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self {
            data: Value::Null,
            status: DEFAULT_STATUS,
            headers: NativeHeaders::new(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            matched_route: String::new(),
        }
    }
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn headers(mut self, headers: NativeHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn matched_route(mut self, route: impl Into<String>) -> Self {
        self.matched_route = route.into();
        self
    }

    pub fn build(self) -> Response {
        Response {
            inner: Rc::new(ResponseData {
                data: self.data,
                status: self.status,
                reason_phrase: canonical_reason(self.status).to_string(),
                headers: self.headers,
                protocol_version: self.protocol_version,
                body: None,
                matched_route: self.matched_route,
                links: Links::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_renders_data() {
        assert_eq!(Response::default().body().to_string(), "");
        assert_eq!(Response::builder().data("text").build().body().to_string(), "text");
        assert_eq!(
            Response::builder().data(json!({"a": 1})).build().body().to_string(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn set_data_drops_the_remembered_stream() {
        let body = Body::from("streamed");
        let mut response = Response::default().with_body(body.clone());
        assert!(Body::ptr_eq(&response.body(), &body));

        response.set_data("replaced");
        assert!(!Body::ptr_eq(&response.body(), &body));
        assert_eq!(response.body().to_string(), "replaced");
    }

    #[test]
    fn is_error_follows_status() {
        let mut response = Response::default();
        assert!(!response.is_error());
        response.set_status(404);
        assert!(response.is_error());
    }

    #[test]
    fn links_group_by_relation() {
        let mut response = Response::default();
        response.add_link("self", "/a", Params::new());
        let attributes = json!({"href": "/ignored", "embeddable": true});
        response.add_link("self", "/b", attributes.as_object().cloned().unwrap());
        response.add_link("up", "/", Params::new());

        let links = response.get_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "self");
        assert_eq!(links[0].1.len(), 2);
        assert_eq!(links[0].1[1].href, "/b");
        assert!(!links[0].1[1].attributes.contains_key("href"));

        response.remove_link("self", Some("/a"));
        assert_eq!(response.get_links()[0].1.len(), 1);

        response.remove_link("self", Some("/b"));
        assert_eq!(response.get_links().len(), 1);
        assert_eq!(response.get_links()[0].0, "up");

        response.remove_link("up", None);
        assert!(response.get_links().is_empty());
    }

    #[test]
    fn link_header_appends_lines() {
        let mut response = Response::default();
        let attributes = json!({"title": "Next page", "type": "text/html"});
        response.link_header("next", "/page/2", attributes.as_object().unwrap());
        response.link_header("prev", "/page/0", &Params::new());

        assert_eq!(
            response.get_headers().value("link"),
            Some(&HeaderValue::from(
                "</page/2>; rel=\"next\"; title=\"Next page\"; type=text/html, </page/0>; rel=\"prev\""
            ))
        );
    }

    #[test]
    fn matched_route_round_trip() {
        let mut response = Response::builder().matched_route("/wp/v2/posts").build();
        assert_eq!(response.get_matched_route(), "/wp/v2/posts");
        response.set_matched_route("/other");
        assert_eq!(response.get_matched_route(), "/other");
    }
}
