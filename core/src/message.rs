//! The framework-neutral message contract.
//!
//! # Design
//! Every `with_*` method takes `&self` and returns a message: the same handle
//! (see `Request::ptr_eq` / `Response::ptr_eq`) when the requested value is
//! already in place, otherwise a new handle carrying the change. The receiver
//! is never modified. Readers return owned values where the adapter has to
//! render them (header lists of a response, uploaded-file objects) and
//! borrows everywhere else.

use serde_json::{Map, Value};

use crate::body::Body;
use crate::headers::{Headers, IntoHeaderValues, LINE_SEPARATOR};
use crate::upload::UploadedFiles;
use crate::uri::Uri;

/// String-keyed, insertion-ordered parameter and attribute store.
pub type Params = Map<String, Value>;

/// Behavior shared by requests and responses.
pub trait Message: Sized {
    fn protocol_version(&self) -> &str;

    fn with_protocol_version(&self, version: &str) -> Self;

    /// Every header as a list of values, in first-seen order.
    fn headers(&self) -> Headers;

    fn has_header(&self, name: &str) -> bool;

    /// Values of `name`; empty when absent.
    fn header_values(&self, name: &str) -> Vec<String>;

    /// Values of `name` joined with `", "`; empty when absent.
    fn header_line(&self, name: &str) -> String {
        self.header_values(name).join(LINE_SEPARATOR)
    }

    /// Replace `name` with `value`.
    fn with_header(&self, name: &str, value: impl IntoHeaderValues) -> Self;

    /// Append `value` to `name`, keeping existing values.
    fn with_added_header(&self, name: &str, value: impl IntoHeaderValues) -> Self;

    fn without_header(&self, name: &str) -> Self;

    fn body(&self) -> Body;

    /// Swap in another stream. Unchanged when `body` is the current handle.
    fn with_body(&self, body: Body) -> Self;
}

/// An outgoing-style request.
pub trait RequestMessage: Message {
    /// The request target, `"/"` when none is set.
    fn request_target(&self) -> String;

    fn with_request_target(&self, target: &str) -> Self;

    fn method(&self) -> &str;

    fn with_method(&self, method: &str) -> Self;

    fn uri(&self) -> &Uri;

    /// Replace the URI. Unless `preserve_host` is set, a URI with a host also
    /// updates the `host` header.
    fn with_uri(&self, uri: Uri, preserve_host: bool) -> Self;
}

/// A request as seen by the server, with its derived parameters.
pub trait ServerRequestMessage: RequestMessage {
    fn server_params(&self) -> &Params;

    fn cookie_params(&self) -> &Params;

    fn with_cookie_params(&self, cookies: Params) -> Self;

    fn query_params(&self) -> &Params;

    fn with_query_params(&self, query: Params) -> Self;

    fn uploaded_files(&self) -> UploadedFiles;

    fn with_uploaded_files(&self, files: UploadedFiles) -> Self;

    fn parsed_body(&self) -> &Params;

    fn with_parsed_body(&self, data: Params) -> Self;

    fn attributes(&self) -> &Params;

    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes().get(name)
    }

    fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Self;

    fn without_attribute(&self, name: &str) -> Self;
}

/// A response.
pub trait ResponseMessage: Message {
    fn status_code(&self) -> u16;

    /// Set the status. An empty `reason` selects the standard phrase for
    /// `code`.
    fn with_status(&self, code: u16, reason: &str) -> Self;

    fn reason_phrase(&self) -> &str;
}
