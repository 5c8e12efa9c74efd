//! Dual-API adapters between a host CMS's REST request/response objects and a
//! framework-neutral HTTP message contract.
//!
//! # Overview
//! `Request` and `Response` each wrap one record that is reachable through
//! two APIs at once:
//! - the host-style API (`set_method`, `add_header`, `set_status`, ...), which
//!   mutates in place;
//! - the fluent message contract (`Message`, `RequestMessage`,
//!   `ServerRequestMessage`, `ResponseMessage`), whose `with_*` methods leave
//!   the receiver alone and return either the same handle (nothing changed)
//!   or a new one.
//!
//! Both read and write the same fields, so they never disagree.
//!
//! # Design
//! - Adapters are `Rc` handles; copy-on-write happens once per fluent call.
//! - Host objects arrive as `NativeRequest` / `NativeResponse` (serde
//!   shapes) and are adapted through `IntoRequest` / `IntoResponse`.
//! - Everything is in-memory and single-threaded; the only fallible paths
//!   decode foreign data (`AdapterError`).

pub mod body;
pub mod config;
pub mod error;
pub mod headers;
pub mod message;
pub mod native;
pub mod request;
pub mod response;
pub mod status;
pub mod upload;
pub mod uri;

pub use body::Body;
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult};
pub use headers::{HeaderCollection, HeaderValue, Headers, IntoHeaderValues, NativeHeaders};
pub use message::{Message, Params, RequestMessage, ResponseMessage, ServerRequestMessage};
pub use native::{IntoRequest, IntoResponse, NativeRequest, NativeResponse};
pub use request::{ContentType, Request, RequestBuilder};
pub use response::{Link, Links, Response, ResponseBuilder};
pub use upload::{
    descriptors_to_objects, objects_to_descriptors, FileDescriptor, FileParams, UploadError,
    UploadedFile, UploadedFiles,
};
pub use uri::Uri;
