//! Error types for the fallible edges of the adapter layer.
//!
//! # Design
//! The adapters themselves never fail: missing headers, params and attributes
//! read as empty values and status codes are coerced rather than rejected.
//! Errors only arise where foreign data enters the crate, i.e. when a native
//! request/response arrives as JSON or when a body is read from a native byte
//! source.

/// Convenience alias used by every fallible function in this crate.
pub type AdapterResult<T = ()> = Result<T, AdapterError>;

/// Errors returned while decoding native shapes or native byte sources.
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    /// The native request/response JSON could not be decoded. Malformed file
    /// descriptors land here too, with the field named in the message.
    #[error("invalid native shape: {0}")]
    InvalidNative(#[from] serde_json::Error),

    /// Reading a native byte source into a body failed.
    #[error("body source could not be read: {0}")]
    Io(#[from] std::io::Error),
}
