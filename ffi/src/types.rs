//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Adapters cross the boundary as opaque boxed handles. Everything else is
//! plain C data: `*mut c_char` for strings and a tagged `FfiResult` envelope
//! for operations that can fail. Conversion helpers live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use restbridge_core::{AdapterError, Request, Response};

/// Opaque handle to a `Request`. Cloning the handle inside (as fluent calls
/// do) shares the record; see `rb_request_same`.
pub struct FfiRequest {
    pub(crate) inner: Request,
}

/// Opaque handle to a `Response`.
pub struct FfiResponse {
    pub(crate) inner: Response,
}

impl FfiRequest {
    pub(crate) fn into_raw(inner: Request) -> *mut Self {
        Box::into_raw(Box::new(FfiRequest { inner }))
    }
}

impl FfiResponse {
    pub(crate) fn into_raw(inner: Response) -> *mut Self {
        Box::into_raw(Box::new(FfiResponse { inner }))
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Hand a string to C. Interior NUL bytes are dropped.
pub(crate) fn into_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

/// Why a string argument could not be read.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ArgError {
    Null,
    InvalidUtf8,
}

impl ArgError {
    pub(crate) fn into_result(self, name: &str) -> *mut FfiResult {
        match self {
            ArgError::Null => FfiResult::null_arg(name),
            ArgError::InvalidUtf8 => FfiResult::error(
                FfiErrorCode::InvalidUtf8,
                format!("argument is not valid UTF-8: {name}"),
            ),
        }
    }
}

/// Borrow a C string argument.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives the
/// returned borrow.
pub(crate) unsafe fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str, ArgError> {
    if ptr.is_null() {
        return Err(ArgError::Null);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| ArgError::InvalidUtf8)
}

/// Like [`str_arg`], but a null pointer reads as `None`.
///
/// # Safety
/// Same as [`str_arg`].
pub(crate) unsafe fn optional_str_arg<'a>(
    ptr: *const c_char,
) -> Result<Option<&'a str>, ArgError> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { str_arg(ptr) }.map(Some)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidNative = 1,
    Io = 2,
    InvalidUtf8 = 3,
    NullArg = 4,
    Panic = 5,
}

/// Tag that tells `rb_free_result` what `FfiResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `*mut FfiRequest`; take it with `rb_result_take_request`.
    Request = 1,
    /// `*mut FfiResponse`; take it with `rb_result_take_response`.
    Response = 2,
    /// `*mut c_char`, owned by the result.
    String = 3,
}

/// Result envelope for every fallible operation.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message,
            data_tag,
            data,
        }))
    }

    pub(crate) fn ok_request(request: Request) -> *mut Self {
        let data = FfiRequest::into_raw(request) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Request, data)
    }

    pub(crate) fn ok_response(response: Response) -> *mut Self {
        let data = FfiResponse::into_raw(response) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::Response, data)
    }

    pub(crate) fn ok_string(s: String) -> *mut Self {
        let data = into_c_string(s) as *mut c_void;
        Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), FfiDataTag::String, data)
    }

    /// Success with no payload.
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    pub(crate) fn error(code: FfiErrorCode, message: String) -> *mut Self {
        Self::boxed(code, into_c_string(message), FfiDataTag::None, std::ptr::null_mut())
    }

    pub(crate) fn from_error(err: AdapterError) -> *mut Self {
        let code = match &err {
            AdapterError::InvalidNative(_) => FfiErrorCode::InvalidNative,
            AdapterError::Io(_) => FfiErrorCode::Io,
        };
        log::debug!("returning ffi error {code:?}: {err}");
        Self::error(code, err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        log::error!("{msg}");
        Self::error(FfiErrorCode::Panic, msg.to_string())
    }

    /// Release the payload according to `data_tag`.
    ///
    /// # Safety
    /// `data` must be null or the pointer this result was built with.
    pub(crate) unsafe fn free_data(&mut self) {
        if self.data.is_null() {
            return;
        }
        match self.data_tag {
            FfiDataTag::Request => drop(unsafe { Box::from_raw(self.data as *mut FfiRequest) }),
            FfiDataTag::Response => drop(unsafe { Box::from_raw(self.data as *mut FfiResponse) }),
            FfiDataTag::String => drop(unsafe { CString::from_raw(self.data as *mut c_char) }),
            FfiDataTag::None => {}
        }
        self.data = std::ptr::null_mut();
        self.data_tag = FfiDataTag::None;
    }
}
