//! C-ABI wrapper around `restbridge-core`.
//!
//! # Overview
//! Lets a host written in any language with a C FFI hand its native request
//! and response records across as JSON and then drive either API on them:
//! the in-place host-style mutators or the fluent calls that return new
//! handles.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary. Adapters hold `Rc`/`RefCell` state, so the
//!   closures are wrapped in `AssertUnwindSafe`; a panic aborts the call
//!   before any handle is handed back.
//! - Operations that can fail return a single `FfiResult` envelope with
//!   `FfiDataTag` + `void* data`. Infallible ones return plain values.
//! - The C caller owns all returned pointers and must call the matching
//!   `rb_*_free` function to release them.

pub mod types;

use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use restbridge_core::{
    AdapterConfig, Message, NativeRequest, NativeResponse, Params, Request, Response,
    ResponseMessage,
};

use types::*;

/// Initialize `env_logger` from `RUST_LOG`. Returns false when a logger was
/// already installed.
#[unsafe(no_mangle)]
pub extern "C" fn rb_init_logging() -> bool {
    catch_unwind(|| env_logger::try_init().is_ok()).unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Request lifecycle
// ---------------------------------------------------------------------------

/// Create an empty request with `method` and `route`.
///
/// Returns null if either argument is null or not UTF-8.
/// The caller must free the returned pointer with `rb_request_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_new(
    method: *const c_char,
    route: *const c_char,
) -> *mut FfiRequest {
    catch_unwind(|| {
        let method = unsafe { str_arg(method) };
        let route = unsafe { str_arg(route) };
        let (Ok(method), Ok(route)) = (method, route) else {
            return std::ptr::null_mut();
        };
        FfiRequest::into_raw(Request::new(method, route, Params::new()))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Adapt a native request given as JSON.
///
/// `config_json` may be null for the default configuration.
/// Returns a result with `data_tag = Request` on success; take the handle
/// with `rb_result_take_request`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_from_json(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(|| {
        let json = match unsafe { str_arg(json) } {
            Ok(s) => s,
            Err(e) => return e.into_result("json"),
        };
        let config = match unsafe { optional_str_arg(config_json) } {
            Ok(None) => AdapterConfig::default(),
            Ok(Some(raw)) => match AdapterConfig::from_json(raw) {
                Ok(config) => config,
                Err(e) => return FfiResult::from_error(e),
            },
            Err(e) => return e.into_result("config_json"),
        };
        match NativeRequest::from_json(json) {
            Ok(native) => FfiResult::ok_request(native.into_request_with(config)),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in rb_request_from_json"))
}

/// Serialize a request back to its native JSON shape.
///
/// Returns a result with `data_tag = String` on success.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_to_json(request: *const FfiRequest) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        let request = unsafe { &*request };
        match request.inner.to_native().to_json() {
            Ok(json) => FfiResult::ok_string(json),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in rb_request_to_json"))
}

/// Free a request handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_free(request: *mut FfiRequest) {
    if !request.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(request) });
        }));
    }
}

/// Whether two request handles share one record.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_same(a: *const FfiRequest, b: *const FfiRequest) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let (a, b) = unsafe { (&*a, &*b) };
        Request::ptr_eq(&a.inner, &b.inner)
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Request headers and params
// ---------------------------------------------------------------------------

/// Which host-style header mutation to apply.
enum HeaderEdit {
    Set,
    Add,
}

fn edit_request_header(
    request: *mut FfiRequest,
    name: *const c_char,
    value: *const c_char,
    edit: HeaderEdit,
) -> bool {
    if request.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let name = unsafe { str_arg(name) };
        let value = unsafe { str_arg(value) };
        let (Ok(name), Ok(value)) = (name, value) else {
            return false;
        };
        let request = unsafe { &mut *request };
        match edit {
            HeaderEdit::Set => request.inner.set_header(name, value),
            HeaderEdit::Add => request.inner.add_header(name, value),
        }
        true
    }))
    .unwrap_or(false)
}

/// Replace header `name` with `value` in place. Returns false on a null or
/// non-UTF-8 argument.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_set_header(
    request: *mut FfiRequest,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    edit_request_header(request, name, value, HeaderEdit::Set)
}

/// Append `value` to header `name` in place.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_add_header(
    request: *mut FfiRequest,
    name: *const c_char,
    value: *const c_char,
) -> bool {
    edit_request_header(request, name, value, HeaderEdit::Add)
}

/// Remove header `name` in place.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_remove_header(
    request: *mut FfiRequest,
    name: *const c_char,
) -> bool {
    if request.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(name) = (unsafe { str_arg(name) }) else {
            return false;
        };
        let request = unsafe { &mut *request };
        request.inner.remove_header(name);
        true
    }))
    .unwrap_or(false)
}

/// Fluent `with_header`: a new handle with header `name` set to `value`.
/// The source handle is untouched. When nothing changes, the new handle
/// shares the source's record (`rb_request_same` is true).
///
/// Returns null on a null or non-UTF-8 argument.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_with_header(
    request: *const FfiRequest,
    name: *const c_char,
    value: *const c_char,
) -> *mut FfiRequest {
    if request.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let name = unsafe { str_arg(name) };
        let value = unsafe { str_arg(value) };
        let (Ok(name), Ok(value)) = (name, value) else {
            return std::ptr::null_mut();
        };
        let request = unsafe { &*request };
        FfiRequest::into_raw(request.inner.with_header(name, value))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// The values of header `name` joined with `", "`; empty when absent.
///
/// Returns null on a null argument. Free with `rb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_header_line(
    request: *const FfiRequest,
    name: *const c_char,
) -> *mut c_char {
    if request.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(name) = (unsafe { str_arg(name) }) else {
            return std::ptr::null_mut();
        };
        let request = unsafe { &*request };
        into_c_string(request.inner.header_line(name))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Set param `name` to the JSON value `value_json`, routed by method.
///
/// Returns a result with `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_set_param(
    request: *mut FfiRequest,
    name: *const c_char,
    value_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if request.is_null() {
            return FfiResult::null_arg("request");
        }
        let name = match unsafe { str_arg(name) } {
            Ok(s) => s,
            Err(e) => return e.into_result("name"),
        };
        let raw = match unsafe { str_arg(value_json) } {
            Ok(s) => s,
            Err(e) => return e.into_result("value_json"),
        };
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => return FfiResult::from_error(e.into()),
        };
        let request = unsafe { &mut *request };
        request.inner.set_param(name, value);
        FfiResult::ok_empty()
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in rb_request_set_param"))
}

/// Param `name` as JSON, or null when absent. Free with `rb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_request_get_param(
    request: *const FfiRequest,
    name: *const c_char,
) -> *mut c_char {
    if request.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(name) = (unsafe { str_arg(name) }) else {
            return std::ptr::null_mut();
        };
        let request = unsafe { &*request };
        match request.inner.get_param(name) {
            Some(value) => into_c_string(value.to_string()),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Response lifecycle
// ---------------------------------------------------------------------------

/// Adapt a native response given as JSON.
///
/// Returns a result with `data_tag = Response` on success; take the handle
/// with `rb_result_take_response`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_from_json(json: *const c_char) -> *mut FfiResult {
    catch_unwind(|| {
        let json = match unsafe { str_arg(json) } {
            Ok(s) => s,
            Err(e) => return e.into_result("json"),
        };
        match NativeResponse::from_json(json) {
            Ok(native) => FfiResult::ok_response(Response::from_native(native)),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in rb_response_from_json"))
}

/// Serialize a response back to its native JSON shape.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_to_json(response: *const FfiResponse) -> *mut FfiResult {
    catch_unwind(AssertUnwindSafe(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let response = unsafe { &*response };
        match response.inner.to_native().to_json() {
            Ok(json) => FfiResult::ok_string(json),
            Err(e) => FfiResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic("panic in rb_response_to_json"))
}

/// Free a response handle. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_free(response: *mut FfiResponse) {
    if !response.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(response) });
        }));
    }
}

/// Whether two response handles share one record.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_same(a: *const FfiResponse, b: *const FfiResponse) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let (a, b) = unsafe { (&*a, &*b) };
        Response::ptr_eq(&a.inner, &b.inner)
    }))
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Response status and headers
// ---------------------------------------------------------------------------

/// Host-style status assignment: coerced, reason phrase cleared.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_set_status(response: *mut FfiResponse, status: i64) -> bool {
    if response.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let response = unsafe { &mut *response };
        response.inner.set_status(status);
        true
    }))
    .unwrap_or(false)
}

/// Fluent `with_status`: a new handle with `code` and `reason`. A null or
/// empty `reason` selects the standard phrase.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_with_status(
    response: *const FfiResponse,
    code: u16,
    reason: *const c_char,
) -> *mut FfiResponse {
    if response.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(reason) = (unsafe { optional_str_arg(reason) }) else {
            return std::ptr::null_mut();
        };
        let response = unsafe { &*response };
        FfiResponse::into_raw(response.inner.with_status(code, reason.unwrap_or("")))
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// The status code; 0 for a null handle.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_status(response: *const FfiResponse) -> u16 {
    if response.is_null() {
        return 0;
    }
    catch_unwind(AssertUnwindSafe(|| unsafe { &*response }.inner.status_code())).unwrap_or(0)
}

/// The reason phrase. Free with `rb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_reason_phrase(response: *const FfiResponse) -> *mut c_char {
    if response.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let response = unsafe { &*response };
        into_c_string(response.inner.reason_phrase().to_string())
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Host-style header assignment. Without `replace` the value is appended to
/// the existing line.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_header(
    response: *mut FfiResponse,
    name: *const c_char,
    value: *const c_char,
    replace: bool,
) -> bool {
    if response.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let name = unsafe { str_arg(name) };
        let value = unsafe { str_arg(value) };
        let (Ok(name), Ok(value)) = (name, value) else {
            return false;
        };
        let response = unsafe { &mut *response };
        response.inner.header(name, value, replace);
        true
    }))
    .unwrap_or(false)
}

/// The values of header `name` joined with `", "`. Free with
/// `rb_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn rb_response_header_line(
    response: *const FfiResponse,
    name: *const c_char,
) -> *mut c_char {
    if response.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let Ok(name) = (unsafe { str_arg(name) }) else {
            return std::ptr::null_mut();
        };
        let response = unsafe { &*response };
        into_c_string(response.inner.header_line(name))
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Results and strings
// ---------------------------------------------------------------------------

/// Move the request handle out of a result. Returns null if the result does
/// not carry one. The result still has to be freed.
#[unsafe(no_mangle)]
pub extern "C" fn rb_result_take_request(result: *mut FfiResult) -> *mut FfiRequest {
    if result.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { &mut *result };
        if result.data_tag != FfiDataTag::Request {
            return std::ptr::null_mut();
        }
        result.data_tag = FfiDataTag::None;
        std::mem::replace(&mut result.data, std::ptr::null_mut()) as *mut FfiRequest
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Move the response handle out of a result. Returns null if the result
/// does not carry one. The result still has to be freed.
#[unsafe(no_mangle)]
pub extern "C" fn rb_result_take_response(result: *mut FfiResult) -> *mut FfiResponse {
    if result.is_null() {
        return std::ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { &mut *result };
        if result.data_tag != FfiDataTag::Response {
            return std::ptr::null_mut();
        }
        result.data_tag = FfiDataTag::None;
        std::mem::replace(&mut result.data, std::ptr::null_mut()) as *mut FfiResponse
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Free an `FfiResult` and whatever payload it still owns.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rb_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let mut result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        unsafe { result.free_data() };
    }));
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rb_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
