//! Response adapter through both APIs.

use restbridge_core::{
    Body, HeaderValue, Message, NativeHeaders, NativeResponse, Response, ResponseMessage,
};
use rstest::rstest;
use serde_json::{json, Value};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Construction and conversion
// ---------------------------------------------------------------------------

#[test]
fn creation_with_defaults() {
    let response = Response::default();

    assert_eq!(response.get_data(), Value::Null);
    assert_eq!(response.get_status(), 200);
    assert!(response.get_headers().is_empty());

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.reason_phrase(), "OK");
    assert!(response.headers().is_empty());
    assert_eq!(response.protocol_version(), "1.1");
    assert_eq!(response.body().to_string(), "");
}

#[test]
fn creation_with_arguments() {
    let headers = NativeHeaders::from_iter([("some name here", "some value here")]);
    let response = Response::new("some data here", 201, headers.clone());

    assert_eq!(response.get_data(), json!("some data here"));
    assert_eq!(response.get_status(), 201);
    assert_eq!(response.get_headers(), &headers);

    assert_eq!(response.status_code(), 201);
    assert_eq!(response.reason_phrase(), "Created");
    assert_eq!(response.header_line("some name here"), "some value here");
    assert_eq!(response.body().to_string(), "some data here");
}

#[rstest]
#[case::negative(-404, 404)]
#[case::zero(0, 0)]
#[case::too_large(123_456, 999)]
#[case::min(i64::MIN, 999)]
fn constructor_coerces_status(#[case] raw: i64, #[case] expected: u16) {
    init_logging();
    let response = Response::new(Value::Null, raw, NativeHeaders::new());
    assert_eq!(response.get_status(), expected);
    assert_eq!(response.status_code(), expected);
}

#[test]
fn from_native_returns_passed_adapter() {
    let response = Response::default();
    assert!(Response::ptr_eq(&Response::from_native(&response), &response));
    assert!(Response::ptr_eq(&Response::from_native(response.clone()), &response));
}

#[test]
fn from_native_reads_every_field() {
    init_logging();
    let native = NativeResponse {
        data: json!({"id": 7}),
        status: 404,
        headers: NativeHeaders::from_iter([("Allow", vec!["GET", "POST"])]),
    };

    let response = Response::from_native(native.clone());

    assert_eq!(response.get_data(), json!({"id": 7}));
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.reason_phrase(), "Not Found");
    assert_eq!(response.header_values("allow"), vec!["GET", "POST"]);
    assert_eq!(response.body().to_string(), r#"{"id":7}"#);
    assert!(response.is_error());

    assert_eq!(response.to_native(), native);
}

// ---------------------------------------------------------------------------
// Fluent API
// ---------------------------------------------------------------------------

#[test]
fn set_protocol_version_through_fluent() {
    let response = Response::default().with_protocol_version("1.2.3");
    assert_eq!(response.protocol_version(), "1.2.3");
    assert!(Response::ptr_eq(&response, &response.with_protocol_version("1.2.3")));
}

#[test]
fn set_header_through_fluent() {
    let response = Response::default().with_header("some name here", "some value here");

    assert_eq!(
        response.get_headers().value("some name here"),
        Some(&HeaderValue::from("some value here"))
    );
    assert_eq!(response.header_values("some name here"), vec!["some value here"]);
    assert_eq!(response.header_line("some name here"), "some value here");
}

#[test]
fn set_same_header_through_fluent_returns_current_instance() {
    let response = Response::default().with_header("h", "v");
    assert!(Response::ptr_eq(&response, &response.with_header("H", "v")));
}

#[test]
fn set_header_list_through_fluent_stores_one_line() {
    let response = Response::default().with_header("Vary", ["Accept", "Origin"]);

    assert_eq!(
        response.get_headers().value("vary"),
        Some(&HeaderValue::from("Accept, Origin"))
    );
    assert_eq!(response.header_values("vary"), vec!["Accept", "Origin"]);
}

#[test]
fn add_header_through_fluent() {
    let response = Response::default()
        .with_header("some name here", "something")
        .with_added_header("some name here", "some value here");

    assert_eq!(
        response.get_headers().value("some name here"),
        Some(&HeaderValue::from("something, some value here"))
    );
    assert_eq!(
        response.header_values("some name here"),
        vec!["something", "some value here"]
    );
    assert_eq!(response.header_line("some name here"), "something, some value here");
}

#[test]
fn remove_header_through_fluent() {
    let response = Response::default()
        .with_header("some name here", "some value here")
        .without_header("some name here");

    assert!(response.get_headers().is_empty());
    assert!(response.headers().is_empty());
    assert!(!response.has_header("some name here"));
}

#[test]
fn empty_header_line_reads_as_no_values() {
    let headers = NativeHeaders::from_iter([("x-empty", "")]);
    let response = Response::new(Value::Null, 200, headers);

    assert!(response.has_header("x-empty"));
    assert!(response.header_values("x-empty").is_empty());
    assert_eq!(response.header_line("x-empty"), "");
    assert!(response.headers().get("x-empty").is_empty());
}

#[test]
fn set_body_through_fluent_returns_current_instance() {
    let body = Body::from("some data here");
    let response = Response::default().with_body(body.clone());
    assert!(Response::ptr_eq(&response, &response.with_body(body.clone())));
    assert!(Body::ptr_eq(&response.body(), &body));
}

#[test]
fn set_body_through_fluent() {
    let response = Response::default().with_body(Body::from("some data here"));

    assert_eq!(response.get_data(), json!("some data here"));
    assert_eq!(response.body().to_string(), "some data here");
}

#[rstest]
#[case::ok(200, "", "OK")]
#[case::not_found(404, "", "Not Found")]
#[case::custom_reason(404, "Gone Fishing", "Gone Fishing")]
#[case::unknown_code(799, "", "")]
fn set_status_through_fluent(#[case] code: u16, #[case] reason: &str, #[case] expected: &str) {
    let original = Response::default();
    let response = original.with_status(code, reason);

    assert_eq!(response.get_status(), code);
    assert_eq!(response.status_code(), code);
    assert_eq!(response.reason_phrase(), expected);
    assert_eq!(original.status_code(), 200);
}

#[rstest]
#[case::just_above_max(1000)]
#[case::far_above_max(5000)]
#[case::u16_max(65535)]
fn both_apis_saturate_status_alike(#[case] code: u16) {
    init_logging();
    let fluent = Response::default().with_status(code, "");
    let mut native = Response::default();
    native.set_status(i64::from(code));

    assert_eq!(fluent.status_code(), 999);
    assert_eq!(native.status_code(), fluent.status_code());
    assert_eq!(fluent.reason_phrase(), "");
}

#[test]
fn data_tracks_writes_to_the_body_stream() {
    let body = Body::from("abc");
    let response = Response::default().with_body(body.clone());
    body.seek_to(std::io::SeekFrom::End(0)).unwrap();
    body.write_bytes(b"def");

    assert_eq!(response.body().to_string(), "abcdef");
    assert_eq!(response.get_data(), json!("abcdef"));
    assert_eq!(response.to_native().data, json!("abcdef"));
}

#[test]
fn set_same_status_through_fluent_returns_current_instance() {
    let response = Response::default();
    assert!(Response::ptr_eq(&response, &response.with_status(200, "")));
    assert!(Response::ptr_eq(&response, &response.with_status(200, "OK")));
    assert!(!Response::ptr_eq(&response, &response.with_status(200, "Fine")));
}

#[test]
fn fluent_calls_leave_the_receiver_untouched() {
    let original = Response::new("data", 200, NativeHeaders::new());
    let _ = original
        .with_status(500, "")
        .with_header("h", "v")
        .with_body(Body::from("other"));

    assert_eq!(original.get_status(), 200);
    assert!(original.get_headers().is_empty());
    assert_eq!(original.get_data(), json!("data"));
}

// ---------------------------------------------------------------------------
// Host-style API
// ---------------------------------------------------------------------------

#[test]
fn set_status_through_native() {
    let mut response = Response::default();
    response.set_status(404);

    assert_eq!(response.get_status(), 404);
    assert_eq!(response.status_code(), 404);
    assert_eq!(response.reason_phrase(), "");
}

#[test]
fn set_negative_status_through_native() {
    init_logging();
    let mut response = Response::default();
    response.set_status(-500);
    assert_eq!(response.status_code(), 500);
}

#[test]
fn set_header_through_native() {
    let mut response = Response::default();
    response.header("some name here", "some value here", true);

    assert_eq!(
        response.get_headers().value("some name here"),
        Some(&HeaderValue::from("some value here"))
    );
    assert_eq!(response.header_values("some name here"), vec!["some value here"]);
    assert_eq!(response.header_line("some name here"), "some value here");
}

#[test]
fn add_header_through_native() {
    let mut response = Response::default();
    response.header("some name here", "something", true);
    response.header("some name here", "some value here", false);

    assert_eq!(
        response.header_values("some name here"),
        vec!["something", "some value here"]
    );
    assert_eq!(response.header_line("some name here"), "something, some value here");
}

#[test]
fn replace_header_through_native() {
    let mut response = Response::default().with_header("h", "old");
    response.header("H", "new", true);
    assert_eq!(response.header_line("h"), "new");
    assert_eq!(response.headers().iter().next().map(|(n, _)| n), Some("h"));
}

#[test]
fn set_headers_through_native() {
    let headers = NativeHeaders::from_iter([("a", "1, 2")]);
    let mut response = Response::default().with_header("old", "x");
    response.set_headers(headers.clone());

    assert_eq!(response.get_headers(), &headers);
    assert_eq!(response.header_values("a"), vec!["1", "2"]);
    assert!(!response.has_header("old"));
}

#[test]
fn set_data_through_native() {
    let mut response = Response::default();
    response.set_data(json!([1, 2, 3]));

    assert_eq!(response.get_data(), json!([1, 2, 3]));
    assert_eq!(response.body().to_string(), "[1,2,3]");
}

#[test]
fn native_mutation_does_not_reach_earlier_fluent_copies() {
    let mut response = Response::default();
    let copy = response.with_header("h", "v");
    response.set_status(418);

    assert_eq!(copy.status_code(), 200);
    assert_eq!(response.status_code(), 418);
    assert!(!response.has_header("h"));
}

#[test]
fn native_line_header_renders_as_list() {
    let headers = NativeHeaders::from_iter([("foo", "a, b, c")]);
    let response = Response::new(Value::Null, 200, headers);

    assert_eq!(
        serde_json::to_value(response.headers()).unwrap(),
        json!({"foo": ["a", "b", "c"]})
    );
    assert_eq!(
        response.get_headers().value("foo"),
        Some(&HeaderValue::from("a, b, c"))
    );
}

#[test]
fn native_status_does_not_pick_a_standard_phrase() {
    let mut response = Response::default();
    response.set_status(123);

    assert_eq!(response.status_code(), 123);
    assert_ne!(response.reason_phrase(), "OK");
    assert_eq!(response.reason_phrase(), "");
}
