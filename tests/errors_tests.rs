//! Error type tests
//!
//! Codes, HTTP mapping and the JSON envelope clients receive.

use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use serde_json::Value;

use geoprovider::api::types::ErrorCode;
use geoprovider::errors::ProviderError;

#[test]
fn test_codes_are_stable() {
    let cases = [
        (ProviderError::config("x"), "E001"),
        (ProviderError::validation("x"), "E002"),
        (ProviderError::unsupported_filter("x"), "E003"),
        (ProviderError::upstream("x"), "E004"),
        (ProviderError::response_parse("x"), "E005"),
        (ProviderError::serialization("x"), "E006"),
        (ProviderError::file_operation("x"), "E007"),
        (ProviderError::openapi("x"), "E008"),
        (ProviderError::date_parse("x"), "E009"),
        (ProviderError::internal("x"), "E010"),
    ];
    for (err, code) in cases {
        assert_eq!(err.code(), code, "{:?}", err);
    }
}

#[test]
fn test_status_mapping() {
    assert_eq!(
        ProviderError::validation("bad").status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ProviderError::unsupported_filter("or").status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ProviderError::upstream("down").status_code(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        ProviderError::response_parse("garbage").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        ProviderError::config("oops").status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_api_codes() {
    assert_eq!(
        ProviderError::unsupported_filter("or").api_code(),
        ErrorCode::UnsupportedFilter
    );
    assert_eq!(
        ProviderError::response_parse("x").api_code(),
        ErrorCode::UpstreamInvalidResponse
    );
    assert_eq!(
        ProviderError::internal("x").api_code(),
        ErrorCode::InternalServerError
    );
}

#[actix_rt::test]
async fn test_error_response_envelope() {
    let resp = ProviderError::upstream("connection refused").error_response();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let bytes = to_bytes(resp.into_body()).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 3000);
    assert_eq!(body["message"], "Upstream API Error: connection refused");
    assert!(body["data"].is_null());
}

#[test]
fn test_from_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    assert!(matches!(ProviderError::from(io), ProviderError::FileOperation(_)));

    let json_err = serde_json::from_str::<Value>("{").unwrap_err();
    assert!(matches!(
        ProviderError::from(json_err),
        ProviderError::Serialization(_)
    ));

    let date_err = chrono::NaiveDate::parse_from_str("2024-13-45", "%Y-%m-%d").unwrap_err();
    assert!(matches!(
        ProviderError::from(date_err),
        ProviderError::DateParse(_)
    ));
}

#[test]
fn test_display_is_simple_format() {
    let err = ProviderError::validation("bbox must have 4 values");
    assert_eq!(err.to_string(), "Validation Error: bbox must have 4 values");
    assert!(err.format_colored().contains("E002"));
}
