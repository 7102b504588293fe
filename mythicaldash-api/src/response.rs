/// Response helpers: the success envelope and browser redirects
///
/// ```json
/// { "success": true, "code": 200, "message": "...", "<payload fields>": ... }
/// ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

/// Wraps `payload` (a JSON object) in the success envelope
///
/// Payload fields are merged at the top level; a non-object payload is placed
/// under `data`.
pub fn success(message: &str, payload: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("code".to_string(), json!(200));
    body.insert("message".to_string(), Value::String(message.to_string()));

    match payload {
        Value::Object(fields) => body.extend(fields),
        Value::Null => {}
        other => {
            body.insert("data".to_string(), other);
        }
    }

    Json(Value::Object(body))
}

/// `302 Found` to `location`
///
/// `axum::response::Redirect` only offers 303/307/308; browsers and PayPal
/// expect a plain 302 here.
pub fn found(location: &str) -> Response {
    let location = HeaderValue::try_from(location).unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `302` to the frontend error page with `message` in the query string
pub fn error_redirect(message: &str) -> Response {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    found(&format!("/error?message={}", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_merged() {
        let Json(body) = success("ok", json!({"settings": {"a": "b"}}));
        assert_eq!(body["success"], true);
        assert_eq!(body["code"], 200);
        assert_eq!(body["message"], "ok");
        assert_eq!(body["settings"]["a"], "b");
    }

    #[test]
    fn test_found_is_302() {
        let response = found("/dashboard");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/dashboard");
    }

    #[test]
    fn test_error_redirect_encodes_message() {
        let response = error_redirect("coins is required & must be > 0");
        assert_eq!(
            response.headers()[header::LOCATION],
            "/error?message=coins+is+required+%26+must+be+%3E+0"
        );
    }

    #[test]
    fn test_non_object_payload() {
        let Json(body) = success("ok", json!([1, 2]));
        assert_eq!(body["data"], json!([1, 2]));

        let Json(body) = success("ok", Value::Null);
        assert!(body.get("data").is_none());
    }
}
