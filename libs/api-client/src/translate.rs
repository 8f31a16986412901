//! Maps failed exchanges onto [`ApiErrorKind`].
//!
//! Error bodies look like `{"code": 4001, "meta": {...}}`, with a `meta`
//! shape that depends on the status. Decoding is defensive: a body that is
//! not JSON, or lacks a field, leaves the matching metadata empty.

use serde_json::{Map, Value};

use crate::error::{
    ApiError, ApiErrorKind, FeatureLimit, RequestSnapshot, ResponseSnapshot, ValidationErrors,
};

const CODE_HARD_LIMIT: i64 = 4001;
const CODE_SOFT_LIMIT: i64 = 4002;
const CODE_TOTAL_LIMIT: i64 = 4003;

/// Decoded error body. Both fields are absent when the body is not JSON.
#[derive(Debug, Default)]
struct ErrorBody {
    code: Option<i64>,
    meta: Map<String, Value>,
}

impl ErrorBody {
    fn decode(raw: &[u8]) -> Self {
        let Ok(Value::Object(mut root)) = serde_json::from_slice::<Value>(raw) else {
            return Self::default();
        };
        let code = root.get("code").and_then(as_code);
        let meta = match root.remove("meta") {
            Some(Value::Object(meta)) => meta,
            _ => Map::new(),
        };
        Self { code, meta }
    }

    fn string(&self, key: &str) -> Option<String> {
        self.meta.get(key).and_then(as_string)
    }

    fn feature_limit(&self) -> FeatureLimit {
        FeatureLimit {
            limit: self.meta.get("limit").and_then(as_u64),
            feature: self.string("feature"),
        }
    }
}

/// Translate a failed exchange into an [`ApiError`].
#[must_use]
pub fn translate(request: RequestSnapshot, response: ResponseSnapshot) -> ApiError {
    let body = ErrorBody::decode(&response.body);
    let kind = classify(response.status.as_u16(), &body);
    ApiError::new(kind, request, response)
}

fn classify(status: u16, body: &ErrorBody) -> ApiErrorKind {
    match status {
        400 => ApiErrorKind::BadRequest,
        401 => ApiErrorKind::Auth {
            error_type: body.string("error_type"),
            hint: body.string("hint"),
        },
        402 => {
            let limit = body.feature_limit();
            match body.code {
                Some(CODE_HARD_LIMIT) => ApiErrorKind::FeatureHardLimit(limit),
                Some(CODE_SOFT_LIMIT) => ApiErrorKind::FeatureSoftLimit(limit),
                Some(CODE_TOTAL_LIMIT) => ApiErrorKind::FeatureTotalLimit(limit),
                _ => ApiErrorKind::FeatureLimit(limit),
            }
        }
        403 => match body.string("feature") {
            Some(feature) => ApiErrorKind::NoFeature {
                feature,
                plans: body.meta.get("plans").map(string_list).unwrap_or_default(),
            },
            None => ApiErrorKind::NoPermissions,
        },
        404 => ApiErrorKind::NotFound {
            entity_type: body.string("entity_type"),
        },
        405 => ApiErrorKind::MethodNotAllowed,
        413 => ApiErrorKind::EntityTooLarge,
        422 => ApiErrorKind::ValidationFailed {
            errors: body
                .meta
                .get("errors")
                .map(validation_errors)
                .unwrap_or_default(),
        },
        429 => ApiErrorKind::RateLimit,
        _ => ApiErrorKind::Server,
    }
}

fn as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .and_then(integral)
                .and_then(|i| u64::try_from(i).ok())
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `4001.0` reads as `4001`; fractional or out-of-range values do not.
#[allow(clippy::cast_possible_truncation)]
fn integral(f: f64) -> Option<i64> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    (f.fract() == 0.0 && f.abs() <= MAX_EXACT).then(|| f as i64)
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_string).collect(),
        other => as_string(other).into_iter().collect(),
    }
}

fn validation_errors(value: &Value) -> ValidationErrors {
    match value {
        Value::Object(fields) => fields
            .iter()
            .map(|(field, messages)| (field.clone(), string_list(messages)))
            .collect(),
        _ => ValidationErrors::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};
    use serde_json::json;

    fn failed(status: u16, body: &Value) -> ApiError {
        failed_raw(status, Bytes::from(body.to_string()))
    }

    fn failed_raw(status: u16, body: Bytes) -> ApiError {
        let request = RequestSnapshot {
            method: Method::GET,
            url: "https://api.example.com/items".to_owned(),
            headers: HeaderMap::new(),
        };
        let response = ResponseSnapshot {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body,
        };
        translate(request, response)
    }

    #[test]
    fn test_unmapped_statuses_are_server_errors() {
        for status in [402_u16, 403, 404] {
            assert_ne!(*failed(status, &json!({})).kind(), ApiErrorKind::Server);
        }
        for status in [406_u16, 409, 410, 418, 451, 500, 501, 502, 503, 504, 599] {
            assert_eq!(
                *failed(status, &json!({"code": 4001, "meta": {"feature": "x"}})).kind(),
                ApiErrorKind::Server,
                "status {status}"
            );
        }
    }

    #[test]
    fn test_bad_request_ignores_body() {
        let err = failed(400, &json!({"meta": {"anything": true}}));
        assert_eq!(*err.kind(), ApiErrorKind::BadRequest);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_metadata() {
        let err = failed(
            401,
            &json!({"meta": {"error_type": "invalid_token", "hint": "token expired"}}),
        );
        assert_eq!(
            *err.kind(),
            ApiErrorKind::Auth {
                error_type: Some("invalid_token".to_owned()),
                hint: Some("token expired".to_owned()),
            }
        );
    }

    #[test]
    fn test_integral_float_code_selects_kind() {
        let err = failed(402, &json!({"code": 4001.0, "meta": {"limit": 5.0}}));
        assert_eq!(
            *err.kind(),
            ApiErrorKind::FeatureHardLimit(FeatureLimit {
                limit: Some(5),
                feature: None,
            })
        );

        let err = failed(402, &json!({"code": 4001.5}));
        assert_eq!(*err.kind(), ApiErrorKind::FeatureLimit(FeatureLimit::default()));
    }

    #[test]
    fn test_payment_required_selected_by_code() {
        let meta = json!({"limit": 50, "feature": "invoices"});
        let expected = FeatureLimit {
            limit: Some(50),
            feature: Some("invoices".to_owned()),
        };

        let hard = failed(402, &json!({"code": 4001, "meta": meta}));
        assert_eq!(*hard.kind(), ApiErrorKind::FeatureHardLimit(expected.clone()));

        let soft = failed(402, &json!({"code": "4002", "meta": meta}));
        assert_eq!(*soft.kind(), ApiErrorKind::FeatureSoftLimit(expected.clone()));

        let total = failed(402, &json!({"code": 4003, "meta": meta}));
        assert_eq!(*total.kind(), ApiErrorKind::FeatureTotalLimit(expected.clone()));

        let other = failed(402, &json!({"code": 4999, "meta": meta}));
        assert_eq!(*other.kind(), ApiErrorKind::FeatureLimit(expected.clone()));

        let missing = failed(402, &json!({"meta": meta}));
        assert_eq!(*missing.kind(), ApiErrorKind::FeatureLimit(expected));
    }

    #[test]
    fn test_forbidden_with_feature_is_no_feature() {
        let err = failed(
            403,
            &json!({"meta": {"feature": "exports", "plans": ["pro", "enterprise"]}}),
        );
        assert_eq!(
            *err.kind(),
            ApiErrorKind::NoFeature {
                feature: "exports".to_owned(),
                plans: vec!["pro".to_owned(), "enterprise".to_owned()],
            }
        );
    }

    #[test]
    fn test_forbidden_without_feature_is_no_permissions() {
        assert_eq!(*failed(403, &json!({})).kind(), ApiErrorKind::NoPermissions);
        assert_eq!(
            *failed(403, &json!({"meta": {"feature": null, "plans": ["pro"]}})).kind(),
            ApiErrorKind::NoPermissions
        );
    }

    #[test]
    fn test_not_found_entity_type() {
        let err = failed(404, &json!({"meta": {"entity_type": "invoice"}}));
        assert_eq!(
            *err.kind(),
            ApiErrorKind::NotFound {
                entity_type: Some("invoice".to_owned())
            }
        );
    }

    #[test]
    fn test_validation_errors() {
        let err = failed(
            422,
            &json!({"meta": {"errors": {"email": ["is required", "is invalid"], "name": "too long"}}}),
        );
        let ApiErrorKind::ValidationFailed { errors } = err.kind() else {
            panic!("expected ValidationFailed, got {:?}", err.kind());
        };
        assert_eq!(errors["email"], vec!["is required", "is invalid"]);
        assert_eq!(errors["name"], vec!["too long"]);
    }

    #[test]
    fn test_simple_kinds() {
        assert_eq!(*failed(405, &json!({})).kind(), ApiErrorKind::MethodNotAllowed);
        assert_eq!(*failed(413, &json!({})).kind(), ApiErrorKind::EntityTooLarge);
        assert_eq!(*failed(429, &json!({})).kind(), ApiErrorKind::RateLimit);
        assert_eq!(*failed(500, &json!({})).kind(), ApiErrorKind::Server);
    }

    #[test]
    fn test_non_json_body_leaves_metadata_absent() {
        let err = failed_raw(402, Bytes::from_static(b"<html>Payment Required</html>"));
        assert_eq!(*err.kind(), ApiErrorKind::FeatureLimit(FeatureLimit::default()));

        let err = failed_raw(404, Bytes::new());
        assert_eq!(*err.kind(), ApiErrorKind::NotFound { entity_type: None });

        let err = failed_raw(403, Bytes::from_static(b"[1, 2]"));
        assert_eq!(*err.kind(), ApiErrorKind::NoPermissions);
    }

    #[test]
    fn test_raw_body_is_kept() {
        let err = failed_raw(500, Bytes::from_static(b"upstream exploded"));
        assert_eq!(err.response().body_text(), "upstream exploded");
        assert_eq!(err.request().url, "https://api.example.com/items");
    }
}
