// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Input validation for API requests
//!
//! The analyzer and translator accept any string; bounds are enforced here,
//! before either is called.

use serde_json::Value;

use crate::api::ApiError;
use crate::config::LimitsConfig;

/// Extract and check the `value` field of an analyze request.
///
/// Returns the raw string; canonicalization happens in the analyzer.
pub fn validate_value_body(body: &Value, limits: &LimitsConfig) -> Result<String, ApiError> {
    let object = body.as_object().ok_or_else(|| {
        ApiError::UnprocessableEntity("Request body must be a JSON object".to_string())
    })?;

    let value = match object.get("value") {
        None | Some(Value::Null) => {
            return Err(ApiError::BadRequest(
                "Missing \"value\" field in request body".to_string(),
            ))
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(ApiError::UnprocessableEntity(
                "Invalid data type for \"value\" (must be a string)".to_string(),
            ))
        }
    };

    check_length("value", value, limits.max_value_length)?;
    Ok(value.clone())
}

/// Check a natural language query. Length is measured after trimming; the
/// query is returned as received.
pub fn validate_query<'a>(
    query: Option<&'a str>,
    limits: &LimitsConfig,
) -> Result<&'a str, ApiError> {
    let query = query.ok_or_else(|| {
        ApiError::BadRequest("Missing \"query\" parameter".to_string())
    })?;

    check_length("query", query, limits.max_query_length)?;
    Ok(query)
}

fn check_length(field: &str, raw: &str, max: usize) -> Result<(), ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("\"{}\" cannot be empty", field)));
    }

    let length = trimmed.chars().count();
    if length > max {
        return Err(ApiError::BadRequest(format!(
            "\"{}\" too long: {} characters (maximum allowed: {})",
            field, length, max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> LimitsConfig {
        LimitsConfig {
            max_value_length: 10,
            max_query_length: 5,
        }
    }

    #[test]
    fn test_accepts_string_value() {
        let value = validate_value_body(&json!({"value": "  madam "}), &limits()).unwrap();
        assert_eq!(value, "  madam ");
    }

    #[test]
    fn test_missing_and_empty_value_are_bad_requests() {
        for body in [json!({}), json!({"value": null}), json!({"value": "   "})] {
            let err = validate_value_body(&body, &limits()).unwrap_err();
            assert!(matches!(err, ApiError::BadRequest(_)), "{}", body);
        }
    }

    #[test]
    fn test_wrong_type_is_unprocessable() {
        for body in [json!({"value": 42}), json!({"value": ["a"]}), json!("madam")] {
            let err = validate_value_body(&body, &limits()).unwrap_err();
            assert!(matches!(err, ApiError::UnprocessableEntity(_)), "{}", body);
        }
    }

    #[test]
    fn test_length_is_measured_after_trim() {
        assert!(validate_value_body(&json!({"value": "   0123456789   "}), &limits()).is_ok());
        assert!(validate_value_body(&json!({"value": "0123456789a"}), &limits()).is_err());
    }

    #[test]
    fn test_query_bounds() {
        assert_eq!(validate_query(Some(" abcde "), &limits()).unwrap(), " abcde ");
        assert!(matches!(validate_query(None, &limits()), Err(ApiError::BadRequest(_))));
        assert!(validate_query(Some("  "), &limits()).is_err());
        assert!(validate_query(Some("abcdef"), &limits()).is_err());
    }
}
