//! CQL2 JSON → flat query parameters
//!
//! Only the subset that maps onto `key=value` query strings is accepted:
//! `and` (arbitrarily nested) over `=` comparisons between a property and a
//! literal. Anything else is rejected rather than silently dropped.

use serde_json::{Map, Value};

use crate::errors::{ProviderError, Result};

/// Convert a CQL2 JSON filter into query parameters
///
/// ```
/// use geoprovider::provider::cql::cql2_to_query_params;
/// use serde_json::json;
///
/// let params = cql2_to_query_params(&json!({
///     "op": "and",
///     "args": [
///         {"op": "=", "args": [{"property": "species"}, "Quercus robur"]},
///         {"op": "=", "args": [{"property": "year"}, 2021]}
///     ]
/// }))
/// .unwrap();
/// assert_eq!(params["species"], json!("Quercus robur"));
/// assert_eq!(params["year"], json!(2021));
/// ```
pub fn cql2_to_query_params(filter: &Value) -> Result<Map<String, Value>> {
    let mut params = Map::new();
    collect(filter, &mut params)?;
    Ok(params)
}

fn collect(expr: &Value, params: &mut Map<String, Value>) -> Result<()> {
    let obj = expr
        .as_object()
        .ok_or_else(|| ProviderError::unsupported_filter(format!("expected a CQL2 expression object, got {}", expr)))?;

    let op = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::unsupported_filter("CQL2 expression is missing \"op\""))?;
    let args = obj
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::unsupported_filter(format!("CQL2 \"{}\" is missing \"args\"", op)))?;

    match op.to_lowercase().as_str() {
        "and" => {
            for arg in args {
                collect(arg, params)?;
            }
            Ok(())
        }
        "=" | "eq" => {
            let (name, value) = equality(args)?;
            params.insert(name, value);
            Ok(())
        }
        other => Err(ProviderError::unsupported_filter(format!(
            "CQL2 operator \"{}\" cannot be expressed as query parameters (supported: and, =)",
            other
        ))),
    }
}

fn equality(args: &[Value]) -> Result<(String, Value)> {
    let [a, b] = args else {
        return Err(ProviderError::unsupported_filter(format!(
            "\"=\" takes exactly 2 arguments, got {}",
            args.len()
        )));
    };

    let (name, literal) = match (property_name(a), property_name(b)) {
        (Some(name), None) => (name, b),
        (None, Some(name)) => (name, a),
        _ => {
            return Err(ProviderError::unsupported_filter(
                "\"=\" must compare one property with one literal",
            ));
        }
    };

    match literal {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok((name.to_string(), literal.clone())),
        other => Err(ProviderError::unsupported_filter(format!(
            "unsupported literal for \"{}\": {}",
            name, other
        ))),
    }
}

fn property_name(value: &Value) -> Option<&str> {
    value.get("property").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_equality() {
        let params =
            cql2_to_query_params(&json!({"op": "=", "args": [{"property": "country"}, "DE"]})).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["country"], json!("DE"));
    }

    #[test]
    fn test_literal_first() {
        let params =
            cql2_to_query_params(&json!({"op": "eq", "args": [true, {"property": "verified"}]})).unwrap();
        assert_eq!(params["verified"], json!(true));
    }

    #[test]
    fn test_nested_and_flattens() {
        let params = cql2_to_query_params(&json!({
            "op": "and",
            "args": [
                {"op": "=", "args": [{"property": "a"}, 1]},
                {"op": "and", "args": [
                    {"op": "=", "args": [{"property": "b"}, "x"]},
                    {"op": "=", "args": [{"property": "c"}, 2.5]}
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(params.len(), 3);
        assert_eq!(params["c"], json!(2.5));
    }

    #[test]
    fn test_rejects_or() {
        let err = cql2_to_query_params(&json!({
            "op": "or",
            "args": [
                {"op": "=", "args": [{"property": "a"}, 1]},
                {"op": "=", "args": [{"property": "a"}, 2]}
            ]
        }))
        .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedFilter(_)));
    }

    #[test]
    fn test_rejects_property_to_property() {
        let err = cql2_to_query_params(&json!({
            "op": "=", "args": [{"property": "a"}, {"property": "b"}]
        }))
        .unwrap_err();
        assert!(err.message().contains("one property"));
    }

    #[test]
    fn test_rejects_non_scalar_literal() {
        assert!(cql2_to_query_params(&json!({"op": "=", "args": [{"property": "a"}, [1, 2]]})).is_err());
        assert!(cql2_to_query_params(&json!({"op": "=", "args": [{"property": "a"}, null]})).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(cql2_to_query_params(&json!("a = 1")).is_err());
        assert!(cql2_to_query_params(&json!({"args": []})).is_err());
        assert!(cql2_to_query_params(&json!({"op": "="})).is_err());
    }
}
