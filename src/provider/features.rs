//! GeoJSON features and upstream response conversion

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::geometry::Geometry;
use crate::config::ResponseMapping;
use crate::errors::{ProviderError, Result};

/// Keys of an observation that never get copied into `properties`
const RESERVED_KEYS: [&str; 3] = ["id", "geometry", "datetime"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeatureType {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FeatureCollectionType {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(id: Option<String>, geometry: Geometry) -> Self {
        Self {
            kind: FeatureType::Feature,
            id,
            geometry,
            properties: Map::new(),
        }
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.properties
            .insert("datetime".to_string(), Value::String(datetime.to_rfc3339()));
        self
    }

    /// `properties.datetime` parsed back from RFC3339
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        self.properties
            .get("datetime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: FeatureCollectionType,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: FeatureCollectionType::FeatureCollection,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// True for `null`, `[]`, `{}` and `""`
pub fn is_empty_response(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert an upstream response body into point features
///
/// Object bodies are unwrapped through `results_key`; arrays are used as-is.
/// Records with unusable coordinates are skipped with a warning.
pub fn convert_results(response: &Value, mapping: &ResponseMapping) -> Result<Vec<Feature>> {
    let records: &[Value] = match response {
        Value::Array(list) => list.as_slice(),
        Value::Object(obj) => match obj.get(&mapping.results_key) {
            Some(Value::Array(list)) => list.as_slice(),
            Some(Value::Null) | None => &[],
            Some(other) => {
                return Err(ProviderError::response_parse(format!(
                    "\"{}\" is not a list: {}",
                    mapping.results_key,
                    type_name(other)
                )));
            }
        },
        other => {
            return Err(ProviderError::response_parse(format!(
                "expected a JSON list or object, got {}",
                type_name(other)
            )));
        }
    };

    info!("Received {} results. Converting to features.", records.len());
    if let Some(first) = records.first() {
        debug!("First result: {}", first);
    }

    let mut features = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or_else(|| {
            ProviderError::response_parse(format!(
                "result #{} is not an object: {}",
                index,
                type_name(record)
            ))
        })?;

        match convert_record(obj, mapping) {
            Ok(feature) => features.push(feature),
            Err(e) => warn!("Skipping result #{}: {}", index, e),
        }
    }

    Ok(features)
}

fn convert_record(obj: &Map<String, Value>, mapping: &ResponseMapping) -> Result<Feature> {
    let id = obj.get(&mapping.id_key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let lon = coordinate(obj, &mapping.longitude_key)?;
    let lat = coordinate(obj, &mapping.latitude_key)?;

    let mut feature = Feature::new(id, Geometry::point(lon, lat));

    for (key, value) in obj {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            feature.properties.insert(key.clone(), value.clone());
        }
    }

    match obj.get(&mapping.datetime_key) {
        Some(Value::String(raw)) => match parse_datetime(raw, &mapping.datetime_format) {
            Some(dt) => feature = feature.with_datetime(dt),
            None => warn!(
                "Unparsable {} value \"{}\" (expected format {})",
                mapping.datetime_key, raw, mapping.datetime_format
            ),
        },
        Some(Value::Null) | None => {}
        Some(other) => warn!("Non-string {} value: {}", mapping.datetime_key, other),
    }

    Ok(feature)
}

/// Missing coordinates default to 0, garbage is an error
fn coordinate(obj: &Map<String, Value>, key: &str) -> Result<f64> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| ProviderError::response_parse(format!("{} is out of range", key))),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            ProviderError::response_parse(format!("{} is not numeric: \"{}\"", key, s))
        }),
        Some(other) => Err(ProviderError::response_parse(format!(
            "{} is not numeric: {}",
            key, other
        ))),
    }
}

/// Parse an upstream timestamp as UTC
///
/// Tries the configured format as a date-time, then as a plain date, then
/// RFC3339.
pub fn parse_datetime(raw: &str, format: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn mapping() -> ResponseMapping {
        ResponseMapping::default()
    }

    #[test]
    fn test_convert_list_response() {
        let body = json!([
            {"id": "obs-1", "Latitude": 51.5, "Longitude": -0.12, "UTC": "2024-03-01T12:30", "PM25": 11.2},
            {"id": 7, "Latitude": "48.85", "Longitude": "2.35", "UTC": "2024-03-01T13:00"}
        ]);

        let features = convert_results(&body, &mapping()).unwrap();
        assert_eq!(features.len(), 2);

        let first = &features[0];
        assert_eq!(first.id.as_deref(), Some("obs-1"));
        assert_eq!(first.geometry.as_point(), Some((-0.12, 51.5)));
        assert_eq!(first.properties["PM25"], json!(11.2));
        // 原始字段保留在 properties 中
        assert_eq!(first.properties["UTC"], json!("2024-03-01T12:30"));
        assert!(!first.properties.contains_key("id"));
        assert_eq!(
            first.datetime(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap())
        );

        assert_eq!(features[1].id.as_deref(), Some("7"));
        assert_eq!(features[1].geometry.as_point(), Some((2.35, 48.85)));
    }

    #[test]
    fn test_convert_object_response_uses_results_key() {
        let body = json!({"count": 1, "results": [{"id": "a", "Latitude": 1.0, "Longitude": 2.0}]});
        let features = convert_results(&body, &mapping()).unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].datetime().is_none());
    }

    #[test]
    fn test_object_without_results_is_empty() {
        let features = convert_results(&json!({"count": 0}), &mapping()).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_missing_coordinates_default_to_zero() {
        let features = convert_results(&json!([{"id": "x"}]), &mapping()).unwrap();
        assert_eq!(features[0].geometry.as_point(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_bad_coordinates_are_skipped() {
        let body = json!([
            {"id": "bad", "Latitude": "north", "Longitude": 1.0},
            {"id": "good", "Latitude": 1.0, "Longitude": 1.0}
        ]);
        let features = convert_results(&body, &mapping()).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].id.as_deref(), Some("good"));
    }

    #[test]
    fn test_unparsable_datetime_is_kept_raw() {
        let body = json!([{"id": "a", "UTC": "yesterday"}]);
        let features = convert_results(&body, &mapping()).unwrap();
        assert!(features[0].datetime().is_none());
        assert_eq!(features[0].properties["UTC"], json!("yesterday"));
    }

    #[test]
    fn test_non_object_record_is_an_error() {
        let err = convert_results(&json!([1, 2]), &mapping()).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseParse(_)));
        assert!(convert_results(&json!("nope"), &mapping()).is_err());
        assert!(convert_results(&json!({"results": "nope"}), &mapping()).is_err());
    }

    #[test]
    fn test_custom_mapping() {
        let mapping = ResponseMapping {
            results_key: "data".to_string(),
            id_key: "uuid".to_string(),
            latitude_key: "lat".to_string(),
            longitude_key: "lng".to_string(),
            datetime_key: "observed_on".to_string(),
            datetime_format: "%Y-%m-%d".to_string(),
        };
        let body = json!({"data": [{"uuid": "u1", "lat": 10.0, "lng": 20.0, "observed_on": "2023-07-04"}]});
        let features = convert_results(&body, &mapping).unwrap();
        assert_eq!(features[0].id.as_deref(), Some("u1"));
        assert_eq!(
            features[0].datetime(),
            Some(Utc.with_ymd_and_hms(2023, 7, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_datetime_falls_back_to_rfc3339() {
        assert_eq!(
            parse_datetime("2024-01-02T03:04:05Z", "%d/%m/%Y"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_empty_response_detection() {
        assert!(is_empty_response(&json!(null)));
        assert!(is_empty_response(&json!([])));
        assert!(is_empty_response(&json!({})));
        assert!(!is_empty_response(&json!([{}])));
    }

    #[test]
    fn test_feature_serialization() {
        let feature = Feature::new(Some("f1".to_string()), Geometry::point(1.0, 2.0));
        assert_eq!(
            serde_json::to_value(&feature).unwrap(),
            json!({
                "type": "Feature",
                "id": "f1",
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
                "properties": {}
            })
        );
        let collection = FeatureCollection::new(vec![feature]);
        assert_eq!(serde_json::to_value(&collection).unwrap()["type"], json!("FeatureCollection"));
    }
}
