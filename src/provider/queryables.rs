//! Queryable parameter descriptions
//!
//! 可查询参数可以手工写在配置里，也可以从上游 API 的 OpenAPI 文档自动生成。

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::QueryablesConfig;
use crate::errors::{ProviderError, Result};

/// JSON-Schema style description of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

impl Property {
    pub fn new(title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: Some(kind.into()),
            options: None,
        }
    }

    pub fn with_options(mut self, options: Vec<Value>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Parameter name → description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Queryables(BTreeMap<String, Property>);

impl Queryables {
    pub fn new(properties: BTreeMap<String, Property>) -> Self {
        Self(properties)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, property: Property) {
        self.0.insert(name.into(), property);
    }

    /// Resolve the queryables for a provider
    ///
    /// An OpenAPI document wins when it is configured and exists on disk;
    /// otherwise the properties written in the config are used.
    pub fn load(config: &QueryablesConfig) -> Result<Self> {
        if let Some(path) = config.openapi_path.as_deref() {
            if Path::new(path).is_file() {
                let queryables = Self::from_openapi(path, &config.openapi_endpoint)?;
                info!(
                    "Loaded {} queryables from OpenAPI document {} ({})",
                    queryables.len(),
                    path,
                    config.openapi_endpoint
                );
                return Ok(queryables);
            }
            warn!(
                "OpenAPI document {} not found, falling back to configured queryables",
                path
            );
        }

        debug!("Using {} configured queryables", config.properties.len());
        Ok(Self(config.properties.clone()))
    }

    /// Read the GET parameters of `endpoint` from an OpenAPI JSON file
    pub fn from_openapi<P: AsRef<Path>>(path: P, endpoint: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let document: Value = serde_json::from_str(&content)?;
        Self::from_openapi_value(&document, endpoint)
    }

    pub fn from_openapi_value(document: &Value, endpoint: &str) -> Result<Self> {
        let params = document
            .get("paths")
            .and_then(|p| p.get(endpoint))
            .and_then(|e| e.get("get"))
            .and_then(|g| g.get("parameters"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProviderError::openapi(format!(
                    "no GET parameters found for path \"{}\"",
                    endpoint
                ))
            })?;

        let mut properties = BTreeMap::new();
        for param in params {
            let Some(name) = param.get("name").and_then(Value::as_str) else {
                // $ref 参数等没有 name 的条目直接跳过
                continue;
            };
            let schema = param.get("schema");

            let kind = param
                .get("type")
                .or_else(|| schema.and_then(|s| s.get("type")))
                .and_then(Value::as_str)
                .map(String::from);

            let options = schema
                .and_then(|s| s.get("items"))
                .and_then(|i| i.get("enum"))
                .or_else(|| schema.and_then(|s| s.get("enum")))
                .and_then(Value::as_array)
                .cloned();

            properties.insert(
                name.to_string(),
                Property {
                    title: name.to_string(),
                    kind,
                    options,
                },
            );
        }

        Ok(Self(properties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn sample_document() -> Value {
        json!({
            "openapi": "3.0.0",
            "paths": {
                "/occurrence/search": {
                    "get": {
                        "parameters": [
                            {"name": "country", "in": "query", "schema": {"type": "array", "items": {"type": "string", "enum": ["DE", "FR"]}}},
                            {"name": "year", "in": "query", "type": "integer"},
                            {"name": "basisOfRecord", "in": "query", "schema": {"type": "string", "enum": ["OBSERVATION", "SPECIMEN"]}},
                            {"$ref": "#/components/parameters/limit"}
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn test_from_openapi_value() {
        let q = Queryables::from_openapi_value(&sample_document(), "/occurrence/search").unwrap();
        assert_eq!(q.len(), 3);

        let country = q.get("country").unwrap();
        assert_eq!(country.kind.as_deref(), Some("array"));
        assert_eq!(country.options, Some(vec![json!("DE"), json!("FR")]));

        assert_eq!(q.get("year").unwrap().kind.as_deref(), Some("integer"));
        assert_eq!(q.get("year").unwrap().options, None);
        assert_eq!(q.get("basisOfRecord").unwrap().options.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_endpoint() {
        let err = Queryables::from_openapi_value(&sample_document(), "/nope").unwrap_err();
        assert!(matches!(err, ProviderError::OpenApi(_)));
    }

    #[test]
    fn test_load_prefers_openapi_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", sample_document()).unwrap();

        let config = QueryablesConfig {
            openapi_path: Some(file.path().to_string_lossy().into_owned()),
            properties: BTreeMap::from([("manual".to_string(), Property::new("manual", "string"))]),
            ..QueryablesConfig::default()
        };
        let q = Queryables::load(&config).unwrap();
        assert!(q.contains("country"));
        assert!(!q.contains("manual"));
    }

    #[test]
    fn test_load_falls_back_to_configured() {
        let config = QueryablesConfig {
            openapi_path: Some("/definitely/not/here.json".to_string()),
            properties: BTreeMap::from([("page".to_string(), Property::new("page", "integer"))]),
            ..QueryablesConfig::default()
        };
        let q = Queryables::load(&config).unwrap();
        assert!(q.contains("page"));
    }

    #[test]
    fn test_serializes_as_map() {
        let mut q = Queryables::default();
        q.insert(
            "mode",
            Property::new("mode", "string").with_options(vec![json!("a"), json!("b")]),
        );
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"mode": {"title": "mode", "type": "string", "enum": ["a", "b"]}})
        );
    }
}
