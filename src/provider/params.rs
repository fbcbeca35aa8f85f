//! Search request → upstream query parameters

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use super::cql::cql2_to_query_params;
use super::pagination::PageRequest;
use super::queryables::Queryables;
use super::search::SearchRequest;
use crate::config::UpstreamConfig;
use crate::errors::{ProviderError, Result};

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    /// Sent as repeated `key=value` pairs
    List(Vec<String>),
}

impl ParamValue {
    /// Scalars become text, arrays of scalars become lists, objects are
    /// forwarded as their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => ParamValue::List(items.iter().map(scalar_text).collect()),
            other => ParamValue::Text(scalar_text(other)),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ordered parameter set with dict-like overwrite semantics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiParams {
    entries: Vec<(String, ParamValue)>,
}

impl ApiParams {
    /// Insert or overwrite in place (first insertion position is kept)
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into `(key, value)` pairs, lists as repeated keys
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.entries.len());
        for (key, value) in &self.entries {
            match value {
                ParamValue::Text(v) => pairs.push((key.clone(), v.clone())),
                ParamValue::List(items) => {
                    pairs.extend(items.iter().map(|v| (key.clone(), v.clone())))
                }
            }
        }
        pairs
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

/// Format a timestamp, surfacing bad strftime patterns as config errors
pub fn format_date(dt: &DateTime<Utc>, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(format))
        .map_err(|_| ProviderError::config(format!("Invalid date format: \"{}\"", format)))?;
    Ok(out)
}

/// Translate a search request into upstream query parameters
pub fn translate(
    request: &SearchRequest,
    page: &PageRequest,
    config: &UpstreamConfig,
    queryables: &Queryables,
) -> Result<ApiParams> {
    request.validate()?;

    let names = &config.params;
    let mut params = ApiParams::default();

    // DEFAULTS
    for (key, value) in &config.default_params {
        params.set(key.as_str(), value.as_str());
    }

    // PROVIDER PROPERTIES: 只补充，不覆盖默认参数
    for (key, value) in &request.provider_properties {
        if !params.contains(key) {
            params.set(key.as_str(), ParamValue::from_json(value));
        }
    }

    // BBOX
    match request.bbox_array()? {
        Some(bbox) => {
            info!("Input bbox: {:?}", bbox);
            params.set(names.bbox.as_str(), join_bbox(&bbox));
        }
        None => debug!("No bbox provided"),
    }

    // DATETIME
    if let Some((start, end)) = request.datetime_range()? {
        info!("Received datetime: {} .. {}", start.to_rfc3339(), end.to_rfc3339());
        params.set(names.start_date.as_str(), format_date(&start, &config.date_format)?);
        params.set(names.end_date.as_str(), format_date(&end, &config.date_format)?);
    }

    // INTERSECTS: 上游一般不支持几何过滤，用外包框代替，结果再做二次过滤
    if let Some(geometry) = &request.intersects {
        let bounds = geometry.bounds().ok_or_else(|| {
            ProviderError::validation("intersects geometry has no coordinates")
        })?;
        info!("Received geometry from intersects with bounds: {:?}", bounds);
        params.set(names.bbox.as_str(), join_bbox(&bounds));
    }

    // COLLECTIONS
    if !request.collections.is_empty() {
        info!(
            "Received collections {:?}; collections are not forwarded upstream",
            request.collections
        );
    }

    // IDS
    if !request.feature_ids.is_empty() {
        info!("Received ids of length: {}", request.feature_ids.len());
        params.set(names.ids.as_str(), request.feature_ids.clone());
    }

    // FILTER
    if let Some(filter) = &request.filter {
        info!("Received CQL filter");
        for (key, value) in cql2_to_query_params(filter)? {
            params.set(key, ParamValue::from_json(&value));
        }
    }

    // FIELDS
    if let Some(fields) = request.fields.as_ref().filter(|f| !f.is_empty()) {
        let (include, exclude) = fields.split();
        info!("Received fields: include={:?} exclude={:?}", include, exclude);
        if !exclude.is_empty() {
            params.set(names.exclude_fields.as_str(), exclude);
        }
    }

    // SORTBY
    if let Some(sort) = request.sortby.as_ref().and_then(|s| s.first()) {
        info!("Received sortby: {} {}", sort.field, sort.direction.as_str());
        params.set(names.sort.as_str(), sort.direction.as_str());
    }

    // METHOD
    if queryables.contains(&names.method) {
        debug!("Forwarding method: {}", request.method);
        params.set(names.method.as_str(), request.method.to_string());
    }

    // PAGINATION
    if queryables.contains(&names.page) {
        params.set(names.page.as_str(), page.page.to_string());
    }
    if queryables.contains(&names.page_size) {
        params.set(names.page_size.as_str(), page.page_size.to_string());
    }

    Ok(params)
}

fn join_bbox(bbox: &[f64; 4]) -> String {
    bbox.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
