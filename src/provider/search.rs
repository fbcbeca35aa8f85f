//! Search request / response model
//!
//! `POST /search` 的请求体与响应体。所有字段均可选，缺省时等价于
//! "不加限制" 的查询。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::features::{Feature, FeatureCollection};
use super::geometry::Geometry;
use super::pagination::PageToken;
use crate::config::HttpMethod;
use crate::errors::{ProviderError, Result};

/// Sort direction of a `sortby` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// `sortby` may be a single object or a list of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    One(SortBy),
    Many(Vec<SortBy>),
}

impl SortSpec {
    pub fn first(&self) -> Option<&SortBy> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(list) => list.first(),
        }
    }
}

/// Field selection: `["+name", "-other"]` or `{include: [...], exclude: [...]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldsSpec {
    Prefixed(Vec<String>),
    Split {
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl FieldsSpec {
    /// Split into `(include, exclude)` with the `+`/`-` prefixes removed
    ///
    /// Un-prefixed names in the list form count as includes.
    pub fn split(&self) -> (Vec<String>, Vec<String>) {
        match self {
            Self::Prefixed(fields) => {
                let mut include = Vec::new();
                let mut exclude = Vec::new();
                for field in fields {
                    if let Some(name) = field.strip_prefix('-') {
                        exclude.push(name.to_string());
                    } else {
                        include.push(field.trim_start_matches('+').to_string());
                    }
                }
                (include, exclude)
            }
            Self::Split { include, exclude } => (include.clone(), exclude.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Prefixed(fields) => fields.is_empty(),
            Self::Split { include, exclude } => include.is_empty() && exclude.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Pagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// Body of `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchRequest {
    /// `[minx, miny, maxx, maxy]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    /// `[start, end]`, RFC3339
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<Vec<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersects: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<String>,
    #[serde(default, alias = "ids", skip_serializing_if = "Vec::is_empty")]
    pub feature_ids: Vec<String>,
    /// CQL2 JSON expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldsSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sortby: Option<SortSpec>,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub provider_properties: BTreeMap<String, Value>,
}

impl SearchRequest {
    /// Reject malformed spatial and temporal windows
    pub fn validate(&self) -> Result<()> {
        if let Some(bbox) = self.bbox.as_deref() {
            self.checked_bbox(bbox)?;
        }

        if let Some(range) = self.datetime.as_deref() {
            if range.len() != 2 {
                return Err(ProviderError::validation(format!(
                    "datetime must be [start, end], got {} value(s)",
                    range.len()
                )));
            }
            if range[0] > range[1] {
                return Err(ProviderError::validation(format!(
                    "datetime start {} is after end {}",
                    range[0].to_rfc3339(),
                    range[1].to_rfc3339()
                )));
            }
        }

        Ok(())
    }

    /// Validated `bbox` as a fixed-size array
    pub fn bbox_array(&self) -> Result<Option<[f64; 4]>> {
        self.bbox
            .as_deref()
            .map(|b| self.checked_bbox(b))
            .transpose()
    }

    /// Validated `[start, end]` interval
    pub fn datetime_range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        self.validate()?;
        Ok(self.datetime.as_deref().map(|r| (r[0], r[1])))
    }

    fn checked_bbox(&self, bbox: &[f64]) -> Result<[f64; 4]> {
        let [minx, miny, maxx, maxy] = <[f64; 4]>::try_from(bbox).map_err(|_| {
            ProviderError::validation(format!(
                "bbox must have 4 values [minx, miny, maxx, maxy], got {}",
                bbox.len()
            ))
        })?;
        if bbox.iter().any(|v| !v.is_finite()) {
            return Err(ProviderError::validation("bbox contains non-finite values"));
        }
        if minx > maxx || miny > maxy {
            return Err(ProviderError::validation(format!(
                "bbox is inverted: {:?}",
                bbox
            )));
        }
        Ok([minx, miny, maxx, maxy])
    }
}

/// Body returned by `POST /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub collection: FeatureCollection,
    /// Token for the following page
    pub pagination: PageToken,
}

impl SearchResponse {
    pub fn new(features: Vec<Feature>, pagination: PageToken) -> Self {
        Self {
            collection: FeatureCollection::new(features),
            pagination,
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.collection.features
    }
}
