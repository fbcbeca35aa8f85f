//! Simulated spatio-temporal point process
//!
//! 在请求窗口内生成齐次泊松点过程，用于在没有上游 API 时联调和演示。
//! 相同的种子和窗口总是得到相同的结果，分页因此是稳定的。

use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, RngExt, SeedableRng};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::cql::cql2_to_query_params;
use super::features::Feature;
use super::geometry::Geometry;
use super::pagination;
use super::queryables::{Property, Queryables};
use super::search::{SearchRequest, SearchResponse};
use super::FeatureProvider;
use crate::config::SimulationConfig;
use crate::errors::{ProviderError, Result};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Space-time window a realization is drawn in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub bbox: [f64; 4],
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Area in square degrees
    pub fn area(&self) -> f64 {
        let [minx, miny, maxx, maxy] = self.bbox;
        (maxx - minx) * (maxy - miny)
    }

    pub fn days(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
    }

    fn seed_with(&self, base: u64) -> u64 {
        let mut h = base;
        for v in self.bbox {
            h = mix(h ^ v.to_bits());
        }
        h = mix(h ^ self.start.timestamp_millis() as u64);
        mix(h ^ self.end.timestamp_millis() as u64)
    }
}

/// splitmix64 finalizer
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub struct SimulatedProvider {
    config: SimulationConfig,
    max_page_size: u32,
    queryables: Queryables,
}

impl SimulatedProvider {
    pub fn new(config: SimulationConfig, max_page_size: u32) -> Self {
        let mut queryables = Queryables::default();
        queryables.insert("intensity", Property::new("intensity", "number"));
        info!(
            "Simulated provider: intensity {} pts/deg²/day, seed {}, max {} points",
            config.intensity, config.seed, config.max_points
        );
        Self {
            config,
            max_page_size,
            queryables,
        }
    }

    /// Resolve the sampling window from the request
    ///
    /// `intersects` bounds win over `bbox`, which wins over the configured
    /// default. Without `datetime` the range is the last `default_days` days
    /// ending at the start of the current UTC hour, so repeated searches
    /// within the hour sample the same window.
    pub fn window(&self, request: &SearchRequest, now: DateTime<Utc>) -> Result<Window> {
        let bbox = match &request.intersects {
            Some(g) => g
                .bounds()
                .ok_or_else(|| ProviderError::validation("intersects geometry has no coordinates"))?,
            None => request.bbox_array()?.unwrap_or(self.config.default_bbox),
        };

        let (start, end) = match request.datetime_range()? {
            Some(range) => range,
            None => self.default_range(now)?,
        };

        Ok(Window { bbox, start, end })
    }

    fn default_range(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let end = now
            .duration_trunc(Duration::hours(1))
            .map_err(|e| ProviderError::internal(format!("cannot truncate {}: {}", now, e)))?;
        let start = Duration::try_days(i64::from(self.config.default_days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                ProviderError::config(format!(
                    "simulation.default_days is out of range: {}",
                    self.config.default_days
                ))
            })?;
        Ok((start, end))
    }

    /// `intensity = <number>` in the CQL filter overrides the configured one
    fn intensity(&self, request: &SearchRequest) -> Result<f64> {
        let Some(filter) = &request.filter else {
            return Ok(self.config.intensity);
        };
        match cql2_to_query_params(filter)?.get("intensity") {
            None => Ok(self.config.intensity),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
                _ => Err(ProviderError::validation(format!("invalid intensity: {}", n))),
            },
            Some(other) => Err(ProviderError::validation(format!(
                "intensity must be a number, got {}",
                other
            ))),
        }
    }

    /// Draw one realization of the process, sorted by time
    pub fn realize(&self, window: &Window, intensity: f64, clip: Option<&Geometry>) -> Vec<Feature> {
        let mut rng = StdRng::seed_from_u64(window.seed_with(self.config.seed));
        let expected = intensity * window.area() * window.days();
        let count = poisson(&mut rng, expected, self.config.max_points);
        debug!("Expected {:.2} points, drew {}", expected, count);

        let [minx, miny, maxx, maxy] = window.bbox;
        let span_ms = (window.end - window.start).num_milliseconds().max(0);

        let mut points: Vec<(f64, f64, DateTime<Utc>)> = (0..count)
            .map(|_| {
                let x = rng.random_range(minx..=maxx);
                let y = rng.random_range(miny..=maxy);
                let offset = rng.random_range(0..=span_ms);
                (x, y, window.start + Duration::milliseconds(offset))
            })
            .filter(|(x, y, _)| clip.is_none_or(|g| g.contains_point(*x, *y)))
            .collect();

        points.sort_by_key(|(_, _, t)| *t);

        points
            .into_iter()
            .enumerate()
            .map(|(i, (x, y, t))| {
                let mut feature = Feature::new(Some(format!("sim-{}", i)), Geometry::point(x, y)).with_datetime(t);
                feature.properties.insert("intensity".to_string(), json!(intensity));
                feature
            })
            .collect()
    }
}

/// Poisson(λ) by counting unit-rate arrivals in [0, 1], capped at `cap`
///
/// An overflowed (infinite) λ saturates at `cap`.
fn poisson<R: Rng>(rng: &mut R, lambda: f64, cap: usize) -> usize {
    if lambda == f64::INFINITY {
        return cap;
    }
    if lambda.is_nan() || lambda <= 0.0 {
        return 0;
    }
    let mut t = 0.0;
    let mut n = 0;
    while n < cap {
        let u = rng.random_range(0.0f64..1.0);
        t += -(1.0 - u).ln() / lambda;
        if t > 1.0 {
            break;
        }
        n += 1;
    }
    n
}

#[async_trait]
impl FeatureProvider for SimulatedProvider {
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        request.validate()?;

        let page = pagination::resolve(request.limit, request.pagination.as_ref(), self.max_page_size);
        let window = self.window(&request, Utc::now())?;
        let intensity = self.intensity(&request)?;
        let clip = request.intersects.as_ref().filter(|g| g.is_polygonal());

        let mut features = self.realize(&window, intensity, clip);
        if !request.feature_ids.is_empty() {
            features.retain(|f| f.id.as_ref().is_some_and(|id| request.feature_ids.contains(id)));
        }

        let total = features.len();
        let page_features: Vec<Feature> = features
            .into_iter()
            .skip(page.offset())
            .take(page.page_size as usize)
            .collect();
        info!(
            "Simulated {} points, returning {} (page {})",
            total,
            page_features.len(),
            page.page
        );

        Ok(SearchResponse::new(page_features, page.next()))
    }

    fn queryables(&self) -> &Queryables {
        &self.queryables
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
