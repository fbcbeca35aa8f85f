//! GeoJSON geometry model
//!
//! Enough of RFC 7946 to accept `intersects` geometries from search requests
//! and to emit point features.

use serde::{Deserialize, Serialize};

/// `[x, y]` or `[x, y, z]`
pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: vec![lon, lat],
        }
    }

    /// `[minx, miny, maxx, maxy]` over every position, `None` when empty
    pub fn bounds(&self) -> Option<[f64; 4]> {
        let mut acc: Option<[f64; 4]> = None;
        self.visit_positions(&mut |x, y| {
            acc = Some(match acc {
                None => [x, y, x, y],
                Some([minx, miny, maxx, maxy]) => [minx.min(x), miny.min(y), maxx.max(x), maxy.max(y)],
            });
        });
        acc
    }

    /// True for geometries that enclose an area
    pub fn is_polygonal(&self) -> bool {
        match self {
            Geometry::Polygon { .. } | Geometry::MultiPolygon { .. } => true,
            Geometry::GeometryCollection { geometries } => geometries.iter().any(Geometry::is_polygonal),
            _ => false,
        }
    }

    /// Point-in-polygon test (even-odd rule, holes excluded)
    ///
    /// Non-polygonal geometries contain nothing.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        match self {
            Geometry::Polygon { coordinates } => polygon_contains(coordinates, x, y),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().any(|poly| polygon_contains(poly, x, y))
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().any(|g| g.contains_point(x, y))
            }
            _ => false,
        }
    }

    /// First two ordinates of a `Point`
    pub fn as_point(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point { coordinates } if coordinates.len() >= 2 => {
                Some((coordinates[0], coordinates[1]))
            }
            _ => None,
        }
    }

    fn visit_positions(&self, f: &mut dyn FnMut(f64, f64)) {
        let mut visit = |p: &Position| {
            if let [x, y, ..] = p.as_slice() {
                f(*x, *y);
            }
        };
        match self {
            Geometry::Point { coordinates } => visit(coordinates),
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.iter().for_each(visit)
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().for_each(visit)
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().for_each(visit)
            }
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    g.visit_positions(&mut *f);
                }
            }
        }
    }
}

fn polygon_contains(rings: &[Vec<Position>], x: f64, y: f64) -> bool {
    // 外环与内环一起做奇偶判定，洞内的点自然被排除
    rings.iter().filter(|ring| ring_crosses(ring, x, y)).count() % 2 == 1
}

fn ring_crosses(ring: &[Position], x: f64, y: f64) -> bool {
    let pts: Vec<(f64, f64)> = ring
        .iter()
        .filter_map(|p| match p.as_slice() {
            [px, py, ..] => Some((*px, *py)),
            _ => None,
        })
        .collect();
    if pts.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = pts.len() - 1;
    for i in 0..pts.len() {
        let (xi, yi) = pts[i];
        let (xj, yj) = pts[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
