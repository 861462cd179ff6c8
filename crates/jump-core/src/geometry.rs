use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A 2D point in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// An axis-aligned envelope in model coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min: Point,
    pub max: Point,
}

impl Envelope {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Point::new(x1.min(x2), y1.min(y2)),
            max: Point::new(x1.max(x2), y1.max(y2)),
        }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut env = Self::new(*first, *first);
        for p in rest {
            env.expand_to_include(p);
        }
        Some(env)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn expand_to_include(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn expand_by(&self, distance: f64) -> Self {
        Self::from_coords(
            self.min.x - distance,
            self.min.y - distance,
            self.max.x + distance,
            self.max.y + distance,
        )
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &Envelope) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// A feature geometry. Polygons carry their exterior ring only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    LineString(Vec<Point>),
    Polygon(Vec<Point>),
}

impl Geometry {
    pub fn envelope(&self) -> Option<Envelope> {
        match self {
            Geometry::Point(p) => Some(Envelope::new(*p, *p)),
            Geometry::LineString(points) | Geometry::Polygon(points) => {
                Envelope::from_points(points)
            }
        }
    }

    /// Every vertex of the geometry, in order.
    pub fn vertices(&self) -> &[Point] {
        match self {
            Geometry::Point(p) => std::slice::from_ref(p),
            Geometry::LineString(points) | Geometry::Polygon(points) => points,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let ok = match self {
            Geometry::Point(p) => p.x.is_finite() && p.y.is_finite(),
            Geometry::LineString(points) => points.len() >= 2,
            Geometry::Polygon(points) => points.len() >= 3,
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::InvalidGeometry(format!("{self:?}")))
        }
    }

    /// Length of a line string, or perimeter of a polygon.
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point(_) => 0.0,
            Geometry::LineString(points) => points
                .windows(2)
                .map(|w| w[0].distance_to(&w[1]))
                .sum(),
            Geometry::Polygon(points) => {
                let open: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
                match (points.first(), points.last()) {
                    (Some(a), Some(b)) => open + b.distance_to(a),
                    _ => open,
                }
            }
        }
    }
}
