//! Wire paths and coordinate mapping.
//!
//! A [`Path`] is an ordered polyline of at least two waypoints in the
//! logical frame. Progress along a path is *parametric*: each of the
//! `n - 1` spans between waypoints is an equal fraction of the total,
//! regardless of its physical length.
//!
//! The presentation layer owns the real layout. Whenever its anchors move
//! it hands the core new waypoint lists; [`route_wire`] is the default
//! router that turns two anchors into an elbow-shaped wire.

use serde::{Deserialize, Serialize};

use galvanic_types::Point;

/// Alignment tolerance for [`route_wire`], in logical units.
const ALIGN_EPSILON: f64 = 1e-9;

/// Errors that can occur when building geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// A path needs at least two waypoints.
    #[error("a path needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints supplied.
        count: usize,
    },

    /// A waypoint had a NaN or infinite coordinate.
    #[error("waypoint {index} is not finite")]
    NonFinite {
        /// Index of the offending waypoint.
        index: usize,
    },

    /// A viewport dimension was zero, negative, or not finite.
    #[error("viewport dimensions must be positive and finite")]
    EmptyViewport,
}

// ---------------------------------------------------------------------------
// Path
// ---------------------------------------------------------------------------

/// An ordered polyline with at least two finite waypoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Path {
    waypoints: Vec<Point>,
}

impl Path {
    /// Build a path from its waypoints.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewWaypoints`] for fewer than two points
    /// and [`GeometryError::NonFinite`] for NaN or infinite coordinates.
    pub fn new(waypoints: Vec<Point>) -> Result<Self, GeometryError> {
        if waypoints.len() < 2 {
            return Err(GeometryError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }
        if let Some(index) = waypoints.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite { index });
        }
        Ok(Self { waypoints })
    }

    /// The waypoints in order.
    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }

    /// Number of spans between waypoints (`n - 1`), saturating at `u32::MAX`.
    pub fn span_count(&self) -> u32 {
        u32::try_from(self.waypoints.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// The first waypoint.
    pub fn start(&self) -> Point {
        self.waypoints.first().copied().unwrap_or_default()
    }

    /// The last waypoint.
    pub fn end(&self) -> Point {
        self.waypoints.last().copied().unwrap_or_default()
    }

    /// Position at parametric progress `t`.
    ///
    /// `t <= 0` (or NaN) gives the first waypoint and `t >= 1` the last.
    /// Otherwise `t` selects span `floor(t * (n - 1))` and interpolates
    /// linearly within it.
    pub fn point_at_progress(&self, t: f64) -> Point {
        if t.is_nan() || t <= 0.0 {
            return self.start();
        }
        if t >= 1.0 {
            return self.end();
        }

        let scaled = t * f64::from(self.span_count());
        let span = scaled.floor();
        let local = scaled - span;

        // 0 <= span < span_count, so the cast cannot truncate or wrap.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = span as usize;

        match (
            self.waypoints.get(index),
            self.waypoints.get(index.saturating_add(1)),
        ) {
            (Some(a), Some(b)) => a.lerp(*b, local),
            _ => self.end(),
        }
    }

    /// Progress of the sampled position nearest to `point`, never below
    /// `current`.
    ///
    /// `samples` candidates are spread uniformly over `[0, 1]`; the one with
    /// the smallest Euclidean distance wins (earliest on ties). The result is
    /// `max(current, best)` clamped to `[0, 1]`, which enforces one-way
    /// travel at the geometry layer.
    pub fn nearest_progress(&self, point: Point, current: f64, samples: u32) -> f64 {
        let samples = samples.max(2);
        let last = f64::from(samples.saturating_sub(1));

        let mut best_t = 0.0;
        let mut best_distance = f64::INFINITY;
        for i in 0..samples {
            let t = f64::from(i) / last;
            let distance = self.point_at_progress(t).distance(point);
            if distance < best_distance {
                best_distance = distance;
                best_t = t;
            }
        }

        best_t.max(current).clamp(0.0, 1.0)
    }
}

impl TryFrom<Vec<Point>> for Path {
    type Error = GeometryError;

    fn try_from(waypoints: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(waypoints)
    }
}

impl From<Path> for Vec<Point> {
    fn from(path: Path) -> Self {
        path.waypoints
    }
}

/// The two wire paths of the circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePaths {
    /// Anode electrode to battery.
    pub anode: Path,
    /// Battery to cathode.
    pub cathode: Path,
}

impl WirePaths {
    /// Position of the current-flow indicator at scalar `s` in `[0, 1]`.
    ///
    /// `s` runs across the anode wire and then the cathode wire. Each wire's
    /// share is weighted by its span count as a proxy for length.
    pub fn position_along(&self, s: f64) -> Point {
        let anode_spans = f64::from(self.anode.span_count());
        let cathode_spans = f64::from(self.cathode.span_count());
        let total = anode_spans + cathode_spans;

        let target = s.clamp(0.0, 1.0) * total;
        if target <= anode_spans {
            self.anode.point_at_progress(target / anode_spans)
        } else {
            self.cathode
                .point_at_progress((target - anode_spans) / cathode_spans)
        }
    }
}

/// Route a wire between two anchors as an elbow.
///
/// The wire leaves `from` vertically, turns once at `(from.x, to.y)`, and
/// runs horizontally into `to`. Anchors already aligned on either axis get a
/// straight two-point wire.
pub fn route_wire(from: Point, to: Point) -> Result<Path, GeometryError> {
    let aligned =
        (from.x - to.x).abs() < ALIGN_EPSILON || (from.y - to.y).abs() < ALIGN_EPSILON;
    if aligned {
        Path::new(vec![from, to])
    } else {
        Path::new(vec![from, Point::new(from.x, to.y), to])
    }
}

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Maps device-pixel coordinates into the logical frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    device_width: f64,
    device_height: f64,
    logical_width: f64,
    logical_height: f64,
}

impl Viewport {
    /// Create a viewport for a device surface and a logical frame.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::EmptyViewport`] if any dimension is not a
    /// positive finite number.
    pub fn new(
        device_width: f64,
        device_height: f64,
        logical_width: f64,
        logical_height: f64,
    ) -> Result<Self, GeometryError> {
        let dims = [device_width, device_height, logical_width, logical_height];
        if dims.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(GeometryError::EmptyViewport);
        }
        Ok(Self {
            device_width,
            device_height,
            logical_width,
            logical_height,
        })
    }

    /// Convert a device-pixel position to logical coordinates.
    pub fn to_logical(&self, pixel: Point) -> Point {
        Point::new(
            pixel.x / self.device_width * self.logical_width,
            pixel.y / self.device_height * self.logical_height,
        )
    }

    /// Convert a logical position back to device pixels.
    pub fn to_device(&self, logical: Point) -> Point {
        Point::new(
            logical.x / self.logical_width * self.device_width,
            logical.y / self.logical_height * self.device_height,
        )
    }
}
