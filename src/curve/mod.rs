//! Polyline curves.
//!
//! A `Wire` is an ordered chain of straight segments. All curve parameters
//! exposed here are *normalized arclength*: 0 at the first point, 1 at the
//! last, proportional to distance travelled along the chain.

use crate::math::{lerp, transform_point, Matrix4, Point3, Vector3, TOLERANCE};
use crate::topo::Edge;

/// An ordered polyline with at least two distinct points.
#[derive(Clone, Debug, PartialEq)]
pub struct Wire {
    points: Vec<Point3>,
}

impl Wire {
    /// Build a wire, dropping consecutive coincident points.
    ///
    /// Returns `None` when fewer than two distinct points remain.
    pub fn new(points: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut kept: Vec<Point3> = Vec::new();
        for p in points {
            if kept.last().map_or(true, |q| (p - q).norm() >= TOLERANCE) {
                kept.push(p);
            }
        }
        (kept.len() >= 2).then_some(Self { points: kept })
    }

    pub fn segment(a: Point3, b: Point3) -> Option<Self> {
        Self::new([a, b])
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn start(&self) -> Point3 {
        self.points[0]
    }

    pub fn end(&self) -> Point3 {
        self.points[self.points.len() - 1]
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.points.windows(2).map(|w| Edge::new(w[0], w[1]))
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && (self.start() - self.end()).norm() < TOLERANCE
    }

    /// Arclength at every vertex.
    fn cumulative(&self) -> Vec<f64> {
        let mut acc = Vec::with_capacity(self.points.len());
        let mut s = 0.0;
        acc.push(0.0);
        for w in self.points.windows(2) {
            s += (w[1] - w[0]).norm();
            acc.push(s);
        }
        acc
    }

    /// Normalized arclength of every vertex.
    pub fn parameters(&self) -> Vec<f64> {
        let acc = self.cumulative();
        let total = acc[acc.len() - 1];
        acc.iter().map(|s| s / total).collect()
    }

    pub fn length(&self) -> f64 {
        self.edges().map(|e| e.length()).sum()
    }

    /// Segment index and local parameter for normalized parameter `t`.
    fn locate(&self, t: f64) -> (usize, f64) {
        let acc = self.cumulative();
        let total = acc[acc.len() - 1];
        let s = t.clamp(0.0, 1.0) * total;
        let last = self.points.len() - 2;
        let i = acc[1..].iter().position(|&a| s < a).unwrap_or(last).min(last);
        let seg = acc[i + 1] - acc[i];
        let local = if seg > 0.0 { (s - acc[i]) / seg } else { 0.0 };
        (i, local)
    }

    /// Point at normalized arclength `t`, clamped to `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point3 {
        let (i, local) = self.locate(t);
        lerp(&self.points[i], &self.points[i + 1], local)
    }

    /// Unit tangent at normalized arclength `t`. At an interior vertex the
    /// outgoing segment wins.
    pub fn tangent_at(&self, t: f64) -> Vector3 {
        let (i, _) = self.locate(t);
        (self.points[i + 1] - self.points[i]).normalize()
    }

    /// Normalized parameter of the point on the wire closest to `p`.
    pub fn project(&self, p: &Point3) -> f64 {
        let acc = self.cumulative();
        let total = acc[acc.len() - 1];
        let mut best = (f64::INFINITY, 0.0);
        for (i, w) in self.points.windows(2).enumerate() {
            let d = w[1] - w[0];
            let local = ((p - w[0]).dot(&d) / d.norm_squared()).clamp(0.0, 1.0);
            let dist = (p - (w[0] + d * local)).norm();
            if dist < best.0 - TOLERANCE * 1e-3 {
                best = (dist, acc[i] + local * d.norm());
            }
        }
        best.1 / total
    }

    pub fn distance_to(&self, p: &Point3) -> f64 {
        (self.point_at(self.project(p)) - p).norm()
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Append the start point when the wire is open.
    pub fn closed(&self) -> Self {
        let mut points = self.points.clone();
        if !self.is_closed() {
            points.push(self.start());
        }
        Self { points }
    }

    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self { points: self.points.iter().map(|p| transform_point(m, p)).collect() }
    }
}
