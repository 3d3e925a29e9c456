//! A wing described by straight-lofted sections.
//!
//! Each section places the shared profile at its leading edge point, scaled
//! by chord along +x and by `thickness * chord` along +z. Between two
//! sections the wing is ruled, so leading and trailing edges are polylines
//! and the midplane of a segment is the bilinear patch spanned by the
//! bounding chord lines.
//!
//! Span coordinate eta runs along the leading edge projected onto the y-z
//! plane, normalized to `[0, 1]` over the whole wing.

use std::collections::HashSet;
use std::sync::Arc;

use nalgebra::{Matrix2, Vector2};
use tracing::debug;

use super::{CapSide, WingStructureReference};
use crate::cache::Cache;
use crate::curve::Wire;
use crate::error::{EntityKind, Error, GeometryContext, Result};
use crate::math::{lerp, x_axis, Matrix4, Point2, Point3, Vector3, TOLERANCE};
use crate::ops::{loft_faces, make_face};
use crate::topo::{Face, Shape};

/// One wing section.
#[derive(Clone, Debug, PartialEq)]
pub struct WingSection {
    pub element_uid: String,
    pub leading_edge: Point3,
    pub chord: f64,
    /// Profile height relative to chord.
    pub thickness: f64,
}

impl WingSection {
    pub fn new(element_uid: impl Into<String>, leading_edge: Point3, chord: f64, thickness: f64) -> Self {
        Self { element_uid: element_uid.into(), leading_edge, chord, thickness }
    }

    fn trailing_edge(&self) -> Point3 {
        self.leading_edge + x_axis() * self.chord
    }

    fn chord_point(&self, xsi: f64) -> Point3 {
        lerp(&self.leading_edge, &self.trailing_edge(), xsi)
    }
}

/// Symmetric hexagon: leading edge at vertex 0, trailing edge at vertex 3,
/// upper side first.
fn default_profile() -> Vec<Point2> {
    vec![
        Point2::new(0.0, 0.0),
        Point2::new(0.1, 0.5),
        Point2::new(0.9, 0.5),
        Point2::new(1.0, 0.0),
        Point2::new(0.9, -0.5),
        Point2::new(0.1, -0.5),
    ]
}

struct WingGeometry {
    loft: Arc<Shape>,
    upper: Arc<Shape>,
    lower: Arc<Shape>,
    section_faces: Vec<Face>,
}

pub struct SectionedWing {
    uid: String,
    sections: Vec<WingSection>,
    profile: Vec<Point2>,
    trailing_index: usize,
    /// Projected span length at every section.
    span: Vec<f64>,
    transformation: Matrix4,
    geometry: Cache<WingGeometry>,
}

impl SectionedWing {
    pub fn new(uid: impl Into<String>, sections: Vec<WingSection>) -> Result<Self> {
        let uid = uid.into();
        if sections.len() < 2 {
            return Err(Error::config(&uid, "a wing needs at least two sections"));
        }
        let mut seen = HashSet::new();
        for s in &sections {
            if !seen.insert(s.element_uid.as_str()) {
                return Err(Error::config(&uid, format!("duplicate section element \"{}\"", s.element_uid)));
            }
            if s.chord <= TOLERANCE || s.thickness <= 0.0 {
                return Err(Error::config(&uid, format!("section \"{}\" has no extent", s.element_uid)));
            }
        }

        let mut span = vec![0.0];
        for w in sections.windows(2) {
            let d = w[1].leading_edge - w[0].leading_edge;
            let len = (d.y * d.y + d.z * d.z).sqrt();
            if len < TOLERANCE {
                let reason = format!("sections \"{}\" and \"{}\" coincide in span", w[0].element_uid, w[1].element_uid);
                return Err(Error::config(&uid, reason));
            }
            span.push(span[span.len() - 1] + len);
        }

        Ok(Self {
            uid,
            sections,
            profile: default_profile(),
            trailing_index: 3,
            span,
            transformation: Matrix4::identity(),
            geometry: Cache::new(),
        })
    }

    /// Replace the profile. The first vertex must be the leading edge; the
    /// vertex with the largest x is taken as trailing edge.
    pub fn with_profile(mut self, profile: Vec<Point2>) -> Result<Self> {
        if profile.len() < 3 {
            return Err(Error::config(&self.uid, "profile needs at least three points"));
        }
        let trailing = (0..profile.len())
            .max_by(|&a, &b| profile[a].x.total_cmp(&profile[b].x))
            .unwrap_or(0);
        if trailing == 0 || profile.iter().any(|p| p.x < profile[0].x) {
            return Err(Error::config(&self.uid, "profile must start at its leading edge"));
        }
        self.profile = profile;
        self.trailing_index = trailing;
        self.geometry.invalidate();
        Ok(self)
    }

    pub fn with_transformation(mut self, transformation: Matrix4) -> Self {
        self.transformation = transformation;
        self
    }

    pub fn sections(&self) -> &[WingSection] {
        &self.sections
    }

    fn total_span(&self) -> f64 {
        self.span[self.span.len() - 1]
    }

    fn segment_count(&self) -> usize {
        self.sections.len() - 1
    }

    /// Segment index and local span parameter; extrapolates past the ends.
    fn locate(&self, eta: f64) -> (usize, f64) {
        let s = eta * self.total_span();
        let k = (0..self.segment_count())
            .rev()
            .find(|&k| self.span[k] <= s)
            .unwrap_or(0);
        (k, self.local(k, s))
    }

    fn local(&self, k: usize, s: f64) -> f64 {
        (s - self.span[k]) / (self.span[k + 1] - self.span[k])
    }

    fn segment_point(&self, k: usize, t: f64, xsi: f64) -> Point3 {
        let (inner, outer) = (&self.sections[k], &self.sections[k + 1]);
        let le = lerp(&inner.leading_edge, &outer.leading_edge, t);
        let te = lerp(&inner.trailing_edge(), &outer.trailing_edge(), t);
        lerp(&le, &te, xsi)
    }

    /// Least-squares (t, xsi) of `p` on the bilinear patch of segment `k`.
    fn invert_segment(&self, k: usize, p: &Point3) -> (f64, f64, f64) {
        let (inner, outer) = (&self.sections[k], &self.sections[k + 1]);
        let dl = outer.leading_edge - inner.leading_edge;
        let dt = outer.trailing_edge() - inner.trailing_edge();
        let mut uv = Vector2::new(0.5, 0.5);
        for _ in 0..30 {
            let (t, x) = (uv.x, uv.y);
            let r = self.segment_point(k, t, x) - p;
            let jt: Vector3 = dl * (1.0 - x) + dt * x;
            let jx: Vector3 = self.segment_point(k, t, 1.0) - self.segment_point(k, t, 0.0);
            let jtj = Matrix2::new(jt.dot(&jt), jt.dot(&jx), jx.dot(&jt), jx.dot(&jx));
            let Some(inv) = jtj.try_inverse() else { break };
            let step = inv * Vector2::new(jt.dot(&r), jx.dot(&r));
            uv -= step;
            if step.norm() < 1e-15 {
                break;
            }
        }
        let residual = (self.segment_point(k, uv.x, uv.y) - p).norm();
        (uv.x, uv.y, residual)
    }

    fn section_index(&self, uid: &str) -> Result<usize> {
        self.sections
            .iter()
            .position(|s| s.element_uid == uid)
            .ok_or_else(|| Error::not_found(EntityKind::SectionElement, uid))
    }

    fn profile_points(&self, section: &WingSection) -> Vec<Point3> {
        self.profile
            .iter()
            .map(|p| {
                section.leading_edge + Vector3::new(p.x * section.chord, 0.0, p.y * section.thickness * section.chord)
            })
            .collect()
    }

    fn geometry(&self) -> Result<Arc<WingGeometry>> {
        self.geometry.get_or_try_init(|| {
            debug!(uid = %self.uid, sections = self.sections.len(), "lofting wing");
            let profiles: Vec<Vec<Point3>> = self.sections.iter().map(|s| self.profile_points(s)).collect();
            let n = self.profile.len();
            let upper = loft_faces(&profiles, 0..self.trailing_index).in_entity(&self.uid)?;
            let lower = loft_faces(&profiles, self.trailing_index..n).in_entity(&self.uid)?;

            let section_faces = profiles
                .iter()
                .map(|pts| {
                    let wire = Wire::new(pts.iter().copied())
                        .ok_or_else(|| Error::geometry(&self.uid, "degenerate profile"))?;
                    make_face(&wire.closed()).in_entity(&self.uid)
                })
                .collect::<Result<Vec<Face>>>()?;

            let mut loft = Shape::from_faces(upper.clone());
            loft.faces.extend(lower.iter().cloned());
            loft.add_face(section_faces[0].clone());
            loft.add_face(section_faces[section_faces.len() - 1].clone());

            Ok(WingGeometry {
                loft: Arc::new(loft),
                upper: Arc::new(Shape::from_faces(upper)),
                lower: Arc::new(Shape::from_faces(lower)),
                section_faces,
            })
        })
    }

    fn edge_line(&self, xsi: f64) -> Result<Wire> {
        Wire::new(self.sections.iter().map(|s| s.chord_point(xsi)))
            .ok_or_else(|| Error::geometry(&self.uid, "degenerate edge line"))
    }
}

impl WingStructureReference for SectionedWing {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn point(&self, eta: f64, xsi: f64) -> Result<Point3> {
        let (k, t) = self.locate(eta);
        Ok(self.segment_point(k, t, xsi))
    }

    fn eta_xsi_local(&self, point: &Point3) -> Result<(f64, f64)> {
        let last = self.segment_count() - 1;
        let solutions: Vec<(usize, f64, f64, f64)> = (0..=last)
            .map(|k| {
                let (t, x, r) = self.invert_segment(k, point);
                (k, t, x, r)
            })
            .collect();
        let inside = solutions
            .iter()
            .filter(|(_, t, _, _)| (-1e-9..=1.0 + 1e-9).contains(t))
            .min_by(|a, b| a.3.total_cmp(&b.3));
        let (k, t, xsi, _) = match inside {
            Some(s) => *s,
            None if solutions[0].1 < 0.0 => solutions[0],
            None => solutions[last],
        };
        let s = self.span[k] + t * (self.span[k + 1] - self.span[k]);
        Ok((s / self.total_span(), xsi))
    }

    fn midplane_eta_dir(&self, eta: f64) -> Result<Vector3> {
        let (k, _) = self.locate(eta);
        (self.sections[k + 1].leading_edge - self.sections[k].leading_edge)
            .try_normalize(TOLERANCE)
            .ok_or_else(|| Error::geometry(&self.uid, format!("leading edge has no span direction at eta {eta}")))
    }

    fn leading_edge_line(&self) -> Result<Wire> {
        self.edge_line(0.0)
    }

    fn trailing_edge_line(&self) -> Result<Wire> {
        self.edge_line(1.0)
    }

    fn loft(&self) -> Result<Arc<Shape>> {
        Ok(Arc::clone(&self.geometry()?.loft))
    }

    fn upper_shape(&self) -> Result<Arc<Shape>> {
        Ok(Arc::clone(&self.geometry()?.upper))
    }

    fn lower_shape(&self) -> Result<Arc<Shape>> {
        Ok(Arc::clone(&self.geometry()?.lower))
    }

    fn inner_face(&self) -> Result<Face> {
        Ok(self.geometry()?.section_faces[0].clone())
    }

    fn outer_face(&self) -> Result<Face> {
        let g = self.geometry()?;
        Ok(g.section_faces[g.section_faces.len() - 1].clone())
    }

    fn section_element_face(&self, uid: &str) -> Result<Face> {
        let i = self.section_index(uid)?;
        Ok(self.geometry()?.section_faces[i].clone())
    }

    fn section_element_chord_point(&self, uid: &str, xsi: f64) -> Result<Point3> {
        let i = self.section_index(uid)?;
        Ok(self.sections[i].chord_point(xsi))
    }

    fn section_element_at(&self, point: &Point3) -> Result<Option<String>> {
        let (eta, _) = self.eta_xsi_local(point)?;
        let s = eta * self.total_span();
        Ok(self
            .span
            .iter()
            .position(|&si| (si - s).abs() < TOLERANCE)
            .map(|i| self.sections[i].element_uid.clone()))
    }

    fn transformation(&self) -> Matrix4 {
        self.transformation
    }
}
