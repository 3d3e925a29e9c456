//! Reference lines.
//!
//! Ribs are positioned along, rotated against and trimmed at named lines:
//! the leading edge, the trailing edge or the midplane line of a spar.
//! Line parameters are normalized arclength in `[0, 1]`.

use super::cs_structure::CsStructure;
use super::definition::LineRef;
use crate::curve::Wire;
use crate::error::Result;
use crate::math::{Point3, Vector3};

impl CsStructure {
    /// The line behind `line`, in wing coordinates.
    pub fn resolve_line(&self, line: &LineRef) -> Result<Wire> {
        match line {
            LineRef::LeadingEdge => self.reference().leading_edge_line(),
            LineRef::TrailingEdge => self.reference().trailing_edge_line(),
            LineRef::Spar(uid) => Ok(self.segment(uid)?.auxiliary(self)?.midplane_line.clone()),
        }
    }

    pub fn resolve_length(&self, line: &LineRef) -> Result<f64> {
        Ok(self.resolve_line(line)?.length())
    }

    /// Point at parameter `eta` on `line`.
    pub fn reference_point(&self, line: &LineRef, eta: f64) -> Result<Point3> {
        match line {
            LineRef::LeadingEdge => self.reference().leading_edge_point(eta),
            LineRef::TrailingEdge => self.reference().trailing_edge_point(eta),
            LineRef::Spar(_) => Ok(self.resolve_line(line)?.point_at(eta)),
        }
    }

    /// Unit tangent of `line` where it passes closest to `point`.
    pub fn line_direction(&self, line: &LineRef, point: &Point3) -> Result<Vector3> {
        let wire = self.resolve_line(line)?;
        Ok(wire.tangent_at(wire.project(point)))
    }
}
