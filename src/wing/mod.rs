//! Query façade over the outer geometry of a wing.
//!
//! Structural positioning never looks at sections, profiles or positioning
//! chains directly. It only asks a `WingStructureReference` for points in
//! (eta, xsi) coordinates, reference lines and the lofted outer shape.
//! All answers are in wing coordinates; `transformation` maps them to the
//! global frame.

pub mod sectioned;

pub use sectioned::{SectionedWing, WingSection};

use std::fmt;
use std::sync::Arc;

use crate::curve::Wire;
use crate::error::{Error, Result};
use crate::math::{Matrix4, Point3, Vector3, TOLERANCE};
use crate::topo::{Face, Shape};

/// Frame in which geometry is returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// Local wing coordinates, as used for all internal computations.
    #[default]
    Wing,
    /// Aircraft coordinates, after the wing transformation.
    Global,
}

/// Upper or lower skin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapSide {
    Upper,
    Lower,
}

impl fmt::Display for CapSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CapSide::Upper => "upper",
            CapSide::Lower => "lower",
        })
    }
}

pub trait WingStructureReference {
    fn uid(&self) -> &str;

    /// Midplane point at span coordinate `eta` and chord coordinate `xsi`.
    fn point(&self, eta: f64, xsi: f64) -> Result<Point3>;

    /// Inverse of `point`: the (eta, xsi) of the midplane point closest to `point`.
    fn eta_xsi_local(&self, point: &Point3) -> Result<(f64, f64)>;

    /// Spanwise tangent of the midplane at `eta`.
    fn midplane_eta_dir(&self, eta: f64) -> Result<Vector3>;

    /// Unit midplane normal at `eta`, pointing to the upper side.
    fn midplane_normal(&self, eta: f64) -> Result<Vector3> {
        let chord = self.point(eta, 1.0)? - self.point(eta, 0.0)?;
        let chord = chord
            .try_normalize(TOLERANCE)
            .ok_or_else(|| Error::geometry(self.uid(), format!("zero chord at eta {eta}")))?;
        let normal = chord.cross(&self.midplane_eta_dir(eta)?);
        normal
            .try_normalize(1e-12)
            .ok_or_else(|| Error::geometry(self.uid(), format!("degenerate midplane at eta {eta}")))
    }

    fn leading_edge_line(&self) -> Result<Wire>;

    fn trailing_edge_line(&self) -> Result<Wire>;

    fn leading_edge_point(&self, eta: f64) -> Result<Point3> {
        Ok(self.leading_edge_line()?.point_at(eta))
    }

    fn trailing_edge_point(&self, eta: f64) -> Result<Point3> {
        Ok(self.trailing_edge_line()?.point_at(eta))
    }

    /// Midplane curve between two midplane points.
    fn midplane_line(&self, start: &Point3, end: &Point3) -> Result<Wire> {
        Wire::segment(*start, *end)
            .ok_or_else(|| Error::geometry(self.uid(), "midplane line between coincident points"))
    }

    /// Outer shell of the wing.
    fn loft(&self) -> Result<Arc<Shape>>;

    fn upper_shape(&self) -> Result<Arc<Shape>>;

    fn lower_shape(&self) -> Result<Arc<Shape>>;

    fn skin(&self, side: CapSide) -> Result<Arc<Shape>> {
        match side {
            CapSide::Upper => self.upper_shape(),
            CapSide::Lower => self.lower_shape(),
        }
    }

    /// Closing face at eta = 0.
    fn inner_face(&self) -> Result<Face>;

    /// Closing face at eta = 1.
    fn outer_face(&self) -> Result<Face>;

    /// Profile face of a section element.
    fn section_element_face(&self, uid: &str) -> Result<Face>;

    /// Point on a section element's chord line.
    fn section_element_chord_point(&self, uid: &str, xsi: f64) -> Result<Point3>;

    /// UID of the section element `point` lies on, if any.
    fn section_element_at(&self, point: &Point3) -> Result<Option<String>>;

    /// Wing to global transformation.
    fn transformation(&self) -> Matrix4;
}
