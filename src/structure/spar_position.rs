use serde::{Deserialize, Serialize};

use crate::boolean::section;
use crate::error::{Error, Result};
use crate::math::{z_axis, Point3, Vector3, TOLERANCE};
use crate::ops::{end_points, quad_face};
use crate::topo::Shape;
use crate::wing::WingStructureReference;

use super::registry::Identified;

/// How a spar position is placed in span direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SparPositionLocation {
    /// Span coordinate on the wing structure reference.
    Eta(f64),
    /// On the chord line of a section element.
    ElementUid(String),
}

/// A named point on the wing midplane that spars are threaded through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparPosition {
    pub uid: String,
    #[serde(flatten)]
    pub location: SparPositionLocation,
    pub xsi: f64,
}

impl SparPosition {
    pub fn at_eta(uid: impl Into<String>, eta: f64, xsi: f64) -> Self {
        Self { uid: uid.into(), location: SparPositionLocation::Eta(eta), xsi }
    }

    pub fn at_element(uid: impl Into<String>, element_uid: impl Into<String>, xsi: f64) -> Self {
        Self { uid: uid.into(), location: SparPositionLocation::ElementUid(element_uid.into()), xsi }
    }

    pub fn eta(&self) -> Option<f64> {
        match self.location {
            SparPositionLocation::Eta(eta) => Some(eta),
            SparPositionLocation::ElementUid(_) => None,
        }
    }

    pub fn element_uid(&self) -> Option<&str> {
        match &self.location {
            SparPositionLocation::ElementUid(uid) => Some(uid),
            SparPositionLocation::Eta(_) => None,
        }
    }

    /// Eta-defined at the inner end of the wing.
    pub fn is_at_inner_border(&self) -> bool {
        self.eta().is_some_and(|eta| eta <= TOLERANCE)
    }

    /// Eta-defined at the outer end of the wing.
    pub fn is_at_outer_border(&self) -> bool {
        self.eta().is_some_and(|eta| eta >= 1.0 - TOLERANCE)
    }

    /// Lies in a section plane, either by reference or at a wing border.
    pub fn is_in_section(&self) -> bool {
        self.element_uid().is_some() || self.is_at_inner_border() || self.is_at_outer_border()
    }

    pub fn midplane_point(&self, wsr: &dyn WingStructureReference) -> Result<Point3> {
        match &self.location {
            SparPositionLocation::Eta(eta) => wsr.point(*eta, self.xsi),
            SparPositionLocation::ElementUid(uid) => wsr.section_element_chord_point(uid, self.xsi),
        }
    }

    /// Spar height direction at this position.
    ///
    /// In a section element it follows the section face; everywhere else it
    /// is the global z axis, independent of sweep and dihedral.
    pub fn up_vector(&self, wsr: &dyn WingStructureReference, midplane_point: &Point3) -> Result<Vector3> {
        let Some(element_uid) = self.element_uid() else {
            return Ok(z_axis());
        };

        let face = wsr.section_element_face(element_uid)?;
        let size = face.bbox().map_or(0.0, |b| b.diagonal());
        let p = midplane_point;
        let cutter = quad_face(
            p + Vector3::new(0.0, -size, -size),
            p + Vector3::new(0.0, -size, size),
            p + Vector3::new(0.0, size, -size),
            p + Vector3::new(0.0, size, size),
        );
        let edges = section(&Shape::from_face(face), &Shape::from_face(cutter));
        let ends = end_points(&edges);
        if ends.len() != 2 {
            return Err(Error::geometry(
                &self.uid,
                format!("section face cut at spar position yields {} end points instead of 2", ends.len()),
            ));
        }
        let up = (ends[1] - ends[0])
            .try_normalize(TOLERANCE)
            .ok_or_else(|| Error::geometry(&self.uid, "section face has no height at spar position"))?;
        Ok(if up.z < 0.0 { -up } else { up })
    }
}

impl Identified for SparPosition {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn set_uid(&mut self, uid: String) {
        self.uid = uid;
    }
}
