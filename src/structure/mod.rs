//! Internal wing structure: spars and ribs.
//!
//! [`CsStructure`] owns the declarative entities of one wing and hands out
//! views ([`SparSegmentRef`], [`RibsDefinitionRef`]) whose geometry is
//! computed on first access. Entities refer to each other by UID and
//! resolve those references through the structure on every rebuild.

pub mod cs_structure;
pub mod definition;
pub mod reference_line;
pub mod registry;
pub mod ribs_definition;
pub mod spar_position;
pub mod spar_segment;

pub use cs_structure::CsStructure;
pub use definition::*;
pub use registry::{Identified, Registry};
pub use ribs_definition::{CutGeometry, RibMidplanePoints, RibsDefinition, RibsDefinitionRef};
pub use spar_position::{SparPosition, SparPositionLocation};
pub use spar_segment::{SparSegment, SparSegmentRef};

use std::sync::Arc;

use tracing::error;

use crate::boolean::{section, KernelError};
use crate::error::{Error, GeometryContext, Result};
use crate::ops::{connect_edges, make_face, ruled_face_along};
use crate::topo::{Face, Shape};
use crate::wing::{CapSide, CoordinateSystem, WingStructureReference};

/// Boundary edges of a spar or a set of ribs on the two skins.
#[derive(Debug, Default)]
pub(crate) struct CapsGeometry {
    pub upper: Option<Arc<Shape>>,
    pub lower: Option<Arc<Shape>>,
}

impl CapsGeometry {
    pub fn side(&self, side: CapSide) -> Option<&Arc<Shape>> {
        match side {
            CapSide::Upper => self.upper.as_ref(),
            CapSide::Lower => self.lower.as_ref(),
        }
    }
}

/// Cut `cutter` with the skin on every declared side.
pub(crate) fn build_caps(
    wsr: &dyn WingStructureReference,
    cutter: &Shape,
    upper: bool,
    lower: bool,
) -> Result<CapsGeometry> {
    let cap = |side: CapSide| -> Result<Arc<Shape>> {
        let skin = wsr.skin(side)?;
        Ok(Arc::new(Shape::from_edges(section(&skin, cutter))))
    };
    Ok(CapsGeometry {
        upper: if upper { Some(cap(CapSide::Upper)?) } else { None },
        lower: if lower { Some(cap(CapSide::Lower)?) } else { None },
    })
}

/// The part of an oversized cut face that lies inside the loft.
///
/// The intersection edges must chain into one wire, which is closed into a
/// planar face, or into two wires, which bound a ruled face.
pub(crate) fn face_inside_loft(uid: &str, cut: &Face, loft: &Shape) -> Result<Face> {
    let edges = section(&Shape::from_face(cut.clone()), loft);
    let wires = connect_edges(&edges);
    match wires.as_slice() {
        [wire] => make_face(&wire.closed()).in_entity(uid),
        [first, second] => ruled_face_along(first, second, &(first.end() - first.start())).in_entity(uid),
        _ => {
            error!(uid = %uid, wires = wires.len(), "cut face does not trim to a face");
            Err(Error::geometry(uid, KernelError::WireCount { expected: "1 or 2", found: wires.len() }))
        }
    }
}

/// `shape` in the requested frame.
pub(crate) fn in_frame(shape: Arc<Shape>, cs: CoordinateSystem, wsr: &dyn WingStructureReference) -> Arc<Shape> {
    match cs {
        CoordinateSystem::Wing => shape,
        CoordinateSystem::Global => Arc::new(shape.transformed(&wsr.transformation())),
    }
}
