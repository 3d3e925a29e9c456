//! Spar segments.
//!
//! A spar runs through an ordered chain of spar positions. Every pair of
//! consecutive positions spans one panel of the oversized cut shape; the
//! panels are trimmed against the loft to give the spar faces.
//!
//! Four caches, filled in dependency order:
//! auxiliary (midplane line, cut shape) -> geometry -> splitted / caps.

use std::sync::Arc;

use tracing::{debug, warn};

use super::cs_structure::CsStructure;
use super::definition::SparSegmentDef;
use super::registry::Identified;
use super::spar_position::SparPosition;
use super::{build_caps, face_inside_loft, in_frame, CapsGeometry};
use crate::boolean::split;
use crate::cache::Cache;
use crate::curve::Wire;
use crate::error::{Error, Result};
use crate::math::{transform_point, Point3, Vector3, TOLERANCE};
use crate::ops::quad_face;
use crate::topo::Shape;
use crate::wing::{CapSide, CoordinateSystem};

/// Gap added around bounding boxes when looking for spars that may cut a shape.
pub(crate) const SPLIT_BOX_GAP: f64 = 1e-2;

#[derive(Debug)]
pub(crate) struct SparAuxiliary {
    /// Polyline through the midplane points of all positions.
    pub midplane_line: Wire,
    /// One oversized panel face per pair of consecutive positions.
    pub cut_shape: Shape,
}

#[derive(Debug)]
pub struct SparSegment {
    def: SparSegmentDef,
    auxiliary: Cache<SparAuxiliary>,
    geometry: Cache<Shape>,
    splitted: Cache<Shape>,
    caps: Cache<CapsGeometry>,
}

impl SparSegment {
    pub fn new(def: SparSegmentDef) -> Self {
        Self {
            def,
            auxiliary: Cache::new(),
            geometry: Cache::new(),
            splitted: Cache::new(),
            caps: Cache::new(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.def.uid
    }

    pub fn definition(&self) -> &SparSegmentDef {
        &self.def
    }

    pub(crate) fn definition_mut(&mut self) -> &mut SparSegmentDef {
        &mut self.def
    }

    pub fn has_cap(&self, side: CapSide) -> bool {
        match side {
            CapSide::Upper => self.def.cross_section.upper_cap.is_some(),
            CapSide::Lower => self.def.cross_section.lower_cap.is_some(),
        }
    }

    pub fn invalidate(&self) {
        self.auxiliary.invalidate();
        self.geometry.invalidate();
        self.splitted.invalidate();
        self.caps.invalidate();
    }

    /// True if any of the four caches holds a value.
    pub fn is_built(&self) -> bool {
        self.auxiliary.is_valid() || self.geometry.is_valid() || self.splitted.is_valid() || self.caps.is_valid()
    }

    fn positions<'a>(&self, cs: &'a CsStructure) -> Result<Vec<&'a SparPosition>> {
        self.def.position_uids.iter().map(|uid| cs.spar_position(uid)).collect()
    }

    pub(crate) fn auxiliary(&self, cs: &CsStructure) -> Result<Arc<SparAuxiliary>> {
        self.auxiliary.get_or_try_init(|| {
            debug!(uid = %self.uid(), "building spar cut shape");
            let wsr = cs.reference();
            let rotation = self.def.cross_section.rotation;
            if (rotation - 90.0).abs() > TOLERANCE {
                warn!(uid = %self.uid(), rotation, "unsupported spar cross section rotation, using the wing z axis");
            }

            let positions = self.positions(cs)?;
            if positions.len() < 2 {
                return Err(Error::config(self.uid(), "a spar needs at least two spar positions"));
            }
            let points = positions
                .iter()
                .map(|p| p.midplane_point(wsr))
                .collect::<Result<Vec<Point3>>>()?;
            let ups = positions
                .iter()
                .zip(&points)
                .map(|(p, pnt)| p.up_vector(wsr, pnt))
                .collect::<Result<Vec<Vector3>>>()?;
            let size = wsr.loft()?.bbox_diagonal();

            let mut cut_shape = Shape::new();
            for k in 0..positions.len() - 1 {
                let (mut inner, mut outer) = (points[k], points[k + 1]);
                let dir = (outer - inner).try_normalize(TOLERANCE).ok_or_else(|| {
                    Error::geometry(self.uid(), format!("spar positions {} and {} coincide", k + 1, k + 2))
                })?;
                // reach past the wing ends so the panel crosses the closing faces
                if positions[k].is_at_inner_border() {
                    inner -= dir * size;
                }
                if positions[k + 1].is_at_outer_border() {
                    outer += dir * size;
                }
                let (up_in, up_out) = (ups[k] * size, ups[k + 1] * size);
                cut_shape.add_face(quad_face(inner + up_in, inner - up_in, outer + up_out, outer - up_out));
            }

            let mut line_points = Vec::with_capacity(points.len());
            for pair in points.windows(2) {
                line_points.extend_from_slice(wsr.midplane_line(&pair[0], &pair[1])?.points());
            }
            let midplane_line = Wire::new(line_points)
                .ok_or_else(|| Error::geometry(self.uid(), "spar midplane line has no extent"))?;

            Ok(SparAuxiliary { midplane_line, cut_shape })
        })
    }

    pub(crate) fn geometry(&self, cs: &CsStructure) -> Result<Arc<Shape>> {
        self.geometry.get_or_try_init(|| {
            let aux = self.auxiliary(cs)?;
            debug!(uid = %self.uid(), panels = aux.cut_shape.faces.len(), "trimming spar against loft");
            let loft = cs.reference().loft()?;
            let faces = aux
                .cut_shape
                .faces
                .iter()
                .map(|panel| face_inside_loft(self.uid(), panel, &loft))
                .collect::<Result<Vec<_>>>()?;
            Ok(Shape::from_faces(faces))
        })
    }

    pub(crate) fn splitted(&self, cs: &CsStructure) -> Result<Arc<Shape>> {
        self.splitted.get_or_try_init(|| {
            let geometry = self.geometry(cs)?;
            debug!(uid = %self.uid(), "splitting spar with ribs and spars");
            let mut tool = Shape::new();
            for ribs in cs.ribs_definition_entities() {
                for cut in ribs.auxiliary(cs)?.cut_geometries.iter() {
                    tool.add_face(cut.face.clone());
                }
            }
            let bbox = geometry.bbox().map(|b| b.enlarged(SPLIT_BOX_GAP));
            for other in cs.spar_segment_entities().filter(|s| s.uid() != self.uid()) {
                let cut = &other.auxiliary(cs)?.cut_shape;
                let overlaps = match (&bbox, cut.bbox()) {
                    (Some(a), Some(b)) => a.overlaps(&b.enlarged(SPLIT_BOX_GAP)),
                    _ => false,
                };
                if overlaps {
                    tool.extend(cut);
                }
            }
            Ok(split(&geometry, &tool))
        })
    }

    pub(crate) fn caps(&self, cs: &CsStructure) -> Result<Arc<CapsGeometry>> {
        self.caps.get_or_try_init(|| {
            let aux = self.auxiliary(cs)?;
            debug!(uid = %self.uid(), "building spar caps");
            build_caps(cs.reference(), &aux.cut_shape, self.has_cap(CapSide::Upper), self.has_cap(CapSide::Lower))
        })
    }
}

impl Identified for SparSegment {
    fn uid(&self) -> &str {
        &self.def.uid
    }

    fn set_uid(&mut self, uid: String) {
        self.def.uid = uid;
    }
}

/// A spar segment together with the structure it lives in.
#[derive(Clone, Copy)]
pub struct SparSegmentRef<'a> {
    structure: &'a CsStructure,
    segment: &'a SparSegment,
}

impl<'a> SparSegmentRef<'a> {
    pub(crate) fn new(structure: &'a CsStructure, segment: &'a SparSegment) -> Self {
        Self { structure, segment }
    }

    pub fn uid(&self) -> &'a str {
        self.segment.uid()
    }

    pub fn definition(&self) -> &'a SparSegmentDef {
        self.segment.definition()
    }

    /// Spar faces trimmed to the loft.
    pub fn geometry(&self, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        Ok(in_frame(self.segment.geometry(self.structure)?, cs, self.structure.reference()))
    }

    /// Spar faces split by all rib cut faces and by crossing spars.
    pub fn splitted_geometry(&self, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        Ok(in_frame(self.segment.splitted(self.structure)?, cs, self.structure.reference()))
    }

    /// The oversized panels used to cut the loft.
    pub fn cut_geometry(&self, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        let aux = self.segment.auxiliary(self.structure)?;
        Ok(in_frame(Arc::new(aux.cut_shape.clone()), cs, self.structure.reference()))
    }

    /// Edges where the spar meets the skin on `side`.
    pub fn caps_geometry(&self, side: CapSide, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        if !self.has_cap(side) {
            return Err(Error::config(self.uid(), format!("spar has no {side} cap")));
        }
        let caps = self.segment.caps(self.structure)?;
        let shape = caps
            .side(side)
            .cloned()
            .ok_or_else(|| Error::config(self.uid(), "caps were built without this side"))?;
        Ok(in_frame(shape, cs, self.structure.reference()))
    }

    pub fn midplane_line(&self, cs: CoordinateSystem) -> Result<Wire> {
        let line = &self.segment.auxiliary(self.structure)?.midplane_line;
        Ok(match cs {
            CoordinateSystem::Wing => line.clone(),
            CoordinateSystem::Global => line.transformed(&self.structure.reference().transformation()),
        })
    }

    /// Point at normalized arclength `eta` on the midplane line.
    pub fn point(&self, eta: f64) -> Result<Point3> {
        Ok(self.segment.auxiliary(self.structure)?.midplane_line.point_at(eta))
    }

    /// Unit tangent of the midplane line at `eta`.
    pub fn direction(&self, eta: f64) -> Result<Vector3> {
        Ok(self.segment.auxiliary(self.structure)?.midplane_line.tangent_at(eta))
    }

    pub fn length(&self) -> Result<f64> {
        Ok(self.segment.auxiliary(self.structure)?.midplane_line.length())
    }

    pub fn number_of_positions(&self) -> usize {
        self.segment.def.position_uids.len()
    }

    fn position(&self, index: usize) -> Result<&'a SparPosition> {
        let i = Error::check_index("spar position", index, self.number_of_positions())?;
        self.structure.spar_position(&self.segment.def.position_uids[i])
    }

    /// Midplane point of the spar position at 1-based `index`.
    pub fn midplane_point(&self, index: usize) -> Result<Point3> {
        self.position(index)?.midplane_point(self.structure.reference())
    }

    /// Midplane point of the spar position at 1-based `index` in the global frame.
    pub fn global_midplane_point(&self, index: usize) -> Result<Point3> {
        Ok(transform_point(&self.structure.reference().transformation(), &self.midplane_point(index)?))
    }

    /// (eta, xsi) of the spar position at 1-based `index`. Element positions
    /// report the eta of their chord point.
    pub fn eta_xsi(&self, index: usize) -> Result<(f64, f64)> {
        let position = self.position(index)?;
        let eta = match position.eta() {
            Some(eta) => eta,
            None => {
                let wsr = self.structure.reference();
                wsr.eta_xsi_local(&position.midplane_point(wsr)?)?.0
            }
        };
        Ok((eta, position.xsi))
    }

    pub fn has_cap(&self, side: CapSide) -> bool {
        self.segment.has_cap(side)
    }

    pub fn is_built(&self) -> bool {
        self.segment.is_built()
    }
}
