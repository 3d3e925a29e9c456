//! Ribs definitions.
//!
//! A ribs definition is either a set of ribs distributed along a reference
//! line or one explicitly positioned rib. Every rib instance gets an
//! oversized cut face, built from a reference point, a rib direction and an
//! up vector, and trimmed at its start and end boundary. The cut faces are
//! then intersected with the loft to give the rib faces.
//!
//! A rib lying in a section plane skips the cut face: its geometry is the
//! section face itself, flagged as `is_target_face`.

use std::sync::Arc;

use tracing::{debug, error};

use super::cs_structure::CsStructure;
use super::definition::{
    LineRef, RibBoundary, RibCount, RibCrossSection, RibExplicitPositioning, RibPoint, RibPositioning, RibsDef,
    RibsPositioning, RotationReference,
};
use super::registry::Identified;
use super::spar_segment::SPLIT_BOX_GAP;
use super::{build_caps, face_inside_loft, in_frame, CapsGeometry};
use crate::boolean::{face_wire_intersection, plane_wire_intersection, section, split, KernelError};
use crate::cache::Cache;
use crate::curve::Wire;
use crate::error::{EntityKind, Error, GeometryContext, Result};
use crate::math::{perpendicular, rotate_deg, transform_point, x_axis, y_axis, z_axis, Point3, Vector3, TOLERANCE};
use crate::ops::{connect_edges, end_points, min_max_point, nearest_face, quad_face, ruled_face_along};
use crate::topo::{Face, Plane, Shape};
use crate::wing::{CapSide, CoordinateSystem};

/// The surface one rib instance is cut from.
#[derive(Clone, Debug, PartialEq)]
pub struct CutGeometry {
    pub face: Face,
    /// The face already is the final rib face.
    pub is_target_face: bool,
}

/// Where a rib meets its start and end line on the midplane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RibMidplanePoints {
    pub start: Point3,
    pub end: Point3,
}

#[derive(Debug)]
struct RibSetData {
    eta_start: f64,
    eta_end: f64,
    offset: f64,
    count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct RibsAuxiliary {
    pub midplane_points: Vec<RibMidplanePoints>,
    pub cut_geometries: Vec<CutGeometry>,
}

#[derive(Debug)]
pub struct RibsDefinition {
    uid: String,
    positioning: RibPositioning,
    cross_section: RibCrossSection,
    rib_set: Cache<RibSetData>,
    auxiliary: Cache<RibsAuxiliary>,
    geometry: Cache<Shape>,
    splitted: Cache<Shape>,
    caps: Cache<CapsGeometry>,
}

fn is_at_border(eta: f64) -> bool {
    eta < TOLERANCE || eta > 1.0 - TOLERANCE
}

/// Section element (`element`) or spar position UID named by a boundary.
fn boundary_uid(boundary: &RibBoundary, element: bool) -> Option<&str> {
    match (boundary, element) {
        (RibBoundary::ElementUid(uid), true) | (RibBoundary::SparPositionUid(uid), false) => Some(uid),
        _ => None,
    }
}

impl RibsDefinition {
    pub fn new(def: RibsDef) -> Result<Self> {
        let positioning = def.positioning()?;
        if let RibPositioning::Set(set) = &positioning {
            match set.count {
                RibCount::NumberOfRibs(0) => return Err(Error::config(&def.uid, "number of ribs must be at least 1")),
                RibCount::Spacing(s) if s <= 0.0 => return Err(Error::config(&def.uid, "rib spacing must be positive")),
                _ => {}
            }
        }
        Ok(Self {
            uid: def.uid,
            positioning,
            cross_section: def.cross_section,
            rib_set: Cache::new(),
            auxiliary: Cache::new(),
            geometry: Cache::new(),
            splitted: Cache::new(),
            caps: Cache::new(),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn positioning(&self) -> &RibPositioning {
        &self.positioning
    }

    pub fn cross_section(&self) -> &RibCrossSection {
        &self.cross_section
    }

    pub(crate) fn positioning_mut(&mut self) -> &mut RibPositioning {
        &mut self.positioning
    }

    pub(crate) fn cross_section_mut(&mut self) -> &mut RibCrossSection {
        &mut self.cross_section
    }

    /// The declarative form.
    pub fn to_definition(&self) -> RibsDef {
        let (ribs_positioning, explicit_positioning) = match &self.positioning {
            RibPositioning::Set(set) => (Some(set.clone()), None),
            RibPositioning::Explicit(explicit) => (None, Some(explicit.clone())),
        };
        RibsDef {
            uid: self.uid.clone(),
            ribs_positioning,
            explicit_positioning,
            cross_section: self.cross_section.clone(),
        }
    }

    pub fn has_cap(&self, side: CapSide) -> bool {
        match side {
            CapSide::Upper => self.cross_section.upper_cap.is_some(),
            CapSide::Lower => self.cross_section.lower_cap.is_some(),
        }
    }

    pub fn invalidate(&self) {
        self.rib_set.invalidate();
        self.auxiliary.invalidate();
        self.geometry.invalidate();
        self.splitted.invalidate();
        self.caps.invalidate();
    }

    pub fn is_built(&self) -> bool {
        self.rib_set.is_valid()
            || self.auxiliary.is_valid()
            || self.geometry.is_valid()
            || self.splitted.is_valid()
            || self.caps.is_valid()
    }

    fn set(&self) -> Result<&RibsPositioning> {
        match &self.positioning {
            RibPositioning::Set(set) => Ok(set),
            RibPositioning::Explicit(_) => {
                Err(Error::config(&self.uid, "an explicitly positioned rib has no reference eta range"))
            }
        }
    }

    pub(crate) fn number_of_ribs(&self, cs: &CsStructure) -> Result<usize> {
        match &self.positioning {
            RibPositioning::Set(_) => Ok(self.rib_set(cs)?.count),
            RibPositioning::Explicit(_) => Ok(1),
        }
    }

    // --- Rib set distribution ---

    fn rib_set(&self, cs: &CsStructure) -> Result<Arc<RibSetData>> {
        self.rib_set.get_or_try_init(|| {
            let set = self.set()?;
            let eta_start = self.boundary_eta(cs, set, &set.start)?;
            let eta_end = self.boundary_eta(cs, set, &set.end)?;
            let delta = (eta_end - eta_start).abs();
            let (count, offset) = match set.count {
                RibCount::NumberOfRibs(n) if n <= 1 => (1, 0.0),
                RibCount::NumberOfRibs(n) => (n as usize, delta / (n - 1) as f64),
                RibCount::Spacing(spacing) => {
                    let length = cs.resolve_length(&set.rib_reference)?;
                    let count = if delta <= TOLERANCE {
                        1
                    } else {
                        ((length * delta + TOLERANCE) / spacing).floor() as usize + 1
                    };
                    (count, spacing / length)
                }
            };
            debug!(uid = %self.uid, eta_start, eta_end, count, "distributing ribs");
            Ok(RibSetData { eta_start, eta_end, offset, count })
        })
    }

    /// Parameter on the rib reference line where a set starts or ends.
    fn boundary_eta(&self, cs: &CsStructure, set: &RibsPositioning, boundary: &RibBoundary) -> Result<f64> {
        let wsr = cs.reference();
        match boundary {
            RibBoundary::Eta(eta) => Ok(*eta),
            RibBoundary::ElementUid(element) => {
                let face = wsr.section_element_face(element)?;
                let line = cs.resolve_line(&set.rib_reference)?;
                let hit = face_wire_intersection(&face, &line).ok_or_else(|| {
                    error!(uid = %self.uid, element = %element, "rib reference line misses section element");
                    let reason = format!("rib reference line does not cross section element \"{element}\"");
                    Error::geometry(&self.uid, reason)
                })?;
                Ok(line.project(&hit))
            }
            RibBoundary::SparPositionUid(position) => {
                self.check_spar_position_on_reference(cs, position, &set.rib_reference)?;
                let point = cs.spar_position(position)?.midplane_point(wsr)?;
                let line = cs.resolve_line(&set.rib_reference)?;
                let up = z_axis();
                let dir = self.rib_direction(cs, set, line.project(&point), &point, &up)?;
                let plane = Plane::new(point, dir.cross(&up))
                    .ok_or_else(|| Error::geometry(&self.uid, "rib direction is parallel to the up vector"))?;
                plane_wire_intersection(&plane, &line).ok_or_else(|| {
                    error!(uid = %self.uid, position = %position, "rib plane misses reference line");
                    let reason = format!("rib through spar position \"{position}\" does not cross the reference line");
                    Error::geometry(&self.uid, reason)
                })
            }
        }
    }

    /// A spar position bounds a rib set only if it lies on the reference spar.
    fn check_spar_position_on_reference(&self, cs: &CsStructure, position: &str, reference: &LineRef) -> Result<()> {
        let Some(spar) = reference.spar_uid() else {
            return Err(Error::config(
                &self.uid,
                "a spar position can only bound ribs whose reference line is a spar",
            ));
        };
        if !cs.segment(spar)?.definition().position_uids.iter().any(|p| p == position) {
            return Err(Error::config(
                &self.uid,
                format!("spar position \"{position}\" is not part of reference spar \"{spar}\""),
            ));
        }
        Ok(())
    }

    /// Unit rib direction, pointing from rib start to rib end.
    fn rib_direction(
        &self,
        cs: &CsStructure,
        set: &RibsPositioning,
        eta: f64,
        point: &Point3,
        up: &Vector3,
    ) -> Result<Vector3> {
        let wsr = cs.reference();
        let z = set.rotation.z;
        let dir = match &set.rotation.reference {
            None => {
                let (local_eta, _) = wsr.eta_xsi_local(point)?;
                rotate_deg(&wsr.midplane_eta_dir(local_eta)?, up, z)
            }
            Some(RotationReference::GlobalX) => rotate_deg(&x_axis(), &z_axis(), z),
            Some(RotationReference::GlobalY) => rotate_deg(&y_axis(), &z_axis(), z),
            Some(RotationReference::Line(LineRef::Spar(spar))) => {
                if set.rib_reference.spar_uid() != Some(spar.as_str()) {
                    return Err(Error::config(
                        &self.uid,
                        "a spar used as rotation reference must also be the rib reference",
                    ));
                }
                let line = cs.resolve_line(&set.rib_reference)?;
                rotate_deg(&line.tangent_at(eta), up, z)
            }
            Some(RotationReference::Line(edge)) => rotate_deg(&cs.line_direction(edge, point)?, up, z),
        };
        // declared direction runs from rib end to rib start
        (-dir)
            .try_normalize(TOLERANCE)
            .ok_or_else(|| Error::geometry(&self.uid, "rib direction vanishes"))
    }

    /// Up vector before x rotation for a rib of a set.
    ///
    /// Ribs at spar positions and at the ends of a reference spar use the
    /// global z axis so that they match the spar cut faces.
    fn set_up_vector(
        &self,
        cs: &CsStructure,
        set: &RibsPositioning,
        eta: f64,
        point: &Point3,
        spar_position: Option<&str>,
    ) -> Result<Vector3> {
        if spar_position.is_some() || (!set.rib_reference.is_edge() && is_at_border(eta)) {
            return Ok(z_axis());
        }
        let wsr = cs.reference();
        let (local_eta, _) = wsr.eta_xsi_local(point)?;
        wsr.midplane_normal(local_eta)
    }

    /// The spar at `eta` (0 or 1) of a reference spar starts or ends in a section.
    fn outer_spar_point_in_section(&self, cs: &CsStructure, spar: &str, eta: f64) -> Result<bool> {
        let positions = &cs.segment(spar)?.definition().position_uids;
        let uid = match (eta < TOLERANCE, eta > 1.0 - TOLERANCE) {
            (true, _) => positions.first(),
            (_, true) => positions.last(),
            _ => None,
        };
        match uid {
            Some(uid) => Ok(cs.spar_position(uid)?.is_in_section()),
            None => Ok(false),
        }
    }

    // --- Cut faces ---

    /// Trim a section face at spar-type rib boundaries.
    ///
    /// At the rib start the part nearest the trailing edge survives, at the
    /// rib end the part nearest the leading edge.
    fn section_rib_face(
        &self,
        cs: &CsStructure,
        mut face: Face,
        chord_point: impl Fn(f64) -> Result<Point3>,
    ) -> Result<Face> {
        let positioning = &self.positioning;
        if let Some(spar) = positioning.rib_start().spar_uid() {
            face = self.keep_nearest_piece(cs, face, spar, &chord_point(1.0)?)?;
        }
        if let Some(spar) = positioning.rib_end().spar_uid() {
            face = self.keep_nearest_piece(cs, face, spar, &chord_point(0.0)?)?;
        }
        Ok(face)
    }

    fn keep_nearest_piece(&self, cs: &CsStructure, face: Face, spar: &str, target: &Point3) -> Result<Face> {
        let cut = &cs.segment(spar)?.auxiliary(cs)?.cut_shape;
        let mut pieces = split(&Shape::from_face(face), cut).faces;
        let i = nearest_face(&pieces, target)
            .ok_or_else(|| Error::geometry(&self.uid, format!("section face vanished when split by spar \"{spar}\"")))?;
        Ok(pieces.swap_remove(i))
    }

    /// Oversized cut face through `start` along `dir`, trimmed at spar-type
    /// boundaries.
    #[allow(clippy::too_many_arguments)]
    fn build_cut_face(
        &self,
        cs: &CsStructure,
        start: &Point3,
        dir: &Vector3,
        up_start: &Vector3,
        up_end: &Vector3,
        rib_start: &LineRef,
        rib_end: &LineRef,
    ) -> Result<Face> {
        let size = cs.reference().loft()?.bbox_diagonal();
        let behind = start - dir * size;
        let ahead = start + dir * size;
        let mut front = Wire::segment(behind + up_start * size, behind - up_start * size)
            .ok_or_else(|| Error::geometry(&self.uid, "rib up vector vanishes at its start"))?;
        let mut back = Wire::segment(ahead - up_end * size, ahead + up_end * size)
            .ok_or_else(|| Error::geometry(&self.uid, "rib up vector vanishes at its end"))?;
        let mut face = ruled_face_along(&front, &back, up_start).in_entity(&self.uid)?;

        if let Some(spar) = rib_start.spar_uid() {
            let up = -up_start;
            front = self.cut_with_spar(cs, &face, spar, size, &up)?;
            face = ruled_face_along(&front, &back, &up).in_entity(&self.uid)?;
        }
        if let Some(spar) = rib_end.spar_uid() {
            back = self.cut_with_spar(cs, &face, spar, size, up_end)?;
            face = ruled_face_along(&back, &front, up_end).in_entity(&self.uid)?;
        }
        Ok(face)
    }

    /// The wire where `face` meets a spar, with its open ends pushed out by
    /// `size` along `up` so it can bound a new cut face.
    fn cut_with_spar(&self, cs: &CsStructure, face: &Face, spar: &str, size: f64, up: &Vector3) -> Result<Wire> {
        let geometry = cs.segment(spar)?.geometry(cs)?;
        let extended = || -> std::result::Result<Wire, KernelError> {
            let edges = section(&geometry, &Shape::from_face(face.clone()));
            let ends = end_points(&edges).len();
            if ends > 2 {
                return Err(KernelError::EndVertices(ends));
            }
            let wires = connect_edges(&edges);
            let [wire] = wires.as_slice() else {
                return Err(KernelError::WireCount { expected: "1", found: wires.len() });
            };
            let pts = wire.points();
            let n = pts.len();
            let push_out = |outer: Point3, inner: Point3| {
                if (outer - inner).dot(up) >= 0.0 { outer + up * size } else { outer - up * size }
            };
            let mut points = Vec::with_capacity(n + 2);
            if !wire.is_closed() {
                points.push(push_out(pts[0], pts[1]));
            }
            points.extend_from_slice(pts);
            if !wire.is_closed() {
                points.push(push_out(pts[n - 1], pts[n - 2]));
            }
            Wire::new(points).ok_or_else(|| KernelError::Degenerate("spar cut wire".into()))
        };
        extended().map_err(|e| {
            error!(uid = %self.uid, spar, "rib does not intersect spar cleanly");
            Error::geometry(&self.uid, format!("intersection with spar \"{spar}\" failed: {e}"))
        })
    }

    /// Points where a rib face meets its start and end line.
    fn definition_points(&self, cs: &CsStructure, face: &Face) -> Result<RibMidplanePoints> {
        let point_on = |line: &LineRef| -> Result<Point3> {
            let wire = cs.resolve_line(line)?;
            face_wire_intersection(face, &wire).ok_or_else(|| {
                error!(uid = %self.uid, line = %line, "rib does not meet its boundary line");
                Error::geometry(&self.uid, format!("rib does not meet \"{line}\""))
            })
        };
        Ok(RibMidplanePoints {
            start: point_on(self.positioning.rib_start())?,
            end: point_on(self.positioning.rib_end())?,
        })
    }

    // --- Rib instances ---

    fn set_instance(
        &self,
        cs: &CsStructure,
        set: &RibsPositioning,
        eta: f64,
        element: Option<&str>,
        spar_position: Option<&str>,
    ) -> Result<(CutGeometry, RibMidplanePoints)> {
        let wsr = cs.reference();

        if let Some(element) = element {
            let face = wsr.section_element_face(element)?;
            let face = self.section_rib_face(cs, face, |xsi| wsr.section_element_chord_point(element, xsi))?;
            let points = self.definition_points(cs, &face)?;
            return Ok((CutGeometry { face, is_target_face: true }, points));
        }

        if is_at_border(eta) {
            let in_section = match set.rib_reference.spar_uid() {
                None => true,
                Some(spar) => self.outer_spar_point_in_section(cs, spar, eta)?,
            };
            if in_section {
                let (face, section_eta) =
                    if eta < TOLERANCE { (wsr.inner_face()?, 0.0) } else { (wsr.outer_face()?, 1.0) };
                let face = self.section_rib_face(cs, face, |xsi| wsr.point(section_eta, xsi))?;
                let points = self.definition_points(cs, &face)?;
                return Ok((CutGeometry { face, is_target_face: true }, points));
            }
        }

        let point = cs.reference_point(&set.rib_reference, eta)?;
        let up = self.set_up_vector(cs, set, eta, &point, spar_position)?;
        let dir = self.rib_direction(cs, set, eta, &point, &up)?;
        let up = rotate_deg(&up, &dir, self.cross_section.x_rotation - 90.0);
        let face = self.build_cut_face(cs, &point, &dir, &up, &up, &set.rib_start, &set.rib_end)?;
        let points = self.definition_points(cs, &face)?;
        Ok((CutGeometry { face, is_target_face: false }, points))
    }

    fn explicit_point(&self, cs: &CsStructure, point: &RibPoint) -> Result<Point3> {
        let wsr = cs.reference();
        match point {
            RibPoint::EtaXsi { eta, xsi, reference_uid } => {
                if let Some(reference) = reference_uid.as_deref().filter(|r| *r != wsr.uid()) {
                    return Err(Error::not_found(EntityKind::WingReference, reference));
                }
                wsr.point(*eta, *xsi)
            }
            RibPoint::Curve { reference, eta } => cs.reference_point(reference, *eta),
            RibPoint::SparPosition(uid) => cs.spar_position(uid)?.midplane_point(wsr),
        }
    }

    /// Up vector at one end of an explicit rib; zero if the end gives none.
    fn explicit_up_vector(&self, cs: &CsStructure, def: &RibPoint, trim: &LineRef, point: &Point3) -> Result<Vector3> {
        if let RibPoint::SparPosition(uid) = def {
            return cs.spar_position(uid)?.up_vector(cs.reference(), point);
        }
        match trim.spar_uid() {
            Some(spar) => self.spar_height_at(cs, spar, point),
            None => Ok(Vector3::zeros()),
        }
    }

    /// Vertical extent of a spar in the span-normal plane through `point`.
    fn spar_height_at(&self, cs: &CsStructure, spar: &str, point: &Point3) -> Result<Vector3> {
        let wsr = cs.reference();
        let geometry = cs.segment(spar)?.geometry(cs)?;
        let (eta, _) = wsr.eta_xsi_local(point)?;
        let Some(normal) = wsr.midplane_normal(eta)?.cross(&x_axis()).try_normalize(TOLERANCE) else {
            return Ok(Vector3::zeros());
        };
        let size = wsr.loft()?.bbox_diagonal();
        let a = perpendicular(&normal) * size;
        let b = normal.cross(&a);
        let cutter = quad_face(point - a - b, point - a + b, point + a - b, point + a + b);
        let edges = section(&geometry, &Shape::from_face(cutter));
        Ok(match min_max_point(&Shape::from_edges(edges), &z_axis()) {
            Some((lo, hi)) => hi - lo,
            None => Vector3::zeros(),
        })
    }

    fn explicit_instance(
        &self,
        cs: &CsStructure,
        explicit: &RibExplicitPositioning,
    ) -> Result<(CutGeometry, RibMidplanePoints)> {
        let wsr = cs.reference();
        let start = self.explicit_point(cs, &explicit.start)?;
        let end = self.explicit_point(cs, &explicit.end)?;
        let points = RibMidplanePoints { start, end };

        if let (Some(a), Some(b)) = (wsr.section_element_at(&start)?, wsr.section_element_at(&end)?) {
            if a == b {
                let face = wsr.section_element_face(&a)?;
                let face = self.section_rib_face(cs, face, |xsi| wsr.section_element_chord_point(&a, xsi))?;
                return Ok((CutGeometry { face, is_target_face: true }, points));
            }
        }

        let mut up_start = self.explicit_up_vector(cs, &explicit.start, &explicit.rib_start, &start)?;
        let mut up_end = self.explicit_up_vector(cs, &explicit.end, &explicit.rib_end, &end)?;
        match (up_start == Vector3::zeros(), up_end == Vector3::zeros()) {
            (true, true) => {
                let (eta, _) = wsr.eta_xsi_local(&start)?;
                up_start = wsr.midplane_normal(eta)?;
                up_end = up_start;
            }
            (true, false) => up_start = up_end,
            (false, true) => up_end = up_start,
            (false, false) => {}
        }
        let unit = |v: Vector3| {
            v.try_normalize(TOLERANCE)
                .ok_or_else(|| Error::geometry(&self.uid, "rib up vector vanishes"))
        };
        // one global axis keeps neighbouring explicit ribs connected
        let angle = 90.0 - self.cross_section.x_rotation;
        let up_start = rotate_deg(&unit(up_start)?, &x_axis(), angle);
        let up_end = rotate_deg(&unit(up_end)?, &x_axis(), angle);

        let dir = (end - start)
            .try_normalize(TOLERANCE)
            .ok_or_else(|| Error::geometry(&self.uid, "rib start and end point coincide"))?;
        let face = self.build_cut_face(cs, &start, &dir, &up_start, &up_end, &explicit.rib_start, &explicit.rib_end)?;
        Ok((CutGeometry { face, is_target_face: false }, points))
    }

    // --- Caches ---

    pub(crate) fn auxiliary(&self, cs: &CsStructure) -> Result<Arc<RibsAuxiliary>> {
        self.auxiliary.get_or_try_init(|| {
            debug!(uid = %self.uid, "building rib cut faces");
            let mut aux = RibsAuxiliary::default();
            match &self.positioning {
                RibPositioning::Set(set) => {
                    let data = self.rib_set(cs)?;
                    for i in 0..data.count {
                        let eta = data.eta_start + data.offset * i as f64;
                        // compared by eta so that spacing-defined sets find their end too
                        let at_end = (data.eta_end - eta).abs() <= TOLERANCE;
                        let pick = |element: bool| {
                            let first = if i == 0 { boundary_uid(&set.start, element) } else { None };
                            first.or_else(|| if at_end { boundary_uid(&set.end, element) } else { None })
                        };
                        let (cut, points) = self.set_instance(cs, set, eta, pick(true), pick(false))?;
                        aux.cut_geometries.push(cut);
                        aux.midplane_points.push(points);
                    }
                }
                RibPositioning::Explicit(explicit) => {
                    let (cut, points) = self.explicit_instance(cs, explicit)?;
                    aux.cut_geometries.push(cut);
                    aux.midplane_points.push(points);
                }
            }
            Ok(aux)
        })
    }

    pub(crate) fn geometry(&self, cs: &CsStructure) -> Result<Arc<Shape>> {
        self.geometry.get_or_try_init(|| {
            let aux = self.auxiliary(cs)?;
            debug!(uid = %self.uid, ribs = aux.cut_geometries.len(), "trimming ribs against loft");
            let loft = cs.reference().loft()?;
            let faces = aux
                .cut_geometries
                .iter()
                .map(|cut| {
                    if cut.is_target_face {
                        Ok(cut.face.clone())
                    } else {
                        face_inside_loft(&self.uid, &cut.face, &loft)
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Shape::from_faces(faces))
        })
    }

    pub(crate) fn splitted(&self, cs: &CsStructure) -> Result<Arc<Shape>> {
        self.splitted.get_or_try_init(|| {
            let geometry = self.geometry(cs)?;
            debug!(uid = %self.uid, "splitting ribs with spars");
            let bbox = geometry.bbox().map(|b| b.enlarged(SPLIT_BOX_GAP));
            let mut tool = Shape::new();
            for spar in cs.spar_segment_entities() {
                let cut = &spar.auxiliary(cs)?.cut_shape;
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
            debug!(uid = %self.uid, "building rib caps");
            let cutter = Shape::from_faces(aux.cut_geometries.iter().map(|c| c.face.clone()).collect());
            build_caps(cs.reference(), &cutter, self.has_cap(CapSide::Upper), self.has_cap(CapSide::Lower))
        })
    }
}

impl Identified for RibsDefinition {
    fn uid(&self) -> &str {
        &self.uid
    }

    fn set_uid(&mut self, uid: String) {
        self.uid = uid;
    }
}

/// A ribs definition together with the structure it lives in.
#[derive(Clone, Copy)]
pub struct RibsDefinitionRef<'a> {
    structure: &'a CsStructure,
    ribs: &'a RibsDefinition,
}

impl<'a> RibsDefinitionRef<'a> {
    pub(crate) fn new(structure: &'a CsStructure, ribs: &'a RibsDefinition) -> Self {
        Self { structure, ribs }
    }

    pub fn uid(&self) -> &'a str {
        self.ribs.uid()
    }

    pub fn positioning(&self) -> &'a RibPositioning {
        self.ribs.positioning()
    }

    pub fn cross_section(&self) -> &'a RibCrossSection {
        self.ribs.cross_section()
    }

    pub fn number_of_ribs(&self) -> Result<usize> {
        self.ribs.number_of_ribs(self.structure)
    }

    fn rib_index(&self, n: usize) -> Result<usize> {
        Error::check_index("rib", n, self.number_of_ribs()?)
    }

    /// All rib faces, trimmed to the loft.
    pub fn geometry(&self, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        Ok(in_frame(self.ribs.geometry(self.structure)?, cs, self.structure.reference()))
    }

    /// Face of rib `n` (1-based).
    pub fn rib_face(&self, n: usize, cs: CoordinateSystem) -> Result<Face> {
        let i = self.rib_index(n)?;
        let face = self.ribs.geometry(self.structure)?.faces[i].clone();
        Ok(match cs {
            CoordinateSystem::Wing => face,
            CoordinateSystem::Global => face.transformed(&self.structure.reference().transformation()),
        })
    }

    /// Rib faces split by every spar that reaches them.
    pub fn splitted_geometry(&self, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        Ok(in_frame(self.ribs.splitted(self.structure)?, cs, self.structure.reference()))
    }

    /// Edges where the ribs meet the skin on `side`.
    pub fn caps_geometry(&self, side: CapSide, cs: CoordinateSystem) -> Result<Arc<Shape>> {
        if !self.has_cap(side) {
            return Err(Error::config(self.uid(), format!("ribs have no {side} cap")));
        }
        let caps = self.ribs.caps(self.structure)?;
        let shape = caps
            .side(side)
            .cloned()
            .ok_or_else(|| Error::config(self.uid(), "caps were built without this side"))?;
        Ok(in_frame(shape, cs, self.structure.reference()))
    }

    /// Cut geometry of rib `n` (1-based), in wing coordinates.
    pub fn cut_geometry(&self, n: usize) -> Result<CutGeometry> {
        let i = self.rib_index(n)?;
        Ok(self.ribs.auxiliary(self.structure)?.cut_geometries[i].clone())
    }

    /// Start and end point of rib `n` (1-based) on the midplane.
    pub fn midplane_points(&self, n: usize, cs: CoordinateSystem) -> Result<RibMidplanePoints> {
        let i = self.rib_index(n)?;
        let points = self.ribs.auxiliary(self.structure)?.midplane_points[i];
        Ok(match cs {
            CoordinateSystem::Wing => points,
            CoordinateSystem::Global => {
                let m = self.structure.reference().transformation();
                RibMidplanePoints { start: transform_point(&m, &points.start), end: transform_point(&m, &points.end) }
            }
        })
    }

    pub fn has_cap(&self, side: CapSide) -> bool {
        self.ribs.has_cap(side)
    }

    pub fn has_caps(&self) -> bool {
        self.has_cap(CapSide::Upper) || self.has_cap(CapSide::Lower)
    }

    /// Parameter on the rib reference line of the first rib of a set.
    pub fn reference_eta_start(&self) -> Result<f64> {
        Ok(self.ribs.rib_set(self.structure)?.eta_start)
    }

    /// Parameter on the rib reference line where a set ends.
    pub fn reference_eta_end(&self) -> Result<f64> {
        Ok(self.ribs.rib_set(self.structure)?.eta_end)
    }

    /// Parameter step between neighbouring ribs of a set.
    pub fn reference_eta_offset(&self) -> Result<f64> {
        Ok(self.ribs.rib_set(self.structure)?.offset)
    }

    pub fn is_built(&self) -> bool {
        self.ribs.is_built()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::RibRotation;

    fn set(count: RibCount) -> RibsDef {
        RibsDef::set(
            "ribs",
            RibsPositioning {
                rib_reference: LineRef::LeadingEdge,
                start: RibBoundary::ElementUid("root".into()),
                end: RibBoundary::SparPositionUid("p".into()),
                rib_start: LineRef::LeadingEdge,
                rib_end: LineRef::Spar("spar".into()),
                count,
                crossing: Default::default(),
                rotation: RibRotation::default(),
            },
        )
    }

    #[test]
    fn boundary_uids() {
        let element = RibBoundary::ElementUid("root".into());
        assert_eq!(boundary_uid(&element, true), Some("root"));
        assert_eq!(boundary_uid(&element, false), None);
        assert_eq!(boundary_uid(&RibBoundary::SparPositionUid("p".into()), false), Some("p"));
        assert_eq!(boundary_uid(&RibBoundary::Eta(0.3), true), None);
    }

    #[test]
    fn counts_are_validated() {
        assert!(matches!(RibsDefinition::new(set(RibCount::NumberOfRibs(0))), Err(Error::Config { .. })));
        assert!(matches!(RibsDefinition::new(set(RibCount::Spacing(-1.0))), Err(Error::Config { .. })));
        assert!(RibsDefinition::new(set(RibCount::Spacing(0.5))).is_ok());
    }

    #[test]
    fn definition_round_trip() {
        let def = set(RibCount::NumberOfRibs(3));
        let ribs = RibsDefinition::new(def.clone()).unwrap();
        assert_eq!(ribs.to_definition(), def);
        assert_eq!(ribs.positioning().rib_end(), &LineRef::Spar("spar".into()));
        assert!(!ribs.is_built());
        assert!(!ribs.has_cap(CapSide::Upper));
    }

    #[test]
    fn border_etas() {
        assert!(is_at_border(0.0));
        assert!(is_at_border(1.0 - 1e-9));
        assert!(!is_at_border(0.5));
    }
}
