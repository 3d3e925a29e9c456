//! The structure of one wing.
//!
//! `CsStructure` owns every spar position, spar segment and ribs definition
//! of a wing together with the wing structure reference they are built on.
//! Reads go through shared borrows and fill the entity caches lazily; every
//! mutation goes through `&mut self` and drops all cached geometry, since
//! spars and ribs trim each other.

use std::fmt;

use tracing::debug;

use super::definition::{RibsDef, SparSegmentDef, StructureDef};
use super::registry::Registry;
use super::ribs_definition::{RibsDefinition, RibsDefinitionRef};
use super::spar_position::{SparPosition, SparPositionLocation};
use super::spar_segment::{SparSegment, SparSegmentRef};
use crate::error::{EntityKind, Error, Result};
use crate::math::{transform_point, Point3, Vector3};
use crate::wing::{CoordinateSystem, WingStructureReference};

pub struct CsStructure {
    reference: Box<dyn WingStructureReference>,
    spar_positions: Registry<SparPosition>,
    spar_segments: Registry<SparSegment>,
    ribs_definitions: Registry<RibsDefinition>,
}

fn check_spar_def(def: &SparSegmentDef) -> Result<()> {
    if def.position_uids.len() < 2 {
        return Err(Error::config(&def.uid, "a spar needs at least two spar positions"));
    }
    Ok(())
}

impl CsStructure {
    pub fn new(def: StructureDef, reference: Box<dyn WingStructureReference>) -> Result<Self> {
        let mut structure = Self {
            reference,
            spar_positions: Registry::new(),
            spar_segments: Registry::new(),
            ribs_definitions: Registry::new(),
        };
        for position in def.spar_positions {
            structure.add_spar_position(position)?;
        }
        for spar in def.spar_segments {
            structure.add_spar_segment(spar)?;
        }
        for ribs in def.ribs_definitions {
            structure.add_ribs_definition(ribs)?;
        }
        debug!(
            wing = %structure.reference.uid(),
            positions = structure.spar_positions.len(),
            spars = structure.spar_segments.len(),
            ribs = structure.ribs_definitions.len(),
            "structure loaded"
        );
        Ok(structure)
    }

    pub fn from_json(json: &str, reference: Box<dyn WingStructureReference>) -> Result<Self> {
        Self::new(serde_json::from_str(json)?, reference)
    }

    pub fn to_definition(&self) -> StructureDef {
        StructureDef {
            spar_positions: self.spar_positions.iter().cloned().collect(),
            spar_segments: self.spar_segments.iter().map(|s| s.definition().clone()).collect(),
            ribs_definitions: self.ribs_definitions.iter().map(RibsDefinition::to_definition).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_definition())?)
    }

    pub fn reference(&self) -> &dyn WingStructureReference {
        self.reference.as_ref()
    }

    // --- Lookup ---

    pub fn spar_position(&self, uid: &str) -> Result<&SparPosition> {
        self.spar_positions.get(uid).ok_or_else(|| Error::not_found(EntityKind::SparPosition, uid))
    }

    pub(crate) fn segment(&self, uid: &str) -> Result<&SparSegment> {
        self.spar_segments.get(uid).ok_or_else(|| Error::not_found(EntityKind::SparSegment, uid))
    }

    pub fn spar_segment(&self, uid: &str) -> Result<SparSegmentRef<'_>> {
        Ok(SparSegmentRef::new(self, self.segment(uid)?))
    }

    /// Spar segment at 1-based `index`, in declaration order.
    pub fn spar_segment_at(&self, index: usize) -> Result<SparSegmentRef<'_>> {
        let i = Error::check_index("spar segment", index, self.spar_segments.len())?;
        let segment = self.spar_segments.at(i).ok_or(Error::Index {
            what: "spar segment",
            index,
            count: self.spar_segments.len(),
        })?;
        Ok(SparSegmentRef::new(self, segment))
    }

    pub fn ribs_definition(&self, uid: &str) -> Result<RibsDefinitionRef<'_>> {
        let ribs = self
            .ribs_definitions
            .get(uid)
            .ok_or_else(|| Error::not_found(EntityKind::RibsDefinition, uid))?;
        Ok(RibsDefinitionRef::new(self, ribs))
    }

    /// Ribs definition at 1-based `index`, in declaration order.
    pub fn ribs_definition_at(&self, index: usize) -> Result<RibsDefinitionRef<'_>> {
        let i = Error::check_index("ribs definition", index, self.ribs_definitions.len())?;
        let ribs = self.ribs_definitions.at(i).ok_or(Error::Index {
            what: "ribs definition",
            index,
            count: self.ribs_definitions.len(),
        })?;
        Ok(RibsDefinitionRef::new(self, ribs))
    }

    pub fn spar_position_count(&self) -> usize {
        self.spar_positions.len()
    }

    pub fn spar_segment_count(&self) -> usize {
        self.spar_segments.len()
    }

    pub fn ribs_definition_count(&self) -> usize {
        self.ribs_definitions.len()
    }

    pub fn spar_positions(&self) -> impl Iterator<Item = &SparPosition> + '_ {
        self.spar_positions.iter()
    }

    pub fn spar_segments(&self) -> impl Iterator<Item = SparSegmentRef<'_>> + '_ {
        self.spar_segments.iter().map(move |s| SparSegmentRef::new(self, s))
    }

    pub fn ribs_definitions(&self) -> impl Iterator<Item = RibsDefinitionRef<'_>> + '_ {
        self.ribs_definitions.iter().map(move |r| RibsDefinitionRef::new(self, r))
    }

    pub(crate) fn spar_segment_entities(&self) -> impl Iterator<Item = &SparSegment> + '_ {
        self.spar_segments.iter()
    }

    pub(crate) fn ribs_definition_entities(&self) -> impl Iterator<Item = &RibsDefinition> + '_ {
        self.ribs_definitions.iter()
    }

    /// Midplane point of a spar position.
    pub fn spar_position_point(&self, uid: &str, cs: CoordinateSystem) -> Result<Point3> {
        let point = self.spar_position(uid)?.midplane_point(self.reference())?;
        Ok(match cs {
            CoordinateSystem::Wing => point,
            CoordinateSystem::Global => transform_point(&self.reference.transformation(), &point),
        })
    }

    /// Spar height direction at a spar position, in wing coordinates.
    pub fn spar_position_up_vector(&self, uid: &str) -> Result<Vector3> {
        let position = self.spar_position(uid)?;
        position.up_vector(self.reference(), &position.midplane_point(self.reference())?)
    }

    /// Drop all cached geometry. Idempotent.
    pub fn invalidate(&self) {
        debug!(wing = %self.reference.uid(), "invalidating structure");
        for spar in &self.spar_segments {
            spar.invalidate();
        }
        for ribs in &self.ribs_definitions {
            ribs.invalidate();
        }
    }

    // --- Mutation ---

    pub fn add_spar_position(&mut self, position: SparPosition) -> Result<()> {
        self.spar_positions
            .add(position)
            .map_err(|p| Error::config(&p.uid, "duplicate spar position UID"))?;
        self.invalidate();
        Ok(())
    }

    pub fn add_spar_segment(&mut self, def: SparSegmentDef) -> Result<()> {
        check_spar_def(&def)?;
        self.spar_segments
            .add(SparSegment::new(def))
            .map_err(|s| Error::config(s.uid(), "duplicate spar segment UID"))?;
        self.invalidate();
        Ok(())
    }

    pub fn add_ribs_definition(&mut self, def: RibsDef) -> Result<()> {
        self.ribs_definitions
            .add(RibsDefinition::new(def)?)
            .map_err(|r| Error::config(r.uid(), "duplicate ribs definition UID"))?;
        self.invalidate();
        Ok(())
    }

    /// Remove a spar position. Spars and ribs still naming it fail to build.
    pub fn remove_spar_position(&mut self, uid: &str) -> Result<SparPosition> {
        let position = self
            .spar_positions
            .remove(uid)
            .ok_or_else(|| Error::not_found(EntityKind::SparPosition, uid))?;
        self.invalidate();
        Ok(position)
    }

    pub fn remove_spar_segment(&mut self, uid: &str) -> Result<SparSegmentDef> {
        let spar = self
            .spar_segments
            .remove(uid)
            .ok_or_else(|| Error::not_found(EntityKind::SparSegment, uid))?;
        self.invalidate();
        Ok(spar.definition().clone())
    }

    pub fn remove_ribs_definition(&mut self, uid: &str) -> Result<RibsDef> {
        let ribs = self
            .ribs_definitions
            .remove(uid)
            .ok_or_else(|| Error::not_found(EntityKind::RibsDefinition, uid))?;
        self.invalidate();
        Ok(ribs.to_definition())
    }

    /// Edit a spar position. The UID must not change; rejected edits leave
    /// the position unchanged.
    pub fn update_spar_position(&mut self, uid: &str, edit: impl FnOnce(&mut SparPosition)) -> Result<()> {
        let position = self
            .spar_positions
            .get_mut(uid)
            .ok_or_else(|| Error::not_found(EntityKind::SparPosition, uid))?;
        let mut edited = position.clone();
        edit(&mut edited);
        if edited.uid != uid {
            return Err(Error::config(uid, "UIDs can only be changed with rename_uid"));
        }
        *position = edited;
        self.invalidate();
        Ok(())
    }

    pub fn set_spar_position_eta(&mut self, uid: &str, eta: f64) -> Result<()> {
        self.update_spar_position(uid, |p| p.location = SparPositionLocation::Eta(eta))
    }

    pub fn set_spar_position_xsi(&mut self, uid: &str, xsi: f64) -> Result<()> {
        self.update_spar_position(uid, |p| p.xsi = xsi)
    }

    pub fn set_spar_position_element(&mut self, uid: &str, element_uid: &str) -> Result<()> {
        self.update_spar_position(uid, |p| p.location = SparPositionLocation::ElementUid(element_uid.to_owned()))
    }

    /// Edit a spar segment definition. Rejected edits leave the spar unchanged.
    pub fn update_spar_segment(&mut self, uid: &str, edit: impl FnOnce(&mut SparSegmentDef)) -> Result<()> {
        let spar = self
            .spar_segments
            .get_mut(uid)
            .ok_or_else(|| Error::not_found(EntityKind::SparSegment, uid))?;
        let mut def = spar.definition().clone();
        edit(&mut def);
        if def.uid != uid {
            return Err(Error::config(uid, "UIDs can only be changed with rename_uid"));
        }
        check_spar_def(&def)?;
        *spar.definition_mut() = def;
        self.invalidate();
        Ok(())
    }

    /// Edit the declarative form of a ribs definition. The result is
    /// validated again; rejected edits leave the ribs unchanged.
    pub fn update_ribs_definition(&mut self, uid: &str, edit: impl FnOnce(&mut RibsDef)) -> Result<()> {
        let ribs = self
            .ribs_definitions
            .get_mut(uid)
            .ok_or_else(|| Error::not_found(EntityKind::RibsDefinition, uid))?;
        let mut def = ribs.to_definition();
        edit(&mut def);
        if def.uid != uid {
            return Err(Error::config(uid, "UIDs can only be changed with rename_uid"));
        }
        *ribs = RibsDefinition::new(def)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_rib_x_rotation(&mut self, uid: &str, degrees: f64) -> Result<()> {
        let ribs = self
            .ribs_definitions
            .get_mut(uid)
            .ok_or_else(|| Error::not_found(EntityKind::RibsDefinition, uid))?;
        ribs.cross_section_mut().x_rotation = degrees;
        self.invalidate();
        Ok(())
    }

    /// Rename an entity and rewrite every reference to it.
    ///
    /// Spar positions are searched first, then spar segments, then ribs
    /// definitions.
    pub fn rename_uid(&mut self, old: &str, new: &str) -> Result<()> {
        let taken = |ok: bool| if ok { Ok(()) } else { Err(Error::config(new, "UID already in use")) };
        if self.spar_positions.contains(old) {
            taken(self.spar_positions.rename(old, new))?;
            for spar in self.spar_segments.iter_mut() {
                for position in spar.definition_mut().position_uids.iter_mut().filter(|p| p.as_str() == old) {
                    *position = new.to_owned();
                }
            }
            for ribs in self.ribs_definitions.iter_mut() {
                ribs.positioning_mut().rename_spar_position(old, new);
            }
        } else if self.spar_segments.contains(old) {
            taken(self.spar_segments.rename(old, new))?;
            for ribs in self.ribs_definitions.iter_mut() {
                ribs.positioning_mut().rename_spar(old, new);
            }
        } else if self.ribs_definitions.contains(old) {
            taken(self.ribs_definitions.rename(old, new))?;
        } else {
            return Err(Error::not_found(EntityKind::Entity, old));
        }
        debug!(old, new, "renamed entity");
        self.invalidate();
        Ok(())
    }
}

impl fmt::Debug for CsStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsStructure")
            .field("reference", &self.reference.uid())
            .field("spar_positions", &self.spar_positions)
            .field("spar_segments", &self.spar_segments)
            .field("ribs_definitions", &self.ribs_definitions)
            .finish()
    }
}
