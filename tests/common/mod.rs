//! Shared fixture: an unswept, untwisted wing of constant chord.
//!
//! Sections `root`, `mid` and `tip` at y = 0, 5 and 10, chord 2 along +x,
//! thickness 0.2. The default hexagon profile gives a flat top and bottom
//! at z = +-0.2 between x = 0.2 and x = 1.8 and a section area of 0.72.

#![allow(dead_code)]

use wingstruct::structure::{
    RibBoundary, RibCount, RibExplicitPositioning, RibPoint, RibsPositioning, SparCrossSection,
};
use wingstruct::{
    CsStructure, LineRef, Point3, RibsDef, SectionedWing, SparPosition, SparSegmentDef, StructureDef, WingSection,
};

pub const SECTION_AREA: f64 = 0.72;

pub fn wing() -> SectionedWing {
    SectionedWing::new(
        "wing",
        vec![
            WingSection::new("root", Point3::new(0.0, 0.0, 0.0), 2.0, 0.2),
            WingSection::new("mid", Point3::new(0.0, 5.0, 0.0), 2.0, 0.2),
            WingSection::new("tip", Point3::new(0.0, 10.0, 0.0), 2.0, 0.2),
        ],
    )
    .unwrap()
}

pub fn capped() -> SparCrossSection {
    SparCrossSection { upper_cap: Some(Default::default()), lower_cap: Some(Default::default()), ..Default::default() }
}

/// A straight spar at xsi 0.3 from root to tip, i.e. in the plane x = 0.6.
pub fn front_spar() -> (Vec<SparPosition>, SparSegmentDef) {
    let positions = vec![SparPosition::at_eta("front_root", 0.0, 0.3), SparPosition::at_eta("front_tip", 1.0, 0.3)];
    let spar = SparSegmentDef {
        uid: "front".into(),
        position_uids: vec!["front_root".into(), "front_tip".into()],
        cross_section: capped(),
    };
    (positions, spar)
}

pub fn rib_set(
    rib_start: LineRef,
    rib_end: LineRef,
    start: RibBoundary,
    end: RibBoundary,
    count: RibCount,
) -> RibsPositioning {
    RibsPositioning {
        rib_reference: LineRef::LeadingEdge,
        start,
        end,
        rib_start,
        rib_end,
        count,
        crossing: Default::default(),
        rotation: Default::default(),
    }
}

/// Four chordwise ribs from leading to trailing edge at y = 1.5, 3.5, 5.5, 7.5.
pub fn chord_ribs() -> RibsDef {
    let mut def = RibsDef::set(
        "ribs",
        rib_set(
            LineRef::LeadingEdge,
            LineRef::TrailingEdge,
            RibBoundary::Eta(0.15),
            RibBoundary::Eta(0.75),
            RibCount::NumberOfRibs(4),
        ),
    );
    def.cross_section.upper_cap = Some(Default::default());
    def
}

/// One explicit rib from the spar at eta 0.45 back to the trailing edge.
pub fn explicit_rib(eta: f64) -> (SparPosition, RibsDef) {
    let position = SparPosition::at_eta("rib_pos", eta, 0.3);
    let rib = RibsDef::explicit(
        "explicit",
        RibExplicitPositioning {
            start: RibPoint::SparPosition("rib_pos".into()),
            end: RibPoint::Curve { reference: LineRef::TrailingEdge, eta },
            rib_start: LineRef::Spar("front".into()),
            rib_end: LineRef::TrailingEdge,
        },
    );
    (position, rib)
}

pub fn structure(extra_ribs: Vec<RibsDef>) -> CsStructure {
    let (positions, spar) = front_spar();
    let mut ribs = vec![chord_ribs()];
    ribs.extend(extra_ribs);
    let def = StructureDef { spar_positions: positions, spar_segments: vec![spar], ribs_definitions: ribs };
    CsStructure::new(def, Box::new(wing())).unwrap()
}
