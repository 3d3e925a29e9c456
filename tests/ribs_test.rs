mod common;

use approx::assert_relative_eq;
use common::*;
use wingstruct::structure::{
    RibBoundary, RibCount, RibExplicitPositioning, RibPoint, RibPositioning, RotationReference,
};
use wingstruct::{
    CapSide, CoordinateSystem, CsStructure, EntityKind, Error, LineRef, Point3, RibsDef, SectionedWing,
    StructureDef, Vector3, WingSection, WingStructureReference,
};

const UPPER_PROFILE_LENGTH: f64 = 1.6 + 2.0 * 0.282_842_712_474_619;

fn height(points: impl Iterator<Item = Point3>) -> f64 {
    let zs: Vec<f64> = points.map(|p| p.z).collect();
    zs.iter().cloned().fold(f64::MIN, f64::max) - zs.iter().cloned().fold(f64::MAX, f64::min)
}

#[test]
fn rib_set_is_evenly_spaced() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition("ribs").unwrap();
    assert_eq!(ribs.number_of_ribs().unwrap(), 4);
    assert_relative_eq!(ribs.reference_eta_start().unwrap(), 0.15);
    assert_relative_eq!(ribs.reference_eta_end().unwrap(), 0.75);
    let span = ribs.reference_eta_end().unwrap() - ribs.reference_eta_start().unwrap();
    assert_relative_eq!(ribs.reference_eta_offset().unwrap() * 3.0, span, epsilon = 1e-9);
    for (n, y) in [(1, 1.5), (2, 3.5), (3, 5.5), (4, 7.5)] {
        let points = ribs.midplane_points(n, CoordinateSystem::Wing).unwrap();
        assert_relative_eq!(points.start, Point3::new(0.0, y, 0.0), epsilon = 1e-9);
        assert_relative_eq!(points.end, Point3::new(2.0, y, 0.0), epsilon = 1e-9);
    }
}

#[test]
fn rib_faces_are_wing_sections() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition("ribs").unwrap();
    let geometry = ribs.geometry(CoordinateSystem::Wing).unwrap();
    assert_eq!(geometry.faces.len(), 4);
    assert_relative_eq!(geometry.area(), 4.0 * SECTION_AREA, epsilon = 1e-6);
    let face = ribs.rib_face(2, CoordinateSystem::Wing).unwrap();
    assert!(face.vertices().all(|p| (p.y - 3.5).abs() < 1e-9));
    assert!(!ribs.cut_geometry(2).unwrap().is_target_face);
}

#[test]
fn spar_splits_every_rib() {
    let cs = structure(vec![]);
    let splitted = cs.ribs_definition("ribs").unwrap().splitted_geometry(CoordinateSystem::Wing).unwrap();
    assert_eq!(splitted.faces.len(), 8);
    assert_relative_eq!(splitted.area(), 4.0 * SECTION_AREA, epsilon = 1e-6);
}

#[test]
fn rib_caps() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition("ribs").unwrap();
    assert!(ribs.has_caps());
    let upper = ribs.caps_geometry(CapSide::Upper, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(upper.edge_length(), 4.0 * UPPER_PROFILE_LENGTH, epsilon = 1e-6);
    let lower = ribs.caps_geometry(CapSide::Lower, CoordinateSystem::Wing);
    assert!(matches!(lower, Err(Error::Config { .. })));
}

#[test]
fn rib_index_is_checked() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition("ribs").unwrap();
    assert!(matches!(ribs.cut_geometry(0), Err(Error::Index { .. })));
    assert!(matches!(ribs.cut_geometry(5), Err(Error::Index { index: 5, count: 4, .. })));
    assert!(matches!(ribs.rib_face(5, CoordinateSystem::Wing), Err(Error::Index { .. })));
    assert!(matches!(ribs.midplane_points(9, CoordinateSystem::Global), Err(Error::Index { .. })));
}

#[test]
fn spacing_sets_the_count() {
    let def = RibsDef::set(
        "spaced",
        rib_set(
            LineRef::LeadingEdge,
            LineRef::TrailingEdge,
            RibBoundary::Eta(0.12),
            RibBoundary::Eta(0.92),
            RibCount::Spacing(2.0),
        ),
    );
    let cs = structure(vec![def]);
    let ribs = cs.ribs_definition("spaced").unwrap();
    assert_eq!(ribs.number_of_ribs().unwrap(), 5);
    assert_relative_eq!(ribs.reference_eta_offset().unwrap(), 0.2, epsilon = 1e-12);
    let last = ribs.midplane_points(5, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(last.start, Point3::new(0.0, 9.2, 0.0), epsilon = 1e-9);
}

#[test]
fn single_rib_has_no_offset() {
    let def = RibsDef::set(
        "single",
        rib_set(
            LineRef::LeadingEdge,
            LineRef::TrailingEdge,
            RibBoundary::Eta(0.33),
            RibBoundary::Eta(0.9),
            RibCount::NumberOfRibs(1),
        ),
    );
    let cs = structure(vec![def]);
    let ribs = cs.ribs_definition("single").unwrap();
    assert_eq!(ribs.number_of_ribs().unwrap(), 1);
    assert_relative_eq!(ribs.reference_eta_offset().unwrap(), 0.0);
    assert_relative_eq!(ribs.midplane_points(1, CoordinateSystem::Wing).unwrap().start.y, 3.3, epsilon = 1e-9);
}

#[test]
fn invalid_counts_are_rejected() {
    let mut cs = structure(vec![]);
    let err = cs.update_ribs_definition("ribs", |r| {
        if let Some(set) = r.ribs_positioning.as_mut() {
            set.count = RibCount::NumberOfRibs(0);
        }
    });
    assert!(matches!(err, Err(Error::Config { .. })));
    let err = cs.update_ribs_definition("ribs", |r| {
        if let Some(set) = r.ribs_positioning.as_mut() {
            set.count = RibCount::Spacing(0.0);
        }
    });
    assert!(matches!(err, Err(Error::Config { .. })));
    assert_eq!(cs.ribs_definition("ribs").unwrap().number_of_ribs().unwrap(), 4);
}

#[test]
fn section_element_starts_a_set() {
    let def = RibsDef::set(
        "from_mid",
        rib_set(
            LineRef::LeadingEdge,
            LineRef::TrailingEdge,
            RibBoundary::ElementUid("mid".into()),
            RibBoundary::Eta(0.9),
            RibCount::NumberOfRibs(3),
        ),
    );
    let cs = structure(vec![def]);
    let ribs = cs.ribs_definition("from_mid").unwrap();
    assert_relative_eq!(ribs.reference_eta_start().unwrap(), 0.5, epsilon = 1e-9);
    let first = ribs.cut_geometry(1).unwrap();
    assert!(first.is_target_face);
    assert_relative_eq!(first.face.area(), SECTION_AREA, epsilon = 1e-9);
    assert!(!ribs.cut_geometry(2).unwrap().is_target_face);
    let points = ribs.midplane_points(3, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.end, Point3::new(2.0, 9.0, 0.0), epsilon = 1e-9);
}

#[test]
fn ribs_along_a_spar_start_at_its_position() {
    let mut set = rib_set(
        LineRef::Spar("front".into()),
        LineRef::TrailingEdge,
        RibBoundary::SparPositionUid("front_root".into()),
        RibBoundary::Eta(0.8),
        RibCount::NumberOfRibs(3),
    );
    set.rib_reference = LineRef::Spar("front".into());
    let cs = structure(vec![RibsDef::set("aft", set)]);
    let ribs = cs.ribs_definition("aft").unwrap();
    assert_relative_eq!(ribs.reference_eta_start().unwrap(), 0.0, epsilon = 1e-9);

    // the root rib is the root section behind the spar
    let root = ribs.cut_geometry(1).unwrap();
    assert!(root.is_target_face);
    assert!(root.face.vertices().all(|p| p.x >= 0.6 - 1e-9));
    assert_relative_eq!(root.face.area(), 0.52, epsilon = 1e-6);

    let geometry = ribs.geometry(CoordinateSystem::Wing).unwrap();
    for face in &geometry.faces {
        assert_relative_eq!(face.area(), 0.52, epsilon = 1e-6);
    }
    let points = ribs.midplane_points(2, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.6, 4.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(points.end, Point3::new(2.0, 4.0, 0.0), epsilon = 1e-9);
}

#[test]
fn spar_position_bound_needs_spar_reference() {
    let set = rib_set(
        LineRef::LeadingEdge,
        LineRef::TrailingEdge,
        RibBoundary::SparPositionUid("front_root".into()),
        RibBoundary::Eta(0.8),
        RibCount::NumberOfRibs(2),
    );
    let cs = structure(vec![RibsDef::set("bad", set)]);
    let err = cs.ribs_definition("bad").unwrap().number_of_ribs();
    assert!(matches!(err, Err(Error::Config { .. })));
}

#[test]
fn spar_rotation_reference_must_be_rib_reference() {
    let mut set = rib_set(
        LineRef::LeadingEdge,
        LineRef::TrailingEdge,
        RibBoundary::Eta(0.2),
        RibBoundary::Eta(0.8),
        RibCount::NumberOfRibs(2),
    );
    set.rotation.reference = Some(RotationReference::Line(LineRef::Spar("front".into())));
    let cs = structure(vec![RibsDef::set("bad", set)]);
    let err = cs.ribs_definition("bad").unwrap().cut_geometry(1);
    assert!(matches!(err, Err(Error::Config { .. })));
}

#[test]
fn global_y_rotation_reference() {
    let mut cs = structure(vec![]);
    cs.update_ribs_definition("ribs", |r| {
        if let Some(set) = r.ribs_positioning.as_mut() {
            set.rotation.reference = Some(RotationReference::GlobalY);
        }
    })
    .unwrap();
    let ribs = cs.ribs_definition("ribs").unwrap();
    let face = ribs.rib_face(1, CoordinateSystem::Wing).unwrap();
    assert!(face.vertices().all(|p| (p.y - 1.5).abs() < 1e-9));
}

#[test]
fn global_x_rotation_reference() {
    let mut cs = structure(vec![]);
    cs.update_ribs_definition("ribs", |r| {
        if let Some(set) = r.ribs_positioning.as_mut() {
            set.rotation.reference = Some(RotationReference::GlobalX);
            set.rotation.z = 170.0;
        }
    })
    .unwrap();
    let ribs = cs.ribs_definition("ribs").unwrap();
    let sweep = 10f64.to_radians();
    let points = ribs.midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.0, 1.5, 0.0), epsilon = 1e-9);
    assert_relative_eq!(points.end, Point3::new(2.0, 1.5 - 2.0 * sweep.tan(), 0.0), epsilon = 1e-9);
    let face = ribs.rib_face(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(face.area(), SECTION_AREA / sweep.cos(), epsilon = 1e-6);
}

#[test]
fn x_rotation_tilts_the_ribs() {
    let mut cs = structure(vec![]);
    let normal = cs.reference().midplane_normal(0.15).unwrap();
    assert_relative_eq!(normal, Vector3::z(), epsilon = 1e-12);

    // at 90 degrees the rib plane holds the midplane normal
    cs.set_rib_x_rotation("ribs", 90.0).unwrap();
    let upright = cs.ribs_definition("ribs").unwrap().rib_face(1, CoordinateSystem::Wing).unwrap();
    assert!(upright.vertices().all(|p| (p.y - 1.5).abs() < 1e-9));
    assert_relative_eq!(height(upright.vertices()), 0.4, epsilon = 1e-9);

    // 90 - x_rotation around the rib direction (+x)
    for (rotation, slope) in [(80.0, 1.0), (100.0, -1.0)] {
        cs.set_rib_x_rotation("ribs", rotation).unwrap();
        assert!(!cs.ribs_definition("ribs").unwrap().is_built());
        let tilted = cs.ribs_definition("ribs").unwrap().rib_face(1, CoordinateSystem::Wing).unwrap();
        let tan = slope * 10f64.to_radians().tan();
        assert!(tilted.vertices().all(|p| (p.y - 1.5 - p.z * tan).abs() < 1e-9));
        assert!(tilted.area() > SECTION_AREA);
    }
}

#[test]
fn spacing_set_ends_at_spar_position() {
    let mut set = rib_set(
        LineRef::Spar("front".into()),
        LineRef::TrailingEdge,
        RibBoundary::Eta(0.2),
        RibBoundary::SparPositionUid("front_tip".into()),
        RibCount::Spacing(2.0),
    );
    set.rib_reference = LineRef::Spar("front".into());
    let cs = structure(vec![RibsDef::set("aft", set)]);
    let ribs = cs.ribs_definition("aft").unwrap();
    assert_relative_eq!(ribs.reference_eta_end().unwrap(), 1.0, epsilon = 1e-9);
    assert_eq!(ribs.number_of_ribs().unwrap(), 5);

    let last = ribs.cut_geometry(5).unwrap();
    assert!(last.is_target_face);
    assert_relative_eq!(last.face.area(), 0.52, epsilon = 1e-6);
    assert!(last.face.vertices().all(|p| (p.y - 10.0).abs() < 1e-9 && p.x >= 0.6 - 1e-9));
    assert!(!ribs.cut_geometry(4).unwrap().is_target_face);
    let points = ribs.midplane_points(4, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.6, 8.0, 0.0), epsilon = 1e-9);
}

#[test]
fn spacing_set_ends_at_section_element() {
    let def = RibsDef::set(
        "to_mid",
        rib_set(
            LineRef::LeadingEdge,
            LineRef::TrailingEdge,
            RibBoundary::Eta(0.1),
            RibBoundary::ElementUid("mid".into()),
            RibCount::Spacing(2.0),
        ),
    );
    let cs = structure(vec![def]);
    let ribs = cs.ribs_definition("to_mid").unwrap();
    assert_relative_eq!(ribs.reference_eta_end().unwrap(), 0.5, epsilon = 1e-9);
    assert_eq!(ribs.number_of_ribs().unwrap(), 3);
    let last = ribs.cut_geometry(3).unwrap();
    assert!(last.is_target_face);
    assert!(last.face.vertices().all(|p| (p.y - 5.0).abs() < 1e-9));
    assert_relative_eq!(last.face.area(), SECTION_AREA, epsilon = 1e-9);
    assert!(!ribs.cut_geometry(2).unwrap().is_target_face);
}

#[test]
fn explicit_rib_from_spar_to_trailing_edge() {
    let mut cs = structure(vec![]);
    let (position, rib) = explicit_rib(0.45);
    cs.add_spar_position(position).unwrap();
    cs.add_ribs_definition(rib).unwrap();
    let ribs = cs.ribs_definition("explicit").unwrap();
    assert_eq!(ribs.number_of_ribs().unwrap(), 1);
    let points = ribs.midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.6, 4.5, 0.0), epsilon = 1e-9);
    assert_relative_eq!(points.end, Point3::new(2.0, 4.5, 0.0), epsilon = 1e-9);
    let geometry = ribs.geometry(CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(geometry.area(), 0.52, epsilon = 1e-6);
    assert!(geometry.vertices().all(|p| p.x >= 0.6 - 1e-9));
    assert!(matches!(ribs.reference_eta_start(), Err(Error::Config { .. })));
}

#[test]
fn explicit_rib_takes_its_height_from_the_spar() {
    let rib = RibsDef::explicit(
        "on_spar",
        RibExplicitPositioning {
            start: RibPoint::Curve { reference: LineRef::Spar("front".into()), eta: 0.45 },
            end: RibPoint::Curve { reference: LineRef::TrailingEdge, eta: 0.45 },
            rib_start: LineRef::Spar("front".into()),
            rib_end: LineRef::TrailingEdge,
        },
    );
    let cs = structure(vec![rib]);
    let ribs = cs.ribs_definition("on_spar").unwrap();
    let points = ribs.midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.6, 4.5, 0.0), epsilon = 1e-9);
    let geometry = ribs.geometry(CoordinateSystem::Wing).unwrap();
    assert!(geometry.vertices().all(|p| (p.y - 4.5).abs() < 1e-9 && p.x >= 0.6 - 1e-9));
    assert_relative_eq!(geometry.area(), 0.52, epsilon = 1e-6);
}

#[test]
fn explicit_rib_without_up_vectors_stands_on_the_midplane() {
    // dihedral wing: the midplane normal leans away from the global z axis
    let wing = SectionedWing::new(
        "wing",
        vec![
            WingSection::new("root", Point3::new(0.0, 0.0, 0.0), 2.0, 0.2),
            WingSection::new("tip", Point3::new(0.0, 10.0, 1.0), 2.0, 0.2),
        ],
    )
    .unwrap();
    let rib = RibsDef::explicit(
        "chord",
        RibExplicitPositioning {
            start: RibPoint::Curve { reference: LineRef::LeadingEdge, eta: 0.35 },
            end: RibPoint::Curve { reference: LineRef::TrailingEdge, eta: 0.35 },
            rib_start: LineRef::LeadingEdge,
            rib_end: LineRef::TrailingEdge,
        },
    );
    let def = StructureDef { ribs_definitions: vec![rib], ..Default::default() };
    let cs = CsStructure::new(def, Box::new(wing)).unwrap();
    let ribs = cs.ribs_definition("chord").unwrap();

    let points = ribs.midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.0, 3.5, 0.35), epsilon = 1e-9);
    assert_relative_eq!(points.end, Point3::new(2.0, 3.5, 0.35), epsilon = 1e-9);

    let normal = cs.reference().midplane_normal(0.35).unwrap();
    assert_relative_eq!(normal, Vector3::new(0.0, -1.0, 10.0).normalize(), epsilon = 1e-9);
    // the face is spanned by the rib direction and the midplane normal
    let plane_normal = Vector3::x().cross(&normal);
    let face = ribs.rib_face(1, CoordinateSystem::Wing).unwrap();
    assert!(face.vertices().all(|p| (p - points.start).dot(&plane_normal).abs() < 1e-9));
    assert!(height(face.vertices()) > 0.3);
    assert!(plane_normal.z.abs() > 0.05);
}

#[test]
fn explicit_rib_follows_its_position() {
    let mut cs = structure(vec![]);
    let (position, rib) = explicit_rib(0.45);
    cs.add_spar_position(position).unwrap();
    cs.add_ribs_definition(rib).unwrap();
    let before = cs.ribs_definition("explicit").unwrap().midplane_points(1, CoordinateSystem::Wing).unwrap();

    cs.set_spar_position_eta("rib_pos", 0.55).unwrap();
    cs.update_ribs_definition("explicit", |r| {
        if let Some(p) = r.explicit_positioning.as_mut() {
            p.end = RibPoint::Curve { reference: LineRef::TrailingEdge, eta: 0.55 };
        }
    })
    .unwrap();
    let after = cs.ribs_definition("explicit").unwrap().midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(after.start.y - before.start.y, 1.0, epsilon = 1e-9);
    assert_relative_eq!(after.end.y - before.end.y, 1.0, epsilon = 1e-9);
}

#[test]
fn explicit_rib_in_a_section_is_the_section_face() {
    let rib = RibsDef::explicit(
        "root_rib",
        wingstruct::structure::RibExplicitPositioning {
            start: RibPoint::EtaXsi { eta: 0.0, xsi: 0.2, reference_uid: Some("wing".into()) },
            end: RibPoint::EtaXsi { eta: 0.0, xsi: 0.8, reference_uid: None },
            rib_start: LineRef::LeadingEdge,
            rib_end: LineRef::TrailingEdge,
        },
    );
    let cs = structure(vec![rib]);
    let ribs = cs.ribs_definition("root_rib").unwrap();
    let cut = ribs.cut_geometry(1).unwrap();
    assert!(cut.is_target_face);
    assert_relative_eq!(ribs.geometry(CoordinateSystem::Wing).unwrap().area(), SECTION_AREA, epsilon = 1e-9);
    let points = ribs.midplane_points(1, CoordinateSystem::Wing).unwrap();
    assert_relative_eq!(points.start, Point3::new(0.4, 0.0, 0.0), epsilon = 1e-12);
}

#[test]
fn explicit_point_on_foreign_reference() {
    let rib = RibsDef::explicit(
        "foreign",
        wingstruct::structure::RibExplicitPositioning {
            start: RibPoint::EtaXsi { eta: 0.3, xsi: 0.2, reference_uid: Some("other_wing".into()) },
            end: RibPoint::EtaXsi { eta: 0.3, xsi: 0.8, reference_uid: None },
            rib_start: LineRef::LeadingEdge,
            rib_end: LineRef::TrailingEdge,
        },
    );
    let cs = structure(vec![rib]);
    let err = cs.ribs_definition("foreign").unwrap().cut_geometry(1).unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: EntityKind::WingReference, .. }));
}

#[test]
fn invalidate_is_idempotent() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition("ribs").unwrap();
    let first = ribs.geometry(CoordinateSystem::Wing).unwrap();
    cs.invalidate();
    cs.invalidate();
    assert!(!ribs.is_built());
    let again = ribs.geometry(CoordinateSystem::Wing).unwrap();
    assert_eq!(*first, *again);
}

#[test]
fn positioning_mode_survives_round_trip() {
    let cs = structure(vec![]);
    let ribs = cs.ribs_definition_at(1).unwrap();
    assert!(matches!(ribs.positioning(), RibPositioning::Set(_)));
    assert_eq!(cs.ribs_definition_count(), 1);
}
