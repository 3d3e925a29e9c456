//! Declarative structure description.
//!
//! This is the persistent, serde-backed form of a wing structure: spar
//! positions, spar segments and ribs definitions as they are read from and
//! written to JSON. Nothing here is geometric; the builders in the sibling
//! modules derive all geometry on demand.
//!
//! Choices are sum types. Reference lines serialise as the strings
//! `"leadingEdge"`, `"trailingEdge"` or the UID of a spar segment.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::spar_position::SparPosition;
use crate::error::{Error, Result};

fn right_angle() -> f64 {
    90.0
}

fn is_right_angle(v: &f64) -> bool {
    *v == 90.0
}

// --- Reference lines ---

/// A named line ribs are positioned along or trimmed against.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineRef {
    LeadingEdge,
    TrailingEdge,
    /// Midplane line of the spar segment with this UID.
    Spar(String),
}

impl LineRef {
    pub fn spar_uid(&self) -> Option<&str> {
        match self {
            LineRef::Spar(uid) => Some(uid),
            _ => None,
        }
    }

    pub fn is_edge(&self) -> bool {
        self.spar_uid().is_none()
    }

    pub(crate) fn rename_spar(&mut self, old: &str, new: &str) {
        if let LineRef::Spar(uid) = self {
            if uid == old {
                *uid = new.to_owned();
            }
        }
    }
}

impl From<String> for LineRef {
    fn from(s: String) -> Self {
        match s.as_str() {
            "leadingEdge" => LineRef::LeadingEdge,
            "trailingEdge" => LineRef::TrailingEdge,
            _ => LineRef::Spar(s),
        }
    }
}

impl From<LineRef> for String {
    fn from(line: LineRef) -> Self {
        line.to_string()
    }
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::LeadingEdge => f.write_str("leadingEdge"),
            LineRef::TrailingEdge => f.write_str("trailingEdge"),
            LineRef::Spar(uid) => f.write_str(uid),
        }
    }
}

/// What the rib z-rotation is measured from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RotationReference {
    Line(LineRef),
    GlobalX,
    GlobalY,
}

impl From<String> for RotationReference {
    fn from(s: String) -> Self {
        match s.as_str() {
            "globalX" => RotationReference::GlobalX,
            "globalY" => RotationReference::GlobalY,
            _ => RotationReference::Line(LineRef::from(s)),
        }
    }
}

impl From<RotationReference> for String {
    fn from(r: RotationReference) -> Self {
        match r {
            RotationReference::GlobalX => "globalX".into(),
            RotationReference::GlobalY => "globalY".into(),
            RotationReference::Line(line) => line.into(),
        }
    }
}

// --- Cross sections ---

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cap {
    #[serde(default)]
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_uid: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparCrossSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_cap: Option<Cap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_cap: Option<Cap>,
    /// Only 90 degrees is supported geometrically.
    #[serde(default = "right_angle", skip_serializing_if = "is_right_angle")]
    pub rotation: f64,
}

impl Default for SparCrossSection {
    fn default() -> Self {
        Self { upper_cap: None, lower_cap: None, rotation: right_angle() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibCrossSection {
    /// Angle between rib plane and midplane around the rib direction.
    #[serde(default = "right_angle", skip_serializing_if = "is_right_angle")]
    pub x_rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_cap: Option<Cap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_cap: Option<Cap>,
}

impl Default for RibCrossSection {
    fn default() -> Self {
        Self { x_rotation: right_angle(), upper_cap: None, lower_cap: None }
    }
}

// --- Spars ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparSegmentDef {
    pub uid: String,
    /// Spar positions from inner to outer.
    pub position_uids: Vec<String>,
    #[serde(default)]
    pub cross_section: SparCrossSection,
}

// --- Ribs ---

/// Where a set of ribs starts or ends along its reference line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RibBoundary {
    Eta(f64),
    ElementUid(String),
    SparPositionUid(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RibCount {
    NumberOfRibs(u32),
    /// Distance between ribs along the reference line.
    Spacing(f64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RibCrossing {
    #[default]
    Cross,
    End,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RibRotation {
    #[serde(default = "right_angle")]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<RotationReference>,
}

impl Default for RibRotation {
    fn default() -> Self {
        Self { z: right_angle(), reference: None }
    }
}

/// A set of ribs distributed along a reference line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibsPositioning {
    pub rib_reference: LineRef,
    pub start: RibBoundary,
    pub end: RibBoundary,
    pub rib_start: LineRef,
    pub rib_end: LineRef,
    pub count: RibCount,
    #[serde(default)]
    pub crossing: RibCrossing,
    #[serde(default)]
    pub rotation: RibRotation,
}

/// One end point of an explicitly positioned rib.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RibPoint {
    EtaXsi {
        eta: f64,
        xsi: f64,
        /// Must name the wing structure reference when present.
        #[serde(default, rename = "referenceUid", skip_serializing_if = "Option::is_none")]
        reference_uid: Option<String>,
    },
    Curve {
        reference: LineRef,
        eta: f64,
    },
    SparPosition(String),
}

/// A single rib between two resolved points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibExplicitPositioning {
    pub start: RibPoint,
    pub end: RibPoint,
    pub rib_start: LineRef,
    pub rib_end: LineRef,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RibPositioning {
    Set(RibsPositioning),
    Explicit(RibExplicitPositioning),
}

impl RibPositioning {
    pub fn rib_start(&self) -> &LineRef {
        match self {
            RibPositioning::Set(p) => &p.rib_start,
            RibPositioning::Explicit(p) => &p.rib_start,
        }
    }

    pub fn rib_end(&self) -> &LineRef {
        match self {
            RibPositioning::Set(p) => &p.rib_end,
            RibPositioning::Explicit(p) => &p.rib_end,
        }
    }

    /// Point every reference to spar position `old` at `new`.
    pub(crate) fn rename_spar_position(&mut self, old: &str, new: &str) {
        let rename = |uid: &mut String| {
            if uid == old {
                *uid = new.to_owned();
            }
        };
        match self {
            RibPositioning::Set(p) => {
                for boundary in [&mut p.start, &mut p.end] {
                    if let RibBoundary::SparPositionUid(uid) = boundary {
                        rename(uid);
                    }
                }
            }
            RibPositioning::Explicit(p) => {
                for point in [&mut p.start, &mut p.end] {
                    if let RibPoint::SparPosition(uid) = point {
                        rename(uid);
                    }
                }
            }
        }
    }

    /// Point every reference to spar segment `old` at `new`.
    pub(crate) fn rename_spar(&mut self, old: &str, new: &str) {
        match self {
            RibPositioning::Set(p) => {
                for line in [&mut p.rib_reference, &mut p.rib_start, &mut p.rib_end] {
                    line.rename_spar(old, new);
                }
                if let Some(RotationReference::Line(line)) = &mut p.rotation.reference {
                    line.rename_spar(old, new);
                }
            }
            RibPositioning::Explicit(p) => {
                p.rib_start.rename_spar(old, new);
                p.rib_end.rename_spar(old, new);
                for point in [&mut p.start, &mut p.end] {
                    if let RibPoint::Curve { reference, .. } = point {
                        reference.rename_spar(old, new);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibsDef {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ribs_positioning: Option<RibsPositioning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_positioning: Option<RibExplicitPositioning>,
    #[serde(default)]
    pub cross_section: RibCrossSection,
}

impl RibsDef {
    pub fn set(uid: impl Into<String>, positioning: RibsPositioning) -> Self {
        Self {
            uid: uid.into(),
            ribs_positioning: Some(positioning),
            explicit_positioning: None,
            cross_section: RibCrossSection::default(),
        }
    }

    pub fn explicit(uid: impl Into<String>, positioning: RibExplicitPositioning) -> Self {
        Self {
            uid: uid.into(),
            ribs_positioning: None,
            explicit_positioning: Some(positioning),
            cross_section: RibCrossSection::default(),
        }
    }

    /// The active positioning mode. Exactly one must be declared.
    pub fn positioning(&self) -> Result<RibPositioning> {
        match (&self.ribs_positioning, &self.explicit_positioning) {
            (Some(set), None) => Ok(RibPositioning::Set(set.clone())),
            (None, Some(explicit)) => Ok(RibPositioning::Explicit(explicit.clone())),
            (None, None) => {
                Err(Error::config(&self.uid, "neither ribs positioning nor explicit rib positioning is defined"))
            }
            (Some(_), Some(_)) => {
                Err(Error::config(&self.uid, "both ribs positioning and explicit rib positioning are defined"))
            }
        }
    }
}

/// The complete structure of one wing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDef {
    #[serde(default)]
    pub spar_positions: Vec<SparPosition>,
    #[serde(default)]
    pub spar_segments: Vec<SparSegmentDef>,
    #[serde(default)]
    pub ribs_definitions: Vec<RibsDef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_refs_parse_from_strings() {
        let lines: Vec<LineRef> = serde_json::from_str(r#"["leadingEdge", "trailingEdge", "spar1"]"#).unwrap();
        assert_eq!(lines, vec![LineRef::LeadingEdge, LineRef::TrailingEdge, LineRef::Spar("spar1".into())]);
        let r: RotationReference = serde_json::from_str(r#""globalY""#).unwrap();
        assert_eq!(r, RotationReference::GlobalY);
    }

    #[test]
    fn ribs_set_with_defaults() {
        let json = r#"{
            "uid": "ribs1",
            "ribsPositioning": {
                "ribReference": "leadingEdge",
                "start": {"eta": 0.1},
                "end": {"sparPositionUid": "p2"},
                "ribStart": "leadingEdge",
                "ribEnd": "spar1",
                "count": {"numberOfRibs": 5}
            }
        }"#;
        let def: RibsDef = serde_json::from_str(json).unwrap();
        let RibPositioning::Set(set) = def.positioning().unwrap() else { panic!("expected set") };
        assert_eq!(set.end, RibBoundary::SparPositionUid("p2".into()));
        assert_eq!(set.count, RibCount::NumberOfRibs(5));
        assert_eq!(set.rotation, RibRotation::default());
        assert_eq!(set.crossing, RibCrossing::Cross);
        assert_eq!(def.cross_section.x_rotation, 90.0);
    }

    #[test]
    fn explicit_points() {
        let json = r#"{
            "start": {"etaXsi": {"eta": 0.0, "xsi": 0.2, "referenceUid": "wing"}},
            "end": {"curve": {"reference": "trailingEdge", "eta": 0.4}},
            "ribStart": "leadingEdge",
            "ribEnd": "trailingEdge"
        }"#;
        let p: RibExplicitPositioning = serde_json::from_str(json).unwrap();
        assert_eq!(p.start, RibPoint::EtaXsi { eta: 0.0, xsi: 0.2, reference_uid: Some("wing".into()) });
        assert_eq!(p.end, RibPoint::Curve { reference: LineRef::TrailingEdge, eta: 0.4 });
    }

    #[test]
    fn missing_positioning_is_config_error() {
        let def: RibsDef = serde_json::from_str(r#"{"uid": "r"}"#).unwrap();
        assert!(matches!(def.positioning(), Err(Error::Config { .. })));
    }
}
