//! Parametric internal structure of aircraft wings.
//!
//! Spars and ribs are declared relative to a wing: spar positions in
//! (eta, xsi) coordinates, spar segments threaded through them, and ribs
//! distributed along reference lines or placed explicitly. [`CsStructure`]
//! turns these declarations into cut faces, trims them against the wing
//! loft and cuts spars and ribs against each other.
//!
//! ```no_run
//! use wingstruct::{CoordinateSystem, CsStructure, Point3, SectionedWing, WingSection};
//!
//! # fn main() -> wingstruct::Result<()> {
//! let wing = SectionedWing::new(
//!     "wing",
//!     vec![
//!         WingSection::new("root", Point3::new(0.0, 0.0, 0.0), 2.0, 0.12),
//!         WingSection::new("tip", Point3::new(0.5, 10.0, 0.0), 1.0, 0.12),
//!     ],
//! )?;
//! let json = std::fs::read_to_string("structure.json").expect("readable file");
//! let structure = CsStructure::from_json(&json, Box::new(wing))?;
//! for spar in structure.spar_segments() {
//!     let faces = spar.splitted_geometry(CoordinateSystem::Global)?;
//!     println!("{}: {} faces", spar.uid(), faces.faces.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod boolean;
pub mod cache;
pub mod curve;
pub mod error;
pub mod math;
pub mod ops;
pub mod structure;
pub mod topo;
pub mod types;
pub mod wing;

pub use boolean::KernelError;
pub use curve::Wire;
pub use error::{EntityKind, Error, Result};
pub use math::{Matrix4, Point2, Point3, Vector3, TOLERANCE};
pub use structure::{
    CsStructure, CutGeometry, LineRef, RibMidplanePoints, RibsDef, RibsDefinitionRef, SparPosition, SparSegmentDef,
    SparSegmentRef, StructureDef,
};
pub use topo::{Edge, Face, Shape};
pub use types::BBox3;
pub use wing::{CapSide, CoordinateSystem, SectionedWing, WingSection, WingStructureReference};
