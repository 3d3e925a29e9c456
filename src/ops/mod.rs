//! Shape construction operations: faces from wires, ruled faces, wire
//! assembly from loose edges and profile lofts.
//!
//! Together with `boolean` these are the kernel services consumed by the
//! structure builders.

pub mod face;
pub mod loft;
pub mod wire;

pub use face::{make_face, quad_face, ruled_face, ruled_face_along};
pub use loft::{loft_faces, LoftRange};
pub use wire::{connect_edges, end_points, min_max_point, nearest_face};
