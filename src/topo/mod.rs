//! Faceted topology for the structure kernel.
//!
//! Faces are sets of planar triangles, edges are straight segments and a
//! `Shape` is a flat compound of both. There is no shared vertex table:
//! coincidence is decided geometrically within `math::TOLERANCE`.

pub mod types;

pub use types::*;
