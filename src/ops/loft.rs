//! Loft operation.
//!
//! Connects consecutive closed profiles with ruled strips. Profiles are
//! given as vertex loops (no repeated closing point) with matching vertex
//! counts; vertex `k` of one profile is ruled to vertex `k` of the next.

use std::ops::Range;

use crate::boolean::KernelError;
use crate::math::Point3;
use crate::topo::Face;

use super::face::quad_face;

/// Profile edges covered by a loft. Edge `k` joins vertex `k` and `k + 1`,
/// wrapping around at the end of the loop.
pub type LoftRange = Range<usize>;

/// Loft the profile edges in `edges` between every pair of consecutive
/// profiles, returning one face per pair.
pub fn loft_faces(profiles: &[Vec<Point3>], edges: LoftRange) -> Result<Vec<Face>, KernelError> {
    if profiles.len() < 2 {
        return Err(KernelError::Degenerate(format!("loft needs at least 2 profiles, got {}", profiles.len())));
    }
    let n = profiles[0].len();
    if n < 3 || profiles.iter().any(|p| p.len() != n) {
        return Err(KernelError::Degenerate("loft profiles must share a vertex count of at least 3".into()));
    }
    if edges.end > n || edges.is_empty() {
        return Err(KernelError::Degenerate(format!("loft edge range {edges:?} outside profile of {n} edges")));
    }

    Ok(profiles
        .windows(2)
        .map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let facets = edges
                .clone()
                .flat_map(|k| {
                    let k1 = (k + 1) % n;
                    quad_face(a[k], a[k1], b[k], b[k1]).facets
                })
                .collect();
            Face::new(facets)
        })
        .collect())
}
