//! Face builders.

use crate::boolean::KernelError;
use crate::curve::Wire;
use crate::math::{lerp, Point3, Vector3, TOLERANCE};
use crate::topo::{Face, Triangle};

/// Subdivisions per direction for a non-planar ruled patch.
const PATCH_DIVISIONS: usize = 8;

fn keep(tri: Triangle) -> Option<Triangle> {
    (tri.area() > TOLERANCE * TOLERANCE).then_some(tri)
}

/// Triangulate the ruled patch spanned by edge `a0a1` and edge `b0b1`.
///
/// Rulings connect `a0` with `b0` and `a1` with `b1`.
fn ruled_patch(a0: Point3, a1: Point3, b0: Point3, b1: Point3) -> Vec<Triangle> {
    let n = (a1 - a0).cross(&(b0 - a0));
    let planar = match n.try_normalize(TOLERANCE * TOLERANCE) {
        Some(n) => (b1 - a0).dot(&n).abs() < TOLERANCE,
        // a0, a1, b0 collinear; let b1 decide via the other diagonal
        None => (b1 - a1).cross(&(b0 - a1)).norm() < TOLERANCE * TOLERANCE,
    };
    if planar {
        return [Triangle::new(a0, a1, b1), Triangle::new(a0, b1, b0)]
            .into_iter()
            .filter_map(keep)
            .collect();
    }

    let at = |u: f64, v: f64| lerp(&lerp(&a0, &a1, u), &lerp(&b0, &b1, u), v);
    let step = 1.0 / PATCH_DIVISIONS as f64;
    let mut facets = Vec::with_capacity(2 * PATCH_DIVISIONS * PATCH_DIVISIONS);
    for i in 0..PATCH_DIVISIONS {
        for j in 0..PATCH_DIVISIONS {
            let (u0, u1) = (i as f64 * step, (i + 1) as f64 * step);
            let (v0, v1) = (j as f64 * step, (j + 1) as f64 * step);
            let (p00, p10, p01, p11) = (at(u0, v0), at(u1, v0), at(u0, v1), at(u1, v1));
            facets.extend([Triangle::new(p00, p10, p11), Triangle::new(p00, p11, p01)].into_iter().filter_map(keep));
        }
    }
    facets
}

/// Planar face bounded by a closed wire, fanned from the vertex centroid.
///
/// The boundary must be star-shaped with respect to its centroid.
pub fn make_face(wire: &Wire) -> Result<Face, KernelError> {
    if !wire.is_closed() {
        return Err(KernelError::OpenWire);
    }
    let pts = &wire.points()[..wire.points().len() - 1];
    if pts.len() < 3 {
        return Err(KernelError::Degenerate("face boundary has fewer than 3 points".into()));
    }
    let centroid = Point3::from(pts.iter().map(|p| p.coords).sum::<Vector3>() / pts.len() as f64);
    let facets: Vec<Triangle> = (0..pts.len())
        .filter_map(|i| keep(Triangle::new(centroid, pts[i], pts[(i + 1) % pts.len()])))
        .collect();
    if facets.is_empty() {
        return Err(KernelError::Degenerate("face boundary encloses no area".into()));
    }
    Ok(Face::new(facets))
}

/// Ruled face between two wires, matched by normalized arclength.
pub fn ruled_face(w1: &Wire, w2: &Wire) -> Result<Face, KernelError> {
    let mut params: Vec<f64> = w1.parameters();
    params.extend(w2.parameters());
    params.sort_by(f64::total_cmp);
    params.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    let facets: Vec<Triangle> = params
        .windows(2)
        .flat_map(|t| ruled_patch(w1.point_at(t[0]), w1.point_at(t[1]), w2.point_at(t[0]), w2.point_at(t[1])))
        .collect();
    if facets.is_empty() {
        return Err(KernelError::Degenerate("ruled face between coincident wires".into()));
    }
    Ok(Face::new(facets))
}

/// Ruled face after orienting both wires so that they run along `dir`.
pub fn ruled_face_along(w1: &Wire, w2: &Wire, dir: &Vector3) -> Result<Face, KernelError> {
    let orient = |w: &Wire| {
        if (w.end() - w.start()).dot(dir) < 0.0 { w.reversed() } else { w.clone() }
    };
    ruled_face(&orient(w1), &orient(w2))
}

/// The ruled face between edge `p1p2` and edge `p3p4`.
pub fn quad_face(p1: Point3, p2: Point3, p3: Point3, p4: Point3) -> Face {
    Face::new(ruled_patch(p1, p2, p3, p4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn planar_quad_has_two_facets() {
        let f = quad_face(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(2.0, 0.0, -1.0),
        );
        assert_eq!(f.facets.len(), 2);
        assert_relative_eq!(f.area(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn twisted_quad_is_subdivided() {
        let f = quad_face(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        );
        assert_eq!(f.facets.len(), 2 * PATCH_DIVISIONS * PATCH_DIVISIONS);
    }

    #[test]
    fn face_from_closed_square() {
        let w = Wire::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ])
        .unwrap();
        let f = make_face(&w).unwrap();
        assert_relative_eq!(f.area(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn open_wire_is_rejected() {
        let w = Wire::new([Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)]).unwrap();
        assert_eq!(make_face(&w), Err(KernelError::OpenWire));
    }

    #[test]
    fn ruled_face_orientation() {
        let a = Wire::segment(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)).unwrap();
        let b = Wire::segment(Point3::new(1.0, 0.0, 1.0), Point3::new(1.0, 0.0, 0.0)).unwrap();
        // opposite runs fold the face over itself
        let folded = |f: &Face| f.facets[0].cross().dot(&f.facets[1].cross()) < 0.0;
        let crossed = ruled_face(&a, &b).unwrap();
        let aligned = ruled_face_along(&a, &b, &Vector3::z()).unwrap();
        assert!(folded(&crossed));
        assert!(!folded(&aligned));
        assert_relative_eq!(aligned.area(), 1.0, epsilon = 1e-12);
    }
}
