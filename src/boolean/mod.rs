//! Intersection and splitting of faceted shapes.
//!
//! These are the cut/section primitives the structure builders rely on:
//! - `section`: intersection edges between two shapes
//! - `split`: faces of a shape divided along the facets of a tool
//! - `face_wire_intersection` / `plane_wire_intersection`: curve hits
//!
//! Coplanar facet pairs never contribute intersection edges. Callers are
//! expected to keep cut surfaces transverse to what they cut.

use rayon::prelude::*;
use thiserror::Error;

use crate::curve::Wire;
use crate::math::{Point3, TOLERANCE};
use crate::topo::*;
use crate::types::BBox3;

/// Errors raised by kernel operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    #[error("wire is not closed")]
    OpenWire,
    #[error("degenerate geometry: {0}")]
    Degenerate(String),
    #[error("expected {expected} wire(s), found {found}")]
    WireCount { expected: &'static str, found: usize },
    #[error("expected at most 2 end vertices, found {0}")]
    EndVertices(usize),
    #[error("shapes do not intersect")]
    NoIntersection,
}

// --- Triangle intersection ---

/// Signed distances of the triangle vertices, snapped to zero within tolerance.
fn snapped_distances(tri: &Triangle, plane: &Plane) -> [f64; 3] {
    tri.vertices().map(|p| {
        let d = plane.signed_distance(&p);
        if d.abs() < TOLERANCE { 0.0 } else { d }
    })
}

/// Segment where `tri` crosses `plane`, if it does so transversally.
fn plane_crossing(tri: &Triangle, plane: &Plane) -> Option<(Point3, Point3)> {
    let d = snapped_distances(tri, plane);
    if d.iter().all(|&x| x > 0.0) || d.iter().all(|&x| x < 0.0) || d.iter().all(|&x| x == 0.0) {
        return None;
    }
    let v = tri.vertices();
    let mut pts: Vec<Point3> = Vec::with_capacity(3);
    for i in 0..3 {
        let j = (i + 1) % 3;
        if d[i] == 0.0 {
            pts.push(v[i]);
        }
        if d[i] * d[j] < 0.0 {
            let t = d[i] / (d[i] - d[j]);
            pts.push(v[i] + (v[j] - v[i]) * t);
        }
    }
    match pts.len() {
        2 => Some((pts[0], pts[1])),
        // one vertex on the plane and the opposite edge crossing it
        3 => {
            let pairs = [(0, 1), (1, 2), (0, 2)];
            let (i, j) = pairs
                .into_iter()
                .max_by(|a, b| {
                    let da = (pts[a.0] - pts[a.1]).norm();
                    let db = (pts[b.0] - pts[b.1]).norm();
                    da.total_cmp(&db)
                })
                .unwrap_or((0, 1));
            Some((pts[i], pts[j]))
        }
        _ => None,
    }
}

/// Intersection segment of two triangles, `None` when they are disjoint,
/// touch in a single point or are coplanar.
pub fn intersect_triangles(t1: &Triangle, t2: &Triangle) -> Option<Edge> {
    let p1 = t1.plane()?;
    let p2 = t2.plane()?;
    let dir = p1.normal.cross(&p2.normal).try_normalize(1e-12)?;

    let (a0, a1) = plane_crossing(t1, &p2)?;
    let (b0, b1) = plane_crossing(t2, &p1)?;

    let (sa0, sa1) = (a0.coords.dot(&dir), a1.coords.dot(&dir));
    let (sb0, sb1) = (b0.coords.dot(&dir), b1.coords.dot(&dir));
    let lo = sa0.min(sa1).max(sb0.min(sb1));
    let hi = sa0.max(sa1).min(sb0.max(sb1));
    if hi - lo < TOLERANCE || (sa1 - sa0).abs() < TOLERANCE {
        return None;
    }
    let at = |s: f64| a0 + (a1 - a0) * ((s - sa0) / (sa1 - sa0));
    Some(Edge::new(at(lo), at(hi)))
}

/// Drop degenerate edges and keep the first of every coincident pair.
pub fn remove_duplicate_edges(edges: Vec<Edge>) -> Vec<Edge> {
    let mut unique: Vec<Edge> = Vec::with_capacity(edges.len());
    for e in edges {
        if !e.is_degenerate() && !unique.iter().any(|u| u.coincides(&e)) {
            unique.push(e);
        }
    }
    unique
}

/// Intersection edges between the facets of `a` and `b`.
///
/// Pairs are evaluated in parallel; the result order follows the facet
/// order of `a` and is therefore deterministic.
pub fn section(a: &Shape, b: &Shape) -> Vec<Edge> {
    let left: Vec<&Triangle> = a.triangles().collect();
    let right: Vec<(&Triangle, BBox3)> = b
        .triangles()
        .map(|t| (t, t.bbox().enlarged(TOLERANCE)))
        .collect();

    let raw: Vec<Edge> = left
        .par_iter()
        .flat_map_iter(|t1| {
            let bb = t1.bbox();
            right
                .iter()
                .filter(move |(_, b2)| b2.overlaps(&bb))
                .filter_map(move |(t2, _)| intersect_triangles(t1, t2))
        })
        .collect();

    remove_duplicate_edges(raw)
}

// --- Curve intersection ---

/// Parameter along `[a, b]` where the segment pierces `tri`.
fn segment_triangle(a: &Point3, b: &Point3, tri: &Triangle) -> Option<f64> {
    let plane = tri.plane()?;
    let da = plane.signed_distance(a);
    let db = plane.signed_distance(b);
    if (da > TOLERANCE && db > TOLERANCE) || (da < -TOLERANCE && db < -TOLERANCE) {
        return None;
    }
    if (da - db).abs() < TOLERANCE * 1e-3 {
        return None;
    }
    let t = (da / (da - db)).clamp(0.0, 1.0);
    let q = a + (b - a) * t;
    (tri.distance_to(&q) <= TOLERANCE).then_some(t)
}

/// First point along `wire` where it meets `face`.
pub fn face_wire_intersection(face: &Face, wire: &Wire) -> Option<Point3> {
    for edge in wire.edges() {
        let hit = face
            .facets
            .iter()
            .filter_map(|tri| segment_triangle(&edge.start, &edge.end, tri))
            .min_by(f64::total_cmp);
        if let Some(t) = hit {
            return Some(edge.start + (edge.end - edge.start) * t);
        }
    }
    None
}

/// Normalized parameter of the first crossing of `wire` with `plane`.
pub fn plane_wire_intersection(plane: &Plane, wire: &Wire) -> Option<f64> {
    let total = wire.length();
    let mut travelled = 0.0;
    for edge in wire.edges() {
        let da = plane.signed_distance(&edge.start);
        let db = plane.signed_distance(&edge.end);
        let len = edge.length();
        if da.abs() <= TOLERANCE {
            return Some(travelled / total);
        }
        if da * db < 0.0 || db.abs() <= TOLERANCE {
            let t = (da / (da - db)).clamp(0.0, 1.0);
            return Some((travelled + t * len) / total);
        }
        travelled += len;
    }
    None
}

// --- Splitting ---

/// Split a triangle by a plane into the polygons on either side and the chord.
fn cut_triangle(tri: &Triangle, plane: &Plane) -> Option<(Vec<Triangle>, Vec<Triangle>, Edge)> {
    let d = snapped_distances(tri, plane);
    let v = tri.vertices();
    let (mut above, mut below, mut on) = (Vec::new(), Vec::new(), Vec::new());
    for i in 0..3 {
        let j = (i + 1) % 3;
        if d[i] >= 0.0 {
            above.push(v[i]);
        }
        if d[i] <= 0.0 {
            below.push(v[i]);
        }
        if d[i] == 0.0 {
            on.push(v[i]);
        }
        if d[i] * d[j] < 0.0 {
            let p = v[i] + (v[j] - v[i]) * (d[i] / (d[i] - d[j]));
            above.push(p);
            below.push(p);
            on.push(p);
        }
    }
    if above.len() < 3 || below.len() < 3 || on.len() != 2 {
        return None;
    }
    let fan = |poly: &[Point3]| -> Vec<Triangle> {
        (1..poly.len() - 1)
            .map(|k| Triangle::new(poly[0], poly[k], poly[k + 1]))
            .filter(|t| t.area() > TOLERANCE * TOLERANCE)
            .collect()
    };
    Some((fan(&above), fan(&below), Edge::new(on[0], on[1])))
}

/// Midpoint of the collinear overlap of two edges, if any.
fn shared_span(e1: &Edge, e2: &Edge) -> Option<Point3> {
    let d = e1.end - e1.start;
    let len = d.norm();
    if len < TOLERANCE {
        return None;
    }
    let u = d / len;
    for p in [e2.start, e2.end] {
        let w = p - e1.start;
        if (w - u * w.dot(&u)).norm() > TOLERANCE {
            return None;
        }
    }
    let s0 = (e2.start - e1.start).dot(&u);
    let s1 = (e2.end - e1.start).dot(&u);
    let lo = s0.min(s1).max(0.0);
    let hi = s0.max(s1).min(len);
    (hi - lo > TOLERANCE).then(|| e1.start + u * (0.5 * (lo + hi)))
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = i;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

/// Regroup triangle pieces into faces. Pieces sharing an edge stay together
/// unless that edge lies on a cut chord.
fn group_pieces(pieces: Vec<Triangle>, chords: &[Edge]) -> Vec<Face> {
    let n = pieces.len();
    let mut parent: Vec<usize> = (0..n).collect();
    let boxes: Vec<BBox3> = pieces.iter().map(|t| t.bbox().enlarged(TOLERANCE)).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if !boxes[i].overlaps(&boxes[j]) {
                continue;
            }
            let joined = pieces[i].edges().iter().any(|ei| {
                pieces[j].edges().iter().any(|ej| match shared_span(ei, ej) {
                    Some(mid) => !chords.iter().any(|c| c.distance_to(&mid) < TOLERANCE),
                    None => false,
                })
            });
            if joined {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut roots: Vec<usize> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();
    for (i, tri) in pieces.into_iter().enumerate() {
        let r = find(&mut parent, i);
        match roots.iter().position(|&x| x == r) {
            Some(k) => faces[k].facets.push(tri),
            None => {
                roots.push(r);
                faces.push(Face::new(vec![tri]));
            }
        }
    }
    faces
}

fn split_face(face: &Face, tools: &[(Triangle, Plane, BBox3)]) -> Vec<Face> {
    let mut pieces = face.facets.clone();
    let mut chords: Vec<Edge> = Vec::new();
    for (tool, plane, bbox) in tools {
        let mut next = Vec::with_capacity(pieces.len());
        for piece in pieces {
            if piece.bbox().overlaps(bbox) && intersect_triangles(&piece, tool).is_some() {
                if let Some((above, below, chord)) = cut_triangle(&piece, plane) {
                    next.extend(above);
                    next.extend(below);
                    chords.push(chord);
                    continue;
                }
            }
            next.push(piece);
        }
        pieces = next;
    }
    group_pieces(pieces, &chords)
}

/// Split every face of `shape` along the facets of `tool`.
///
/// Loose edges of `shape` are carried over unchanged.
pub fn split(shape: &Shape, tool: &Shape) -> Shape {
    let tools: Vec<(Triangle, Plane, BBox3)> = tool
        .triangles()
        .filter_map(|t| t.plane().map(|p| (*t, p, t.bbox().enlarged(TOLERANCE))))
        .collect();
    let faces = shape
        .faces
        .iter()
        .flat_map(|f| split_face(f, &tools))
        .collect();
    Shape { faces, edges: shape.edges.clone() }
}
