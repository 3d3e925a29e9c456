//! Wire assembly from loose edges and extreme-point queries.

use std::collections::VecDeque;

use crate::curve::Wire;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topo::{Edge, Face, Shape};

fn same(a: &Point3, b: &Point3) -> bool {
    (a - b).norm() < TOLERANCE
}

/// Chain edges that share end points into wires.
///
/// Each connected chain becomes one wire. Branching chains are split at the
/// branch point. Degenerate edges are ignored.
pub fn connect_edges(edges: &[Edge]) -> Vec<Wire> {
    let mut remaining: Vec<Edge> = edges.iter().filter(|e| !e.is_degenerate()).copied().collect();
    remaining.reverse();
    let mut wires = Vec::new();

    while let Some(first) = remaining.pop() {
        let mut chain: VecDeque<Point3> = VecDeque::from([first.start, first.end]);
        loop {
            let front = chain[0];
            let back = chain[chain.len() - 1];
            if chain.len() > 2 && same(&front, &back) {
                break;
            }
            let Some(i) = remaining.iter().position(|e| {
                same(&e.start, &back) || same(&e.end, &back) || same(&e.start, &front) || same(&e.end, &front)
            }) else {
                break;
            };
            let e = remaining.remove(i);
            if same(&e.start, &back) {
                chain.push_back(e.end);
            } else if same(&e.end, &back) {
                chain.push_back(e.start);
            } else if same(&e.end, &front) {
                chain.push_front(e.start);
            } else {
                chain.push_front(e.end);
            }
        }
        // snap the closing point so the wire reports itself closed
        if chain.len() > 3 && same(&chain[0], &chain[chain.len() - 1]) {
            let head = chain[0];
            if let Some(last) = chain.back_mut() {
                *last = head;
            }
        }
        if let Some(w) = Wire::new(chain) {
            wires.push(w);
        }
    }
    wires
}

/// Points incident to exactly one edge.
pub fn end_points(edges: &[Edge]) -> Vec<Point3> {
    let mut nodes: Vec<(Point3, usize)> = Vec::new();
    for e in edges.iter().filter(|e| !e.is_degenerate()) {
        for p in [e.start, e.end] {
            match nodes.iter_mut().find(|(q, _)| same(q, &p)) {
                Some((_, count)) => *count += 1,
                None => nodes.push((p, 1)),
            }
        }
    }
    nodes.into_iter().filter(|(_, c)| *c == 1).map(|(p, _)| p).collect()
}

/// Vertices of `shape` with the smallest and largest projection onto `dir`.
pub fn min_max_point(shape: &Shape, dir: &Vector3) -> Option<(Point3, Point3)> {
    let mut iter = shape.vertices();
    let first = iter.next()?;
    let s = first.coords.dot(dir);
    let ((_, lo), (_, hi)) = iter.fold(((s, first), (s, first)), |(lo, hi), p| {
        let s = p.coords.dot(dir);
        (if s < lo.0 { (s, p) } else { lo }, if s > hi.0 { (s, p) } else { hi })
    });
    Some((lo, hi))
}

/// Index of the face closest to `point`.
pub fn nearest_face(faces: &[Face], point: &Point3) -> Option<usize> {
    faces
        .iter()
        .map(|f| f.distance_to(point))
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
