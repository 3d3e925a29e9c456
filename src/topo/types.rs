//! Faceted shape entities: straight edges, triangles, faces and compounds.

use crate::math::{transform_point, Matrix4, Point3, Vector3, TOLERANCE};
use crate::types::BBox3;

// --- Primitive entities ---

/// A straight edge between two points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub start: Point3,
    pub end: Point3,
}

impl Edge {
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Point3 {
        nalgebra::center(&self.start, &self.end)
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    pub fn is_degenerate(&self) -> bool {
        self.length() < TOLERANCE
    }

    /// Distance from `p` to the closest point of the segment.
    pub fn distance_to(&self, p: &Point3) -> f64 {
        let d = self.end - self.start;
        let len2 = d.norm_squared();
        if len2 < TOLERANCE * TOLERANCE {
            return (p - self.start).norm();
        }
        let t = ((p - self.start).dot(&d) / len2).clamp(0.0, 1.0);
        (p - (self.start + d * t)).norm()
    }

    /// Same segment regardless of orientation.
    pub fn coincides(&self, other: &Edge) -> bool {
        let same = (self.start - other.start).norm() < TOLERANCE && (self.end - other.end).norm() < TOLERANCE;
        let flipped = (self.start - other.end).norm() < TOLERANCE && (self.end - other.start).norm() < TOLERANCE;
        same || flipped
    }

    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self::new(transform_point(m, &self.start), transform_point(m, &self.end))
    }
}

/// An infinite plane through `origin` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub origin: Point3,
    pub normal: Vector3,
}

impl Plane {
    /// `None` if `normal` has zero length.
    pub fn new(origin: Point3, normal: Vector3) -> Option<Self> {
        let normal = normal.try_normalize(TOLERANCE * TOLERANCE)?;
        Some(Self { origin, normal })
    }

    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }
}

/// A planar facet of a face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Point3,
    pub b: Point3,
    pub c: Point3,
}

impl Triangle {
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [Point3; 3] {
        [self.a, self.b, self.c]
    }

    pub fn edges(&self) -> [Edge; 3] {
        [Edge::new(self.a, self.b), Edge::new(self.b, self.c), Edge::new(self.c, self.a)]
    }

    /// Unnormalized normal, length is twice the area.
    pub fn cross(&self) -> Vector3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn area(&self) -> f64 {
        0.5 * self.cross().norm()
    }

    pub fn centroid(&self) -> Point3 {
        Point3::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    /// Supporting plane; `None` for slivers.
    pub fn plane(&self) -> Option<Plane> {
        if self.area() < TOLERANCE * TOLERANCE {
            return None;
        }
        Plane::new(self.a, self.cross())
    }

    pub fn bbox(&self) -> BBox3 {
        BBox3::new(self.a, self.a).including(&self.b).including(&self.c)
    }

    pub fn distance_to(&self, p: &Point3) -> f64 {
        if let Some(plane) = self.plane() {
            let h = plane.signed_distance(p);
            let q = p - plane.normal * h;
            if self.contains_coplanar(&q) {
                return h.abs();
            }
        }
        self.edges()
            .iter()
            .map(|e| e.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    /// Barycentric inclusion test for a point already lying in the plane.
    fn contains_coplanar(&self, q: &Point3) -> bool {
        let n = self.cross();
        let inside = |u: &Point3, v: &Point3| (v - u).cross(&(q - u)).dot(&n) >= -TOLERANCE * n.norm();
        inside(&self.a, &self.b) && inside(&self.b, &self.c) && inside(&self.c, &self.a)
    }

    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self::new(transform_point(m, &self.a), transform_point(m, &self.b), transform_point(m, &self.c))
    }
}

// --- Composite entities ---

/// A connected surface patch represented by its facets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Face {
    pub facets: Vec<Triangle>,
}

impl Face {
    pub fn new(facets: Vec<Triangle>) -> Self {
        Self { facets }
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    pub fn area(&self) -> f64 {
        self.facets.iter().map(Triangle::area).sum()
    }

    pub fn vertices(&self) -> impl Iterator<Item = Point3> + '_ {
        self.facets.iter().flat_map(|t| t.vertices())
    }

    pub fn bbox(&self) -> Option<BBox3> {
        self.facets.iter().map(Triangle::bbox).reduce(|a, b| a.union(&b))
    }

    pub fn distance_to(&self, p: &Point3) -> f64 {
        self.facets
            .iter()
            .map(|t| t.distance_to(p))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self::new(self.facets.iter().map(|t| t.transformed(m)).collect())
    }
}

/// A compound of faces and loose edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Shape {
    pub faces: Vec<Face>,
    pub edges: Vec<Edge>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_face(face: Face) -> Self {
        Self { faces: vec![face], edges: Vec::new() }
    }

    pub fn from_faces(faces: Vec<Face>) -> Self {
        Self { faces, edges: Vec::new() }
    }

    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Self { faces: Vec::new(), edges }
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Append all faces and edges of `other`.
    pub fn extend(&mut self, other: &Shape) {
        self.faces.extend(other.faces.iter().cloned());
        self.edges.extend(other.edges.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.faces.iter().all(Face::is_empty) && self.edges.is_empty()
    }

    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.faces.iter().flat_map(|f| f.facets.iter())
    }

    pub fn vertices(&self) -> impl Iterator<Item = Point3> + '_ {
        self.faces
            .iter()
            .flat_map(Face::vertices)
            .chain(self.edges.iter().flat_map(|e| [e.start, e.end]))
    }

    pub fn bbox(&self) -> Option<BBox3> {
        let verts: Vec<Point3> = self.vertices().collect();
        BBox3::from_points(&verts)
    }

    /// Bounding box diagonal, zero for an empty shape.
    pub fn bbox_diagonal(&self) -> f64 {
        self.bbox().map_or(0.0, |b| b.diagonal())
    }

    pub fn area(&self) -> f64 {
        self.faces.iter().map(Face::area).sum()
    }

    pub fn edge_length(&self) -> f64 {
        self.edges.iter().map(Edge::length).sum()
    }

    pub fn transformed(&self, m: &Matrix4) -> Self {
        Self {
            faces: self.faces.iter().map(|f| f.transformed(m)).collect(),
            edges: self.edges.iter().map(|e| e.transformed(m)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0))
    }

    #[test]
    fn triangle_area_and_plane() {
        let t = unit_triangle();
        assert_relative_eq!(t.area(), 0.5, epsilon = 1e-12);
        let plane = t.plane().unwrap();
        assert_relative_eq!(plane.normal, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn triangle_distance_inside_and_outside() {
        let t = unit_triangle();
        assert_relative_eq!(t.distance_to(&Point3::new(0.2, 0.2, 3.0)), 3.0, epsilon = 1e-12);
        assert_relative_eq!(t.distance_to(&Point3::new(-1.0, 0.0, 0.0)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn edge_coincidence_ignores_orientation() {
        let e = Edge::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0));
        assert!(e.coincides(&e.reversed()));
        assert!(!e.coincides(&Edge::new(Point3::origin(), Point3::new(1.0, 2.0, 3.1))));
    }

    #[test]
    fn shape_translation_moves_bbox() {
        let shape = Shape::from_face(Face::new(vec![unit_triangle()]));
        let m = Matrix4::new_translation(&Vector3::new(0.0, 5.0, 0.0));
        let moved = shape.transformed(&m);
        let b = moved.bbox().unwrap();
        assert_relative_eq!(b.min.y, 5.0, epsilon = 1e-12);
        assert_relative_eq!(moved.area(), shape.area(), epsilon = 1e-12);
    }
}
