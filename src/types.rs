use crate::math::{Point3, Vector3};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BBox3 {
    pub fn new(min: Point3, max: Point3) -> Self { Self { min, max } }
    pub fn center(&self) -> Point3 { nalgebra::center(&self.min, &self.max) }
    pub fn size(&self) -> Vector3 { self.max - self.min }
    pub fn diagonal(&self) -> f64 { self.size().norm() }

    /// Smallest box containing all `points`, or `None` for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| b.including(p)))
    }

    pub fn including(&self, p: &Point3) -> Self {
        Self::new(self.min.inf(p), self.max.sup(p))
    }

    pub fn union(&self, other: &BBox3) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Grow the box by `gap` in every direction.
    pub fn enlarged(&self, gap: f64) -> Self {
        let g = Vector3::repeat(gap);
        Self::new(self.min - g, self.max + g)
    }

    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// True unless the boxes are separated along some axis.
    pub fn overlaps(&self, other: &BBox3) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}
