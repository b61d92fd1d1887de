use crate::Vec3;

/// Axis-aligned bounding box stored as min/max corners.
///
/// Used for mesh extents and camera framing. Growing an empty box with a
/// point yields a degenerate box at that point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty box (min > max, contains nothing).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a box from explicit corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Compute the bounding box of a point set.
    ///
    /// Returns `EMPTY` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.grow(*p);
        }
        aabb
    }

    /// Expand the box to include a point.
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// The smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True if the box contains nothing.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extent (max - min). Zero for an empty box.
    pub fn extent(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        self.extent().length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let points = [
            Vec3::new(-1.0, -2.0, -3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let aabb = Aabb::from_points(&points);

        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_aabb_union() {
        let a = Aabb::new(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let b = Aabb::new(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let union = a.union(&b);

        assert_eq!(union.min, Vec3::ZERO);
        assert_eq!(union.max, Vec3::splat(10.0));
    }

    #[test]
    fn test_aabb_center_and_extent() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(10.0, 10.0, 10.0));

        assert_eq!(aabb.center(), Vec3::splat(5.0));
        assert_eq!(aabb.extent(), Vec3::splat(10.0));
        assert!((aabb.diagonal() - 10.0 * 3.0_f32.sqrt()).abs() < 0.001);
    }

    #[test]
    fn test_aabb_empty() {
        let empty = Aabb::EMPTY;

        assert!(empty.is_empty());
        assert_eq!(empty.extent(), Vec3::ZERO);
        assert_eq!(Aabb::from_points(&[]), empty);
    }

    #[test]
    fn test_aabb_grow() {
        let mut aabb = Aabb::EMPTY;
        aabb.grow(Vec3::new(1.0, 2.0, 3.0));

        // Degenerate box at the point
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, aabb.max);
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }
}
