use glam::DVec3;

/// Axis-aligned bounding box in double precision.
///
/// An empty box has `min > max` on every axis so that `union` with any
/// point or box yields that point or box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds3 {
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a box from two corners (in any order)
    pub fn from_corners(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box enclosing every point; empty for an empty slice
    pub fn from_points(points: &[DVec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |acc, &p| acc.union_point(p))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True when both corners are finite (no infinities or NaN)
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn union_point(&self, p: DVec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(&self, other: &Bounds3) -> Self {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, offset: DVec3) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }

    /// The 8 corners, bottom face first
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(b.x, b.y, b.z),
            DVec3::new(a.x, b.y, b.z),
        ]
    }
}
