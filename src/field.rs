use crate::{
    error::Result,
    types::{Point, Value, Vector},
};

/// Axis-aligned box bounding the domain of a [`VectorField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lowest corner.
    pub min: Point,
    /// Highest corner.
    pub max: Point,
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Returns the box of size `dims` centred on `center`.
    ///
    /// ```text
    ///  min = center - dims/2
    ///  max = center + dims/2
    /// ```
    pub fn centered(center: Point, dims: Vector) -> Self {
        let half = dims / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns `max - min`.
    pub fn extent(&self) -> Vector {
        self.max - self.min
    }

    /// True when `p` lies inside or on the faces of the box.
    #[inline]
    pub fn contains(&self, p: &Point) -> bool {
        self.contains_within(p, 0.0)
    }

    /// True when `p` lies inside the box grown by `tolerance` on every side.
    ///
    /// Returns false for non-finite positions.
    #[inline]
    pub fn contains_within(&self, p: &Point, tolerance: Value) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] - tolerance && p[i] <= self.max[i] + tolerance)
    }
}

/// Read-only velocity sampler over a steady 3D vector field.
///
/// Implementations must be deterministic and safe to share between threads:
/// tracers sample the same field from several rayon workers at once.
pub trait VectorField: Sync {
    /// Returns the velocity at `position`.
    ///
    /// Fails with [`StreamError::OutOfDomain`](crate::error::StreamError::OutOfDomain)
    /// when `position` is not [`contains`](VectorField::contains)ed by the field.
    fn sample(&self, position: &Point) -> Result<Vector>;

    /// Returns the domain box.
    fn bounds(&self) -> Bounds;

    /// True when `position` can be sampled.
    fn contains(&self, position: &Point) -> bool {
        self.bounds().contains(position)
    }
}
