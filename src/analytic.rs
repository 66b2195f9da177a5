use crate::{
    error::{Result, StreamError},
    field::{Bounds, VectorField},
    types::{FieldFunction, Point, Vector},
};

/// A vector field given by a closed-form function over a bounding box.
///
/// Useful for synthetic test flows and for resampling onto a
/// [`GridField`](crate::grid::GridField) with
/// [`GridField::from_fn`](crate::grid::GridField::from_fn).
pub struct AnalyticField {
    bounds: Bounds,
    function: Box<FieldFunction>,
}

impl AnalyticField {
    pub fn new<F>(bounds: Bounds, function: F) -> Self
    where
        F: Fn(&Point) -> Vector + Send + Sync + 'static,
    {
        Self {
            bounds,
            function: Box::new(function),
        }
    }

    /// The same velocity everywhere inside `bounds`.
    pub fn uniform(bounds: Bounds, velocity: Vector) -> Self {
        Self::new(bounds, move |_| velocity)
    }
}

impl VectorField for AnalyticField {
    fn sample(&self, position: &Point) -> Result<Vector> {
        if !self.contains(position) {
            return Err(StreamError::OutOfDomain {
                position: *position,
            });
        }
        Ok((self.function)(position))
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}
