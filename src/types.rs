use nalgebra::{Point3, Vector3};

/// Scalar component type used for positions, velocities and step sizes.
pub type Value = f32;

/// A 3D position with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components. Used for velocities and grid spacing.
pub type Vector = Vector3<Value>;

/// An analytic vector field: maps a [`Point`] to the velocity at that point.
pub type FieldFunction = dyn Fn(&Point) -> Vector + Send + Sync;
