use ndarray::Array3;

use crate::{
    error::{Result, StreamError},
    field::{Bounds, VectorField},
    interp::{cell_coordinate, trilinear},
    types::{Point, Value, Vector},
};

/// Default slack, in world units, applied when testing whether a position lies
/// inside the grid.
pub const DEFAULT_TOLERANCE: Value = 1e-5;

/// A steady vector field sampled on a rectilinear grid.
///
/// The grid has `nx × ny × nz` sample nodes and `(nx - 1) × (ny - 1) × (nz - 1)`
/// cells. Node `(x, y, z)` sits at `origin + (x, y, z) ⊙ spacing`.
///
/// Samples are stored as `samples[[z, y, x]]`.
///
/// Velocities between nodes are reconstructed by trilinear interpolation of the
/// 8 corners of the containing cell.
#[derive(Debug, Clone)]
pub struct GridField {
    samples: Array3<Vector>,
    origin: Point,
    spacing: Vector,
    tolerance: Value,
}

impl GridField {
    /// Wraps an array of velocity samples indexed `[z, y, x]`.
    ///
    /// Returns [`StreamError::InvalidConfiguration`] if any axis holds fewer than
    /// two samples or any spacing component is not strictly positive.
    pub fn new(samples: Array3<Vector>, origin: Point, spacing: Vector) -> Result<Self> {
        let (nz, ny, nx) = samples.dim();
        if nx < 2 || ny < 2 || nz < 2 {
            return Err(StreamError::InvalidConfiguration(
                "grid needs at least two samples per axis",
            ));
        }
        if !spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(StreamError::InvalidConfiguration(
                "grid spacing must be positive and finite",
            ));
        }
        if !origin.iter().all(|o| o.is_finite()) {
            return Err(StreamError::InvalidConfiguration("grid origin must be finite"));
        }
        Ok(Self {
            samples,
            origin,
            spacing,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Builds a grid of `dims = [nx, ny, nz]` nodes by evaluating `function` at
    /// every node position.
    pub fn from_fn<F>(dims: [usize; 3], origin: Point, spacing: Vector, function: F) -> Result<Self>
    where
        F: Fn(&Point) -> Vector,
    {
        let [nx, ny, nz] = dims;
        let samples = Array3::from_shape_fn((nz, ny, nx), |(z, y, x)| {
            let p = Point::new(
                origin.x + x as Value * spacing.x,
                origin.y + y as Value * spacing.y,
                origin.z + z as Value * spacing.z,
            );
            function(&p)
        });
        Self::new(samples, origin, spacing)
    }

    /// Builds a grid from a flat buffer of interleaved `vx, vy, vz` triples with
    /// X varying fastest, then Y, then Z.
    ///
    /// This is the layout of raw brick-of-floats volume files once read into
    /// memory.
    pub fn from_interleaved(
        dims: [usize; 3],
        origin: Point,
        spacing: Vector,
        data: &[Value],
    ) -> Result<Self> {
        let [nx, ny, nz] = dims;
        if data.len() != 3 * nx * ny * nz {
            return Err(StreamError::InvalidConfiguration(
                "interleaved buffer length does not match grid dimensions",
            ));
        }
        let samples = Array3::from_shape_fn((nz, ny, nx), |(z, y, x)| {
            let i = 3 * ((z * ny + y) * nx + x);
            Vector::new(data[i], data[i + 1], data[i + 2])
        });
        Self::new(samples, origin, spacing)
    }

    /// Sets the containment tolerance. Negative values are treated as zero.
    pub fn with_tolerance(mut self, tolerance: Value) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }

    /// Returns the number of sample nodes along each axis as `[nx, ny, nz]`.
    pub fn dims(&self) -> [usize; 3] {
        let (nz, ny, nx) = self.samples.dim();
        [nx, ny, nz]
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn spacing(&self) -> Vector {
        self.spacing
    }

    pub fn tolerance(&self) -> Value {
        self.tolerance
    }

    /// Returns the stored sample at node `(x, y, z)`.
    ///
    /// # Panics
    /// Panics if the node index is out of range.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Vector {
        self.samples[[z, y, x]]
    }

    /// Returns the world-space position of node `(x, y, z)`.
    pub fn node_position(&self, x: usize, y: usize, z: usize) -> Point {
        Point::new(
            self.origin.x + x as Value * self.spacing.x,
            self.origin.y + y as Value * self.spacing.y,
            self.origin.z + z as Value * self.spacing.z,
        )
    }

    /// Returns the 8 node indices `[x, y, z]` of the cell at `(x, y, z)`.
    ///
    /// ```text
    ///     6----7          Y
    ///    /|   /|          |
    ///   2----3 |          *-- X
    ///   | 4--|-5         /
    ///   |/   |/         Z
    ///   0----1
    ///
    ///  0 = (x,   y,   z  )    4 = (x,   y,   z+1)
    ///  1 = (x+1, y,   z  )    5 = (x+1, y,   z+1)
    ///  2 = (x+1, y+1, z  )    6 = (x+1, y+1, z+1)
    ///  3 = (x,   y+1, z  )    7 = (x,   y+1, z+1)
    /// ```
    #[inline]
    pub fn cell_corner_indices(&self, x: usize, y: usize, z: usize) -> [[usize; 3]; 8] {
        [
            [x, y, z],
            [x + 1, y, z],
            [x + 1, y + 1, z],
            [x, y + 1, z],
            [x, y, z + 1],
            [x + 1, y, z + 1],
            [x + 1, y + 1, z + 1],
            [x, y + 1, z + 1],
        ]
    }

    /// Trilinear reconstruction at `p`. `p` must already be known to be inside.
    fn interpolate(&self, p: &Point) -> Vector {
        let [nx, ny, nz] = self.dims();
        let (cx, tx) = cell_coordinate(p.x, self.origin.x, self.spacing.x, nx);
        let (cy, ty) = cell_coordinate(p.y, self.origin.y, self.spacing.y, ny);
        let (cz, tz) = cell_coordinate(p.z, self.origin.z, self.spacing.z, nz);

        let corners = self
            .cell_corner_indices(cx, cy, cz)
            .map(|[x, y, z]| self.samples[[z, y, x]]);

        trilinear(&corners, &Vector::new(tx, ty, tz))
    }
}

impl VectorField for GridField {
    fn sample(&self, position: &Point) -> Result<Vector> {
        if !self.contains(position) {
            return Err(StreamError::OutOfDomain {
                position: *position,
            });
        }
        Ok(self.interpolate(position))
    }

    fn bounds(&self) -> Bounds {
        let [nx, ny, nz] = self.dims();
        Bounds::new(self.origin, self.node_position(nx - 1, ny - 1, nz - 1))
    }

    fn contains(&self, position: &Point) -> bool {
        self.bounds().contains_within(position, self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_field() -> GridField {
        // v = (x + 2y, 3z, -x), linear so trilinear reconstruction is exact everywhere
        GridField::from_fn(
            [5, 4, 3],
            Point::new(-1.0, 0.0, 0.5),
            Vector::new(0.5, 0.25, 1.0),
            |p| Vector::new(p.x + 2.0 * p.y, 3.0 * p.z, -p.x),
        )
        .unwrap()
    }

    #[test]
    fn dims_and_bounds() {
        let field = linear_field();
        assert_eq!(field.dims(), [5, 4, 3]);
        let b = field.bounds();
        assert_eq!(b.min, Point::new(-1.0, 0.0, 0.5));
        assert_eq!(b.max, Point::new(1.0, 0.75, 2.5));
    }

    #[test]
    fn exact_at_grid_nodes() {
        let field = linear_field();
        let [nx, ny, nz] = field.dims();
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let p = field.node_position(x, y, z);
                    assert_eq!(field.sample(&p).unwrap(), field.get(x, y, z));
                }
            }
        }
    }

    #[test]
    fn reproduces_linear_field_between_nodes() {
        let field = linear_field();
        for p in [
            Point::new(-0.8, 0.1, 0.7),
            Point::new(0.33, 0.6, 2.2),
            Point::new(0.99, 0.74, 1.5),
        ] {
            let expected = Vector::new(p.x + 2.0 * p.y, 3.0 * p.z, -p.x);
            let v = field.sample(&p).unwrap();
            assert!((v - expected).norm() < 1e-4, "{v} != {expected}");
        }
    }

    #[test]
    fn rejects_outside_and_accepts_tolerance() {
        let field = linear_field();
        let outside = Point::new(1.5, 0.3, 1.0);
        assert_eq!(
            field.sample(&outside),
            Err(StreamError::OutOfDomain { position: outside })
        );

        let just_outside = Point::new(1.0 + 5e-6, 0.3, 1.0);
        assert!(field.sample(&just_outside).is_ok());
        let strict = linear_field().with_tolerance(0.0);
        assert!(strict.sample(&just_outside).is_err());
    }

    #[test]
    fn interleaved_layout_is_x_fastest() {
        // 2 × 2 × 2 grid where vx stores the flat node index
        let data: Vec<Value> = (0..8).flat_map(|i| [i as Value, 0.0, 1.0]).collect();
        let field = GridField::from_interleaved(
            [2, 2, 2],
            Point::origin(),
            Vector::new(1.0, 1.0, 1.0),
            &data,
        )
        .unwrap();
        assert_eq!(field.get(1, 0, 0).x, 1.0);
        assert_eq!(field.get(0, 1, 0).x, 2.0);
        assert_eq!(field.get(0, 0, 1).x, 4.0);
        assert_eq!(field.get(1, 1, 1), Vector::new(7.0, 0.0, 1.0));
    }

    #[test]
    fn invalid_grids_are_rejected() {
        let spacing = Vector::new(1.0, 1.0, 1.0);
        let flat = GridField::from_fn([1, 3, 3], Point::origin(), spacing, |_| Vector::zeros());
        assert!(matches!(flat, Err(StreamError::InvalidConfiguration(_))));

        let bad_spacing = GridField::from_fn(
            [2, 2, 2],
            Point::origin(),
            Vector::new(1.0, 0.0, 1.0),
            |_| Vector::zeros(),
        );
        assert!(matches!(bad_spacing, Err(StreamError::InvalidConfiguration(_))));

        let short = GridField::from_interleaved([2, 2, 2], Point::origin(), spacing, &[0.0; 23]);
        assert!(matches!(short, Err(StreamError::InvalidConfiguration(_))));
    }
}
