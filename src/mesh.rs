use crate::{
    error::{Result, StreamError},
    types::{Point, Value, Vector},
};

/// Triangle mesh produced by the stream surface tracer.
///
/// Vertices are append-only; faces hold index triples into `vertices`.
/// The mesh need not be closed or manifold: the ribbon has open boundaries
/// along its sides, its last row, and wherever a streamline terminated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    /// Vertex positions: `[[x, y, z], ...]`
    pub vertices: Vec<Point>,

    /// Triangle index triples into `vertices`: `[[v0, v1, v2], ...]`
    pub faces: Vec<[usize; 3]>,
}

impl SurfaceMesh {
    /// Creates an empty mesh with no vertices or faces.
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Appends a vertex and returns its index.
    pub fn push_vertex(&mut self, p: Point) -> usize {
        self.vertices.push(p);
        self.vertices.len() - 1
    }

    /// Adds a triangle defined by three vertex indices.
    ///
    /// Returns [`StreamError::InvalidConfiguration`] if any index is out of
    /// bounds or two indices coincide.
    pub fn triangle_from_verts(&mut self, a: usize, b: usize, c: usize) -> Result<()> {
        if self.vertices.len() <= a.max(b.max(c)) {
            return Err(StreamError::InvalidConfiguration(
                "triangle references a missing vertex",
            ));
        }
        if a == b || b == c || a == c {
            return Err(StreamError::InvalidConfiguration(
                "triangle repeats a vertex",
            ));
        }
        self.faces.push([a, b, c]);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Returns the three vertex positions of triangle `tri`.
    pub fn tri_coords(&self, tri: usize) -> [Point; 3] {
        self.faces[tri].map(|v| self.vertices[v])
    }

    /// Returns the unnormalised face normal of `tri`; its length is twice the area.
    fn tri_cross(&self, tri: usize) -> Vector {
        let [a, b, c] = self.tri_coords(tri);
        (b - a).cross(&(c - b))
    }

    /// Computes the unit face normal for triangle `tri`.
    ///
    /// Returns the zero vector if the triangle is degenerate.
    pub fn tri_normal(&self, tri: usize) -> Vector {
        let cross = self.tri_cross(tri);
        let nrm = cross.norm();
        if nrm == 0.0 {
            Vector::zeros()
        } else {
            cross / nrm
        }
    }

    /// Area of triangle `tri`.
    pub fn tri_area(&self, tri: usize) -> Value {
        self.tri_cross(tri).norm() / 2.0
    }

    /// Total area of all faces.
    pub fn area(&self) -> Value {
        (0..self.faces.len()).map(|tri| self.tri_area(tri)).sum()
    }

    /// Computes one normal per vertex as the area-weighted average of the
    /// adjacent face normals.
    ///
    /// Vertices with no adjacent faces get the zero vector.
    pub fn vertex_normals(&self) -> Vec<Vector> {
        let mut normals = vec![Vector::zeros(); self.vertices.len()];
        for tri in 0..self.faces.len() {
            // The cross product already scales with area.
            let weighted = self.tri_cross(tri);
            for v in self.faces[tri] {
                normals[v] += weighted;
            }
        }
        for n in normals.iter_mut() {
            let nrm = n.norm();
            if nrm > 0.0 {
                *n /= nrm;
            }
        }
        normals
    }

    /// Splits the quad between two rows into two triangles.
    ///
    /// `lp, rp` are the left and right vertices of the previous row, `lc, rc`
    /// the same streamlines one step later. The quad is cut along the shorter
    /// diagonal, preferring `lp–rc` on a tie. Both triangles keep the winding
    /// `lp → rp → rc → lc`.
    ///
    /// ```text
    ///   lc ---- rc        lc ---- rc
    ///   |     / |         | \     |
    ///   |   /   |   or    |   \   |
    ///   | /     |         |     \ |
    ///   lp ---- rp        lp ---- rp
    /// ```
    pub fn split_quad(&self, lp: usize, rp: usize, lc: usize, rc: usize) -> [[usize; 3]; 2] {
        let d_main = (self.vertices[rc] - self.vertices[lp]).norm_squared();
        let d_anti = (self.vertices[lc] - self.vertices[rp]).norm_squared();
        if d_main <= d_anti {
            [[lp, rp, rc], [lp, rc, lc]]
        } else {
            [[lp, rp, lc], [rp, rc, lc]]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SurfaceMesh {
        let mut mesh = SurfaceMesh::new_empty();
        mesh.push_vertex(Point::new(0.0, 0.0, 0.0));
        mesh.push_vertex(Point::new(1.0, 0.0, 0.0));
        mesh.push_vertex(Point::new(0.0, 1.0, 0.0));
        mesh.push_vertex(Point::new(1.0, 1.0, 0.0));
        mesh
    }

    #[test]
    fn rejects_bad_triangles() {
        let mut mesh = square();
        assert!(mesh.triangle_from_verts(0, 1, 4).is_err());
        assert!(mesh.triangle_from_verts(0, 1, 1).is_err());
        assert!(mesh.triangle_from_verts(0, 1, 3).is_ok());
        assert_eq!(mesh.faces, vec![[0, 1, 3]]);
    }

    #[test]
    fn normals_and_area() {
        let mut mesh = square();
        let [a, b] = mesh.split_quad(0, 1, 2, 3);
        mesh.triangle_from_verts(a[0], a[1], a[2]).unwrap();
        mesh.triangle_from_verts(b[0], b[1], b[2]).unwrap();

        assert!((mesh.area() - 1.0).abs() < 1e-6);
        for tri in 0..2 {
            assert_eq!(mesh.tri_normal(tri), Vector::new(0.0, 0.0, 1.0));
        }
        for n in mesh.vertex_normals() {
            assert_eq!(n, Vector::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let mut mesh = SurfaceMesh::new_empty();
        for x in 0..3 {
            mesh.push_vertex(Point::new(x as Value, 0.0, 0.0));
        }
        mesh.triangle_from_verts(0, 1, 2).unwrap();
        assert_eq!(mesh.tri_normal(0), Vector::zeros());
        assert_eq!(mesh.tri_area(0), 0.0);
    }

    #[test]
    fn split_uses_shorter_diagonal() {
        let mut mesh = SurfaceMesh::new_empty();
        // Quad leaning right: the lp-rc diagonal is the long one.
        let lp = mesh.push_vertex(Point::new(0.0, 0.0, 0.0));
        let rp = mesh.push_vertex(Point::new(1.0, 0.0, 0.0));
        let lc = mesh.push_vertex(Point::new(2.0, 1.0, 0.0));
        let rc = mesh.push_vertex(Point::new(3.0, 1.0, 0.0));
        assert_eq!(mesh.split_quad(lp, rp, lc, rc), [[lp, rp, lc], [rp, rc, lc]]);

        let lc2 = mesh.push_vertex(Point::new(-2.0, 1.0, 0.0));
        let rc2 = mesh.push_vertex(Point::new(-1.0, 1.0, 0.0));
        assert_eq!(mesh.split_quad(lp, rp, lc2, rc2), [[lp, rp, rc2], [lp, rc2, lc2]]);
    }
}
