//! Indexed triangle mesh with a world transform.

use torsoscan_math::{Point3, Transform, Vec3};

use crate::error::{MeshError, Result};

/// An owned triangle mesh.
///
/// Vertex positions are stored in local coordinates; `transform` maps them
/// into world space. Geometry operations read world-space positions and
/// return meshes whose transform is the identity.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Human-readable name, used in logs.
    pub name: String,
    /// Local-space vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangles as counter-clockwise (outward-facing) vertex index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Local-to-world transform.
    pub transform: Transform,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a mesh from raw parts, checking that every index is in range.
    pub fn from_parts(
        name: impl Into<String>,
        vertices: Vec<Point3>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self> {
        let count = vertices.len();
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle: t,
                    index,
                    count,
                });
            }
        }
        Ok(Self {
            name: name.into(),
            vertices,
            triangles,
            transform: Transform::identity(),
        })
    }

    /// A mesh with no triangles carries no surface.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// World-space position of vertex `i`.
    pub fn world_vertex(&self, i: usize) -> Point3 {
        self.transform.apply_point(&self.vertices[i])
    }

    /// All vertex positions in world space.
    pub fn world_vertices(&self) -> Vec<Point3> {
        if self.transform.is_identity() {
            return self.vertices.clone();
        }
        self.vertices
            .iter()
            .map(|p| self.transform.apply_point(p))
            .collect()
    }

    /// World-space corners of triangle `t`.
    pub fn world_triangle(&self, t: usize) -> [Point3; 3] {
        let [a, b, c] = self.triangles[t];
        [
            self.world_vertex(a as usize),
            self.world_vertex(b as usize),
            self.world_vertex(c as usize),
        ]
    }

    /// Compose `t` after the current transform.
    pub fn apply_transform(&mut self, t: &Transform) {
        self.transform = self.transform.then(t);
    }

    /// Move the mesh by `offset` in world space.
    pub fn translate(&mut self, offset: Vec3) {
        self.apply_transform(&Transform::translation(offset.x, offset.y, offset.z));
    }

    /// Rotate the mesh about the world Z axis by `angle` radians.
    pub fn rotate_z(&mut self, angle: f64) {
        self.apply_transform(&Transform::rotation_z(angle));
    }

    /// Freeze the transform into the vertex data and reset it to identity.
    pub fn bake_transform(&mut self) {
        if self.transform.is_identity() {
            return;
        }
        self.vertices = self.world_vertices();
        self.transform = Transform::identity();
    }

    /// A copy with the transform baked in.
    pub fn to_world(&self) -> Mesh {
        let mut out = self.clone();
        out.bake_transform();
        out
    }

    /// Append another mesh's world-space geometry, baking this mesh first.
    pub fn merge(&mut self, other: &Mesh) {
        self.bake_transform();
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.world_vertices());
        self.triangles.extend(
            other
                .triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );
    }

    /// Signed enclosed volume by summing origin tetrahedra over all triangles.
    ///
    /// Positive for closed meshes with outward-facing triangles.
    pub fn signed_volume(&self) -> f64 {
        let verts = self.world_vertices();
        self.triangles
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (
                    verts[a as usize].coords,
                    verts[b as usize].coords,
                    verts[c as usize].coords,
                );
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Mean of the local vertex positions, `None` for a mesh without vertices.
    pub fn vertex_centroid(&self) -> Option<Point3> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Drop vertices no triangle references, renumbering the triangles.
    pub fn compact(&mut self) {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut kept = Vec::new();
        for tri in &mut self.triangles {
            for idx in tri.iter_mut() {
                let old = *idx as usize;
                if remap[old] == u32::MAX {
                    remap[old] = kept.len() as u32;
                    kept.push(self.vertices[old]);
                }
                *idx = remap[old];
            }
        }
        self.vertices = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_from_parts_rejects_bad_index() {
        let err = Mesh::from_parts("bad", vec![Point3::origin()], vec![[0, 1, 0]]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::IndexOutOfRange {
                triangle: 0,
                index: 1,
                count: 1
            }
        ));
    }

    #[test]
    fn test_unit_cube_volume() {
        let mesh = cuboid(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 1.0));
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_volume_is_translation_invariant() {
        let mut mesh = cuboid(Point3::origin(), Vec3::new(2.0, 1.0, 0.5));
        mesh.translate(Vec3::new(10.0, -4.0, 3.0));
        assert!((mesh.signed_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bake_transform() {
        let mut mesh = cuboid(Point3::origin(), Vec3::new(2.0, 1.0, 1.0));
        mesh.rotate_z(FRAC_PI_2);
        mesh.translate(Vec3::new(1.0, 0.0, 0.0));
        let before = mesh.world_vertices();
        mesh.bake_transform();
        assert!(mesh.transform.is_identity());
        for (a, b) in before.iter().zip(&mesh.vertices) {
            assert!((a - b).norm() < 1e-12);
        }
        // Rotated by 90 degrees, the long side now runs along Y.
        let ys: Vec<f64> = mesh.vertices.iter().map(|p| p.y).collect();
        let span = ys.iter().cloned().fold(f64::MIN, f64::max)
            - ys.iter().cloned().fold(f64::MAX, f64::min);
        assert!((span - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_and_compact() {
        let mut a = cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0));
        let mut b = cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0));
        b.translate(Vec3::new(5.0, 0.0, 0.0));
        a.merge(&b);
        assert_eq!(a.vertex_count(), 16);
        assert!((a.signed_volume() - 2.0).abs() < 1e-9);

        a.vertices.push(Point3::new(100.0, 0.0, 0.0));
        a.compact();
        assert_eq!(a.vertex_count(), 16);
    }
}
