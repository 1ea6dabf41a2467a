//! The geometry operations the analysis pipeline is written against.

use torsoscan_math::{Axis, Point2};

use crate::bounds::{BoundingBox, BoundingCylinder};
use crate::clip::{self, Plane};
use crate::decimate;
use crate::hull;
use crate::islands;
use crate::mesh::Mesh;

/// Primitive geometry operations consumed by the pipeline.
///
/// A host application with its own mesh engine can implement this trait;
/// [`ClipKernel`] is the built-in implementation.
pub trait GeometryKernel {
    /// World-space axis-aligned bounds, `None` without vertices.
    fn bounding_box(&self, mesh: &Mesh) -> Option<BoundingBox>;

    /// Vertex-centroid bounding cylinder, `None` without vertices.
    fn bounding_cylinder(&self, mesh: &Mesh) -> Option<BoundingCylinder>;

    /// Slab intersection of `thickness` centred at `position` along `axis`.
    fn slice(&self, mesh: &Mesh, axis: Axis, position: f64, thickness: f64) -> Option<Mesh>;

    /// Boolean intersection, `None` when empty.
    fn intersect(&self, mesh: &Mesh, cutter: &Mesh) -> Option<Mesh>;

    /// Remove everything on the outer side of `plane`, in place.
    fn subtract(&self, mesh: &mut Mesh, plane: &Plane);

    /// Connected components.
    fn islands(&self, mesh: &Mesh) -> Vec<Mesh>;

    /// Counter-clockwise hull indices, `None` for an invalid hull.
    fn convex_hull_2d(&self, points: &[Point2]) -> Option<Vec<usize>>;

    /// Cap the vertex count, in place.
    fn decimate(&self, mesh: &mut Mesh, max_vertices: usize);

    /// Signed tetrahedron-sum volume.
    fn volume(&self, mesh: &Mesh) -> f64;
}

/// Plane-clipping kernel.
///
/// Intersections are exact for convex cutters, which covers the slabs and
/// cylinders the analysis cuts with.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipKernel;

impl GeometryKernel for ClipKernel {
    fn bounding_box(&self, mesh: &Mesh) -> Option<BoundingBox> {
        BoundingBox::of(mesh)
    }

    fn bounding_cylinder(&self, mesh: &Mesh) -> Option<BoundingCylinder> {
        BoundingCylinder::of(mesh)
    }

    fn slice(&self, mesh: &Mesh, axis: Axis, position: f64, thickness: f64) -> Option<Mesh> {
        clip::slice(mesh, axis, position, thickness)
    }

    fn intersect(&self, mesh: &Mesh, cutter: &Mesh) -> Option<Mesh> {
        clip::intersect(mesh, cutter)
    }

    fn subtract(&self, mesh: &mut Mesh, plane: &Plane) {
        let name = std::mem::take(&mut mesh.name);
        *mesh = clip::clip_half_space(mesh, plane);
        mesh.name = name;
    }

    fn islands(&self, mesh: &Mesh) -> Vec<Mesh> {
        islands::islands(mesh)
    }

    fn convex_hull_2d(&self, points: &[Point2]) -> Option<Vec<usize>> {
        hull::convex_hull_2d(points)
    }

    fn decimate(&self, mesh: &mut Mesh, max_vertices: usize) {
        decimate::decimate(mesh, max_vertices);
    }

    fn volume(&self, mesh: &Mesh) -> f64 {
        mesh.signed_volume()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;
    use torsoscan_math::{Point3, Vec3};

    #[test]
    fn test_subtract_keeps_name_and_inner_side() {
        let kernel = ClipKernel;
        let mut mesh = cuboid(Point3::origin(), Vec3::new(2.0, 2.0, 2.0));
        mesh.name = "block".into();
        kernel.subtract(&mut mesh, &Plane::axis_aligned(Axis::X, 0.5, false));
        assert_eq!(mesh.name, "block");
        assert!((kernel.volume(&mesh) - 6.0).abs() < 1e-9);
        let bbox = kernel.bounding_box(&mesh).unwrap();
        assert!((bbox.max.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_kernel_is_object_safe() {
        let kernel: Box<dyn GeometryKernel> = Box::new(ClipKernel);
        let mesh = cuboid(Point3::origin(), Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(kernel.islands(&mesh).len(), 1);
    }
}
