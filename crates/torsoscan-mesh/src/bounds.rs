//! Bounding volumes recomputed on demand from world-space vertices.

use torsoscan_math::{Point3, Vec3};

use crate::mesh::Mesh;

/// Axis-aligned bounding box snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a box from its corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.include_point(&p);
        }
        Some(bbox)
    }

    /// Box around a mesh's world-space vertices.
    pub fn of(mesh: &Mesh) -> Option<Self> {
        Self::from_points(mesh.world_vertices())
    }

    /// Grow the box to include `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Point3 {
        midpoint(&self.min, &self.max)
    }

    /// Extent along each axis.
    pub fn dimensions(&self) -> Vec3 {
        self.max - self.min
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) / 2.0)
}

/// Vertical bounding cylinder: vertex centroid plus the largest vertex distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCylinder {
    /// Vertex centroid in local coordinates.
    pub local_center: Point3,
    /// Vertex centroid in world coordinates.
    pub center: Point3,
    /// Largest world-space distance from the centroid to a vertex.
    pub radius: f64,
}

impl BoundingCylinder {
    /// Cylinder around a mesh, `None` for a mesh without vertices.
    pub fn of(mesh: &Mesh) -> Option<Self> {
        let local_center = mesh.vertex_centroid()?;
        let center = mesh.transform.apply_point(&local_center);
        let radius = mesh
            .world_vertices()
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);
        Some(Self {
            local_center,
            center,
            radius,
        })
    }

    /// Whether the two footprints overlap in the XY plane (touching counts).
    pub fn overlaps_xy(&self, other: &BoundingCylinder) -> bool {
        let d = (self.center.xy() - other.center.xy()).norm();
        d <= self.radius + other.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;

    #[test]
    fn test_bounding_box_of_translated_cube() {
        let mut mesh = cuboid(Point3::origin(), Vec3::new(2.0, 4.0, 6.0));
        mesh.translate(Vec3::new(1.0, 0.0, 3.0));
        let bbox = BoundingBox::of(&mesh).unwrap();
        assert!((bbox.min - Point3::new(0.0, -2.0, 0.0)).norm() < 1e-12);
        assert!((bbox.max - Point3::new(2.0, 2.0, 6.0)).norm() < 1e-12);
        assert!((bbox.center() - Point3::new(1.0, 0.0, 3.0)).norm() < 1e-12);
        assert!((bbox.dimensions() - Vec3::new(2.0, 4.0, 6.0)).norm() < 1e-12);
        assert!(bbox.contains(&Point3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_empty_mesh_has_no_bounds() {
        let mesh = Mesh::new("empty");
        assert!(BoundingBox::of(&mesh).is_none());
        assert!(BoundingCylinder::of(&mesh).is_none());
    }

    #[test]
    fn test_bounding_cylinder_radius_is_corner_distance() {
        let mesh = cuboid(Point3::new(0.0, 0.0, 5.0), Vec3::new(2.0, 2.0, 2.0));
        let bcyl = BoundingCylinder::of(&mesh).unwrap();
        assert!((bcyl.center - Point3::new(0.0, 0.0, 5.0)).norm() < 1e-12);
        assert!((bcyl.radius - 3f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cylinder_overlap_ignores_height() {
        let a = cuboid(Point3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = cuboid(Point3::new(1.5, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));
        let c = cuboid(Point3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let (ca, cb, cc) = (
            BoundingCylinder::of(&a).unwrap(),
            BoundingCylinder::of(&b).unwrap(),
            BoundingCylinder::of(&c).unwrap(),
        );
        assert!(ca.overlaps_xy(&cb));
        assert!(!ca.overlaps_xy(&cc));
    }
}
