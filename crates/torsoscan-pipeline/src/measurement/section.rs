//! Cross-section helpers shared by the measurement stages.

use torsoscan_math::{Axis, Point2};
use torsoscan_mesh::{GeometryKernel, Mesh, Plane, Polygon};

/// World-space vertices projected onto the XY plane.
pub fn projected_points(mesh: &Mesh) -> Vec<Point2> {
    mesh.world_vertices()
        .iter()
        .map(|p| Point2::new(p.x, p.y))
        .collect()
}

/// Convex hull of `points` as a polygon, `None` when fewer than three
/// corners remain.
pub fn hull(kernel: &dyn GeometryKernel, points: &[Point2]) -> Option<Polygon> {
    let indices = kernel.convex_hull_2d(points)?;
    if indices.len() < 3 {
        return None;
    }
    Some(Polygon::new(indices.iter().map(|&i| points[i]).collect()))
}

/// Circumference of a section: perimeter of its projected convex hull.
pub fn circumference(kernel: &dyn GeometryKernel, section: &Mesh) -> Option<f64> {
    hull(kernel, &projected_points(section)).map(|h| h.perimeter())
}

/// Hull area of the part of `section` in front of `x_cutoff` (x below it).
///
/// Degenerate fronts count as zero area.
pub fn front_area(kernel: &dyn GeometryKernel, section: &Mesh, x_cutoff: f64) -> f64 {
    let mut front = section.clone();
    kernel.subtract(&mut front, &Plane::axis_aligned(Axis::X, x_cutoff, false));
    let points = projected_points(&front);
    if points.len() < 3 {
        return 0.0;
    }
    hull(kernel, &points).map_or(0.0, |h| h.area())
}

/// The island with the largest volume.
pub fn largest_island(kernel: &dyn GeometryKernel, islands: Vec<Mesh>) -> Option<Mesh> {
    islands
        .into_iter()
        .map(|island| (kernel.volume(&island), island))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, island)| island)
}
