//! Primitive solids used as cutters and references.

use std::f64::consts::TAU;

use torsoscan_math::{Point3, Vec3};

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Unit directions of a regular `n`-gon starting at `+X`, counter-clockwise.
///
/// Mirror pairs `k` and `n - k` are exact negations in `y`.
pub fn ring_directions(n: usize) -> Vec<(f64, f64)> {
    let mut dirs: Vec<(f64, f64)> = Vec::with_capacity(n);
    for k in 0..n {
        if 2 * k > n {
            let (c, s) = dirs[n - k];
            dirs.push((c, -s));
        } else if 2 * k == n {
            dirs.push((-1.0, 0.0));
        } else {
            let (s, c) = (TAU * k as f64 / n as f64).sin_cos();
            dirs.push((c, s));
        }
    }
    dirs
}

/// Axis-aligned box centred at `center`.
pub fn cuboid(center: Point3, size: Vec3) -> Mesh {
    let h = size / 2.0;
    let (x0, x1) = (center.x - h.x, center.x + h.x);
    let (y0, y1) = (center.y - h.y, center.y + h.y);
    let (z0, z1) = (center.z - h.z, center.z + h.z);
    let vertices = vec![
        Point3::new(x0, y0, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y0, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x0, y1, z1),
    ];
    let triangles = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    Mesh {
        name: "cuboid".into(),
        vertices,
        triangles,
        ..Mesh::default()
    }
}

/// Closed vertical prism approximating a cylinder, centred at the origin.
///
/// `segments` vertices per ring, `depth` along Z.
pub fn cylinder(radius: f64, depth: f64, segments: usize) -> Result<Mesh> {
    if segments < 3 {
        return Err(MeshError::InvalidPrimitive(format!(
            "cylinder needs at least 3 segments, got {segments}"
        )));
    }
    if !radius.is_finite() || radius <= 0.0 || !depth.is_finite() || depth <= 0.0 {
        return Err(MeshError::InvalidPrimitive(format!(
            "cylinder radius and depth must be positive (radius {radius}, depth {depth})"
        )));
    }

    let n = segments as u32;
    let mut vertices = Vec::with_capacity(2 * segments + 2);
    for z in [-depth / 2.0, depth / 2.0] {
        for (c, s) in ring_directions(segments) {
            vertices.push(Point3::new(radius * c, radius * s, z));
        }
    }
    vertices.push(Point3::new(0.0, 0.0, -depth / 2.0));
    vertices.push(Point3::new(0.0, 0.0, depth / 2.0));
    let (bottom, top) = (2 * n, 2 * n + 1);

    let mut triangles = Vec::with_capacity(4 * segments);
    for k in 0..n {
        let k1 = (k + 1) % n;
        triangles.push([k, k1, n + k1]);
        triangles.push([k, n + k1, n + k]);
        triangles.push([bottom, k1, k]);
        triangles.push([top, n + k, n + k1]);
    }
    Mesh::from_parts("cylinder", vertices, triangles)
}
