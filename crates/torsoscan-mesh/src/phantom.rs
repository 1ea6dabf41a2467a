//! Synthetic torso phantom for tests, benchmarks and demos.
//!
//! The surface is star-shaped around the Z axis: every ring vertex sits on
//! the ray from the axis at its height, at the larger of the torso profile
//! and the far intersection with any bump sphere. Cross-sections are
//! egg-shaped ellipses, mirror-symmetric across the XZ plane and facing
//! `-X`.

use torsoscan_math::{Point3, Vec3};

use crate::mesh::Mesh;
use crate::primitives::ring_directions;

/// A spherical protrusion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bump {
    /// Sphere centre.
    pub center: Point3,
    /// Sphere radius.
    pub radius: f64,
}

/// Parameters of the phantom. Lengths in metres.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsoPhantom {
    /// Total height; the base sits at `z = 0`.
    pub height: f64,
    /// Vertical distance between vertex rings (rounded to fit the height).
    pub ring_spacing: f64,
    /// Vertices per ring; keep it even for exact mirror symmetry.
    pub segments: usize,
    /// Waist semi-axes along X and Y.
    pub waist: (f64, f64),
    /// Chest semi-axes along X and Y.
    pub chest: (f64, f64),
    /// Heights where the waist starts and stops blending into the chest.
    pub transition: (f64, f64),
    /// Back/front asymmetry of the cross-section.
    pub egg: f64,
    /// Protrusions.
    pub bumps: Vec<Bump>,
}

impl Default for TorsoPhantom {
    fn default() -> Self {
        Self {
            height: 0.40,
            ring_spacing: 0.005,
            segments: 64,
            waist: (0.08, 0.10),
            chest: (0.11, 0.14),
            transition: (0.12, 0.18),
            egg: 0.1,
            bumps: vec![
                Bump {
                    center: Point3::new(-0.08, -0.075, 0.28),
                    radius: 0.06,
                },
                Bump {
                    center: Point3::new(-0.08, 0.075, 0.28),
                    radius: 0.06,
                },
            ],
        }
    }
}

impl TorsoPhantom {
    /// A plain torso without bumps.
    pub fn without_bumps() -> Self {
        Self {
            bumps: Vec::new(),
            ..Self::default()
        }
    }

    fn profile(&self, dir: (f64, f64), z: f64) -> f64 {
        let (z0, z1) = self.transition;
        let t = ((z - z0) / (z1 - z0)).clamp(0.0, 1.0);
        let blend = t * t * (3.0 - 2.0 * t);
        let a = self.waist.0 + (self.chest.0 - self.waist.0) * blend;
        let b = self.waist.1 + (self.chest.1 - self.waist.1) * blend;
        let (c, s) = dir;
        let base = (1.0 + self.egg * c) / ((c / a).powi(2) + (s / b).powi(2)).sqrt();

        let ray = Vec3::new(c, s, 0.0);
        self.bumps.iter().fold(base, |r, bump| {
            let w = bump.center - Point3::new(0.0, 0.0, z);
            let along = ray.dot(&w);
            let disc = along * along - w.norm_squared() + bump.radius * bump.radius;
            if disc < 0.0 {
                r
            } else {
                r.max(along + disc.sqrt())
            }
        })
    }

    /// Build the closed, outward-facing mesh.
    pub fn build(&self) -> Mesh {
        let rows = ((self.height / self.ring_spacing).round() as usize).max(1);
        let n = self.segments.max(3);
        let dirs = ring_directions(n);

        let mut mesh = Mesh::new("phantom");
        for j in 0..=rows {
            let z = self.height * j as f64 / rows as f64;
            for &(c, s) in &dirs {
                let r = self.profile((c, s), z);
                mesh.vertices.push(Point3::new(r * c, r * s, z));
            }
        }
        let bottom = mesh.vertices.len() as u32;
        mesh.vertices.push(Point3::new(0.0, 0.0, 0.0));
        mesh.vertices.push(Point3::new(0.0, 0.0, self.height));
        let top = bottom + 1;

        let n = n as u32;
        for j in 0..rows as u32 {
            let (lo, hi) = (j * n, (j + 1) * n);
            for k in 0..n {
                let k1 = (k + 1) % n;
                // Diagonals flip on the y < 0 side so the surface mirrors exactly.
                if 2 * k < n {
                    mesh.triangles.push([lo + k, lo + k1, hi + k1]);
                    mesh.triangles.push([lo + k, hi + k1, hi + k]);
                } else {
                    mesh.triangles.push([lo + k, lo + k1, hi + k]);
                    mesh.triangles.push([lo + k1, hi + k1, hi + k]);
                }
            }
        }
        let last = rows as u32 * n;
        for k in 0..n {
            let k1 = (k + 1) % n;
            mesh.triangles.push([bottom, k1, k]);
            mesh.triangles.push([top, last + k, last + k1]);
        }
        mesh
    }
}
