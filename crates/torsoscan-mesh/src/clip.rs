//! Half-space clipping of closed meshes with cap reconstruction.
//!
//! Every boolean the analysis needs is a cut by one or more planes: a slab
//! slice is two planes, a cylinder intersection is the cylinder's face
//! planes, and a subtraction is a single plane. Clipping keeps the
//! triangles on the inner side, splits the crossing ones, and closes each
//! cut with a cap triangulated from the loops of cut edges, so the result
//! stays a closed solid whose volume and islands are meaningful.

use std::collections::{HashMap, HashSet};

use torsoscan_math::{Axis, Point2, Point3, Vec3};
use tracing::debug;

use crate::bounds::BoundingBox;
use crate::contour::{ear_clip_triangulate, point_in_polygon, signed_area};
use crate::mesh::Mesh;

/// Distances below this are snapped onto the plane.
const PLANE_EPS: f64 = 1e-12;

/// An oriented plane `normal · p = offset`.
///
/// The inner (kept) side is `normal · p <= offset`; the normal points
/// towards the material a clip removes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`.
    pub offset: f64,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here).
    ///
    /// Returns `None` for a zero normal.
    pub fn from_point_normal(point: &Point3, normal: &Vec3) -> Option<Self> {
        let n = normal.try_normalize(f64::MIN_POSITIVE)?;
        Some(Self {
            normal: n,
            offset: n.dot(&point.coords),
        })
    }

    /// Plane perpendicular to `axis` at `position`, removing everything
    /// above it (or below it when `keep_above`).
    pub fn axis_aligned(axis: Axis, position: f64, keep_above: bool) -> Self {
        let mut normal = axis.unit();
        let mut offset = position;
        if keep_above {
            normal = -normal;
            offset = -offset;
        }
        Self { normal, offset }
    }

    /// Signed distance of `p`, positive on the removed side.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn approx_eq(&self, other: &Plane) -> bool {
        self.normal.dot(&other.normal) > 1.0 - 1e-9 && (self.offset - other.offset).abs() < 1e-9
    }
}

/// Keep the part of `mesh` on the inner side of `plane`.
///
/// The result is in world space. Triangles lying in the plane are dropped
/// and rebuilt as part of the cap.
pub fn clip_half_space(mesh: &Mesh, plane: &Plane) -> Mesh {
    let mut vertices = mesh.world_vertices();
    let mut dist: Vec<f64> = vertices
        .iter()
        .map(|p| {
            let d = plane.signed_distance(p);
            if d.abs() < PLANE_EPS {
                0.0
            } else {
                d
            }
        })
        .collect();

    let mut out = Mesh::new(mesh.name.clone());
    if dist.iter().all(|&d| d <= 0.0) && !dist.iter().all(|&d| d == 0.0) {
        out.vertices = vertices;
        out.triangles = mesh.triangles.clone();
        return out;
    }
    if dist.iter().all(|&d| d > 0.0) {
        return out;
    }

    let mut splits: HashMap<(u32, u32), u32> = HashMap::new();
    let mut cap_edges: HashSet<(u32, u32)> = HashSet::new();
    let mut triangles = Vec::with_capacity(mesh.triangles.len());

    for tri in &mesh.triangles {
        let d = tri.map(|i| dist[i as usize]);
        if d.iter().all(|&x| x <= 0.0) && d.iter().any(|&x| x < 0.0) {
            triangles.push(*tri);
            record_cap_edges(tri, &dist, &mut cap_edges);
            continue;
        }
        if d.iter().all(|&x| x >= 0.0) {
            // Outside, or flat in the plane.
            continue;
        }

        let mut poly: Vec<u32> = Vec::with_capacity(4);
        for k in 0..3 {
            let (cur, next) = (tri[k], tri[(k + 1) % 3]);
            let (dc, dn) = (d[k], d[(k + 1) % 3]);
            if dc <= 0.0 {
                poly.push(cur);
            }
            if (dc <= 0.0) != (dn <= 0.0) {
                poly.push(split_edge(cur, next, &mut vertices, &mut dist, &mut splits));
            }
        }
        poly.dedup();
        if poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        if poly.len() < 3 {
            continue;
        }
        for k in 1..poly.len() - 1 {
            triangles.push([poly[0], poly[k], poly[k + 1]]);
        }
        record_cap_edges(&poly, &dist, &mut cap_edges);
    }

    out.vertices = vertices;
    out.triangles = triangles;
    if !cap_edges.is_empty() {
        let loops = chain_loops(cap_edges);
        add_caps(&mut out, &loops, &plane.normal);
    }
    out.compact();
    out
}

/// Vertex where the edge `a`-`b` crosses the plane, shared between the two
/// triangles using the edge.
fn split_edge(
    a: u32,
    b: u32,
    vertices: &mut Vec<Point3>,
    dist: &mut Vec<f64>,
    splits: &mut HashMap<(u32, u32), u32>,
) -> u32 {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let (d_lo, d_hi) = (dist[lo as usize], dist[hi as usize]);
    if d_lo == 0.0 {
        return lo;
    }
    if d_hi == 0.0 {
        return hi;
    }
    *splits.entry((lo, hi)).or_insert_with(|| {
        let t = d_lo / (d_lo - d_hi);
        let p = vertices[lo as usize] + (vertices[hi as usize] - vertices[lo as usize]) * t;
        vertices.push(p);
        dist.push(0.0);
        (vertices.len() - 1) as u32
    })
}

/// Collect the reversed on-plane edges of a kept polygon. An edge seen from
/// both neighbours cancels out.
fn record_cap_edges(poly: &[u32], dist: &[f64], cap_edges: &mut HashSet<(u32, u32)>) {
    let n = poly.len();
    for k in 0..n {
        let (a, b) = (poly[k], poly[(k + 1) % n]);
        if a == b || dist[a as usize] != 0.0 || dist[b as usize] != 0.0 {
            continue;
        }
        if !cap_edges.remove(&(a, b)) {
            cap_edges.insert((b, a));
        }
    }
}

fn chain_loops(edges: HashSet<(u32, u32)>) -> Vec<Vec<u32>> {
    let mut next: HashMap<u32, Vec<u32>> = HashMap::new();
    for (a, b) in edges {
        next.entry(a).or_default().push(b);
    }
    let mut starts: Vec<u32> = next.keys().copied().collect();
    starts.sort_unstable();

    let mut loops = Vec::new();
    for start in starts {
        while let Some(first) = next.get_mut(&start).and_then(|v| v.pop()) {
            let mut chain = vec![start];
            let mut cur = first;
            let mut closed = false;
            while let Some(step) = next.get_mut(&cur).and_then(|v| v.pop()) {
                chain.push(cur);
                if step == start {
                    closed = true;
                    break;
                }
                cur = step;
            }
            if !closed && cur == start {
                closed = true;
            }
            if closed && chain.len() >= 3 {
                loops.push(chain);
            } else {
                debug!(len = chain.len(), "dropping open cap chain");
            }
        }
    }
    loops
}

/// Triangulate the cap loops in the plane with outward normal `normal`.
fn add_caps(mesh: &mut Mesh, loops: &[Vec<u32>], normal: &Vec3) {
    let u = if normal.x.abs() < 0.9 {
        normal.cross(&Vec3::x())
    } else {
        normal.cross(&Vec3::y())
    }
    .normalize();
    let v = normal.cross(&u);

    let project = |i: u32| {
        let p = mesh.vertices[i as usize].coords;
        Point2::new(p.dot(&u), p.dot(&v))
    };
    let loops_2d: Vec<Vec<Point2>> = loops
        .iter()
        .map(|l| l.iter().map(|&i| project(i)).collect())
        .collect();
    let areas: Vec<f64> = loops_2d.iter().map(|l| signed_area(l)).collect();

    // Outer boundaries share the sign of the largest loop.
    let sign = areas
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .map(f64::signum)
        .unwrap_or(1.0);
    let (outers, holes): (Vec<usize>, Vec<usize>) =
        (0..loops.len()).partition(|&k| areas[k] * sign > 0.0);

    let mut owned_holes: Vec<Vec<usize>> = vec![Vec::new(); outers.len()];
    for &h in &holes {
        let probe = loops_2d[h][0];
        let owner = outers
            .iter()
            .enumerate()
            .filter(|&(_, &o)| point_in_polygon(&probe, &loops_2d[o]))
            .min_by(|a, b| areas[*a.1].abs().total_cmp(&areas[*b.1].abs()))
            .map(|(k, _)| k);
        if let Some(k) = owner {
            owned_holes[k].push(h);
        }
    }

    let mut verts_2d: Vec<Point2> = Vec::new();
    let mut global: Vec<u32> = Vec::new();
    for (k, &o) in outers.iter().enumerate() {
        verts_2d.clear();
        global.clear();
        for (l, pts) in std::iter::once(o)
            .chain(owned_holes[k].iter().copied())
            .map(|l| (l, &loops_2d[l]))
        {
            verts_2d.extend_from_slice(pts);
            global.extend_from_slice(&loops[l]);
        }
        let mut poly: Vec<usize> = (0..loops[o].len()).collect();
        let mut start = loops[o].len();
        for &h in &owned_holes[k] {
            poly = bridge_hole(&verts_2d, poly, start, loops[h].len());
            start += loops[h].len();
        }
        let mut tris = Vec::new();
        ear_clip_triangulate(&verts_2d, &poly, sign < 0.0, &mut tris);
        mesh.triangles.extend(
            tris.iter()
                .map(|t| [global[t[0]], global[t[1]], global[t[2]]]),
        );
    }
}

/// Splice the hole occupying `hole_start..hole_start + hole_len` into the
/// outer polygon through the closest vertex pair.
fn bridge_hole(verts: &[Point2], poly: Vec<usize>, hole_start: usize, hole_len: usize) -> Vec<usize> {
    let mut best = (f64::INFINITY, 0, 0);
    for h in 0..hole_len {
        let hp = verts[hole_start + h];
        for (j, &o) in poly.iter().enumerate() {
            let d = (verts[o] - hp).norm_squared();
            if d < best.0 {
                best = (d, h, j);
            }
        }
    }
    let (_, h, j) = best;
    let mut merged = Vec::with_capacity(poly.len() + hole_len + 2);
    merged.extend_from_slice(&poly[..=j]);
    merged.extend((0..=hole_len).map(|i| hole_start + (h + i) % hole_len));
    merged.push(poly[j]);
    merged.extend_from_slice(&poly[j + 1..]);
    merged
}

/// Keep the part of `mesh` inside every plane.
pub fn clip_convex(mesh: &Mesh, planes: &[Plane]) -> Mesh {
    let mut out = mesh.to_world();
    for plane in planes {
        if out.is_empty() {
            break;
        }
        out = clip_half_space(&out, plane);
    }
    out
}

/// The part of `mesh` inside a slab of `thickness` centred at `position`
/// along `axis`, or `None` when the slab misses the surface.
pub fn slice(mesh: &Mesh, axis: Axis, position: f64, thickness: f64) -> Option<Mesh> {
    let (lo, hi) = (position - thickness / 2.0, position + thickness / 2.0);
    let a = axis.index();
    let world = mesh.world_vertices();

    let mut band = Mesh::new(mesh.name.clone());
    band.vertices = world;
    band.triangles = mesh
        .triangles
        .iter()
        .filter(|tri| {
            let (mut t_min, mut t_max) = (f64::INFINITY, f64::NEG_INFINITY);
            for &i in tri.iter() {
                let c = band.vertices[i as usize][a];
                t_min = t_min.min(c);
                t_max = t_max.max(c);
            }
            t_max >= lo && t_min <= hi
        })
        .copied()
        .collect();
    if band.is_empty() {
        return None;
    }
    band.compact();

    let planes = [
        Plane::axis_aligned(axis, hi, false),
        Plane::axis_aligned(axis, lo, true),
    ];
    let mut out = clip_convex(&band, &planes);
    if out.is_empty() {
        return None;
    }
    out.name = format!("{}.slice", mesh.name);
    Some(out)
}

/// Distinct face planes of a closed convex mesh, outward-facing.
pub fn face_planes(cutter: &Mesh) -> Vec<Plane> {
    let mut planes: Vec<Plane> = Vec::new();
    for t in 0..cutter.triangle_count() {
        let [a, b, c] = cutter.world_triangle(t);
        let Some(plane) = Plane::from_point_normal(&a, &(b - a).cross(&(c - a))) else {
            continue;
        };
        if !planes.iter().any(|p| p.approx_eq(&plane)) {
            planes.push(plane);
        }
    }
    planes
}

/// Boolean intersection of `mesh` with a convex `cutter`.
///
/// Returns `None` when nothing of `mesh` lies inside the cutter.
pub fn intersect(mesh: &Mesh, cutter: &Mesh) -> Option<Mesh> {
    let (a, b) = (BoundingBox::of(mesh)?, BoundingBox::of(cutter)?);
    if (0..3).any(|i| a.max[i] < b.min[i] || a.min[i] > b.max[i]) {
        return None;
    }
    let out = clip_convex(mesh, &face_planes(cutter));
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}
