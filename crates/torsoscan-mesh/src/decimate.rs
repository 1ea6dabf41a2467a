//! Vertex-clustering decimation.

use std::collections::{HashMap, HashSet};

use torsoscan_math::{Point3, Vec3};
use tracing::debug;

use crate::bounds::BoundingBox;
use crate::mesh::Mesh;

/// Growth factor of the clustering cell between attempts.
const CELL_GROWTH: f64 = 1.25;

/// Reduce `mesh` to at most `max_vertices` vertices by merging vertices that
/// fall in the same grid cell.
///
/// The grid is centred on the bounding-box centre, so a mesh symmetric about
/// that centre stays symmetric. Triangles that collapse are removed. Returns
/// whether the mesh changed.
pub fn decimate(mesh: &mut Mesh, max_vertices: usize) -> bool {
    if max_vertices < 3 || mesh.vertex_count() <= max_vertices {
        return false;
    }
    mesh.bake_transform();
    let Some(bbox) = BoundingBox::of(mesh) else {
        return false;
    };
    let extent = bbox.dimensions().max();
    if extent <= 0.0 {
        return false;
    }
    let center = bbox.center();

    let mut cell = extent / max_vertices as f64;
    let mut keys = cluster_keys(&mesh.vertices, &center, cell);
    while distinct(&keys) > max_vertices {
        cell *= CELL_GROWTH;
        keys = cluster_keys(&mesh.vertices, &center, cell);
    }

    let mut slot: HashMap<[i64; 3], u32> = HashMap::new();
    let mut sums: Vec<(Vec3, usize)> = Vec::new();
    let remap: Vec<u32> = keys
        .iter()
        .zip(&mesh.vertices)
        .map(|(key, p)| {
            let s = *slot.entry(*key).or_insert_with(|| {
                sums.push((Vec3::zeros(), 0));
                (sums.len() - 1) as u32
            });
            let entry = &mut sums[s as usize];
            entry.0 += p.coords;
            entry.1 += 1;
            s
        })
        .collect();

    let before = mesh.vertex_count();
    let mut seen: HashSet<[u32; 3]> = HashSet::new();
    mesh.triangles = mesh
        .triangles
        .iter()
        .map(|t| t.map(|i| remap[i as usize]))
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .filter(|t| {
            let mut key = *t;
            key.sort_unstable();
            seen.insert(key)
        })
        .collect();
    mesh.vertices = sums
        .into_iter()
        .map(|(sum, n)| Point3::from(sum / n as f64))
        .collect();
    mesh.compact();
    debug!(
        mesh = %mesh.name,
        before,
        after = mesh.vertex_count(),
        cell,
        "decimated"
    );
    true
}

fn cluster_keys(vertices: &[Point3], center: &Point3, cell: f64) -> Vec<[i64; 3]> {
    vertices
        .iter()
        .map(|p| {
            let d = (p - center) / cell;
            [
                d.x.round() as i64,
                d.y.round() as i64,
                d.z.round() as i64,
            ]
        })
        .collect()
}

fn distinct(keys: &[[i64; 3]]) -> usize {
    keys.iter().collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cylinder;

    #[test]
    fn test_decimate_caps_vertex_count() {
        let mut mesh = cylinder(1.0, 0.2, 256).unwrap();
        assert!(mesh.vertex_count() > 200);
        assert!(decimate(&mut mesh, 200));
        assert!(mesh.vertex_count() <= 200);
        assert!(mesh.triangle_count() > 0);
        assert!(mesh.signed_volume() > 0.3);
    }

    #[test]
    fn test_decimate_keeps_small_meshes() {
        let mut mesh = cylinder(1.0, 0.2, 16).unwrap();
        let before = mesh.clone();
        assert!(!decimate(&mut mesh, 200));
        assert_eq!(mesh.vertices, before.vertices);
    }

    #[test]
    fn test_decimate_preserves_mirror_symmetry() {
        let mut mesh = cylinder(1.0, 0.2, 512).unwrap();
        decimate(&mut mesh, 100);
        for p in &mesh.vertices {
            let has_mirror = mesh
                .vertices
                .iter()
                .any(|q| (q.x - p.x).abs() < 1e-9 && (q.y + p.y).abs() < 1e-9 && (q.z - p.z).abs() < 1e-9);
            assert!(has_mirror, "no mirror for {p:?}");
        }
    }
}
