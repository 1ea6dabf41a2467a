//! Connected-component splitting.

use std::collections::HashMap;

use crate::mesh::Mesh;

/// Positions closer than this are welded before connectivity is computed.
const WELD_QUANTUM: f64 = 1e-9;

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}

/// Split `mesh` into its connected components, in order of first triangle.
///
/// Triangles are connected when they share a vertex position. Each island is
/// a world-space mesh holding only the vertices it uses.
pub fn islands(mesh: &Mesh) -> Vec<Mesh> {
    let verts = mesh.world_vertices();
    let mut welded: HashMap<[i64; 3], usize> = HashMap::new();
    let canon: Vec<usize> = verts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let key = [
                (p.x / WELD_QUANTUM).round() as i64,
                (p.y / WELD_QUANTUM).round() as i64,
                (p.z / WELD_QUANTUM).round() as i64,
            ];
            *welded.entry(key).or_insert(i)
        })
        .collect();

    let mut sets = DisjointSet::new(verts.len());
    for tri in &mesh.triangles {
        let [a, b, c] = tri.map(|i| canon[i as usize]);
        sets.union(a, b);
        sets.union(b, c);
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut out: Vec<Mesh> = Vec::new();
    for tri in &mesh.triangles {
        let root = sets.find(canon[tri[0] as usize]);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            let mut island = Mesh::new(format!("{}.island{}", mesh.name, out.len()));
            island.vertices = verts.clone();
            out.push(island);
            out.len() - 1
        });
        out[slot].triangles.push(*tri);
    }
    for island in &mut out {
        island.compact();
    }
    out
}

/// Number of connected components.
pub fn island_count(mesh: &Mesh) -> usize {
    islands(mesh).len()
}
