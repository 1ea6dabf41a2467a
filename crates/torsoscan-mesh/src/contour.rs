//! Planar polygons: area, perimeter, containment and ear-clip triangulation.

use torsoscan_math::Point2;

/// A closed planar polygon.
#[derive(Debug, Clone, Default)]
pub struct Polygon {
    /// Vertices in order; the closing edge is implicit.
    pub points: Vec<Point2>,
}

impl Polygon {
    /// Create a polygon from its vertices.
    pub fn new(points: Vec<Point2>) -> Self {
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area, positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Unsigned area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Is the polygon counter-clockwise?
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Length of the closed boundary.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| (self.points[(i + 1) % n] - self.points[i]).norm())
            .sum()
    }

    /// Even-odd containment test.
    pub fn contains(&self, point: &Point2) -> bool {
        point_in_polygon(point, &self.points)
    }
}

/// Shoelace signed area of a closed point sequence.
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Even-odd ray casting test of `point` against a closed point sequence.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &polygon[i];
        let pj = &polygon[j];
        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Barycentric test that counts points on the edges as inside, but not
/// points coinciding with a corner (bridge seams repeat corner positions).
fn point_in_triangle_2d(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    if p == a || p == b || p == c {
        return false;
    }
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < f64::MIN_POSITIVE {
        return false;
    }
    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;

    let eps = 1e-10;
    u >= -eps && v >= -eps && (u + v) <= 1.0 + eps
}

/// Ear-clipping triangulation of the polygon `indices` (into `verts`).
///
/// With `reversed` the polygon is treated as clockwise and the emitted
/// triangles keep that winding. Collinear vertices are dropped without
/// emitting a triangle; if no ear can be found the remainder is fanned.
pub fn ear_clip_triangulate(
    verts: &[Point2],
    indices: &[usize],
    reversed: bool,
    out: &mut Vec<[usize; 3]>,
) {
    if indices.len() < 3 {
        return;
    }
    let sign = if reversed { -1.0 } else { 1.0 };
    let mut remaining: Vec<usize> = indices.to_vec();

    while remaining.len() > 3 {
        let n = remaining.len();
        let mut clipped = false;

        for i in 0..n {
            let prev = (i + n - 1) % n;
            let next = (i + 1) % n;
            let (a, b, c) = (
                &verts[remaining[prev]],
                &verts[remaining[i]],
                &verts[remaining[next]],
            );
            if sign * cross(a, b, c) <= 0.0 {
                continue;
            }
            let blocked = (0..n)
                .filter(|&j| j != prev && j != i && j != next)
                .any(|j| point_in_triangle_2d(&verts[remaining[j]], a, b, c));
            if blocked {
                continue;
            }
            out.push([remaining[prev], remaining[i], remaining[next]]);
            remaining.remove(i);
            clipped = true;
            break;
        }

        if clipped {
            continue;
        }

        // No strict ear: drop a flat vertex if there is one.
        let flat = (0..n).find(|&i| {
            let (a, b, c) = (
                &verts[remaining[(i + n - 1) % n]],
                &verts[remaining[i]],
                &verts[remaining[(i + 1) % n]],
            );
            let scale = (b - a).norm() * (c - a).norm();
            cross(a, b, c).abs() <= 1e-12 * scale
        });
        match flat {
            Some(i) => {
                remaining.remove(i);
            }
            None => {
                for k in 1..remaining.len() - 1 {
                    out.push([remaining[0], remaining[k], remaining[k + 1]]);
                }
                return;
            }
        }
    }

    if remaining.len() == 3 {
        out.push([remaining[0], remaining[1], remaining[2]]);
    }
}
