//! 2D convex hulls of projected vertices.

use torsoscan_math::Point2;

use crate::contour::Polygon;

fn cross(o: &Point2, a: &Point2, b: &Point2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns indices into `points` in counter-clockwise order without
/// collinear vertices, or `None` when the hull has fewer than three corners
/// (too few points, or all of them collinear).
pub fn convex_hull_2d(points: &[Point2]) -> Option<Vec<usize>> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points[i].x.is_finite() && points[i].y.is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        points[a]
            .x
            .total_cmp(&points[b].x)
            .then(points[a].y.total_cmp(&points[b].y))
    });
    order.dedup_by(|a, b| points[*a] == points[*b]);
    if order.len() < 3 {
        return None;
    }

    let mut hull: Vec<usize> = Vec::with_capacity(order.len() + 1);
    for &i in &order {
        while hull.len() >= 2
            && cross(&points[hull[hull.len() - 2]], &points[hull[hull.len() - 1]], &points[i]) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }
    let lower_len = hull.len() + 1;
    for &i in order.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&points[hull[hull.len() - 2]], &points[hull[hull.len() - 1]], &points[i]) <= 0.0
        {
            hull.pop();
        }
        hull.push(i);
    }
    hull.pop();

    if hull.len() < 3 {
        None
    } else {
        Some(hull)
    }
}

/// The hull as a counter-clockwise polygon.
pub fn hull_polygon(points: &[Point2]) -> Option<Polygon> {
    let indices = convex_hull_2d(points)?;
    Some(Polygon::new(indices.into_iter().map(|i| points[i]).collect()))
}

/// Perimeter of the convex hull, `None` for an invalid hull.
pub fn hull_perimeter(points: &[Point2]) -> Option<f64> {
    hull_polygon(points).map(|p| p.perimeter())
}

/// Area of the convex hull, `None` for an invalid hull.
pub fn hull_area(points: &[Point2]) -> Option<f64> {
    hull_polygon(points).map(|p| p.area())
}
