use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::point::Point;

use crate::models::OrientedRect;

/// Find the outermost contours of a binary edge image.
///
/// Contours nested inside another component's hole are skipped. Each contour
/// is compressed so straight horizontal, vertical and diagonal runs keep only
/// their end points.
pub fn find_external_contours(edges: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none() && matches!(c.border_type, BorderType::Outer))
        .map(|c| compress_chain(&c.points))
        .collect()
}

/// Drop the interior points of collinear unit-step runs of a closed chain
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        points.to_vec()
    } else {
        kept
    }
}

/// Closed Douglas-Peucker approximation with a tolerance relative to the perimeter.
///
/// The ring is cut at two far-apart contour points and each half is
/// simplified as an open chain, so both cut points survive as vertices.
pub fn approximate_polygon(contour: &[Point<i32>], tolerance: f64) -> Vec<Point<i32>> {
    let n = contour.len();
    if n < 3 {
        return contour.to_vec();
    }
    let epsilon = tolerance * arc_length(contour, true);
    if !(epsilon > 0.0) {
        return contour.to_vec();
    }

    let start = farthest_from(contour, contour[0]);
    let end = farthest_from(contour, contour[start]);
    if start == end {
        return vec![contour[start]];
    }

    let arc = |from: usize, to: usize| -> Vec<Point<i32>> {
        let len = (to + n - from) % n;
        (0..=len).map(|k| contour[(from + k) % n]).collect()
    };

    let mut polygon = approximate_polygon_dp(&arc(start, end), epsilon, false);
    polygon.pop();
    polygon.extend(approximate_polygon_dp(&arc(end, start), epsilon, false));
    polygon.pop();
    polygon
}

/// Index of the contour point farthest from `origin`; the first one wins ties
fn farthest_from(contour: &[Point<i32>], origin: Point<i32>) -> usize {
    let mut best = (0, -1i64);
    for (i, p) in contour.iter().enumerate() {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        let d = dx * dx + dy * dy;
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Minimum-area enclosing rectangle by rotating calipers over the convex hull.
///
/// The returned angle lies in `[-90, 0)` degrees. An axis-aligned box comes
/// back as angle -90 with its vertical extent as the width.
pub fn min_area_rect(points: &[Point<i32>]) -> OrientedRect {
    let hull_points = if points.len() < 3 {
        points.to_vec()
    } else {
        convex_hull(points)
    };
    let hull: Vec<(f64, f64)> = hull_points
        .into_iter()
        .map(|p| (p.x as f64, p.y as f64))
        .collect();

    match hull.len() {
        0 => return OrientedRect::new((0.0, 0.0), (0.0, 0.0), -90.0),
        1 => {
            let (x, y) = hull[0];
            return OrientedRect::new((x as f32, y as f32), (0.0, 0.0), -90.0);
        }
        _ => {}
    }

    // (area, axis u, min/max along u, min/max along v)
    let mut best: Option<(f64, (f64, f64), (f64, f64), (f64, f64))> = None;

    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        let u = (dx / len, dy / len);
        let v = (-u.1, u.0);

        let mut u_range = (f64::MAX, f64::MIN);
        let mut v_range = (f64::MAX, f64::MIN);
        for &(x, y) in &hull {
            let pu = x * u.0 + y * u.1;
            let pv = x * v.0 + y * v.1;
            u_range = (u_range.0.min(pu), u_range.1.max(pu));
            v_range = (v_range.0.min(pv), v_range.1.max(pv));
        }

        let area = (u_range.1 - u_range.0) * (v_range.1 - v_range.0);
        if best.is_none_or(|(best_area, ..)| area < best_area) {
            best = Some((area, u, u_range, v_range));
        }
    }

    let Some((_, u, u_range, v_range)) = best else {
        let (x, y) = hull[0];
        return OrientedRect::new((x as f32, y as f32), (0.0, 0.0), -90.0);
    };

    let v = (-u.1, u.0);
    let cu = (u_range.0 + u_range.1) * 0.5;
    let cv = (v_range.0 + v_range.1) * 0.5;
    let center = (u.0 * cu + v.0 * cv, u.1 * cu + v.1 * cv);

    let mut width = u_range.1 - u_range.0;
    let mut height = v_range.1 - v_range.0;
    let mut angle = u.1.atan2(u.0).to_degrees();

    // Fold the axis direction into [-90, 90), then onto [-90, 0) by
    // switching to the perpendicular axis.
    if angle >= 90.0 {
        angle -= 180.0;
    } else if angle < -90.0 {
        angle += 180.0;
    }
    if angle >= 0.0 {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }

    OrientedRect::new(
        (center.0 as f32, center.1 as f32),
        (width as f32, height as f32),
        angle as f32,
    )
}

/// True for simple convex polygons (consistent turn direction at every vertex)
pub fn is_convex(polygon: &[Point<i32>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut orientation = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = (b.x - a.x) as i64 * (c.y - b.y) as i64 - (b.y - a.y) as i64 * (c.x - b.x) as i64;
        if cross == 0 {
            continue;
        }
        let sign = cross.signum();
        if orientation == 0 {
            orientation = sign;
        } else if orientation != sign {
            return false;
        }
    }
    orientation != 0
}

/// Centroid from the polygon's spatial moments, `(m10 / m00, m01 / m00)`.
///
/// Falls back to the vertex mean for degenerate (zero-area) polygons.
pub fn polygon_centroid(polygon: &[Point<i32>]) -> Option<(f32, f32)> {
    if polygon.is_empty() {
        return None;
    }

    let n = polygon.len();
    let (mut m00, mut m10, mut m01) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let (x0, y0) = (polygon[i].x as f64, polygon[i].y as f64);
        let (x1, y1) = (polygon[(i + 1) % n].x as f64, polygon[(i + 1) % n].y as f64);
        let cross = x0 * y1 - x1 * y0;
        m00 += cross;
        m10 += (x0 + x1) * cross;
        m01 += (y0 + y1) * cross;
    }
    m00 *= 0.5;
    m10 /= 6.0;
    m01 /= 6.0;

    if m00.abs() < f64::EPSILON {
        let sx: f64 = polygon.iter().map(|p| p.x as f64).sum();
        let sy: f64 = polygon.iter().map(|p| p.y as f64).sum();
        return Some(((sx / n as f64) as f32, (sy / n as f64) as f32));
    }

    Some(((m10 / m00) as f32, (m01 / m00) as f32))
}
