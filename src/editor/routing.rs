//! Orthogonal wire routing.
//!
//! Turns an ordered anchor list (source port, waypoints, target port) into a
//! polyline of axis-aligned segments. A bare source/target pair gets either a
//! two-bend route through the horizontal midpoint or, when the target is not
//! far enough to the right, an S-shaped route that steps `gap` out of the
//! source and `gap` into the target so the wire never doubles back through
//! the blocks. Paths through waypoints use a plain horizontal-first L bend
//! per segment.
//!
//! The function is pure and deterministic.

use crate::config::RoutingConfig;
use crate::model::Point;

/// Route with the default gap of 20.
pub fn route(points: &[Point]) -> Vec<Point> {
    route_with(points, &RoutingConfig::default())
}

/// Route an anchor list. Inputs with fewer than two points are returned as-is.
pub fn route_with(points: &[Point], cfg: &RoutingConfig) -> Vec<Point> {
    let Some(&last) = points.last() else {
        return Vec::new();
    };
    if points.len() < 2 {
        return points.to_vec();
    }

    let gap = cfg.gap;
    let pairs = points.len() - 1;
    let mut out = Vec::with_capacity(if pairs == 1 { 6 } else { 2 * pairs + 1 });

    for pair in points.windows(2) {
        let (p1, p2) = (pair[0], pair[1]);
        if pairs == 1 {
            if p2.x > p1.x + 2.0 * gap {
                let mid_x = p1.x + (p2.x - p1.x) / 2.0;
                out.push(p1);
                out.push(Point::new(mid_x, p1.y));
                out.push(Point::new(mid_x, p2.y));
            } else {
                let mid_y = p1.y + (p2.y - p1.y) / 2.0;
                out.push(p1);
                out.push(Point::new(p1.x + gap, p1.y));
                out.push(Point::new(p1.x + gap, mid_y));
                out.push(Point::new(p2.x - gap, mid_y));
                out.push(Point::new(p2.x - gap, p2.y));
            }
        } else {
            out.push(p1);
            out.push(Point::new(p2.x, p1.y));
        }
    }

    out.push(last);
    out
}

/// True when every segment of `polyline` is horizontal or vertical.
pub fn is_orthogonal(polyline: &[Point]) -> bool {
    polyline
        .windows(2)
        .all(|s| s[0].x == s[1].x || s[0].y == s[1].y)
}
