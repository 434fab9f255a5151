//! Axis-aligned routing.

use crate::geometry::{Point, EPSILON};
use crate::model::{Diagram, Edge};

use super::{
    dedup_consecutive_points, rebuild_routing_handles, ResolvedHandleMove, RoutedPoint,
    RoutedPointKind, Router,
};

pub const ORTHOGONAL_KIND: &str = "orthogonal";

/// Routes edges as axis-aligned segments. Only corner points take part in
/// the effective route: a routing point collinear with its neighbours adds
/// no corner, so its junction handle is prunable.
pub struct OrthogonalRouter;

fn collinear(a: Point, b: Point, c: Point) -> bool {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    cross.abs() < EPSILON
}

impl Router for OrthogonalRouter {
    fn kind(&self) -> &'static str {
        ORTHOGONAL_KIND
    }

    fn route(&self, diagram: &Diagram, edge: &Edge) -> Vec<RoutedPoint> {
        let source = diagram.endpoint_position(&edge.source_id);
        let target = diagram.endpoint_position(&edge.target_id);

        let mut route = Vec::with_capacity(edge.routing_points.len() + 2);
        if let Some(source) = source {
            route.push(RoutedPoint {
                kind: RoutedPointKind::Source,
                point: source,
                point_index: None,
            });
        }
        let points = &edge.routing_points;
        for (i, point) in points.iter().enumerate() {
            let prev = route.last().map(|rp: &RoutedPoint| rp.point);
            let next = points.get(i + 1).copied().or(target);
            let is_corner = match (prev, next) {
                (Some(prev), Some(next)) => {
                    !prev.almost_equals(*point)
                        && !next.almost_equals(*point)
                        && !collinear(prev, *point, next)
                }
                // Without both neighbours the point cannot be judged; keep it.
                _ => true,
            };
            if is_corner {
                route.push(RoutedPoint {
                    kind: RoutedPointKind::Linear,
                    point: *point,
                    point_index: Some(i),
                });
            }
        }
        if let Some(target) = target {
            route.push(RoutedPoint {
                kind: RoutedPointKind::Target,
                point: target,
                point_index: None,
            });
        }
        route
    }

    fn create_routing_handles(&self, edge: &mut Edge) {
        rebuild_routing_handles(edge);
    }

    fn cleanup_routing_points(&self, edge: &mut Edge, endpoint_detached: bool) {
        dedup_consecutive_points(&mut edge.routing_points);
        if !endpoint_detached || edge.routing_points.len() < 3 {
            return;
        }
        // A detached endpoint no longer pins its approach segment; interior
        // points that stopped being corners are dropped.
        let points = &edge.routing_points;
        let mut kept = Vec::with_capacity(points.len());
        kept.push(points[0]);
        for i in 1..points.len() - 1 {
            if !collinear(points[i - 1], points[i], points[i + 1]) {
                kept.push(points[i]);
            }
        }
        kept.push(points[points.len() - 1]);
        edge.routing_points = kept;
    }

    fn apply_handle_moves(&self, edge: &mut Edge, moves: &[ResolvedHandleMove]) {
        for mv in moves {
            let Some(idx) = mv.point_index else { continue };
            if idx >= edge.routing_points.len() {
                continue;
            }
            let old = edge.routing_points[idx];
            edge.routing_points[idx] = mv.to_position;

            // Re-align the neighbours so the segments around the moved
            // corner stay axis-aligned: a neighbour that shared an axis
            // with the old position follows the moved point on that axis.
            if idx > 0 {
                let prev = &mut edge.routing_points[idx - 1];
                if (prev.x - old.x).abs() < EPSILON {
                    prev.x = mv.to_position.x;
                } else if (prev.y - old.y).abs() < EPSILON {
                    prev.y = mv.to_position.y;
                }
            }
            if idx + 1 < edge.routing_points.len() {
                let next = &mut edge.routing_points[idx + 1];
                if (next.x - old.x).abs() < EPSILON {
                    next.x = mv.to_position.x;
                } else if (next.y - old.y).abs() < EPSILON {
                    next.y = mv.to_position.y;
                }
            }
        }
    }
}
