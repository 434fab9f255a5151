//! Straight-segment routing.

use crate::geometry::Point;
use crate::model::{Diagram, Edge};

use super::{
    dedup_consecutive_points, rebuild_routing_handles, ResolvedHandleMove, RoutedPoint,
    RoutedPointKind, Router,
};

pub const POLYLINE_KIND: &str = "polyline";

/// Routes edges as a chain of straight segments through their routing
/// points. Routing points that coincide with the previously emitted point
/// carry no geometry and are left out of the effective route, which makes
/// their junction handles prunable on deactivation.
pub struct PolylineRouter;

impl Router for PolylineRouter {
    fn kind(&self) -> &'static str {
        POLYLINE_KIND
    }

    fn route(&self, diagram: &Diagram, edge: &Edge) -> Vec<RoutedPoint> {
        let mut route = Vec::with_capacity(edge.routing_points.len() + 2);
        if let Some(source) = diagram.endpoint_position(&edge.source_id) {
            route.push(RoutedPoint {
                kind: RoutedPointKind::Source,
                point: source,
                point_index: None,
            });
        }
        for (i, point) in edge.routing_points.iter().enumerate() {
            let redundant = route
                .last()
                .map(|prev: &RoutedPoint| prev.point.almost_equals(*point))
                .unwrap_or(false);
            if redundant {
                continue;
            }
            route.push(RoutedPoint {
                kind: RoutedPointKind::Linear,
                point: *point,
                point_index: Some(i),
            });
        }
        if let Some(target) = diagram.endpoint_position(&edge.target_id) {
            // A trailing routing point sitting on the target is equally dead.
            if let Some(prev) = route.last() {
                if prev.kind == RoutedPointKind::Linear && prev.point.almost_equals(target) {
                    route.pop();
                }
            }
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

    fn cleanup_routing_points(&self, edge: &mut Edge, _endpoint_detached: bool) {
        dedup_consecutive_points(&mut edge.routing_points);
    }

    fn apply_handle_moves(&self, edge: &mut Edge, moves: &[ResolvedHandleMove]) {
        for mv in moves {
            if let Some(idx) = mv.point_index {
                if idx < edge.routing_points.len() {
                    edge.routing_points[idx] = mv.to_position;
                }
            }
        }
    }
}
