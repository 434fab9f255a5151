//! Time-driven interpolation of routing-handle moves.

use indexmap::IndexMap;

use crate::edit::command::CommandContext;
use crate::geometry::Point;
use crate::router::ResolvedHandleMove;

/// Interpolates routing-point (or dangling-anchor) positions between a
/// move's start and end as `t` runs over `[0, 1]`, driven by an external
/// scheduler through repeated [`tween`](Self::tween) calls.
///
/// Forward mode commits the last interpolated value at `t = 1`. Reverse
/// mode at `t = 1` does not trust accumulated interpolation: it replaces
/// each touched edge's routing-point sequence with its pre-recorded
/// snapshot and regenerates the canonical handle set, so the restoration
/// is exact no matter how many intermediate frames ran.
pub struct MoveHandlesAnimation {
    moves: IndexMap<String, ResolvedHandleMove>,
    original_routing_points: IndexMap<String, Vec<Point>>,
    reverse: bool,
}

impl MoveHandlesAnimation {
    pub fn new(
        moves: IndexMap<String, ResolvedHandleMove>,
        original_routing_points: IndexMap<String, Vec<Point>>,
        reverse: bool,
    ) -> Self {
        Self {
            moves,
            original_routing_points,
            reverse,
        }
    }

    /// One animation step. Safe to invoke repeatedly with monotonically
    /// increasing `t` and idempotent at a fixed `t`.
    pub fn tween(&self, ctx: &mut CommandContext<'_>, t: f64) {
        for mv in self.moves.values() {
            let Some(from) = mv.from_position else {
                continue;
            };

            if self.reverse && t >= 1.0 {
                if let Some(points) = self.original_routing_points.get(&mv.edge_id) {
                    // An anchored move lands exactly on its start position,
                    // not on the last interpolated frame.
                    let anchor_id = ctx
                        .diagram
                        .find_handle(&mv.element_id)
                        .and_then(|(_, handle)| handle.dangling_anchor_id.clone());
                    if let Some(anchor_id) = anchor_id {
                        if let Some(anchor) = ctx.diagram.anchors.get_mut(&anchor_id) {
                            anchor.position = from;
                        }
                    }
                    if let Some(edge) = ctx.diagram.edges.get_mut(&mv.edge_id) {
                        edge.routing_points = points.clone();
                        edge.handles.clear();
                        if let Some(router) = ctx.routers.get(&mv.router_kind) {
                            router.create_routing_handles(edge);
                        }
                    }
                    continue;
                }
            }

            let position = if self.reverse {
                mv.to_position.lerp(from, t)
            } else {
                from.lerp(mv.to_position, t)
            };

            // A handle that owns a dangling anchor moves the anchor itself;
            // anchors are not part of the routing-point sequence.
            let anchor_id = ctx
                .diagram
                .find_handle(&mv.element_id)
                .and_then(|(_, handle)| handle.dangling_anchor_id.clone());
            if let Some(anchor_id) = anchor_id {
                if let Some(anchor) = ctx.diagram.anchors.get_mut(&anchor_id) {
                    anchor.position = position;
                }
                continue;
            }

            if let Some(idx) = mv.point_index {
                if let Some(edge) = ctx.diagram.edges.get_mut(&mv.edge_id) {
                    // The edge may have been restructured mid-edit; an
                    // out-of-range index is a no-op for this point.
                    if idx < edge.routing_points.len() {
                        edge.routing_points[idx] = position;
                    }
                }
            }
        }
    }

    /// Drive the animation to completion in `steps` uniform increments,
    /// ending exactly at `t = 1`.
    pub fn run(&self, ctx: &mut CommandContext<'_>, steps: usize) {
        let steps = steps.max(1);
        for i in 0..=steps {
            self.tween(ctx, i as f64 / steps as f64);
        }
    }
}
