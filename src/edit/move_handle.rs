//! Moving routing handles, with dangling-anchor detachment and merge.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::edit::animation::MoveHandlesAnimation;
use crate::edit::command::{
    Command, CommandContext, CommandResult, Executable, Mergeable, Undoable,
};
use crate::geometry::Point;
use crate::model::{DanglingAnchor, HandleKind};
use crate::router::ResolvedHandleMove;

/// A raw move request. The start position is optional because some
/// callers only know the destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleMove {
    pub element_id: String,
    #[serde(default)]
    pub from_position: Option<Point>,
    pub to_position: Point,
}

fn default_animate() -> bool {
    true
}

/// Request to move one or more routing handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRoutingHandleAction {
    pub moves: Vec<HandleMove>,
    #[serde(default = "default_animate")]
    pub animate: bool,
}

impl MoveRoutingHandleAction {
    pub fn new(moves: Vec<HandleMove>) -> Self {
        Self {
            moves,
            animate: true,
        }
    }

    pub fn without_animation(moves: Vec<HandleMove>) -> Self {
        Self {
            moves,
            animate: false,
        }
    }
}

pub const MOVE_ROUTING_HANDLE_KIND: &str = "moveRoutingHandle";

/// Resolves raw moves into handle/edge/router triples, detaches endpoints
/// into dangling anchors on the first source/target move, and applies the
/// moves either directly (batched per edge through the router) or through
/// a [`MoveHandlesAnimation`].
pub struct MoveRoutingHandleCommand {
    action: MoveRoutingHandleAction,
    resolved_moves: IndexMap<String, ResolvedHandleMove>,
    /// Routing-point snapshots per edge, taken before the edge's first
    /// mutation by this command. Undo restores from these exactly.
    original_routing_points: IndexMap<String, Vec<Point>>,
}

impl MoveRoutingHandleCommand {
    pub fn new(action: MoveRoutingHandleAction) -> Self {
        Self {
            action,
            resolved_moves: IndexMap::new(),
            original_routing_points: IndexMap::new(),
        }
    }

    /// Resolved-state accessor for hosts inspecting a live command.
    pub fn resolved_moves(&self) -> impl Iterator<Item = &ResolvedHandleMove> {
        self.resolved_moves.values()
    }

    /// Bind a raw move to its handle, edge, and router. Moves whose id
    /// does not resolve to a routing handle (or whose edge has no
    /// registered router) are skipped.
    fn resolve(
        &mut self,
        mv: &HandleMove,
        ctx: &mut CommandContext<'_>,
    ) -> Option<ResolvedHandleMove> {
        let Some((edge_id, handle_idx)) = ctx.diagram.locate_handle(&mv.element_id) else {
            log::debug!("move handle: {:?} is not a routing handle, skipped", mv.element_id);
            return None;
        };
        let (router_kind, handle_kind, point_index, endpoint_id) = {
            let edge = ctx.diagram.edges.get(&edge_id)?;
            let handle = &edge.handles[handle_idx];
            let endpoint_id = match handle.kind {
                HandleKind::Source => Some(edge.source_id.clone()),
                HandleKind::Target => Some(edge.target_id.clone()),
                HandleKind::Junction => None,
            };
            (
                edge.router_kind.clone(),
                handle.kind,
                handle.point_index,
                endpoint_id,
            )
        };
        if ctx.routers.get(&router_kind).is_none() {
            log::debug!("move handle: no router for kind {router_kind:?}, skipped");
            return None;
        }

        // Snapshot the edge before this command's first mutation of it.
        if !self.original_routing_points.contains_key(&edge_id) {
            let points = ctx.diagram.edges[&edge_id].routing_points.clone();
            self.original_routing_points.insert(edge_id.clone(), points);
        }

        // An endpoint handle dragged off its node detaches into a dangling
        // anchor; a still-detached endpoint must not grow a second one.
        if let Some(endpoint_id) = endpoint_id {
            if !ctx.diagram.anchors.contains_key(&endpoint_id) {
                self.detach_endpoint(ctx, &edge_id, handle_idx, handle_kind, endpoint_id, mv);
            }
        }

        Some(ResolvedHandleMove {
            element_id: mv.element_id.clone(),
            edge_id,
            router_kind,
            handle_kind,
            point_index,
            from_position: mv.from_position,
            to_position: mv.to_position,
        })
    }

    fn detach_endpoint(
        &mut self,
        ctx: &mut CommandContext<'_>,
        edge_id: &str,
        handle_idx: usize,
        handle_kind: HandleKind,
        original_id: String,
        mv: &HandleMove,
    ) {
        let role = match handle_kind {
            HandleKind::Source => "source",
            HandleKind::Target => "target",
            HandleKind::Junction => return,
        };
        let anchor_id = format!("{edge_id}_dangling-{role}");
        ctx.diagram.anchors.insert(
            anchor_id.clone(),
            DanglingAnchor {
                id: anchor_id.clone(),
                position: mv.to_position,
                original_id,
            },
        );
        let router_kind = {
            let Some(edge) = ctx.diagram.edges.get_mut(edge_id) else {
                return;
            };
            match handle_kind {
                HandleKind::Source => edge.source_id = anchor_id.clone(),
                HandleKind::Target => edge.target_id = anchor_id.clone(),
                HandleKind::Junction => unreachable!(),
            }
            edge.handles[handle_idx].dangling_anchor_id = Some(anchor_id);
            edge.router_kind.clone()
        };
        // Detachment can leave degenerate points behind; the router decides
        // which ones.
        if let Some(router) = ctx.routers.get(&router_kind) {
            if let Some(edge) = ctx.diagram.edges.get_mut(edge_id) {
                router.cleanup_routing_points(edge, true);
            }
        }
    }

    /// Apply all resolved moves immediately: anchored handles write the
    /// anchor position directly, everything else is batched per edge into
    /// a single router call.
    fn apply_moves(&self, ctx: &mut CommandContext<'_>) {
        let mut by_edge: IndexMap<String, Vec<ResolvedHandleMove>> = IndexMap::new();
        for mv in self.resolved_moves.values() {
            let anchor_id = ctx
                .diagram
                .find_handle(&mv.element_id)
                .and_then(|(_, handle)| handle.dangling_anchor_id.clone());
            if let Some(anchor_id) = anchor_id {
                if let Some(anchor) = ctx.diagram.anchors.get_mut(&anchor_id) {
                    anchor.position = mv.to_position;
                }
                continue;
            }
            by_edge
                .entry(mv.edge_id.clone())
                .or_default()
                .push(mv.clone());
        }
        for (edge_id, moves) in &by_edge {
            // All moves for an edge share that edge's router.
            let router_kind = &moves[0].router_kind;
            if let Some(router) = ctx.routers.get(router_kind) {
                if let Some(edge) = ctx.diagram.edges.get_mut(edge_id) {
                    router.apply_handle_moves(edge, moves);
                }
            }
        }
    }

    fn animation(&self, reverse: bool) -> MoveHandlesAnimation {
        MoveHandlesAnimation::new(
            self.resolved_moves.clone(),
            self.original_routing_points.clone(),
            reverse,
        )
    }
}

impl Executable for MoveRoutingHandleCommand {
    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        let moves = self.action.moves.clone();
        for mv in &moves {
            if let Some(resolved) = self.resolve(mv, ctx) {
                self.resolved_moves
                    .insert(resolved.element_id.clone(), resolved);
            }
        }
        if self.action.animate {
            CommandResult::Animating(self.animation(false))
        } else {
            self.apply_moves(ctx);
            CommandResult::Done
        }
    }
}

impl Undoable for MoveRoutingHandleCommand {
    fn undo(&mut self, _ctx: &mut CommandContext<'_>) -> CommandResult {
        CommandResult::Animating(self.animation(true))
    }

    fn redo(&mut self, _ctx: &mut CommandContext<'_>) -> CommandResult {
        CommandResult::Animating(self.animation(false))
    }
}

impl Mergeable for MoveRoutingHandleCommand {
    /// Absorb a later, already-executed move command: known handles just
    /// get the newer destination, unseen handles are adopted along with
    /// the snapshots the other command took before it ran. Animated
    /// receivers always decline; edges already snapshotted here keep
    /// their earlier snapshot.
    fn merge(&mut self, other: &dyn Command, _ctx: &mut CommandContext<'_>) -> bool {
        if self.action.animate {
            return false;
        }
        let Some(other) = other.as_any().downcast_ref::<MoveRoutingHandleCommand>() else {
            return false;
        };
        for resolved in other.resolved_moves.values() {
            if let Some(existing) = self.resolved_moves.get_mut(&resolved.element_id) {
                existing.to_position = resolved.to_position;
            } else {
                self.resolved_moves
                    .insert(resolved.element_id.clone(), resolved.clone());
            }
        }
        for (edge_id, points) in &other.original_routing_points {
            if !self.original_routing_points.contains_key(edge_id) {
                self.original_routing_points
                    .insert(edge_id.clone(), points.clone());
            }
        }
        true
    }
}

impl Command for MoveRoutingHandleCommand {
    fn kind(&self) -> &'static str {
        MOVE_ROUTING_HANDLE_KIND
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_mergeable(&mut self) -> Option<&mut dyn Mergeable> {
        Some(self)
    }
}
