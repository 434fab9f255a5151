//! Pluggable routing geometry.
//!
//! Edges declare a `router_kind`; the editing core is agnostic to which
//! concrete geometry algorithm is bound and talks to routers only through
//! the [`Router`] trait. A [`RouterRegistry`] maps kinds to
//! implementations; [`PolylineRouter`] and [`OrthogonalRouter`] are
//! registered by default.

pub mod orthogonal;
pub mod polyline;

use std::collections::HashMap;

use crate::geometry::Point;
use crate::model::{Diagram, Edge, HandleKind, RoutingHandle};

pub use orthogonal::OrthogonalRouter;
pub use polyline::PolylineRouter;

// ────────────────────────────────────────────────────────────────────────────
// Route representation
// ────────────────────────────────────────────────────────────────────────────

/// Role of a point within an effective route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutedPointKind {
    Source,
    Linear,
    Target,
}

/// One point of an edge's effective route. Linear points carry the index
/// of the routing point they originate from; a junction handle whose
/// `point_index` appears in no routed point is stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutedPoint {
    pub kind: RoutedPointKind,
    pub point: Point,
    pub point_index: Option<usize>,
}

/// A handle move after id lookup and capability validation: bound to its
/// edge and router by id, never by live reference.
#[derive(Debug, Clone)]
pub struct ResolvedHandleMove {
    pub element_id: String,
    pub edge_id: String,
    pub router_kind: String,
    pub handle_kind: HandleKind,
    pub point_index: Option<usize>,
    pub from_position: Option<Point>,
    pub to_position: Point,
}

// ────────────────────────────────────────────────────────────────────────────
// Router trait
// ────────────────────────────────────────────────────────────────────────────

/// Geometry engine for one routing style.
pub trait Router {
    /// The `router_kind` this implementation is registered under.
    fn kind(&self) -> &'static str;

    /// The edge's current effective route. Needs the diagram to resolve
    /// endpoint positions.
    fn route(&self, diagram: &Diagram, edge: &Edge) -> Vec<RoutedPoint>;

    /// (Re)generate the full handle set for the edge's current geometry.
    /// Must be idempotent: calling it twice without an intervening
    /// geometry change yields an equivalent handle set.
    fn create_routing_handles(&self, edge: &mut Edge);

    /// Remove routing points made redundant, e.g. by an endpoint becoming
    /// a dangling anchor. The router decides which points, if any, are
    /// degenerate.
    fn cleanup_routing_points(&self, edge: &mut Edge, endpoint_detached: bool);

    /// Apply a batch of handle repositionings to one edge in a single
    /// pass, honoring the routing style's constraints. `point_index`
    /// stability must be preserved for handles not being moved.
    fn apply_handle_moves(&self, edge: &mut Edge, moves: &[ResolvedHandleMove]);
}

// ────────────────────────────────────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────────────────────────────────────

/// Maps `router_kind` strings to router implementations.
#[derive(Default)]
pub struct RouterRegistry {
    routers: HashMap<String, Box<dyn Router>>,
}

impl RouterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in routers registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PolylineRouter));
        registry.register(Box::new(OrthogonalRouter));
        registry
    }

    pub fn register(&mut self, router: Box<dyn Router>) {
        self.routers.insert(router.kind().to_string(), router);
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Router> {
        self.routers.get(kind).map(|r| r.as_ref())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared handle regeneration
// ────────────────────────────────────────────────────────────────────────────

/// Rebuild an edge's handle set deterministically: one source handle, one
/// junction handle per routing point, one target handle.
///
/// `edit_mode` and `dangling_anchor_id` carry over to regenerated handles
/// with the same `(kind, point_index)`, which keeps regeneration idempotent
/// and keeps anchor ownership intact across a rebuild.
pub(crate) fn rebuild_routing_handles(edge: &mut Edge) {
    let old = std::mem::take(&mut edge.handles);
    let carried = |kind: HandleKind, point_index: Option<usize>| {
        old.iter()
            .find(|h| h.kind == kind && h.point_index == point_index)
            .map(|h| (h.edit_mode, h.dangling_anchor_id.clone()))
            .unwrap_or((false, None))
    };

    let mut handles = Vec::with_capacity(edge.routing_points.len() + 2);
    let (edit_mode, anchor) = carried(HandleKind::Source, None);
    handles.push(RoutingHandle {
        id: format!("{}-rh-source", edge.id),
        kind: HandleKind::Source,
        point_index: None,
        edit_mode,
        dangling_anchor_id: anchor,
    });
    for i in 0..edge.routing_points.len() {
        let (edit_mode, anchor) = carried(HandleKind::Junction, Some(i));
        handles.push(RoutingHandle {
            id: format!("{}-rh-junction-{}", edge.id, i),
            kind: HandleKind::Junction,
            point_index: Some(i),
            edit_mode,
            dangling_anchor_id: anchor,
        });
    }
    let (edit_mode, anchor) = carried(HandleKind::Target, None);
    handles.push(RoutingHandle {
        id: format!("{}-rh-target", edge.id),
        kind: HandleKind::Target,
        point_index: None,
        edit_mode,
        dangling_anchor_id: anchor,
    });
    edge.handles = handles;
}

/// Drop consecutive routing points that coincide within epsilon.
pub(crate) fn dedup_consecutive_points(points: &mut Vec<Point>) {
    points.dedup_by(|a, b| a.almost_equals(*b));
}
