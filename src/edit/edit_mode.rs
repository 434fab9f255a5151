//! Switching routing-edit mode on and off.
//!
//! Activating an edge regenerates its handle set through its router;
//! activating a handle marks it editable. Deactivation drops handles,
//! clears edit state, and reattaches endpoints that were left dangling.
//! Junction handles whose point no longer appears in the router's current
//! route are stale and removed together with their routing point; the
//! removal is paired with exact re-insertion on undo.

use serde::{Deserialize, Serialize};

use crate::edit::command::{Command, CommandContext, CommandResult, Executable, Undoable};
use crate::geometry::Point;
use crate::model::{ElementRef, HandleKind};

/// Request to toggle edit mode on the given elements. Element ids may
/// name edges (handle regeneration) or individual handles (edit flag).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchEditModeAction {
    #[serde(default)]
    pub elements_to_activate: Vec<String>,
    #[serde(default)]
    pub elements_to_deactivate: Vec<String>,
}

impl SwitchEditModeAction {
    pub fn activate(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            elements_to_activate: ids.into_iter().map(Into::into).collect(),
            elements_to_deactivate: Vec::new(),
        }
    }

    pub fn deactivate(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            elements_to_activate: Vec::new(),
            elements_to_deactivate: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A junction handle removed during deactivation, with everything needed
/// to restore its routing point at the exact same index.
#[derive(Debug, Clone)]
struct RemovedJunction {
    edge_id: String,
    point_index: usize,
    point: Option<Point>,
}

pub struct SwitchEditModeCommand {
    action: SwitchEditModeAction,
    resolved_to_activate: Vec<String>,
    resolved_to_deactivate: Vec<String>,
    removed_junctions: Vec<RemovedJunction>,
}

pub const SWITCH_EDIT_MODE_KIND: &str = "switchEditMode";

impl SwitchEditModeCommand {
    pub fn new(action: SwitchEditModeAction) -> Self {
        Self {
            action,
            resolved_to_activate: Vec::new(),
            resolved_to_deactivate: Vec::new(),
            removed_junctions: Vec::new(),
        }
    }

    /// A stale junction handle references a point index absent from the
    /// router's current route.
    fn is_stale_junction(ctx: &CommandContext<'_>, edge_id: &str, handle_id: &str) -> bool {
        let Some(edge) = ctx.diagram.edges.get(edge_id) else {
            return false;
        };
        let Some(handle) = edge.handles.iter().find(|h| h.id == handle_id) else {
            return false;
        };
        if handle.kind != HandleKind::Junction {
            return false;
        }
        let Some(router) = ctx.routers.get(&edge.router_kind) else {
            return false;
        };
        let route = router.route(ctx.diagram, edge);
        !route.iter().any(|rp| rp.point_index == handle.point_index)
    }

    fn do_execute(&mut self, ctx: &mut CommandContext<'_>) {
        for removal in &mut self.removed_junctions {
            if let Some(edge) = ctx.diagram.edges.get_mut(&removal.edge_id) {
                if removal.point_index < edge.routing_points.len() {
                    removal.point = Some(edge.routing_points.remove(removal.point_index));
                }
            }
        }
        let deactivate = self.resolved_to_deactivate.clone();
        let activate = self.resolved_to_activate.clone();
        deactivation_pass(ctx, &deactivate);
        activation_pass(ctx, &activate);
    }
}

impl Executable for SwitchEditModeCommand {
    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        for id in &self.action.elements_to_activate {
            if ctx.diagram.contains_element(id) {
                self.resolved_to_activate.push(id.clone());
            } else {
                log::debug!("switch edit mode: unknown element {id:?} skipped");
            }
        }
        for id in &self.action.elements_to_deactivate {
            match ctx.diagram.element_ref(id) {
                Some(ElementRef::Handle { edge_id }) => {
                    self.resolved_to_deactivate.push(id.clone());
                    if Self::is_stale_junction(ctx, &edge_id, id) {
                        let point_index = ctx
                            .diagram
                            .find_handle(id)
                            .and_then(|(_, h)| h.point_index);
                        if let Some(point_index) = point_index {
                            self.removed_junctions.push(RemovedJunction {
                                edge_id: edge_id.clone(),
                                point_index,
                                point: None,
                            });
                            // Regenerate the parent's full handle set around
                            // the removed point.
                            self.resolved_to_deactivate.push(edge_id.clone());
                            self.resolved_to_activate.push(edge_id);
                        }
                    }
                }
                Some(_) => self.resolved_to_deactivate.push(id.clone()),
                None => log::debug!("switch edit mode: unknown element {id:?} skipped"),
            }
        }
        self.do_execute(ctx);
        CommandResult::Done
    }
}

impl Undoable for SwitchEditModeCommand {
    fn undo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        for removal in &self.removed_junctions {
            let Some(point) = removal.point else { continue };
            if let Some(edge) = ctx.diagram.edges.get_mut(&removal.edge_id) {
                if removal.point_index <= edge.routing_points.len() {
                    edge.routing_points.insert(removal.point_index, point);
                }
            }
        }
        // Mirror-symmetric to execute.
        let activate = self.resolved_to_activate.clone();
        let deactivate = self.resolved_to_deactivate.clone();
        deactivation_pass(ctx, &activate);
        activation_pass(ctx, &deactivate);
        CommandResult::Done
    }

    fn redo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
        // Re-run the mutation over the already-resolved element lists.
        self.do_execute(ctx);
        CommandResult::Done
    }
}

impl Command for SwitchEditModeCommand {
    fn kind(&self) -> &'static str {
        SWITCH_EDIT_MODE_KIND
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Drop handle sets of routable elements, clear edit state on handles, and
/// reattach endpoints whose handle still owns a dangling anchor.
fn deactivation_pass(ctx: &mut CommandContext<'_>, ids: &[String]) {
    for id in ids {
        if let Some(edge) = ctx.diagram.edges.get_mut(id) {
            edge.handles.clear();
            continue;
        }
        let Some((edge_id, handle_idx)) = ctx.diagram.locate_handle(id) else {
            continue;
        };
        let anchor_id = {
            let Some(edge) = ctx.diagram.edges.get_mut(&edge_id) else {
                continue;
            };
            let handle = &mut edge.handles[handle_idx];
            handle.edit_mode = false;
            handle.dangling_anchor_id.clone()
        };
        let Some(anchor_id) = anchor_id else { continue };
        let Some(original_id) = anchor_original(ctx.diagram, &anchor_id) else {
            continue;
        };
        if let Some(edge) = ctx.diagram.edges.get_mut(&edge_id) {
            if edge.source_id == anchor_id {
                edge.source_id = original_id;
            } else if edge.target_id == anchor_id {
                edge.target_id = original_id;
            }
            edge.handles[handle_idx].dangling_anchor_id = None;
        }
        ctx.diagram.anchors.swap_remove(&anchor_id);
    }
}

/// Resolve a dangling anchor's original node id, if the anchor exists and
/// its original is still present in the model.
fn anchor_original(diagram: &crate::model::Diagram, anchor_id: &str) -> Option<String> {
    let anchor = diagram.anchors.get(anchor_id)?;
    if diagram.nodes.contains_key(&anchor.original_id) {
        Some(anchor.original_id.clone())
    } else {
        None
    }
}

/// Regenerate handle sets for routable elements and flag bare handles as
/// editable.
fn activation_pass(ctx: &mut CommandContext<'_>, ids: &[String]) {
    for id in ids {
        if let Some(edge) = ctx.diagram.edges.get_mut(id) {
            let router_kind = edge.router_kind.clone();
            if let Some(router) = ctx.routers.get(&router_kind) {
                router.create_routing_handles(edge);
            } else {
                log::debug!("no router registered for kind {router_kind:?}");
            }
            continue;
        }
        if let Some((edge_id, handle_idx)) = ctx.diagram.locate_handle(id) {
            if let Some(edge) = ctx.diagram.edges.get_mut(&edge_id) {
                edge.handles[handle_idx].edit_mode = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DanglingAnchor, Diagram, Edge, Node};
    use crate::router::RouterRegistry;

    fn setup(points: &[(f64, f64)]) -> (Diagram, RouterRegistry) {
        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("n1", 0.0, 0.0));
        diagram.add_node(Node::new("n2", 10.0, 10.0));
        let mut edge = Edge::new("e1", "polyline", "n1", "n2");
        edge.routing_points = points.iter().copied().map(Point::from).collect();
        diagram.add_edge(edge);
        (diagram, RouterRegistry::with_defaults())
    }

    fn run(
        diagram: &mut Diagram,
        routers: &RouterRegistry,
        action: SwitchEditModeAction,
    ) -> SwitchEditModeCommand {
        let mut command = SwitchEditModeCommand::new(action);
        let mut ctx = CommandContext::new(diagram, routers);
        command.execute(&mut ctx);
        command
    }

    #[test]
    fn activating_an_edge_creates_handles() {
        let (mut diagram, routers) = setup(&[(5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));
        assert_eq!(diagram.edges["e1"].handles.len(), 3);
    }

    #[test]
    fn activating_a_handle_sets_edit_mode() {
        let (mut diagram, routers) = setup(&[(5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));
        run(
            &mut diagram,
            &routers,
            SwitchEditModeAction::activate(["e1-rh-junction-0"]),
        );
        let (_, handle) = diagram.find_handle("e1-rh-junction-0").unwrap();
        assert!(handle.edit_mode);
    }

    #[test]
    fn unknown_ids_are_skipped() {
        let (mut diagram, routers) = setup(&[]);
        let command = run(
            &mut diagram,
            &routers,
            SwitchEditModeAction::activate(["ghost", "e1"]),
        );
        assert_eq!(command.resolved_to_activate, vec!["e1".to_string()]);
    }

    #[test]
    fn deactivating_an_edge_drops_handles() {
        let (mut diagram, routers) = setup(&[(5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));
        run(&mut diagram, &routers, SwitchEditModeAction::deactivate(["e1"]));
        assert!(diagram.edges["e1"].handles.is_empty());
    }

    #[test]
    fn stale_junction_is_pruned_and_restored_on_undo() {
        // Point 0 sits on the source node, so the polyline route omits it.
        let (mut diagram, routers) = setup(&[(0.0, 0.0), (5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));
        assert_eq!(diagram.edges["e1"].handles.len(), 4);

        let mut command = SwitchEditModeCommand::new(SwitchEditModeAction::deactivate([
            "e1-rh-junction-0",
        ]));
        let mut ctx = CommandContext::new(&mut diagram, &routers);
        command.execute(&mut ctx);

        assert_eq!(diagram.edges["e1"].routing_points, vec![Point::new(5.0, 5.0)]);
        // Handle set regenerated for the shorter geometry.
        assert_eq!(diagram.edges["e1"].handles.len(), 3);

        let mut ctx = CommandContext::new(&mut diagram, &routers);
        command.undo(&mut ctx);
        assert_eq!(
            diagram.edges["e1"].routing_points,
            vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]
        );
        assert_eq!(diagram.edges["e1"].handles.len(), 4);

        let mut ctx = CommandContext::new(&mut diagram, &routers);
        command.redo(&mut ctx);
        assert_eq!(diagram.edges["e1"].routing_points, vec![Point::new(5.0, 5.0)]);
    }

    #[test]
    fn live_junction_is_not_pruned() {
        let (mut diagram, routers) = setup(&[(5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));
        run(
            &mut diagram,
            &routers,
            SwitchEditModeAction::deactivate(["e1-rh-junction-0"]),
        );
        assert_eq!(diagram.edges["e1"].routing_points, vec![Point::new(5.0, 5.0)]);
    }

    #[test]
    fn deactivating_a_dangling_handle_restores_the_endpoint() {
        let (mut diagram, routers) = setup(&[(5.0, 5.0)]);
        run(&mut diagram, &routers, SwitchEditModeAction::activate(["e1"]));

        // Detach the source endpoint by hand.
        diagram.anchors.insert(
            "e1_dangling-source".to_string(),
            DanglingAnchor {
                id: "e1_dangling-source".to_string(),
                position: Point::new(-3.0, -3.0),
                original_id: "n1".to_string(),
            },
        );
        {
            let edge = diagram.edges.get_mut("e1").unwrap();
            edge.source_id = "e1_dangling-source".to_string();
            let handle = edge
                .handles
                .iter_mut()
                .find(|h| h.kind == HandleKind::Source)
                .unwrap();
            handle.dangling_anchor_id = Some("e1_dangling-source".to_string());
        }

        run(
            &mut diagram,
            &routers,
            SwitchEditModeAction::deactivate(["e1-rh-source"]),
        );

        assert_eq!(diagram.edges["e1"].source_id, "n1");
        assert!(diagram.anchors.is_empty());
        let (_, handle) = diagram.find_handle("e1-rh-source").unwrap();
        assert!(handle.dangling_anchor_id.is_none());
    }
}
