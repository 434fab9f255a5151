//! Command plumbing: capability traits, execution context, and the
//! undo/redo history.
//!
//! Commands are composed from small capability traits rather than a
//! deep hierarchy: every command is [`Executable`] and [`Undoable`];
//! only commands that can absorb a later command of the same kind also
//! implement [`Mergeable`].

use std::any::Any;

use crate::edit::animation::MoveHandlesAnimation;
use crate::model::Diagram;
use crate::router::RouterRegistry;

/// Collaborators threaded explicitly through every operation: the model
/// root and the router registry. No hidden process-wide wiring.
pub struct CommandContext<'a> {
    pub diagram: &'a mut Diagram,
    pub routers: &'a RouterRegistry,
}

impl<'a> CommandContext<'a> {
    pub fn new(diagram: &'a mut Diagram, routers: &'a RouterRegistry) -> Self {
        Self { diagram, routers }
    }
}

/// Outcome of running a command phase. `Animating` hands an animation to
/// the caller's scheduler; everything else completed synchronously.
pub enum CommandResult {
    Done,
    Animating(MoveHandlesAnimation),
}

pub trait Executable {
    fn execute(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult;
}

pub trait Undoable {
    fn undo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult;
    fn redo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult;
}

/// Commands that can absorb a later command instead of stacking a new
/// history entry. Returns true if `other` was absorbed.
pub trait Mergeable {
    fn merge(&mut self, other: &dyn Command, ctx: &mut CommandContext<'_>) -> bool;
}

/// Object-safe composition of the capability traits, for storage in a
/// history stack.
pub trait Command: Executable + Undoable {
    fn kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// The mergeable view of this command, if it supports merging.
    fn as_mergeable(&mut self) -> Option<&mut dyn Mergeable> {
        None
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Command history (undo / redo stack)
// ────────────────────────────────────────────────────────────────────────────

/// Bounded undo/redo history over boxed commands.
///
/// Animated command phases are driven to completion synchronously through
/// [`MoveHandlesAnimation::run`], so the model is never left in a
/// partially interpolated state between history operations.
pub struct CommandHistory {
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_depth: usize,
    /// Number of tween steps used to drive animations to `t = 1`.
    tween_steps: usize,
}

impl CommandHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            tween_steps: 8,
        }
    }

    pub fn with_tween_steps(mut self, steps: usize) -> Self {
        self.tween_steps = steps.max(1);
        self
    }

    /// Execute a command and push it onto the undo stack, unless the
    /// current top absorbs it via merge.
    pub fn execute(&mut self, mut command: Box<dyn Command>, ctx: &mut CommandContext<'_>) {
        let result = command.execute(ctx);
        self.settle(result, ctx);
        self.redo_stack.clear();

        if let Some(top) = self.undo_stack.last_mut() {
            if let Some(mergeable) = top.as_mergeable() {
                if mergeable.merge(command.as_ref(), ctx) {
                    log::debug!("command merged into previous {}", top.kind());
                    return;
                }
            }
        }
        self.undo_stack.push(command);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent command, returning true if one was undone.
    pub fn undo(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        if let Some(mut command) = self.undo_stack.pop() {
            let result = command.undo(ctx);
            self.settle(result, ctx);
            self.redo_stack.push(command);
            true
        } else {
            false
        }
    }

    /// Redo the most recently undone command, returning true if one was redone.
    pub fn redo(&mut self, ctx: &mut CommandContext<'_>) -> bool {
        if let Some(mut command) = self.redo_stack.pop() {
            let result = command.redo(ctx);
            self.settle(result, ctx);
            self.undo_stack.push(command);
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn settle(&self, result: CommandResult, ctx: &mut CommandContext<'_>) {
        if let CommandResult::Animating(animation) = result {
            animation.run(ctx, self.tween_steps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Edge, Node};

    /// Minimal command for exercising the history independently of the
    /// routing commands: appends a routing point on execute.
    struct AppendPoint {
        edge_id: String,
        point: Point,
    }

    impl Executable for AppendPoint {
        fn execute(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
            if let Some(edge) = ctx.diagram.edges.get_mut(&self.edge_id) {
                edge.routing_points.push(self.point);
            }
            CommandResult::Done
        }
    }

    impl Undoable for AppendPoint {
        fn undo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
            if let Some(edge) = ctx.diagram.edges.get_mut(&self.edge_id) {
                edge.routing_points.pop();
            }
            CommandResult::Done
        }

        fn redo(&mut self, ctx: &mut CommandContext<'_>) -> CommandResult {
            self.execute(ctx)
        }
    }

    impl Command for AppendPoint {
        fn kind(&self) -> &'static str {
            "appendPoint"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn setup() -> (Diagram, RouterRegistry) {
        let mut diagram = Diagram::new();
        diagram.add_node(Node::new("n1", 0.0, 0.0));
        diagram.add_node(Node::new("n2", 10.0, 10.0));
        diagram.add_edge(Edge::new("e1", "polyline", "n1", "n2"));
        (diagram, RouterRegistry::with_defaults())
    }

    fn append(x: f64, y: f64) -> Box<dyn Command> {
        Box::new(AppendPoint {
            edge_id: "e1".to_string(),
            point: Point::new(x, y),
        })
    }

    #[test]
    fn undo_redo_round_trip() {
        let (mut diagram, routers) = setup();
        let mut history = CommandHistory::new(10);
        let mut ctx = CommandContext::new(&mut diagram, &routers);

        history.execute(append(1.0, 1.0), &mut ctx);
        assert_eq!(ctx.diagram.edges["e1"].routing_points.len(), 1);

        assert!(history.undo(&mut ctx));
        assert!(ctx.diagram.edges["e1"].routing_points.is_empty());

        assert!(history.redo(&mut ctx));
        assert_eq!(ctx.diagram.edges["e1"].routing_points.len(), 1);
    }

    #[test]
    fn execute_clears_redo_stack() {
        let (mut diagram, routers) = setup();
        let mut history = CommandHistory::new(10);
        let mut ctx = CommandContext::new(&mut diagram, &routers);

        history.execute(append(1.0, 1.0), &mut ctx);
        history.undo(&mut ctx);
        assert!(history.can_redo());

        history.execute(append(2.0, 2.0), &mut ctx);
        assert!(!history.can_redo());
    }

    #[test]
    fn respects_max_depth() {
        let (mut diagram, routers) = setup();
        let mut history = CommandHistory::new(3);
        let mut ctx = CommandContext::new(&mut diagram, &routers);

        for i in 0..5 {
            history.execute(append(i as f64, 0.0), &mut ctx);
        }
        let mut undone = 0;
        while history.undo(&mut ctx) {
            undone += 1;
        }
        assert_eq!(undone, 3);
    }

    #[test]
    fn empty_history_cannot_undo_or_redo() {
        let (mut diagram, routers) = setup();
        let mut history = CommandHistory::new(10);
        let mut ctx = CommandContext::new(&mut diagram, &routers);
        assert!(!history.undo(&mut ctx));
        assert!(!history.redo(&mut ctx));
    }
}
