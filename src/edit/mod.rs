//! Interactive editing: commands, undo/redo history, and the handle-move
//! animation.
//!
//! Commands mutate the diagram through a [`CommandContext`] and record
//! enough state to restore it exactly on undo. The [`CommandHistory`]
//! owns the undo/redo stacks and drives any animation a command returns
//! to completion before the next command runs.

pub mod animation;
pub mod command;
pub mod edit_mode;
pub mod move_handle;

pub use animation::MoveHandlesAnimation;
pub use command::{
    Command, CommandContext, CommandHistory, CommandResult, Executable, Mergeable, Undoable,
};
pub use edit_mode::{SwitchEditModeAction, SwitchEditModeCommand, SWITCH_EDIT_MODE_KIND};
pub use move_handle::{
    HandleMove, MoveRoutingHandleAction, MoveRoutingHandleCommand, MOVE_ROUTING_HANDLE_KIND,
};
