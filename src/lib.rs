//! bendpoint is a library for interactive edge routing in node/edge
//! diagrams: pluggable routers compute the rendered line from persisted
//! routing points, routing handles expose those points for editing, and
//! undoable commands move handles (animated or direct), switch elements
//! in and out of edit mode, and detach edge endpoints into dangling
//! anchors while a drag is in flight.

pub mod edit;
pub mod geometry;
pub mod model;
pub mod router;

pub use edit::{CommandContext, CommandHistory};
pub use geometry::Point;
pub use model::{Diagram, DiagramDoc, Edge, Node};
pub use router::{Router, RouterRegistry};
