//! # Mutation Surface
//!
//! In-place affordances on keyed nodes. Each submodule holds the tree
//! algorithm or state for one affordance; [`crate::RenderSession`] wires
//! them to keys, events and the change aggregator.

pub mod decorate;
pub mod drag;
pub mod format;
pub mod image;
pub mod link;
pub mod toolbar;

pub use drag::{DragState, DropTarget, Side};
pub use format::{FormatFlag, FormatState};
pub use image::{ImageTransform, PendingImageTarget};
pub use link::LinkDraft;
pub use toolbar::{Placement, Toolbar, ToolbarState};
