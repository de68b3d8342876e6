//! Attributes the editor adds to the live tree.
//!
//! Everything here is bookkeeping or decoration and never reaches a clean
//! document: `data-sc-*` attributes and `contenteditable` are dropped,
//! decoration nodes are skipped, and image frames are unwrapped.

use sitecanvas_dom::{ElementData, NodeId, Tree};

pub const KEY: &str = "data-sc-key";
pub const SECTION: &str = "data-sc-section";
pub const MANAGED: &str = "data-sc-managed";
pub const ADJUSTING: &str = "data-sc-adjusting";
pub const STATE: &str = "data-sc-state";
pub const DECORATED: &str = "data-sc-decorated";
pub const UI: &str = "data-sc-ui";
pub const FRAME: &str = "data-sc-frame";
pub const CONTENT_EDITABLE: &str = "contenteditable";

/// Author-supplied stable key
pub const AUTHOR_KEY: &str = "data-key";

const BOOKKEEPING_PREFIX: &str = "data-sc-";

pub fn is_bookkeeping_attr(name: &str) -> bool {
    name.starts_with(BOOKKEEPING_PREFIX) || name == CONTENT_EDITABLE
}

pub fn is_ui(tree: &Tree, id: NodeId) -> bool {
    tree.attr(id, UI).is_some()
}

pub fn is_frame(tree: &Tree, id: NodeId) -> bool {
    tree.element(id).map(|el| el.has_attr(FRAME)).unwrap_or(false)
}

/// True when `id` is or sits inside a decoration node
pub fn in_ui(tree: &Tree, id: NodeId) -> bool {
    tree.closest(id, is_ui).is_some()
}

/// Empty decoration control
pub fn ui_element(role: &str) -> ElementData {
    ElementData::new("span")
        .with_attr(UI, role)
        .with_attr("role", "button")
}

pub fn ui_container(role: &str) -> ElementData {
    ElementData::new("div").with_attr(UI, role)
}

pub mod roles {
    pub const DELETE: &str = "delete";
    pub const DRAG_HANDLE: &str = "drag-handle";
    pub const GENERATE: &str = "generate";
    pub const ADJUST: &str = "adjust";
    pub const LINK_EDIT: &str = "link-edit";
    pub const PLACEHOLDER: &str = "placeholder";
    pub const SECTION_CONTROLS: &str = "section-controls";
    pub const RESET: &str = "reset";
}
