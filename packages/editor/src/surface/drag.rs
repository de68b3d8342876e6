//! # Drag Reorder
//!
//! Nearest-neighbour insertion among the dragged node's siblings.
//!
//! Pointer samples are buffered and applied once per frame. Each frame
//! picks the sibling whose vertical midpoint is closest to the pointer and
//! moves a placeholder before or after it; on release the dragged node
//! takes the placeholder's place. Equal distances resolve to "before".

use crate::layout::LayoutProvider;
use crate::markers::{self, roles};
use sitecanvas_dom::{DomResult, NodeId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTarget {
    pub sibling: NodeId,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub struct DragState {
    pub key: String,
    pub node: NodeId,
    pub placeholder: NodeId,
    pending_y: Option<f64>,
}

impl DragState {
    /// Mark `node` as dragging and drop a placeholder right after it
    pub fn begin(tree: &mut Tree, key: &str, node: NodeId) -> DomResult<Self> {
        let placeholder = tree.create_element(markers::ui_container(roles::PLACEHOLDER));
        tree.insert_after(node, placeholder)?;
        if let Some(el) = tree.element_mut(node) {
            el.set_attr(markers::STATE, "dragging");
        }
        Ok(Self {
            key: key.to_string(),
            node,
            placeholder,
            pending_y: None,
        })
    }

    /// Buffer a pointer sample; only the latest one per frame matters
    pub fn pointer_move(&mut self, y: f64) {
        self.pending_y = Some(y);
    }

    pub fn has_pending(&self) -> bool {
        self.pending_y.is_some()
    }

    /// Apply the buffered sample, moving the placeholder
    pub fn frame(&mut self, tree: &mut Tree, layout: &dyn LayoutProvider) -> DomResult<Option<DropTarget>> {
        let Some(y) = self.pending_y.take() else {
            return Ok(None);
        };
        let Some(target) = nearest_sibling(tree, layout, self.node, y) else {
            return Ok(None);
        };
        let Some(parent) = tree.parent(target.sibling) else {
            return Ok(None);
        };
        match target.side {
            Side::Before => tree.insert_before(parent, self.placeholder, Some(target.sibling))?,
            Side::After => tree.insert_after(target.sibling, self.placeholder)?,
        }
        Ok(Some(target))
    }

    /// Move the node into the placeholder's slot
    pub fn finish(mut self, tree: &mut Tree, layout: &dyn LayoutProvider) -> DomResult<NodeId> {
        self.frame(tree, layout)?;
        if let Some(parent) = tree.parent(self.placeholder) {
            tree.insert_before(parent, self.node, Some(self.placeholder))?;
        }
        self.clear(tree)?;
        Ok(self.node)
    }

    pub fn cancel(self, tree: &mut Tree) -> DomResult<()> {
        self.clear(tree)
    }

    fn clear(&self, tree: &mut Tree) -> DomResult<()> {
        if tree.is_alive(self.placeholder) {
            tree.remove(self.placeholder)?;
        }
        if let Some(el) = tree.element_mut(self.node) {
            if el.attr(markers::STATE) == Some("dragging") {
                el.remove_attr(markers::STATE);
            }
        }
        Ok(())
    }
}

/// Element siblings of `node` a drop can be placed against
pub fn drop_candidates(tree: &Tree, node: NodeId) -> Vec<NodeId> {
    let Some(parent) = tree.parent(node) else {
        return Vec::new();
    };
    tree.element_children(parent)
        .into_iter()
        .filter(|sibling| *sibling != node && !markers::is_ui(tree, *sibling))
        .collect()
}

/// Sibling with the closest vertical midpoint, and which side of it `y` is on
pub fn nearest_sibling(tree: &Tree, layout: &dyn LayoutProvider, node: NodeId, y: f64) -> Option<DropTarget> {
    let mut best: Option<(f64, DropTarget)> = None;

    for sibling in drop_candidates(tree, node) {
        let Some(rect) = layout.rect(tree, sibling) else {
            continue;
        };
        let mid = rect.mid_y();
        let distance = (y - mid).abs();
        let side = if y <= mid { Side::Before } else { Side::After };
        let candidate = DropTarget { sibling, side };

        best = match best {
            None => Some((distance, candidate)),
            Some((d, _)) if distance < d => Some((distance, candidate)),
            Some((d, current)) if distance == d && side == Side::Before && current.side == Side::After => {
                Some((distance, candidate))
            }
            keep => keep,
        };
    }

    best.map(|(_, target)| target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedLayout, Rect};
    use sitecanvas_dom::{parse_document, serialize};

    // Four 100px-tall rows at y = 0, 100, 200, 300
    fn setup() -> (Tree, Vec<NodeId>, FixedLayout) {
        let tree = parse_document(
            r#"<div><p data-sc-key="a">A</p><p data-sc-key="b">B</p><p data-sc-key="c">C</p><p data-sc-key="d">D</p></div>"#,
        );
        let div = tree.children(tree.root())[0];
        let rows = tree.element_children(div);
        let mut layout = FixedLayout::new();
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            layout = layout.with_rect(*key, Rect::new(0.0, i as f64 * 100.0, 300.0, 100.0));
        }
        (tree, rows, layout)
    }

    fn order(tree: &Tree) -> String {
        tree.text_content(tree.root())
    }

    #[test]
    fn test_drop_between_siblings_from_any_origin() {
        // Dropping just above C's midpoint puts the node between B and C
        for (dragged, expected) in [(0, "BACD"), (3, "ABDC")] {
            let (mut tree, rows, layout) = setup();
            let mut drag = DragState::begin(&mut tree, "x", rows[dragged]).unwrap();
            drag.pointer_move(240.0);
            drag.finish(&mut tree, &layout).unwrap();
            assert_eq!(order(&tree), expected);
        }
    }

    #[test]
    fn test_tie_prefers_before() {
        let (tree, rows, layout) = setup();
        // 200 is equidistant from B's (150) and C's (250) midpoints
        let target = nearest_sibling(&tree, &layout, rows[0], 200.0).unwrap();
        assert_eq!(target.sibling, rows[2]);
        assert_eq!(target.side, Side::Before);
    }

    #[test]
    fn test_only_latest_sample_applied() {
        let (mut tree, rows, layout) = setup();
        let mut drag = DragState::begin(&mut tree, "a", rows[0]).unwrap();
        drag.pointer_move(390.0);
        drag.pointer_move(160.0);
        let target = drag.frame(&mut tree, &layout).unwrap().unwrap();
        assert_eq!(target.sibling, rows[1]);
        assert_eq!(target.side, Side::After);
        assert!(drag.frame(&mut tree, &layout).unwrap().is_none());
    }

    #[test]
    fn test_cancel_restores_tree() {
        let (mut tree, rows, layout) = setup();
        let before = serialize(&tree);
        let mut drag = DragState::begin(&mut tree, "a", rows[0]).unwrap();
        drag.pointer_move(390.0);
        drag.frame(&mut tree, &layout).unwrap();
        drag.cancel(&mut tree).unwrap();
        assert_eq!(serialize(&tree), before);
    }

    #[test]
    fn test_placeholder_ignored_as_candidate() {
        let (mut tree, rows, _) = setup();
        let drag = DragState::begin(&mut tree, "a", rows[0]).unwrap();
        let candidates = drop_candidates(&tree, rows[0]);
        assert!(!candidates.contains(&drag.placeholder));
        assert_eq!(candidates.len(), 3);
    }
}
