//! Attaches editing affordances to keyed nodes.
//!
//! Decoration is idempotent: decorated nodes carry a marker and are skipped
//! on later passes, so it can be re-run over any scope after a reset or a
//! structural change.

use crate::identity::{managed_category, Category};
use crate::markers::{self, roles};
use sitecanvas_dom::{DomResult, ElementData, NodeId, Tree};

pub const FRAME_STYLE: &str = "position: relative; display: inline-block; overflow: hidden";

pub fn decorate(tree: &mut Tree, scope: NodeId) -> DomResult<usize> {
    let mut count = 0;

    for id in tree.descendants(scope) {
        if !tree.is_alive(id) || markers::in_ui(tree, id) {
            continue;
        }
        let decorated = tree
            .element(id)
            .map(|el| el.has_attr(markers::DECORATED))
            .unwrap_or(true);
        if decorated {
            continue;
        }

        if tree.attr(id, markers::SECTION).is_some() {
            decorate_section(tree, id)?;
            count += 1;
        }

        match managed_category(tree, id) {
            Some(Category::Text) => decorate_text(tree, id)?,
            Some(Category::Image) => decorate_image(tree, id)?,
            Some(Category::Link) => decorate_link(tree, id)?,
            None => continue,
        }
        count += 1;
    }

    Ok(count)
}

fn mark(tree: &mut Tree, id: NodeId) {
    if let Some(el) = tree.element_mut(id) {
        el.set_attr(markers::DECORATED, "");
    }
}

fn append_ui(tree: &mut Tree, parent: NodeId, role: &str) -> DomResult<NodeId> {
    let ui = tree.create_element(markers::ui_element(role));
    tree.append_child(parent, ui)?;
    Ok(ui)
}

fn decorate_section(tree: &mut Tree, section: NodeId) -> DomResult<()> {
    let controls = tree.create_element(markers::ui_container(roles::SECTION_CONTROLS));
    let first = tree.children(section).first().copied();
    tree.insert_before(section, controls, first)?;
    for role in [roles::RESET, roles::GENERATE, roles::DELETE] {
        append_ui(tree, controls, role)?;
    }
    mark(tree, section);
    Ok(())
}

fn decorate_text(tree: &mut Tree, id: NodeId) -> DomResult<()> {
    if let Some(el) = tree.element_mut(id) {
        el.set_attr(markers::CONTENT_EDITABLE, "true");
    }
    for role in [roles::DRAG_HANDLE, roles::GENERATE, roles::DELETE] {
        append_ui(tree, id, role)?;
    }
    mark(tree, id);
    Ok(())
}

/// Wrap media in a clipping frame that holds its controls
pub fn decorate_image(tree: &mut Tree, id: NodeId) -> DomResult<()> {
    let frame = match tree.parent(id) {
        Some(parent) if markers::is_frame(tree, parent) => parent,
        _ => tree.wrap(
            id,
            ElementData::new("div")
                .with_attr(markers::FRAME, "")
                .with_attr("style", FRAME_STYLE),
        )?,
    };
    let has_controls = tree
        .children(frame)
        .iter()
        .any(|child| markers::is_ui(tree, *child));
    if !has_controls {
        for role in [roles::DRAG_HANDLE, roles::ADJUST, roles::DELETE] {
            append_ui(tree, frame, role)?;
        }
    }
    mark(tree, id);
    Ok(())
}

fn decorate_link(tree: &mut Tree, id: NodeId) -> DomResult<()> {
    append_ui(tree, id, roles::LINK_EDIT)?;
    mark(tree, id);
    Ok(())
}

/// The node a drag or delete acts on: the frame for media, else the node
pub fn movable_node(tree: &Tree, id: NodeId) -> NodeId {
    match tree.parent(id) {
        Some(parent) if markers::is_frame(tree, parent) => parent,
        _ => id,
    }
}

/// Children of a keyed element that are content rather than controls
pub fn content_children(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    tree.children(id)
        .iter()
        .copied()
        .filter(|child| !markers::is_ui(tree, *child))
        .collect()
}

/// Replace the content of an element while keeping its controls at the end
pub fn replace_content(tree: &mut Tree, id: NodeId, content: Vec<NodeId>) -> DomResult<()> {
    for child in content_children(tree, id) {
        tree.remove(child)?;
    }
    let first_ui = tree.children(id).first().copied();
    for node in content {
        tree.insert_before(id, node, first_ui)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::clean_document;
    use crate::identity::IdentityAssigner;
    use sitecanvas_dom::parse_document;

    fn prepared(source: &str) -> (Tree, IdentityAssigner) {
        let mut tree = parse_document(source);
        let mut assigner = IdentityAssigner::new(2);
        assigner.assign_sections(&mut tree);
        let root = tree.root();
        assigner.assign(&mut tree, root);
        (tree, assigner)
    }

    #[test]
    fn test_decoration_never_reaches_clean_output() {
        let source = r#"<section><h1>Title</h1><img src="/a.png"><p>Go <a href="/x">here</a></p></section>"#;
        let (mut tree, _) = prepared(source);
        let root = tree.root();
        decorate(&mut tree, root).unwrap();

        assert_eq!(clean_document(&tree), source);
    }

    #[test]
    fn test_decorate_is_idempotent() {
        let (mut tree, _) = prepared(r#"<section><h1>Title</h1><img src="/a.png"></section>"#);
        let root = tree.root();
        let first = decorate(&mut tree, root).unwrap();
        let nodes = tree.len();
        let second = decorate(&mut tree, root).unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(tree.len(), nodes);
    }

    #[test]
    fn test_image_frame_and_movable_node() {
        let (mut tree, assigner) = prepared(r#"<section><img src="/a.png" alt="x"></section>"#);
        let root = tree.root();
        decorate(&mut tree, root).unwrap();

        let img = assigner.lookup(&tree, "x__inst_1").unwrap();
        let frame = movable_node(&tree, img);
        assert_ne!(frame, img);
        assert!(markers::is_frame(&tree, frame));
        assert_eq!(tree.element(frame).unwrap().style("overflow").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_replace_content_keeps_controls() {
        let (mut tree, assigner) = prepared(r#"<section><p>Old text</p></section>"#);
        let root = tree.root();
        decorate(&mut tree, root).unwrap();
        let p = assigner.lookup(&tree, "section_p_1").unwrap();

        let fresh = tree.create_text("New text");
        replace_content(&mut tree, p, vec![fresh]).unwrap();

        assert_eq!(tree.text_content(p), "New text");
        assert_eq!(tree.children(p)[0], fresh);
        assert_eq!(tree.children(p).len(), 4);
    }
}
