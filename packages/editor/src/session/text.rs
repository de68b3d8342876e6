//! Text editing: focus, toolbar, selection and inline formatting.

use super::{NodeState, RenderSession, Selection};
use crate::errors::{EditorError, EditorResult};
use crate::identity::{managed_category, Category};
use crate::markers;
use crate::surface::decorate;
use crate::surface::format::{self, FormatFlag};
use crate::surface::toolbar;
use sitecanvas_dom::{parse_fragment, NodeId, Tree};
use sitecanvas_protocol::{DeleteKind, EditorEvent};
use std::collections::{BTreeMap, VecDeque};
use std::time::Instant;

impl RenderSession {
    /// Attach the toolbar to a text element and put the caret at its start
    pub fn focus(&mut self, key: &str, _now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        self.managed(key, Category::Text)?;

        if let Some(previous) = self.toolbar.key().map(str::to_string) {
            if previous != key && self.node_state(&previous) == NodeState::Focused {
                self.set_state(&previous, NodeState::Idle);
            }
        }
        self.set_state(key, NodeState::Focused);
        self.toolbar.show(key);
        self.selection = Some(Selection {
            key: key.to_string(),
            start: 0,
            end: 0,
        });
        self.refresh_toolbar();
        Ok(())
    }

    /// Focus left the element. The toolbar lingers for the grace window.
    pub fn blur(&mut self, now: Instant) {
        self.toolbar.blur(now, self.config.blur_grace());
    }

    /// A press on the toolbar during the grace window keeps it open
    pub fn toolbar_pointer_down(&mut self) -> bool {
        self.toolbar.hold()
    }

    /// Select a character range of a text element
    pub fn select(&mut self, key: &str, start: usize, end: usize, now: Instant) -> EditorResult<()> {
        let id = self.managed(key, Category::Text)?;
        let len = format::text_len(&self.tree, id);
        let (start, end) = (start.min(end), start.max(end));
        if end > len {
            return Err(EditorError::InvalidSelection { start, end, len });
        }
        if self.toolbar.key() != Some(key) || !self.toolbar.is_visible() {
            self.focus(key, now)?;
        }
        self.toolbar.hold();
        self.selection = Some(Selection {
            key: key.to_string(),
            start,
            end,
        });
        self.refresh_toolbar();
        Ok(())
    }

    /// Replace the inner content of a text element with user-typed markup.
    ///
    /// Links and images already inside the element keep their keys: the
    /// n-th `a` (or `img`) of the new markup takes over the key of the n-th
    /// one it replaces. Keys with no successor are reported as deleted.
    pub fn edit_text(&mut self, key: &str, html: &str, now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.managed(key, Category::Text)?;

        let previous = nested_keyed(&self.tree, id);
        let content: Vec<NodeId> = parse_fragment(html)
            .into_iter()
            .map(|mut vnode| {
                vnode.retain_attributes_deep(&|name| !markers::is_bookkeeping_attr(name));
                self.tree.build(&vnode)
            })
            .collect();
        let dropped = carry_keys(&mut self.tree, &content, previous);
        decorate::replace_content(&mut self.tree, id, content)?;
        self.identity.assign(&mut self.tree, id);
        decorate::decorate(&mut self.tree, id)?;

        if !dropped.is_empty() {
            let keys: Vec<String> = dropped.iter().map(|nested| nested.key.clone()).collect();
            self.forget_keys(&keys);
            for nested in dropped {
                tracing::debug!(key = %nested.key, "nested node dropped by edit");
                self.emit(EditorEvent::Delete {
                    key: nested.key,
                    kind: match nested.category {
                        Some(Category::Image) => DeleteKind::Image,
                        Some(Category::Link) => DeleteKind::Link,
                        _ => DeleteKind::Text,
                    },
                });
            }
        }

        if let Some(selection) = self.selection.as_mut().filter(|s| s.key == key) {
            let len = format::text_len(&self.tree, id);
            selection.start = selection.start.min(len);
            selection.end = selection.end.min(len);
        }
        self.text_changed(key, id, now);
        Ok(())
    }

    pub fn toggle_format(&mut self, flag: FormatFlag, now: Instant) -> EditorResult<bool> {
        let (key, id, start, end) = self.selected()?;
        let on = format::toggle(&mut self.tree, id, start, end, flag)?;
        tracing::debug!(%key, ?flag, on, "toggle format");
        self.text_changed(&key, id, now);
        self.refresh_toolbar();
        Ok(on)
    }

    pub fn grow(&mut self, now: Instant) -> EditorResult<f64> {
        self.resize(self.config.size_step as f64, now)
    }

    pub fn shrink(&mut self, now: Instant) -> EditorResult<f64> {
        self.resize(-(self.config.size_step as f64), now)
    }

    fn resize(&mut self, delta: f64, now: Instant) -> EditorResult<f64> {
        let (key, id, start, end) = self.selected()?;
        let size = format::change_size(&mut self.tree, id, start, end, delta)?;
        self.text_changed(&key, id, now);
        self.refresh_toolbar();
        Ok(size)
    }

    pub fn set_color(&mut self, color: &str, now: Instant) -> EditorResult<()> {
        let (key, id, start, end) = self.selected()?;
        format::set_color(&mut self.tree, id, start, end, color)?;
        self.text_changed(&key, id, now);
        self.refresh_toolbar();
        Ok(())
    }

    fn selected(&self) -> EditorResult<(String, NodeId, usize, usize)> {
        let selection = self.selection.as_ref().ok_or(EditorError::NoSelection)?;
        let id = self.managed(&selection.key, Category::Text)?;
        Ok((selection.key.clone(), id, selection.start, selection.end))
    }

    fn text_changed(&mut self, key: &str, id: NodeId, now: Instant) {
        let value = self.clean_inner(id);
        self.emit(EditorEvent::Edit {
            key: key.to_string(),
            value,
        });
        self.mark_changed(now);
    }

    /// Recompute button state and placement for the anchored element
    pub(crate) fn refresh_toolbar(&mut self) {
        let Some(key) = self.toolbar.key().map(str::to_string) else {
            return;
        };
        let Ok(id) = self.managed(&key, Category::Text) else {
            self.toolbar.hide();
            return;
        };
        let (start, end) = match self.selection.as_ref().filter(|s| s.key == key) {
            Some(selection) => (selection.start, selection.end),
            None => (0, 0),
        };
        self.toolbar.active = format::query(&self.tree, id, start, end);
        if let Some(rect) = self.layout.rect(&self.tree, id) {
            self.toolbar.placement = toolbar::placement(rect, self.layout.viewport());
        }
    }
}

/// A keyed node living inside a text element
struct Nested {
    tag: String,
    key: String,
    category: Option<Category>,
}

fn nested_keyed(tree: &Tree, id: NodeId) -> Vec<Nested> {
    decorate::content_children(tree, id)
        .into_iter()
        .flat_map(|child| tree.descendants(child))
        .filter(|node| !markers::in_ui(tree, *node))
        .filter_map(|node| {
            Some(Nested {
                tag: tree.tag(node)?.to_string(),
                key: tree.attr(node, markers::KEY)?.to_string(),
                category: managed_category(tree, node),
            })
        })
        .collect()
}

/// Hand the keys of `previous` to same-tag nodes of `content` in document
/// order; returns the ones left without a successor
fn carry_keys(tree: &mut Tree, content: &[NodeId], previous: Vec<Nested>) -> Vec<Nested> {
    let mut by_tag: BTreeMap<String, VecDeque<Nested>> = BTreeMap::new();
    for nested in previous {
        by_tag.entry(nested.tag.clone()).or_default().push_back(nested);
    }

    let nodes: Vec<NodeId> = content.iter().flat_map(|root| tree.descendants(*root)).collect();
    for node in nodes {
        let Some(queue) = tree.tag(node).and_then(|tag| by_tag.get_mut(tag)) else {
            continue;
        };
        let Some(nested) = queue.pop_front() else {
            continue;
        };
        if let Some(el) = tree.element_mut(node) {
            el.set_attr(markers::KEY, nested.key.clone());
            if let Some(category) = nested.category {
                el.set_attr(markers::MANAGED, category.as_str());
            }
        }
    }

    by_tag.into_values().flatten().collect()
}
