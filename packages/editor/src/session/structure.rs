//! Structural edits: delete, drag reorder and section reset.

use super::{NodeState, RenderSession};
use crate::errors::{EditorError, EditorResult};
use crate::identity::{managed_category, Category};
use crate::markers;
use crate::surface::decorate::{self, movable_node};
use crate::surface::DragState;
use sitecanvas_protocol::{DeleteKind, EditorEvent};
use std::time::Instant;

impl RenderSession {
    /// Start the exit transition of a text or image node. The node leaves
    /// the tree on the first tick after the transition.
    pub fn delete(&mut self, key: &str, now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.node(key)?;
        match managed_category(&self.tree, id) {
            Some(Category::Text | Category::Image) => {}
            _ => {
                return Err(EditorError::WrongKind {
                    key: key.to_string(),
                    expected: "text or image",
                })
            }
        }
        if matches!(self.node_state(key), NodeState::Exiting { .. }) {
            return Ok(());
        }
        if self.drag.as_ref().map(|d| d.key.as_str()) == Some(key) {
            self.cancel_drag()?;
        }

        let target = movable_node(&self.tree, id);
        if let Some(el) = self.tree.element_mut(target) {
            el.set_attr(markers::STATE, "exiting");
        }
        self.set_state(
            key,
            NodeState::Exiting {
                until: now + self.config.exit_transition(),
            },
        );
        Ok(())
    }

    pub(crate) fn finish_delete(&mut self, key: &str, now: Instant) -> EditorResult<()> {
        let id = self.node(key)?;
        let kind = match managed_category(&self.tree, id) {
            Some(Category::Image) => DeleteKind::Image,
            _ => DeleteKind::Text,
        };
        let target = movable_node(&self.tree, id);
        let parent = self.tree.parent(target);

        let removed = self.identity.index_mut().forget(&self.tree, target);
        self.tree.remove(target)?;
        self.forget_keys(&removed);
        self.states.remove(key);
        if let Some(parent) = parent {
            self.identity.assign(&mut self.tree, parent);
        }

        tracing::debug!(%key, ?kind, "node deleted");
        self.emit(EditorEvent::Delete {
            key: key.to_string(),
            kind,
        });
        self.mark_changed(now);
        Ok(())
    }

    /// Remove a whole section. Its snapshot goes with it.
    pub fn delete_section(&mut self, section_id: &str, now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.section_node(section_id)?;

        let removed = self.identity.index_mut().forget(&self.tree, id);
        self.tree.remove(id)?;
        self.forget_keys(&removed);
        self.busy.remove(section_id);
        self.snapshots.discard(section_id);

        tracing::info!(%section_id, "section deleted");
        self.emit(EditorEvent::Delete {
            key: section_id.to_string(),
            kind: DeleteKind::Section,
        });
        self.mark_changed(now);
        Ok(())
    }

    /// Rebuild a section from its load-time snapshot. Keys inside it are
    /// replaced by freshly assigned ones.
    pub fn reset_section(&mut self, section_id: &str, now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        let old = self.section_node(section_id)?;
        let fresh = self
            .snapshots
            .restore(section_id, &mut self.tree)
            .ok_or_else(|| EditorError::UnknownSection(section_id.to_string()))?;

        if self.drag.as_ref().map(|d| self.tree.is_descendant_of(d.node, old)) == Some(true) {
            self.cancel_drag()?;
        }
        let removed = self.identity.index_mut().forget(&self.tree, old);
        self.tree.replace(old, fresh)?;
        self.forget_keys(&removed);
        self.busy.remove(section_id);

        self.identity.index_mut().refresh(&self.tree, fresh);
        let keys = self.identity.assign(&mut self.tree, fresh);
        decorate::decorate(&mut self.tree, fresh)?;

        tracing::info!(%section_id, keys = keys.len(), "section reset");
        self.emit(EditorEvent::SectionReset {
            section_id: section_id.to_string(),
        });
        self.mark_changed(now);
        Ok(())
    }

    /// Pick up a text or image node for reordering among its siblings
    pub fn begin_drag(&mut self, key: &str, y: f64) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.node(key)?;
        match managed_category(&self.tree, id) {
            Some(Category::Text | Category::Image) => {}
            _ => {
                return Err(EditorError::WrongKind {
                    key: key.to_string(),
                    expected: "text or image",
                })
            }
        }
        if self.drag.is_some() {
            self.cancel_drag()?;
        }

        let node = movable_node(&self.tree, id);
        let mut drag = DragState::begin(&mut self.tree, key, node)?;
        drag.pointer_move(y);
        self.drag = Some(drag);
        self.set_state(key, NodeState::Dragging);
        Ok(())
    }

    /// Buffer a pointer sample; the placeholder moves on the next tick
    pub fn drag_move(&mut self, y: f64) -> EditorResult<()> {
        let drag = self.drag.as_mut().ok_or(EditorError::NotDragging)?;
        drag.pointer_move(y);
        Ok(())
    }

    /// Drop the dragged node where the placeholder is
    pub fn end_drag(&mut self, now: Instant) -> EditorResult<()> {
        let drag = self.drag.take().ok_or(EditorError::NotDragging)?;
        let key = drag.key.clone();
        let node = drag.finish(&mut self.tree, self.layout.as_ref())?;
        self.set_state(&key, NodeState::Idle);

        if let Some(parent) = self.tree.parent(node) {
            self.identity.assign(&mut self.tree, parent);
        }
        tracing::debug!(%key, "drag reorder");
        self.emit(EditorEvent::DragReorder { key });
        self.mark_changed(now);
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> EditorResult<()> {
        let drag = self.drag.take().ok_or(EditorError::NotDragging)?;
        let key = drag.key.clone();
        drag.cancel(&mut self.tree)?;
        self.set_state(&key, NodeState::Idle);
        Ok(())
    }
}
