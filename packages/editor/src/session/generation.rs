//! Content generation round trips.
//!
//! A request marks its origin busy and is remembered by id. A response is
//! applied only if its id is still pending and its origin still exists;
//! anything else is stale and dropped.

use super::RenderSession;
use crate::errors::EditorResult;
use crate::identity::{managed_category, Category};
use crate::markers;
use crate::surface::decorate;
use sitecanvas_dom::NodeId;
use sitecanvas_protocol::{EditorEvent, GeneratedText, GenerationScope, InventoryItem, RequestId};
use std::time::Instant;

impl RenderSession {
    /// Ask the host to generate text for an element or a whole section
    pub fn request_generation(&mut self, scope: GenerationScope) -> EditorResult<RequestId> {
        self.ensure_ready()?;
        let origin = self.scope_node(&scope)?;
        let inventory = self.inventory(origin);
        let snapshot = self.clean_inner(origin);

        self.set_busy(&scope, origin, true);
        let request_id = self.correlator.begin(scope.clone(), snapshot);
        tracing::debug!(%request_id, ?scope, items = inventory.len(), "generation requested");

        self.emit(EditorEvent::GenerateRequest {
            request_id: request_id.clone(),
            scope,
            inventory,
        });
        Ok(request_id)
    }

    /// Apply a generation response. Returns whether any text changed.
    pub fn apply_generated(
        &mut self,
        request_id: &RequestId,
        target: &GenerationScope,
        items: &[GeneratedText],
        error: bool,
        now: Instant,
    ) -> EditorResult<bool> {
        let Some(pending) = self.correlator.resolve(request_id) else {
            tracing::debug!(%request_id, "ignoring stale generation response");
            return Ok(false);
        };
        let scope = pending.origin;
        if &scope != target {
            tracing::debug!(%request_id, ?target, ?scope, "response target differs from request");
        }

        let origin = self.scope_node(&scope).ok();
        if !self.correlator.has_pending_for(&scope) {
            if let Some(origin) = origin {
                self.set_busy(&scope, origin, false);
            } else {
                self.busy.remove(scope_id(&scope));
            }
        }

        if error {
            tracing::warn!(%request_id, ?scope, "generation failed");
            return Ok(false);
        }
        let Some(origin) = origin else {
            tracing::debug!(%request_id, ?scope, "generation origin no longer exists");
            return Ok(false);
        };

        let mut applied = false;
        for item in items {
            let Ok(id) = self.managed(&item.key, Category::Text) else {
                tracing::debug!(key = %item.key, "generated text for unknown key");
                continue;
            };
            let in_scope = match &scope {
                GenerationScope::Element { key } => *key == item.key,
                GenerationScope::Section { .. } => self.tree.is_descendant_of(id, origin),
            };
            if !in_scope {
                tracing::debug!(key = %item.key, "generated text outside request scope");
                continue;
            }

            let text = self.tree.create_text(item.text.clone());
            decorate::replace_content(&mut self.tree, id, vec![text])?;
            let value = self.clean_inner(id);
            self.emit(EditorEvent::Edit {
                key: item.key.clone(),
                value,
            });
            applied = true;
        }

        if applied {
            self.mark_changed(now);
        }
        Ok(applied)
    }

    fn scope_node(&self, scope: &GenerationScope) -> EditorResult<NodeId> {
        match scope {
            GenerationScope::Element { key } => self.managed(key, Category::Text),
            GenerationScope::Section { section_id } => self.section_node(section_id),
        }
    }

    /// Managed text under `origin`, in document order
    fn inventory(&self, origin: NodeId) -> Vec<InventoryItem> {
        self.tree
            .descendants(origin)
            .into_iter()
            .filter(|id| managed_category(&self.tree, *id) == Some(Category::Text))
            .filter_map(|id| {
                let key = self.tree.attr(id, markers::KEY)?.to_string();
                let tag = self.tree.tag(id)?.to_string();
                let text = self.tree.text_content(id).trim().to_string();
                Some(InventoryItem { key, tag, text })
            })
            .collect()
    }

    fn set_busy(&mut self, scope: &GenerationScope, origin: NodeId, busy: bool) {
        let id = scope_id(scope).to_string();
        if let Some(el) = self.tree.element_mut(origin) {
            if busy {
                el.set_attr(markers::STATE, "busy");
            } else if el.attr(markers::STATE) == Some("busy") {
                el.remove_attr(markers::STATE);
            }
        }
        if busy {
            self.busy.insert(id);
        } else {
            self.busy.remove(&id);
        }
    }
}

fn scope_id(scope: &GenerationScope) -> &str {
    match scope {
        GenerationScope::Element { key } => key,
        GenerationScope::Section { section_id } => section_id,
    }
}

