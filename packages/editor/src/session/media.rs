//! Images, videos and links.

use super::{NodeState, RenderSession};
use crate::errors::{EditorError, EditorResult};
use crate::identity::Category;
use crate::markers;
use crate::surface::decorate::{self, movable_node};
use crate::surface::image::{self, ImageTransform, PendingImageTarget, VIDEO_PREFIX};
use crate::surface::LinkDraft;
use sitecanvas_dom::{DomError, ElementData, NodeId};
use sitecanvas_protocol::EditorEvent;
use std::time::Instant;

impl RenderSession {
    /// Click on an image: remember it as the picker target and ask the host
    /// for an asset. Ignored while the image is being adjusted.
    pub fn activate_image(&mut self, key: &str) -> EditorResult<bool> {
        self.ensure_ready()?;
        let id = self.managed(key, Category::Image)?;
        if self.node_state(key) == NodeState::Adjusting {
            return Ok(false);
        }

        let (width, height) = self
            .layout
            .rect(&self.tree, id)
            .map(|rect| (rect.width, rect.height))
            .unwrap_or((0.0, 0.0));
        self.pending_image = Some(PendingImageTarget {
            key: key.to_string(),
            width,
            height,
        });
        self.emit(EditorEvent::OpenAssetPicker {
            key: key.to_string(),
            width,
            height,
        });
        Ok(true)
    }

    /// Point an image at a new source. A `video:` source swaps the element
    /// for a video player.
    pub fn replace_image(&mut self, key: &str, src: &str, now: Instant) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.managed(key, Category::Image)?;
        let current = self.tree.tag(id).unwrap_or("img").to_string();

        let replaced = if let Some(url) = src.strip_prefix(VIDEO_PREFIX) {
            image::swap_to_video(&mut self.tree, id, url)?
        } else if current == "img" {
            let el = self.tree.element_mut(id).ok_or(DomError::NotAnElement(id))?;
            el.set_attr("src", src);
            id
        } else {
            self.swap_to_image(id, src)?
        };

        if replaced != id {
            self.identity.index_mut().refresh(&self.tree, replaced);
            if let Some(transform) = self.transforms.get(key).copied() {
                if let Some(el) = self.tree.element_mut(replaced) {
                    transform.apply(el);
                }
            }
        }
        if self.pending_image.as_ref().map(|p| p.key.as_str()) == Some(key) {
            self.pending_image = None;
        }

        tracing::debug!(%key, %src, "image replaced");
        self.emit(EditorEvent::ImageReplace {
            key: key.to_string(),
            src: src.to_string(),
        });
        self.mark_changed(now);
        Ok(())
    }

    /// A video going back to a still image
    fn swap_to_image(&mut self, id: NodeId, src: &str) -> EditorResult<NodeId> {
        let old = self
            .tree
            .element(id)
            .cloned()
            .ok_or(DomError::NotAnElement(id))?;
        let mut el = ElementData::new("img").with_attr("src", src);
        for name in ["class", "style", "width", "height", markers::KEY, markers::MANAGED, markers::DECORATED] {
            if let Some(value) = old.attr(name) {
                el.set_attr(name, value);
            }
        }
        if let Some(title) = old.attr("title") {
            el.set_attr("alt", title);
        }
        let img = self.tree.create_element(el);
        self.tree.replace(id, img)?;
        if self.tree.attr(img, markers::DECORATED).is_some() {
            decorate::decorate_image(&mut self.tree, img)?;
        }
        Ok(img)
    }

    /// Enter or leave pan/zoom mode. Returns whether the image is now adjusting.
    pub fn toggle_adjust(&mut self, key: &str) -> EditorResult<bool> {
        self.ensure_ready()?;
        let id = self.managed(key, Category::Image)?;
        let adjusting = self.node_state(key) != NodeState::Adjusting;
        let frame = movable_node(&self.tree, id);

        if let Some(el) = self.tree.element_mut(frame) {
            if adjusting {
                el.set_attr(markers::ADJUSTING, "");
            } else {
                el.remove_attr(markers::ADJUSTING);
            }
        }
        self.set_state(
            key,
            if adjusting {
                NodeState::Adjusting
            } else {
                NodeState::Idle
            },
        );
        Ok(adjusting)
    }

    /// Move the focal point to a pointer position inside the frame
    pub fn pan(&mut self, key: &str, x: f64, y: f64, now: Instant) -> EditorResult<ImageTransform> {
        let id = self.adjusting(key)?;
        let frame = movable_node(&self.tree, id);
        let rect = self
            .layout
            .rect(&self.tree, frame)
            .filter(|rect| rect.width > 0.0 && rect.height > 0.0)
            .ok_or_else(|| EditorError::NotMeasured(key.to_string()))?;

        let x_percent = (x - rect.x) / rect.width * 100.0;
        let y_percent = (y - rect.y) / rect.height * 100.0;
        self.update_transform(key, id, now, |t| t.pan_to(x_percent, y_percent))
    }

    pub fn zoom_in(&mut self, key: &str, now: Instant) -> EditorResult<ImageTransform> {
        let id = self.adjusting(key)?;
        self.update_transform(key, id, now, ImageTransform::zoom_in)
    }

    pub fn zoom_out(&mut self, key: &str, now: Instant) -> EditorResult<ImageTransform> {
        let id = self.adjusting(key)?;
        self.update_transform(key, id, now, ImageTransform::zoom_out)
    }

    pub fn reset_transform(&mut self, key: &str, now: Instant) -> EditorResult<ImageTransform> {
        let id = self.managed(key, Category::Image)?;
        self.update_transform(key, id, now, ImageTransform::reset)
    }

    fn adjusting(&self, key: &str) -> EditorResult<NodeId> {
        let id = self.managed(key, Category::Image)?;
        if self.node_state(key) != NodeState::Adjusting {
            return Err(EditorError::NotAdjusting(key.to_string()));
        }
        Ok(id)
    }

    fn update_transform(
        &mut self,
        key: &str,
        id: NodeId,
        now: Instant,
        change: impl FnOnce(&mut ImageTransform),
    ) -> EditorResult<ImageTransform> {
        let before = self.transform(key);
        let mut transform = before;
        change(&mut transform);

        if transform != before {
            if let Some(el) = self.tree.element_mut(id) {
                transform.apply(el);
            }
            self.mark_changed(now);
        }
        if transform.is_identity() {
            self.transforms.remove(key);
        } else {
            self.transforms.insert(key.to_string(), transform);
        }
        Ok(transform)
    }

    /// Open the inline link editor prefilled with the current destination
    pub fn open_link_editor(&mut self, key: &str) -> EditorResult<()> {
        self.ensure_ready()?;
        let id = self.managed(key, Category::Link)?;
        let draft = LinkDraft::open(key, self.tree.attr(id, "href"));
        self.link_draft = Some(draft);
        Ok(())
    }

    pub fn update_link_draft(&mut self, href: &str) -> EditorResult<()> {
        let draft = self.link_draft.as_mut().ok_or(EditorError::NoLinkDraft)?;
        draft.update(href);
        Ok(())
    }

    /// Write the draft to the link and report it to the host
    pub fn save_link(&mut self, now: Instant) -> EditorResult<()> {
        let draft = self.link_draft.take().ok_or(EditorError::NoLinkDraft)?;
        let id = self.managed(&draft.key, Category::Link)?;
        let href = draft.destination().to_string();

        let el = self.tree.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        el.set_attr("href", href.clone());
        let text = collapse_whitespace(&self.tree.text_content(id));

        tracing::debug!(key = %draft.key, %href, "link saved");
        self.emit(EditorEvent::LinkUpdate {
            key: draft.key,
            href,
            text,
        });
        self.mark_changed(now);
        Ok(())
    }

    pub fn cancel_link(&mut self) -> bool {
        self.link_draft.take().is_some()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
