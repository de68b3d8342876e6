//! Canonical content state on the host side.
//!
//! The editor reports per-field events as they happen and a complete clean
//! document after every quiet period. Both are folded in here; the clean
//! document is authoritative, the per-field maps let the host answer
//! questions (what did the user type into `hero_h1_1`?) without parsing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sitecanvas_protocol::{keys, DeleteKind, EditorEvent, ItemType, SectionOutline};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkValue {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentState {
    pub template_id: String,
    /// Text key → clean inner markup
    pub fields: BTreeMap<String, String>,
    pub links: BTreeMap<String, LinkValue>,
    /// Keys and section ids the user removed
    pub deleted: BTreeSet<String>,
    /// Image base key → chosen source
    pub image_replacements: BTreeMap<String, String>,
    /// Live image instance keys
    pub image_instances: BTreeSet<String>,
    pub outline: Vec<SectionOutline>,
    /// Last clean document
    pub html: Option<String>,
    pub revision: u64,
    pub last_snapshot_at: Option<DateTime<Utc>>,
    pub load_error: Option<String>,
}

impl ContentState {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }

    /// Fold one editor event in. Returns true when a full snapshot arrived.
    pub fn apply_event(&mut self, event: &EditorEvent) -> bool {
        match event {
            EditorEvent::Ready { template_id, images } => {
                if self.template_id.is_empty() {
                    self.template_id = template_id.clone();
                }
                self.image_instances = images.iter().cloned().collect();
                self.load_error = None;
            }
            EditorEvent::LoadFailed { reason } => {
                self.load_error = Some(reason.clone());
            }
            EditorEvent::Edit { key, value } => {
                self.fields.insert(key.clone(), value.clone());
                self.deleted.remove(key);
            }
            EditorEvent::Delete { key, kind } => self.delete(key, *kind),
            EditorEvent::ImageReplace { key, src } => {
                self.image_replacements
                    .insert(keys::base_key(key).to_string(), src.clone());
                self.image_instances.insert(key.clone());
            }
            EditorEvent::LinkUpdate { key, href, text } => {
                self.links.insert(
                    key.clone(),
                    LinkValue {
                        href: href.clone(),
                        text: text.clone(),
                    },
                );
            }
            EditorEvent::SectionReset { section_id } => self.reset_section(section_id),
            EditorEvent::FullSnapshot { html, revision } => {
                self.html = Some(html.clone());
                self.revision = *revision;
                self.last_snapshot_at = Some(Utc::now());
                return true;
            }
            EditorEvent::Layers { sections } => {
                self.image_instances = sections
                    .iter()
                    .flat_map(|section| &section.items)
                    .filter(|item| item.item_type == ItemType::Image)
                    .map(|item| item.key.clone())
                    .collect();
                self.outline = sections.clone();
            }
            EditorEvent::DragReorder { .. }
            | EditorEvent::OpenAssetPicker { .. }
            | EditorEvent::GenerateRequest { .. } => {}
        }
        false
    }

    fn delete(&mut self, key: &str, kind: DeleteKind) {
        match kind {
            DeleteKind::Text => {
                self.fields.remove(key);
            }
            DeleteKind::Image => {
                self.image_instances.remove(key);
                self.release_image(keys::base_key(key));
            }
            DeleteKind::Link => {
                self.links.remove(key);
            }
            DeleteKind::Section => {
                for item_key in self.keys_in_section(key) {
                    self.forget_key(&item_key);
                }
            }
        }
        self.deleted.insert(key.to_string());
    }

    /// Everything recorded for the section's old keys is void after a reset
    fn reset_section(&mut self, section_id: &str) {
        for key in self.keys_in_section(section_id) {
            self.forget_key(&key);
            self.deleted.remove(&key);
        }
    }

    fn forget_key(&mut self, key: &str) {
        self.fields.remove(key);
        self.links.remove(key);
        if self.image_instances.remove(key) {
            self.release_image(keys::base_key(key));
        }
    }

    /// Drop a stored replacement once no live instance uses it
    fn release_image(&mut self, base: &str) {
        let in_use = self
            .image_instances
            .iter()
            .any(|instance| keys::base_key(instance) == base);
        if !in_use && self.image_replacements.remove(base).is_some() {
            tracing::debug!(%base, "released image replacement");
        }
    }

    /// Keys listed under a section in the last known outline
    pub fn keys_in_section(&self, section_id: &str) -> Vec<String> {
        self.outline
            .iter()
            .filter(|section| section.section_id == section_id)
            .flat_map(|section| section.items.iter().map(|item| item.key.clone()))
            .collect()
    }

    /// Stored source for an image instance, looked up by its base key
    pub fn replacement_for(&self, instance: &str) -> Option<&str> {
        self.image_replacements
            .get(keys::base_key(instance))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecanvas_protocol::LayerItem;

    fn outline() -> Vec<SectionOutline> {
        let item = |item_type, key: &str| LayerItem {
            item_type,
            label: key.to_string(),
            key: key.to_string(),
        };
        vec![
            SectionOutline {
                section_id: "section_1".to_string(),
                label: "Hero".to_string(),
                items: vec![item(ItemType::Text, "hero_h1_1"), item(ItemType::Image, "shop__inst_1")],
            },
            SectionOutline {
                section_id: "section_2".to_string(),
                label: "Gallery".to_string(),
                items: vec![item(ItemType::Image, "shop__inst_2")],
            },
        ]
    }

    fn state() -> ContentState {
        let mut state = ContentState::new("bakery");
        state.apply_event(&EditorEvent::Layers { sections: outline() });
        state
    }

    #[test]
    fn test_image_released_with_last_instance() {
        let mut state = state();
        state.apply_event(&EditorEvent::ImageReplace {
            key: "shop__inst_1".to_string(),
            src: "/new.jpg".to_string(),
        });
        assert_eq!(state.replacement_for("shop__inst_2"), Some("/new.jpg"));

        state.apply_event(&EditorEvent::Delete {
            key: "shop__inst_1".to_string(),
            kind: DeleteKind::Image,
        });
        assert!(state.image_replacements.contains_key("shop"));

        state.apply_event(&EditorEvent::Delete {
            key: "shop__inst_2".to_string(),
            kind: DeleteKind::Image,
        });
        assert!(state.image_replacements.is_empty());
    }

    #[test]
    fn test_reset_forgets_section_fields() {
        let mut state = state();
        state.apply_event(&EditorEvent::Edit {
            key: "hero_h1_1".to_string(),
            value: "Hi".to_string(),
        });
        state.apply_event(&EditorEvent::SectionReset {
            section_id: "section_1".to_string(),
        });
        assert!(state.fields.is_empty());
        assert!(state.image_instances.contains("shop__inst_2"));
    }

    #[test]
    fn test_dropped_link_forgotten() {
        let mut state = state();
        state.apply_event(&EditorEvent::LinkUpdate {
            key: "link_1".to_string(),
            href: "/contact".to_string(),
            text: "us today".to_string(),
        });
        state.apply_event(&EditorEvent::Delete {
            key: "link_1".to_string(),
            kind: DeleteKind::Link,
        });
        assert!(state.links.is_empty());
        assert!(state.deleted.contains("link_1"));
    }

    #[test]
    fn test_snapshot_reported() {
        let mut state = state();
        assert!(state.apply_event(&EditorEvent::FullSnapshot {
            html: "<p>x</p>".to_string(),
            revision: 3,
        }));
        assert_eq!(state.revision, 3);
        assert!(state.last_snapshot_at.is_some());
        assert!(!state.apply_event(&EditorEvent::DragReorder {
            key: "hero_h1_1".to_string()
        }));
    }
}
