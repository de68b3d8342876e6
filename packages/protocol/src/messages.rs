use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlates a generation request with its response
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteKind {
    Text,
    Image,
    /// A link dropped from the text that held it
    Link,
    Section,
}

/// Kind of an editable node as it appears in the layer outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    Text,
    Image,
    Link,
}

/// What a generation request covers: one element or a whole section
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "kebab-case")]
pub enum GenerationScope {
    Element { key: String },
    Section { section_id: String },
}

/// One entry of the text inventory sent with a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub key: String,
    pub tag: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub key: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerItem {
    pub item_type: ItemType,
    pub label: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOutline {
    pub section_id: String,
    pub label: String,
    pub items: Vec<LayerItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerActionKind {
    /// Scroll to and highlight
    Focus,
    /// Focus, then open the element's editor
    Activate,
}

/// Preview → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EditorEvent {
    /// Template loaded and keyed; lists every live image instance
    Ready {
        template_id: String,
        images: Vec<String>,
    },

    LoadFailed {
        reason: String,
    },

    /// Clean inner markup of a text element after an edit
    Edit {
        key: String,
        value: String,
    },

    Delete {
        key: String,
        kind: DeleteKind,
    },

    ImageReplace {
        key: String,
        src: String,
    },

    LinkUpdate {
        key: String,
        href: String,
        text: String,
    },

    DragReorder {
        key: String,
    },

    SectionReset {
        section_id: String,
    },

    /// Clean serialization of the whole document
    FullSnapshot {
        html: String,
        revision: u64,
    },

    Layers {
        sections: Vec<SectionOutline>,
    },

    OpenAssetPicker {
        key: String,
        width: f64,
        height: f64,
    },

    GenerateRequest {
        request_id: RequestId,
        scope: GenerationScope,
        inventory: Vec<InventoryItem>,
    },
}

impl EditorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            EditorEvent::Ready { .. } => "ready",
            EditorEvent::LoadFailed { .. } => "load-failed",
            EditorEvent::Edit { .. } => "edit",
            EditorEvent::Delete { .. } => "delete",
            EditorEvent::ImageReplace { .. } => "image-replace",
            EditorEvent::LinkUpdate { .. } => "link-update",
            EditorEvent::DragReorder { .. } => "drag-reorder",
            EditorEvent::SectionReset { .. } => "section-reset",
            EditorEvent::FullSnapshot { .. } => "full-snapshot",
            EditorEvent::Layers { .. } => "layers",
            EditorEvent::OpenAssetPicker { .. } => "open-asset-picker",
            EditorEvent::GenerateRequest { .. } => "generate-request",
        }
    }
}

/// Host → preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostCommand {
    /// `src` prefixed with `video:` swaps the image for a video
    ReplaceImage {
        key: String,
        src: String,
    },

    ApplyGeneratedContent {
        request_id: RequestId,
        target: GenerationScope,
        #[serde(default)]
        items: Vec<GeneratedText>,
        #[serde(default)]
        error: bool,
    },

    LayerAction {
        key: String,
        item_type: ItemType,
        action: LayerActionKind,
    },

    ResetSection {
        section_id: String,
    },

    DeleteSection {
        section_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let event = EditorEvent::Delete {
            key: "hero_img__inst_1".to_string(),
            kind: DeleteKind::Image,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "delete", "key": "hero_img__inst_1", "kind": "image"})
        );
        assert_eq!(event.kind(), "delete");
    }

    #[test]
    fn test_command_defaults() {
        let raw = json!({
            "type": "apply-generated-content",
            "request_id": "abc-1",
            "target": {"scope": "section", "section_id": "section_2"},
            "error": true
        });
        let cmd: HostCommand = serde_json::from_value(raw).unwrap();
        assert_eq!(
            cmd,
            HostCommand::ApplyGeneratedContent {
                request_id: RequestId::from("abc-1"),
                target: GenerationScope::Section {
                    section_id: "section_2".to_string()
                },
                items: vec![],
                error: true,
            }
        );
    }
}
