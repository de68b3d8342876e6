use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and thresholds for a preview session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet period before a full snapshot is emitted
    pub debounce_ms: u64,

    /// Delay between a delete request and the node leaving the tree
    pub exit_transition_ms: u64,

    /// How long the toolbar survives a blur, so clicking it does not dismiss it
    pub blur_grace_ms: u64,

    /// Text elements with fewer visible characters are not made editable
    pub min_text_chars: usize,

    /// Font size change per toolbar step, in px
    pub size_step: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            exit_transition_ms: 200,
            blur_grace_ms: 150,
            min_text_chars: 2,
            size_step: 2,
        }
    }
}

impl EditorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn exit_transition(&self) -> Duration {
        Duration::from_millis(self.exit_transition_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"debounceMs": 50}"#).unwrap();
        assert_eq!(config.debounce_ms, 50);
        assert_eq!(config.exit_transition_ms, 200);
        assert_eq!(config.min_text_chars, 2);
    }
}
