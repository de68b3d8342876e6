use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    /// Give up on a generation call after this long; `None` waits forever
    pub generation_timeout_ms: Option<u64>,

    /// Write the content state after every full snapshot
    pub persist_on_snapshot: bool,

    /// Free-form description of the business, passed to the generator
    pub business_context: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            generation_timeout_ms: Some(60_000),
            persist_on_snapshot: true,
            business_context: String::new(),
        }
    }
}

impl HostConfig {
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_timeout_disables_it() {
        let config: HostConfig = serde_json::from_str(r#"{"generationTimeoutMs": null}"#).unwrap();
        assert_eq!(config.generation_timeout(), None);
        assert!(config.persist_on_snapshot);

        let config: HostConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.generation_timeout(), Some(Duration::from_secs(60)));
    }
}
