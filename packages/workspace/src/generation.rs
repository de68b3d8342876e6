//! Boundary to whatever writes copy for the host.
//!
//! The controller only knows this trait; a model-backed implementation lives
//! outside this crate. Responses are matched back to the editor by request
//! id, so an implementation may take as long as it likes.

use crate::error::GenerationError;
use async_trait::async_trait;
use sitecanvas_protocol::{GeneratedText, GenerationScope, InventoryItem, RequestId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub request_id: RequestId,
    pub scope: GenerationScope,
    pub inventory: Vec<InventoryItem>,
    pub business_context: String,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<GeneratedText>, GenerationError>;
}

/// Always fails; the editor clears its busy markers on the error reply
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGenerator;

#[async_trait]
impl GenerationService for NoopGenerator {
    async fn generate(
        &self,
        _request: GenerationRequest,
    ) -> Result<Vec<GeneratedText>, GenerationError> {
        Err(GenerationError::Unavailable)
    }
}

/// Answers from a fixed key → text table, skipping keys it has nothing for
#[derive(Debug, Default, Clone)]
pub struct CannedGenerator {
    texts: HashMap<String, String>,
}

impl CannedGenerator {
    pub fn new(texts: HashMap<String, String>) -> Self {
        Self { texts }
    }
}

#[async_trait]
impl GenerationService for CannedGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<GeneratedText>, GenerationError> {
        Ok(request
            .inventory
            .iter()
            .filter_map(|item| {
                self.texts.get(&item.key).map(|text| GeneratedText {
                    key: item.key.clone(),
                    text: text.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            request_id: RequestId::from("r-1"),
            scope: GenerationScope::Section {
                section_id: "section_1".to_string(),
            },
            inventory: vec![
                InventoryItem {
                    key: "hero_h1_1".to_string(),
                    tag: "h1".to_string(),
                    text: "Old".to_string(),
                },
                InventoryItem {
                    key: "hero_p_2".to_string(),
                    tag: "p".to_string(),
                    text: "Old body".to_string(),
                },
            ],
            business_context: String::new(),
        }
    }

    #[tokio::test]
    async fn test_canned_answers_known_keys_only() {
        let generator = CannedGenerator::new(HashMap::from([(
            "hero_p_2".to_string(),
            "Warm bread daily.".to_string(),
        )]));
        let items = generator.generate(request()).await.unwrap();
        assert_eq!(
            items,
            vec![GeneratedText {
                key: "hero_p_2".to_string(),
                text: "Warm bread daily.".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_noop_is_unavailable() {
        assert_eq!(
            NoopGenerator.generate(request()).await,
            Err(GenerationError::Unavailable)
        );
    }
}
