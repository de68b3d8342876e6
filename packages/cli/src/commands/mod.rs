pub mod outline;
pub mod render;
pub mod replay;

pub use outline::{outline, OutlineArgs};
pub use render::{render, RenderArgs};
pub use replay::{replay, ReplayArgs};

use anyhow::{anyhow, Result};
use sitecanvas_editor::{EditorConfig, RenderSession};
use sitecanvas_workspace::{DirectoryCatalog, TemplateCatalog};
use std::collections::HashMap;
use std::path::Path;

/// Parse repeated `--set key=value` flags
pub fn parse_values(pairs: &[String]) -> Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| anyhow!("Expected key=value, got {:?}", pair))
        })
        .collect()
}

/// Fetch, fill and load a template into a fresh session
pub fn open_session(
    templates_dir: &Path,
    template_id: &str,
    values: &HashMap<String, String>,
    config: EditorConfig,
) -> Result<RenderSession> {
    let html = DirectoryCatalog::new(templates_dir).render(template_id, values)?;
    let mut session = RenderSession::new(template_id, config);
    session.load(&html)?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        let values = parse_values(&["name=Crumb".to_string(), "tagline=a=b".to_string()]).unwrap();
        assert_eq!(values["name"], "Crumb");
        assert_eq!(values["tagline"], "a=b");
        assert!(parse_values(&["oops".to_string()]).is_err());
    }
}
