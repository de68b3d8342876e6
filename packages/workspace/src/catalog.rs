//! Template lookup by id

use crate::error::CatalogError;
use sitecanvas_dom::render_template;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait TemplateCatalog: Send + Sync {
    /// Raw template markup, placeholders intact
    fn fetch(&self, template_id: &str) -> Result<String, CatalogError>;

    fn render(
        &self,
        template_id: &str,
        values: &HashMap<String, String>,
    ) -> Result<String, CatalogError> {
        Ok(render_template(&self.fetch(template_id)?, values))
    }
}

fn check_id(template_id: &str) -> Result<(), CatalogError> {
    let bad = template_id.is_empty()
        || template_id.contains(['/', '\\'])
        || template_id.contains("..");
    if bad {
        return Err(CatalogError::InvalidId(template_id.to_string()));
    }
    Ok(())
}

/// Reads `<dir>/<template-id>.html`
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TemplateCatalog for DirectoryCatalog {
    fn fetch(&self, template_id: &str) -> Result<String, CatalogError> {
        check_id(template_id)?;
        let path = self.dir.join(format!("{}.html", template_id));
        if !path.is_file() {
            return Err(CatalogError::NotFound(template_id.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    templates: HashMap<String, String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, template_id: impl Into<String>, html: impl Into<String>) -> Self {
        self.templates.insert(template_id.into(), html.into());
        self
    }
}

impl TemplateCatalog for MemoryCatalog {
    fn fetch(&self, template_id: &str) -> Result<String, CatalogError> {
        check_id(template_id)?;
        self.templates
            .get(template_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(template_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_catalog_renders_placeholders() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("bakery.html"),
            "<h1>{{ name }}</h1><p>{{tagline}}</p>",
        )
        .unwrap();
        let catalog = DirectoryCatalog::new(dir.path());

        let values = HashMap::from([("name".to_string(), "Crumb & Co".to_string())]);
        let html = catalog.render("bakery", &values).unwrap();
        assert_eq!(html, "<h1>Crumb &amp; Co</h1><p>{{tagline}}</p>");
    }

    #[test]
    fn test_ids_cannot_escape_the_directory() {
        let catalog = DirectoryCatalog::new("/tmp");
        for id in ["", "../etc/passwd", "a/b", "a\\b"] {
            assert!(matches!(catalog.fetch(id), Err(CatalogError::InvalidId(_))));
        }
    }

    #[test]
    fn test_missing_template() {
        let catalog = MemoryCatalog::new().with("bakery", "<p>hi</p>");
        assert!(catalog.fetch("bakery").is_ok());
        assert!(matches!(catalog.fetch("florist"), Err(CatalogError::NotFound(_))));
    }
}
