/// Inline link editor state. Saving writes the draft; cancelling drops it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkDraft {
    pub key: String,
    pub original: String,
    pub href: String,
}

impl LinkDraft {
    pub fn open(key: impl Into<String>, current: Option<&str>) -> Self {
        let current = current.unwrap_or("").to_string();
        Self {
            key: key.into(),
            original: current.clone(),
            href: current,
        }
    }

    pub fn update(&mut self, href: impl Into<String>) {
        self.href = href.into();
    }

    pub fn is_dirty(&self) -> bool {
        self.href.trim() != self.original
    }

    /// Final destination; surrounding whitespace is not part of a URL
    pub fn destination(&self) -> &str {
        self.href.trim()
    }
}
