use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Class marker on the page body encoding menu visibility. Present means
/// the slide menu is collapsed.
pub const MENU_HIDDEN_CLASS: &str = "menu-hidden";

/// An entry element rendered into the feed container. `html` is the
/// innerHTML-equivalent used when comparing content across loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedEntry {
    pub title: String,
    pub html: String,
}

/// In-memory model of the reader page: the body class list and the feed
/// container. The menu starts hidden, matching the page's initial markup.
#[derive(Debug, Clone)]
pub struct ReaderPage {
    body_classes: BTreeSet<String>,
    entries: Vec<RenderedEntry>,
}

impl Default for ReaderPage {
    fn default() -> Self {
        let mut body_classes = BTreeSet::new();
        body_classes.insert(MENU_HIDDEN_CLASS.to_string());
        Self {
            body_classes,
            entries: Vec::new(),
        }
    }
}

impl ReaderPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    pub fn menu_hidden(&self) -> bool {
        self.has_body_class(MENU_HIDDEN_CLASS)
    }

    /// Pure two-state toggle: removes the hidden marker if present,
    /// restores it otherwise.
    pub fn click_menu_icon(&mut self) {
        if !self.body_classes.remove(MENU_HIDDEN_CLASS) {
            self.body_classes.insert(MENU_HIDDEN_CLASS.to_string());
        }
    }

    pub fn entries(&self) -> &[RenderedEntry] {
        &self.entries
    }

    /// Full replacement of the feed container. A completed load never
    /// appends to prior content.
    pub fn replace_entries(&mut self, entries: Vec<RenderedEntry>) {
        self.entries = entries;
    }

    pub fn clear_entries(&mut self) {
        self.entries.clear();
    }

    /// Digest over the concatenated entry HTML, for cheap comparison of
    /// container content between two loads.
    pub fn content_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for entry in &self.entries {
            hasher.update(entry.html.as_bytes());
            hasher.update(b"\n");
        }
        let bytes = hasher.finalize();
        format!("{bytes:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, html: &str) -> RenderedEntry {
        RenderedEntry {
            title: title.to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn menu_is_hidden_by_default() {
        let page = ReaderPage::new();
        assert!(page.has_body_class(MENU_HIDDEN_CLASS));
        assert!(page.menu_hidden());
    }

    #[test]
    fn menu_toggles_visibility_on_click() {
        let mut page = ReaderPage::new();

        page.click_menu_icon();
        assert!(!page.menu_hidden());

        page.click_menu_icon();
        assert!(page.menu_hidden());
    }

    #[test]
    fn replace_entries_discards_prior_content() {
        let mut page = ReaderPage::new();
        page.replace_entries(vec![entry("a", "<article>a</article>")]);
        page.replace_entries(vec![
            entry("b", "<article>b</article>"),
            entry("c", "<article>c</article>"),
        ]);

        assert_eq!(page.entries().len(), 2);
        assert_eq!(page.entries()[0].title, "b");
    }

    #[test]
    fn fingerprint_tracks_container_content() {
        let mut page = ReaderPage::new();
        page.replace_entries(vec![entry("a", "<article>a</article>")]);
        let first = page.content_fingerprint();

        page.replace_entries(vec![entry("b", "<article>b</article>")]);
        let second = page.content_fingerprint();
        assert_ne!(first, second);

        page.replace_entries(vec![entry("a", "<article>a</article>")]);
        assert_eq!(page.content_fingerprint(), first);
    }
}
