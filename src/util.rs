// ABOUTME: Filename helpers for converted pages
// ABOUTME: Slugs page titles and keeps stems unique within one output directory

use std::collections::HashSet;

pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// Hands out unique file stems: the slugged title when there is one,
/// otherwise the page id. A stem already taken gets `-<page_id>` appended.
#[derive(Debug, Default)]
pub struct StemAllocator {
    used: HashSet<String>,
}

impl StemAllocator {
    pub fn allocate(&mut self, title: Option<&str>, page_id: &str) -> String {
        let mut stem = title
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| page_id.to_string());

        if !self.used.insert(stem.clone()) {
            stem = format!("{}-{}", stem, page_id);
            self.used.insert(stem.clone());
        }
        stem
    }
}
