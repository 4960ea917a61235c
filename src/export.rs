// ABOUTME: Export orchestration from locator to JSON snapshots to Markdown
// ABOUTME: Composes the tree fetcher, snapshot store, change detection, and converter

use crate::convert::Converter;
use crate::diff::is_changed;
use crate::fetch::{BlockSource, TreeFetcher};
use crate::locator::resolve_locator;
use crate::snapshot::{SnapshotStore, DATABASE_FILE};
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// What a page download did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Download {
    Fetched { blocks: usize },
    Unchanged,
}

pub struct Exporter<S> {
    source: S,
    store: SnapshotStore,
    converter: Converter,
    fetch_metadata: bool,
    skip_unchanged: bool,
}

impl<S: BlockSource> Exporter<S> {
    pub fn new(source: S, converter: Converter) -> Self {
        Exporter {
            source,
            store: SnapshotStore::default(),
            converter,
            fetch_metadata: true,
            skip_unchanged: false,
        }
    }

    pub fn with_metadata(mut self, fetch_metadata: bool) -> Self {
        self.fetch_metadata = fetch_metadata;
        self
    }

    /// Skip pages whose metadata is not newer than the previous `database.json`.
    pub fn skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    /// Download the page behind `locator` into `json_dir/<page_id>.json`.
    pub fn download_url(&self, locator: &str, json_dir: &Path) -> Result<PathBuf> {
        let page_id = resolve_locator(locator)?;
        let out_path = json_dir.join(format!("{}.json", page_id));
        self.download_page(&page_id, &out_path, self.fetch_metadata)?;
        Ok(out_path)
    }

    pub fn download_page(
        &self,
        page_id: &str,
        out_path: &Path,
        fetch_metadata: bool,
    ) -> Result<Download> {
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let fetcher = TreeFetcher::new(&self.source);
        let database_path = out_path.with_file_name(DATABASE_FILE);

        if self.skip_unchanged && fetch_metadata {
            let meta = fetcher.fetch_metadata(page_id)?;
            let previous = self.store.load(&database_path)?;
            if out_path.exists() && !is_changed(&previous, &meta) {
                tracing::info!(page_id, "page unchanged, skipping download");
                return Ok(Download::Unchanged);
            }

            let blocks = fetcher.fetch_block_tree(page_id)?;
            self.store.save(&blocks, out_path)?;
            self.store.save(&[meta], &database_path)?;
            tracing::info!(page_id, path = %out_path.display(), "downloaded page");
            return Ok(Download::Fetched {
                blocks: blocks.len(),
            });
        }

        let blocks = fetcher.fetch_block_tree(page_id)?;
        self.store.save(&blocks, out_path)?;
        tracing::info!(page_id, path = %out_path.display(), "downloaded page");

        if fetch_metadata {
            let meta = fetcher.fetch_metadata(page_id)?;
            self.store.save(&[meta], &database_path)?;
        }

        Ok(Download::Fetched {
            blocks: blocks.len(),
        })
    }

    pub fn convert(&self, json_dir: &Path, md_dir: &Path) -> Result<Vec<PathBuf>> {
        self.converter.convert(json_dir, md_dir)
    }

    /// Download the page behind `locator`, then convert the whole `json_dir`.
    pub fn export_url(&self, locator: &str, json_dir: &Path, md_dir: &Path) -> Result<Vec<PathBuf>> {
        self.download_url(locator, json_dir)?;
        self.convert(json_dir, md_dir)
    }

    pub fn export_page(&self, page_id: &str, json_dir: &Path, md_dir: &Path) -> Result<Vec<PathBuf>> {
        let out_path = json_dir.join(format!("{}.json", page_id));
        self.download_page(page_id, &out_path, self.fetch_metadata)?;
        self.convert(json_dir, md_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChildrenPage, RawRecord};
    use crate::Error;
    use serde_json::json;
    use std::cell::{Cell, RefCell};
    use tempfile::TempDir;

    struct StubSource {
        edited: RefCell<&'static str>,
        listings: Cell<usize>,
    }

    impl StubSource {
        fn new() -> Self {
            StubSource {
                edited: RefCell::new("2024-01-01T00:00:00.000Z"),
                listings: Cell::new(0),
            }
        }
    }

    impl BlockSource for StubSource {
        fn list_children(&self, block_id: &str, _cursor: Option<&str>) -> Result<ChildrenPage> {
            self.listings.set(self.listings.get() + 1);
            if block_id != "abc123" {
                return Ok(ChildrenPage::default());
            }
            let block = json!({
                "id": "b-1",
                "last_edited_time": "2024-01-01T00:00:00.000Z",
                "has_children": false,
                "type": "paragraph",
                "paragraph": {"rich_text": [{"type": "text", "plain_text": "Hello"}]}
            });
            Ok(ChildrenPage::new(
                vec![serde_json::from_value(block).unwrap()],
                None,
            ))
        }

        fn retrieve_page(&self, page_id: &str) -> Result<RawRecord> {
            if page_id != "abc123" {
                return Err(Error::NotFound(page_id.into()));
            }
            Ok(serde_json::from_value(json!({
                "object": "page",
                "id": "abc123",
                "last_edited_time": *self.edited.borrow(),
                "properties": {"Name": {"type": "title", "title": [{"plain_text": "Hello Page"}]}}
            }))
            .unwrap())
        }
    }

    fn exporter() -> Exporter<StubSource> {
        Exporter::new(StubSource::new(), Converter::new(None, "md"))
    }

    #[test]
    fn test_download_url_writes_tree_and_metadata() {
        let temp = TempDir::new().unwrap();
        let json_dir = temp.path().join("json");

        let path = exporter()
            .download_url("https://www.notion.so/acme/Hello-Page-abc123", &json_dir)
            .unwrap();

        assert_eq!(path, json_dir.join("abc123.json"));
        let store = SnapshotStore::default();
        let blocks = store.load(&path).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, "b1");
        let meta = store.load(&json_dir.join(DATABASE_FILE)).unwrap();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].id, "abc123");
    }

    #[test]
    fn test_download_without_metadata() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("json").join("abc123.json");

        let outcome = exporter().download_page("abc123", &out, false).unwrap();

        assert_eq!(outcome, Download::Fetched { blocks: 1 });
        assert!(out.exists());
        assert!(!temp.path().join("json").join(DATABASE_FILE).exists());
    }

    #[test]
    fn test_download_database_locator_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let err = exporter()
            .download_url("https://www.notion.so/acme/0123456789abcdef?v=1", temp.path())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLocator(_)));
    }

    #[test]
    fn test_download_missing_page_leaves_tree_snapshot() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("missing.json");

        let err = exporter().download_page("missing", &out, true).unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(out.exists(), "earlier stage output stays in place");
    }

    #[test]
    fn test_skip_unchanged_pages() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("abc123.json");
        let exporter = exporter().skip_unchanged(true);

        assert_eq!(
            exporter.download_page("abc123", &out, true).unwrap(),
            Download::Fetched { blocks: 1 }
        );
        let listings = exporter.source.listings.get();

        assert_eq!(
            exporter.download_page("abc123", &out, true).unwrap(),
            Download::Unchanged
        );
        assert_eq!(exporter.source.listings.get(), listings);

        *exporter.source.edited.borrow_mut() = "2024-02-01T00:00:00.000Z";
        assert_eq!(
            exporter.download_page("abc123", &out, true).unwrap(),
            Download::Fetched { blocks: 1 }
        );
    }

    #[test]
    fn test_export_url_converts_to_markdown() {
        let temp = TempDir::new().unwrap();
        let json_dir = temp.path().join("json");
        let md_dir = temp.path().join("md");

        let written = exporter()
            .export_url("Hello-Page-abc123", &json_dir, &md_dir)
            .unwrap();

        assert_eq!(written, vec![md_dir.join("hello-page.md")]);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("# Hello Page"));
        assert!(content.contains("Hello"));
    }
}
