// ABOUTME: Converts a directory of JSON page snapshots into Markdown files
// ABOUTME: Adds YAML frontmatter from the metadata snapshot and names files by title

use crate::codec::normalize_id;
use crate::model::{Frontmatter, Record};
use crate::render::{page_title, render_blocks};
use crate::snapshot::{SnapshotStore, DATABASE_FILE};
use crate::util::StemAllocator;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const GENERATOR: &str = concat!("notion2md ", env!("CARGO_PKG_VERSION"));

pub struct MarkdownOutput {
    pub frontmatter_yaml: String,
    pub body: String,
}

impl MarkdownOutput {
    pub fn document(&self) -> String {
        format!("---\n{}---\n\n{}", self.frontmatter_yaml, self.body)
    }
}

pub fn to_markdown(
    blocks: &[Record],
    meta: Option<&Record>,
    page_id: &str,
    strip_meta_chars: &str,
) -> Result<MarkdownOutput> {
    let title = meta.and_then(page_title);

    let frontmatter = Frontmatter {
        id: page_id.to_string(),
        title: title.as_deref().map(|t| strip_chars(t, strip_meta_chars)),
        url: meta
            .and_then(|m| m.get("url"))
            .and_then(Value::as_str)
            .map(String::from),
        last_edited_time: meta.map(|m| m.last_edited_time),
        generator: GENERATOR.into(),
    };

    let frontmatter_yaml = serde_yaml::to_string(&frontmatter)
        .map_err(|e| Error::Render(format!("Failed to serialize frontmatter: {}", e)))?;

    let mut body = format!("# {}\n\n", title.as_deref().unwrap_or("Untitled"));
    let content = render_blocks(blocks);
    if content.is_empty() {
        body.push_str("_This page is empty._\n");
    } else {
        body.push_str(&content);
        body.push('\n');
    }

    Ok(MarkdownOutput {
        frontmatter_yaml,
        body,
    })
}

fn strip_chars(text: &str, chars: &str) -> String {
    text.chars().filter(|c| !chars.contains(*c)).collect()
}

pub struct Converter {
    store: SnapshotStore,
    strip_meta_chars: String,
    extension: String,
}

impl Converter {
    pub fn new(strip_meta_chars: Option<String>, extension: impl Into<String>) -> Self {
        Converter {
            store: SnapshotStore::default(),
            strip_meta_chars: strip_meta_chars.unwrap_or_default(),
            extension: extension.into(),
        }
    }

    /// Render every page snapshot in `json_dir` into `md_dir`.
    ///
    /// Returns the written paths in snapshot file-name order.
    pub fn convert(&self, json_dir: &Path, md_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(md_dir)?;

        let metadata = self.store.load(&json_dir.join(DATABASE_FILE))?;
        let by_id: HashMap<&str, &Record> = metadata.iter().map(|m| (m.id.as_str(), m)).collect();

        let sources = page_snapshots(json_dir)?;
        let pb = ProgressBar::new(sources.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40}] {pos}/{len} pages")
                .map_err(|e| Error::Render(e.to_string()))?
                .progress_chars("##-"),
        );

        let mut written = Vec::with_capacity(sources.len());
        let mut stems = StemAllocator::default();

        for source in &sources {
            let page_id = source
                .file_stem()
                .and_then(|s| s.to_str())
                .map(normalize_id)
                .unwrap_or_default();
            let blocks = self.store.load(source)?;
            let meta = by_id.get(page_id.as_str()).copied();
            if meta.is_none() {
                tracing::warn!(page_id = %page_id, "no metadata for page, converting without title");
            }

            let md = to_markdown(&blocks, meta, &page_id, &self.strip_meta_chars)?;

            let title = meta.and_then(page_title);
            let stem = stems.allocate(title.as_deref(), &page_id);

            let out = md_dir.join(format!("{}.{}", stem, self.extension));
            fs::write(&out, md.document())?;
            tracing::info!(path = %out.display(), blocks = blocks.len(), "wrote markdown");

            written.push(out);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(written)
    }
}

fn page_snapshots(json_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(json_dir)? {
        let path = entry?.path();
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let is_database = path.file_name().and_then(|n| n.to_str()) == Some(DATABASE_FILE);
        if path.is_file() && is_json && !is_database {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
