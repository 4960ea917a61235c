// ABOUTME: Paginated block-tree retrieval over any block source
// ABOUTME: Walks descendants depth-first with an explicit stack, decoding per level

use crate::codec::{decode_owned, decode_record};
use crate::model::{has_children, ChildrenPage, RawRecord, Record};
use crate::{Error, Result};

/// Remote capabilities the fetcher needs.
pub trait BlockSource {
    /// One page of the immediate children of `block_id`.
    fn list_children(&self, block_id: &str, cursor: Option<&str>) -> Result<ChildrenPage>;

    /// Page-level metadata (title, properties, timestamps).
    fn retrieve_page(&self, page_id: &str) -> Result<RawRecord>;
}

pub struct TreeFetcher<'a, S: ?Sized> {
    source: &'a S,
}

/// One listing level: every raw record of a parent, plus the decoded children
/// collected so far for its first `children.len()` records.
struct Level {
    raw: Vec<RawRecord>,
    children: Vec<Vec<Record>>,
}

impl Level {
    fn new(raw: Vec<RawRecord>) -> Self {
        let children = Vec::with_capacity(raw.len());
        Level { raw, children }
    }

    fn decode(self) -> Result<Vec<Record>> {
        self.raw
            .into_iter()
            .zip(self.children)
            .map(|(raw, children)| {
                let mut record = decode_owned(raw)?;
                record.children = Some(children);
                Ok(record)
            })
            .collect()
    }
}

impl<'a, S: BlockSource + ?Sized> TreeFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        TreeFetcher { source }
    }

    pub fn fetch_metadata(&self, page_id: &str) -> Result<Record> {
        let raw = self.source.retrieve_page(page_id)?;
        tracing::debug!(page_id, "fetched page metadata");
        decode_record(&raw)
    }

    /// Fetch every descendant of `root_id`.
    ///
    /// Each level's pagination is exhausted before descending, and each child
    /// subtree is resolved completely before its next sibling is touched.
    /// The returned records are the root's immediate children, each carrying
    /// its own decoded `children`.
    pub fn fetch_block_tree(&self, root_id: &str) -> Result<Vec<Record>> {
        let mut stack = vec![Level::new(self.fetch_level(root_id)?)];

        while let Some(level) = stack.last_mut() {
            let next = level.children.len();
            if let Some(raw) = level.raw.get(next) {
                if has_children(raw) {
                    let child_id = raw_id(raw)?;
                    let grandchildren = self.fetch_level(&child_id)?;
                    stack.push(Level::new(grandchildren));
                } else {
                    level.children.push(Vec::new());
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let records = done.decode()?;
            match stack.last_mut() {
                Some(parent) => parent.children.push(records),
                None => return Ok(records),
            }
        }

        Ok(Vec::new())
    }

    fn fetch_level(&self, block_id: &str) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.source.list_children(block_id, cursor.as_deref())?;
            pages += 1;
            cursor = page.continuation().map(str::to_owned);
            records.extend(page.results);
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(block_id, pages, blocks = records.len(), "fetched block level");
        Ok(records)
    }
}

fn raw_id(raw: &RawRecord) -> Result<String> {
    raw.get("id")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::Decode("block with children has no id".into()))
}
