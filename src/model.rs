// ABOUTME: Data models for Notion blocks, page metadata, and listing pages
// ABOUTME: Raw JSON objects on the wire, decoded records in memory

use crate::codec;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A JSON object exactly as the service (or a snapshot file) represents it.
pub type RawRecord = Map<String, Value>;

/// Wire-precise `last_edited_time`.
///
/// The service always sends UTC with a trailing `Z`, so only the naive
/// date-time is kept. The number of fractional digits seen on the wire is
/// remembered so encoding reproduces the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    at: NaiveDateTime,
    subsec_digits: u8,
}

impl Timestamp {
    /// Fractional digits are chosen like an ISO formatter would: none for
    /// whole seconds, otherwise 3, 6 or 9.
    pub fn new(at: NaiveDateTime) -> Self {
        let nanos = at.nanosecond() % 1_000_000_000;
        let subsec_digits = if nanos == 0 {
            0
        } else if nanos % 1_000_000 == 0 {
            3
        } else if nanos % 1_000 == 0 {
            6
        } else {
            9
        };
        Timestamp { at, subsec_digits }
    }

    pub fn with_precision(at: NaiveDateTime, subsec_digits: u8) -> Self {
        Timestamp {
            at,
            subsec_digits: subsec_digits.min(9),
        }
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.at
    }

    pub fn subsec_digits(&self) -> u8 {
        self.subsec_digits
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(at: NaiveDateTime) -> Self {
        Timestamp::new(at)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&codec::encode_timestamp(self))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        codec::decode_timestamp(&wire).map_err(serde::de::Error::custom)
    }
}

/// Where the codec-owned keys sat in the wire object, so encoding can put
/// them back in place. `None` keys are appended after the other fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSlots {
    pub id: Option<usize>,
    pub last_edited_time: Option<usize>,
    pub children: Option<usize>,
}

/// A decoded block or page-metadata object.
///
/// Equality ignores `slots`: key order is presentation, not content.
#[derive(Debug, Clone)]
pub struct Record {
    /// Canonical normalized id.
    pub id: String,
    pub last_edited_time: Timestamp,
    /// `None` when the record never carried a `children` key (page metadata).
    pub children: Option<Vec<Record>>,
    /// Every other field, untouched and in wire order.
    pub fields: RawRecord,
    pub slots: FieldSlots,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.last_edited_time == other.last_edited_time
            && self.children == other.children
            && self.fields == other.fields
    }
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn has_children(&self) -> bool {
        has_children(&self.fields)
    }

    /// Block type tag, e.g. `paragraph` or `heading_1`.
    pub fn block_type(&self) -> Option<&str> {
        self.get("type").and_then(Value::as_str)
    }

    /// Type-specific payload, e.g. the `paragraph` object of a paragraph block.
    pub fn payload(&self) -> Option<&Value> {
        self.block_type().and_then(|t| self.get(t))
    }

    pub fn children(&self) -> &[Record] {
        self.children.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn has_children(raw: &RawRecord) -> bool {
    raw.get("has_children")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// One page of a paginated children listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildrenPage {
    #[serde(default)]
    pub results: Vec<RawRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl ChildrenPage {
    pub fn new(results: Vec<RawRecord>, next_cursor: Option<String>) -> Self {
        ChildrenPage {
            results,
            has_more: next_cursor.is_some(),
            next_cursor,
        }
    }

    /// Cursor for the next page, or `None` once the listing is exhausted.
    pub fn continuation(&self) -> Option<&str> {
        if self.has_more {
            self.next_cursor.as_deref()
        } else {
            None
        }
    }
}

/// YAML header written at the top of every converted page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<Timestamp>,
    pub generator: String,
}
