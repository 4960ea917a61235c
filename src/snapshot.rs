// ABOUTME: JSON snapshot files holding ordered record sequences
// ABOUTME: Decodes on load and encodes on save through an injected codec

use crate::codec::Codec;
use crate::model::{RawRecord, Record};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// File name of the metadata snapshot kept next to page snapshots.
pub const DATABASE_FILE: &str = "database.json";

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotStore {
    codec: Codec,
}

impl SnapshotStore {
    pub fn new(codec: Codec) -> Self {
        SnapshotStore { codec }
    }

    /// A missing file is an empty snapshot.
    pub fn load(&self, path: &Path) -> Result<Vec<Record>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let corrupt = |reason: String| Error::CorruptSnapshot {
            path: path.to_path_buf(),
            reason,
        };

        let value = parse_unbounded(&content).map_err(|e| corrupt(e.to_string()))?;
        let items = match value {
            Value::Array(items) => items,
            other => return Err(corrupt(format!("expected array, found {}", kind(&other)))),
        };

        let raw = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(corrupt(format!(
                    "entry {} is {}, expected object",
                    i,
                    kind(&other)
                ))),
            })
            .collect::<Result<Vec<RawRecord>>>()?;

        (self.codec.decode)(&raw)
    }

    /// Overwrites `path`. The parent directory must already exist.
    pub fn save(&self, records: &[Record], path: &Path) -> Result<()> {
        let raw: Vec<RawRecord> = records.iter().map(self.codec.encode).collect();

        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        raw.serialize(&mut ser)?;
        buf.push(b'\n');

        fs::write(path, buf)?;
        tracing::debug!(path = %path.display(), records = records.len(), "saved snapshot");
        Ok(())
    }
}

/// Tree snapshots nest two JSON levels per block level, well past
/// serde_json's default limit of 128. The parser grows its stack on the heap
/// instead.
fn parse_unbounded(content: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(content);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_records;
    use crate::model::{FieldSlots, Timestamp};
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_records() -> Vec<Record> {
        let raw: Vec<RawRecord> = serde_json::from_value(json!([
            {
                "object": "block",
                "id": "x1",
                "last_edited_time": "2024-01-01T00:00:00.000Z",
                "has_children": true,
                "type": "toggle",
                "toggle": {"rich_text": [{"plain_text": "Hi"}]},
                "children": [
                    {
                        "id": "x2",
                        "last_edited_time": "2024-01-02T09:30:00.000Z",
                        "has_children": false,
                        "children": []
                    }
                ]
            }
        ]))
        .unwrap();
        decode_records(&raw).unwrap()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::default();
        let records = store.load(&temp.path().join("missing.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        let store = SnapshotStore::default();

        let records = sample_records();
        store.save(&records, &path).unwrap();
        let loaded = store.load(&path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn test_save_writes_wire_timestamp_and_four_space_indent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("database.json");
        let store = SnapshotStore::default();

        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let record = Record {
            id: "y".into(),
            last_edited_time: Timestamp::new(at),
            children: None,
            slots: FieldSlots::default(),
            fields: RawRecord::new(),
        };
        store.save(&[record], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains(r#""last_edited_time": "2024-01-01T00:00:00Z""#));
        assert!(content.contains(r#""id": "y""#));
        assert!(content.starts_with("[\n    {\n        \""));
    }

    #[test]
    fn test_deep_tree_survives_save_and_load() {
        let depth = 300;
        let mut node = json!({
            "id": format!("n{}", depth),
            "last_edited_time": "2024-01-01T00:00:00.000Z",
            "has_children": false,
            "children": []
        });
        for i in (0..depth).rev() {
            node = json!({
                "id": format!("n{}", i),
                "last_edited_time": "2024-01-01T00:00:00.000Z",
                "has_children": true,
                "children": [node]
            });
        }
        let Value::Object(root) = node else {
            panic!("expected object")
        };
        let records = decode_records(&[root]).unwrap();

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deep.json");
        let store = SnapshotStore::default();
        store.save(&records, &path).unwrap();
        let loaded = store.load(&path).unwrap();

        assert_eq!(loaded, records);
        let mut level = loaded.as_slice();
        let mut seen = 0;
        while let Some(first) = level.first() {
            seen += 1;
            level = first.children();
        }
        assert_eq!(seen, depth + 1);
    }

    #[test]
    fn test_save_keeps_service_key_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        let store = SnapshotStore::default();

        store.save(&sample_records(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();

        let at = |key: &str| content.find(&format!("\"{}\"", key)).unwrap();
        assert!(at("object") < at("id"));
        assert!(at("id") < at("last_edited_time"));
        assert!(at("last_edited_time") < at("has_children"));
        assert!(at("toggle") < at("children"));
    }

    #[test]
    fn test_load_trailing_garbage_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        fs::write(&path, "[] []").unwrap();

        let err = SnapshotStore::default().load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_save_overwrites_previous_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        let store = SnapshotStore::default();

        store.save(&sample_records(), &path).unwrap();
        store.save(&[], &path).unwrap();

        assert!(store.load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_does_not_create_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("page.json");
        let err = SnapshotStore::default()
            .save(&sample_records(), &path)
            .unwrap_err();
        assert!(matches!(err, Error::Filesystem(_)));
    }

    #[test]
    fn test_load_invalid_json_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        fs::write(&path, "[{\"id\": ").unwrap();

        let err = SnapshotStore::default().load(&path).unwrap_err();
        assert!(matches!(err, Error::CorruptSnapshot { .. }));
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let store = SnapshotStore::default();

        let path = temp.path().join("object.json");
        fs::write(&path, r#"{"id": "a"}"#).unwrap();
        assert!(matches!(
            store.load(&path),
            Err(Error::CorruptSnapshot { reason, .. }) if reason.contains("expected array")
        ));

        let path = temp.path().join("numbers.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            store.load(&path),
            Err(Error::CorruptSnapshot { reason, .. }) if reason.contains("entry 0")
        ));
    }

    #[test]
    fn test_load_undecodable_record_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        fs::write(&path, r#"[{"id": "a", "last_edited_time": "soon"}]"#).unwrap();

        let err = SnapshotStore::default().load(&path).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_injected_codec_is_used() {
        fn decode_nothing(_: &[RawRecord]) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.json");
        let store = SnapshotStore::new(Codec {
            decode: decode_nothing,
            ..Codec::wire()
        });

        store.save(&sample_records(), &path).unwrap();
        assert!(store.load(&path).unwrap().is_empty());
        assert!(SnapshotStore::default().load(&path).unwrap().len() == 1);
    }
}
