// ABOUTME: Change detection between two metadata snapshots
// ABOUTME: Pages are keyed by id and compared on last_edited_time

use crate::model::{Record, Timestamp};
use std::collections::HashMap;

/// Records of `current` that are new or were edited after their `previous`
/// counterpart. Order follows `current`.
pub fn changed_pages<'a>(previous: &[Record], current: &'a [Record]) -> Vec<&'a Record> {
    let seen: HashMap<&str, Timestamp> = previous
        .iter()
        .map(|r| (r.id.as_str(), r.last_edited_time))
        .collect();

    current
        .iter()
        .filter(|r| match seen.get(r.id.as_str()) {
            Some(prev) => prev.naive() < r.last_edited_time.naive(),
            None => true,
        })
        .collect()
}

pub fn is_changed(previous: &[Record], page: &Record) -> bool {
    !changed_pages(previous, std::slice::from_ref(page)).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_timestamp;
    use crate::model::{FieldSlots, RawRecord};

    fn page(id: &str, edited: &str) -> Record {
        Record {
            id: id.into(),
            last_edited_time: decode_timestamp(edited).unwrap(),
            children: None,
            slots: FieldSlots::default(),
            fields: RawRecord::new(),
        }
    }

    #[test]
    fn test_changed_pages_new_and_edited() {
        let previous = vec![
            page("a", "2024-01-01T00:00:00.000Z"),
            page("b", "2024-01-01T00:00:00.000Z"),
        ];
        let current = vec![
            page("a", "2024-01-01T00:00:00.000Z"),
            page("b", "2024-02-01T00:00:00.000Z"),
            page("c", "2023-01-01T00:00:00.000Z"),
        ];

        let changed: Vec<&str> = changed_pages(&previous, &current)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(changed, vec!["b", "c"]);
    }

    #[test]
    fn test_changed_pages_ignores_precision_only_difference() {
        let previous = vec![page("a", "2024-01-01T00:00:00Z")];
        let current = vec![page("a", "2024-01-01T00:00:00.000Z")];
        assert!(changed_pages(&previous, &current).is_empty());
    }

    #[test]
    fn test_older_remote_is_not_changed() {
        let previous = vec![page("a", "2024-03-01T00:00:00.000Z")];
        assert!(!is_changed(&previous, &page("a", "2024-01-01T00:00:00.000Z")));
        assert!(is_changed(&[], &page("a", "2024-01-01T00:00:00.000Z")));
    }
}
