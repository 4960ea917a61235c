// ABOUTME: Wire-form codec for record ids and last_edited_time
// ABOUTME: Decodes raw JSON objects into records and encodes them back exactly

use crate::model::{FieldSlots, RawRecord, Record, Timestamp};
use crate::{Error, Result};
use chrono::{NaiveDateTime, Timelike};
use serde_json::Value;
use std::fmt;

/// Zone marker the service appends to every timestamp.
pub const WIRE_ZONE_MARKER: &str = "Z";

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub type DecodeFn = fn(&[RawRecord]) -> Result<Vec<Record>>;
pub type EncodeFn = fn(&Record) -> RawRecord;

/// Directional codec pair handed to the snapshot store.
#[derive(Clone, Copy)]
pub struct Codec {
    pub decode: DecodeFn,
    pub encode: EncodeFn,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

impl Codec {
    pub fn wire() -> Self {
        Codec {
            decode: decode_records,
            encode: encode_record,
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Codec::wire()
    }
}

/// Strip dashes and lowercase, so `1a2b-…` and `1A2B…` compare equal.
pub fn normalize_id(id: &str) -> String {
    id.chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn decode_timestamp(wire: &str) -> Result<Timestamp> {
    let body = wire.strip_suffix(WIRE_ZONE_MARKER).unwrap_or(wire);

    let at = NaiveDateTime::parse_from_str(body, &format!("{}%.f", WIRE_FORMAT))
        .map_err(|e| Error::Decode(format!("invalid last_edited_time {:?}: {}", wire, e)))?;

    let digits = body
        .rsplit_once('.')
        .map(|(_, frac)| frac.len())
        .unwrap_or(0);
    if digits > 9 {
        return Err(Error::Decode(format!(
            "last_edited_time {:?} has more than nanosecond precision",
            wire
        )));
    }

    Ok(Timestamp::with_precision(at, digits as u8))
}

pub fn encode_timestamp(ts: &Timestamp) -> String {
    let at = ts.naive();
    let base = at.format(WIRE_FORMAT);
    match ts.subsec_digits() as usize {
        0 => format!("{}{}", base, WIRE_ZONE_MARKER),
        digits => {
            let nanos = format!("{:09}", at.nanosecond() % 1_000_000_000);
            format!("{}.{}{}", base, &nanos[..digits], WIRE_ZONE_MARKER)
        }
    }
}

/// Decode a batch. Any failure rejects the whole batch.
pub fn decode_records(raw: &[RawRecord]) -> Result<Vec<Record>> {
    raw.iter().map(decode_record).collect()
}

pub fn decode_record(raw: &RawRecord) -> Result<Record> {
    decode_owned(raw.clone())
}

/// Nested `children` decode recursively, one stack frame per tree level.
/// Depth is bounded by the thread stack, not by a counter.
pub(crate) fn decode_owned(mut fields: RawRecord) -> Result<Record> {
    let slot = |key: &str| fields.keys().position(|k| k == key);
    let slots = FieldSlots {
        id: slot("id"),
        last_edited_time: slot("last_edited_time"),
        children: slot("children"),
    };

    let id = match fields.shift_remove("id") {
        Some(Value::String(id)) => normalize_id(&id),
        Some(other) => return Err(Error::Decode(format!("id is not a string: {}", other))),
        None => return Err(Error::Decode("record has no id".into())),
    };

    let last_edited_time = match fields.shift_remove("last_edited_time") {
        Some(Value::String(wire)) => decode_timestamp(&wire)?,
        Some(other) => {
            return Err(Error::Decode(format!(
                "last_edited_time of {} is not a string: {}",
                id, other
            )))
        }
        None => {
            return Err(Error::Decode(format!(
                "record {} has no last_edited_time",
                id
            )))
        }
    };

    let children = match fields.shift_remove("children") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            let decoded = items
                .into_iter()
                .map(|item| match item {
                    Value::Object(child) => decode_owned(child),
                    other => Err(Error::Decode(format!(
                        "child of {} is not an object: {}",
                        id, other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Some(decoded)
        }
        Some(other) => {
            return Err(Error::Decode(format!(
                "children of {} is not an array: {}",
                id, other
            )))
        }
    };

    Ok(Record {
        id,
        last_edited_time,
        children,
        fields,
        slots,
    })
}

/// Encode back to the wire object. Codec-owned keys return to the slots they
/// were decoded from; keys without a slot follow the other fields.
pub fn encode_record(record: &Record) -> RawRecord {
    let mut owned = vec![
        (record.slots.id, "id", Value::String(record.id.clone())),
        (
            record.slots.last_edited_time,
            "last_edited_time",
            Value::String(encode_timestamp(&record.last_edited_time)),
        ),
    ];
    if let Some(children) = &record.children {
        let encoded = children
            .iter()
            .map(|child| Value::Object(encode_record(child)))
            .collect();
        owned.push((record.slots.children, "children", Value::Array(encoded)));
    }

    let (mut slotted, trailing): (Vec<_>, Vec<_>) =
        owned.into_iter().partition(|(slot, _, _)| slot.is_some());
    slotted.sort_by_key(|(slot, _, _)| *slot);
    let mut slotted = slotted.into_iter().peekable();

    let mut raw = RawRecord::new();
    let mut rest = record.fields.iter();
    loop {
        let at = raw.len();
        if let Some((_, key, value)) = slotted.next_if(|(slot, _, _)| *slot <= Some(at)) {
            raw.insert(key.into(), value);
            continue;
        }
        match rest.next() {
            Some((key, value)) => {
                raw.insert(key.clone(), value.clone());
            }
            None => break,
        }
    }
    for (_, key, value) in slotted.chain(trailing) {
        raw.insert(key.into(), value);
    }
    raw
}
