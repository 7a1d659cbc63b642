//! Deterministic fingerprints of memoized calls.
//!
//! A fingerprint hashes the function's module and qualified name together
//! with a canonical byte encoding of its bound arguments. The encoding is
//! type-tagged and length-prefixed, so distinct values never share an
//! encoding, and it normalizes every source of incidental ordering:
//!
//! - arguments are sorted by parameter name; the receiver is skipped,
//! - map entries are sorted by key,
//! - set elements are sorted by their own encoding and deduplicated,
//! - lists keep their order,
//! - frames are reduced to shape, column names, column types and a hash of
//!   their cells, never to their address in memory.

use dfcache_common::ContentHash;
use dfcache_frame::DataFrame;

use crate::signature::{BoundArgs, FunctionId};
use crate::value::Value;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_SET: u8 = 6;
const TAG_MAP: u8 = 7;
const TAG_FRAME: u8 = 8;

/// Computes the fingerprint of a call to `function` with `args`.
pub fn fingerprint(function: &FunctionId, args: &BoundArgs) -> ContentHash {
    ContentHash::from_bytes(&canonical_call(function, args))
}

/// Returns the canonical byte encoding that [`fingerprint`] hashes.
pub fn canonical_call(function: &FunctionId, args: &BoundArgs) -> Vec<u8> {
    let mut hashed: Vec<_> = args.hashed().collect();
    hashed.sort_by(|a, b| a.name().cmp(b.name()));

    let mut out = Vec::new();
    write_str(&mut out, function.module());
    write_str(&mut out, function.qualname());
    write_len(&mut out, hashed.len());
    for arg in hashed {
        write_str(&mut out, arg.name());
        write_value(&mut out, arg.value());
    }
    out
}

/// Returns the canonical byte encoding of a single value.
pub fn canonical_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(b) => {
            out.push(TAG_BOOL);
            out.push(*b as u8);
        }
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_bits().to_le_bytes());
        }
        Value::Str(s) => {
            out.push(TAG_STR);
            write_str(out, s);
        }
        Value::List(items) => {
            out.push(TAG_LIST);
            write_len(out, items.len());
            for item in items {
                write_value(out, item);
            }
        }
        Value::Set(items) => {
            let mut encoded: Vec<Vec<u8>> = items.iter().map(canonical_value).collect();
            encoded.sort();
            encoded.dedup();
            out.push(TAG_SET);
            write_len(out, encoded.len());
            for item in encoded {
                out.extend_from_slice(&item);
            }
        }
        Value::Map(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push(TAG_MAP);
            write_len(out, entries.len());
            for (key, item) in entries {
                write_str(out, key);
                write_value(out, item);
            }
        }
        Value::Frame(df) => {
            out.push(TAG_FRAME);
            write_frame(out, df);
        }
    }
}

fn write_frame(out: &mut Vec<u8>, df: &DataFrame) {
    let (rows, cols) = df.shape();
    write_len(out, rows);
    write_len(out, cols);
    for name in df.column_names() {
        write_str(out, name);
    }
    for dtype in df.dtypes() {
        write_str(out, dtype.as_str());
    }
    write_str(out, &df.content_hash().to_string());
}
