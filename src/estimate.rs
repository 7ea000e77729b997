//! Serialized-size estimation.
//!
//! Computes a conservative approximation of a value's serialized JSON byte
//! length prior to actually serializing it, used to decide entry placement
//! before the true size is known. For content whose escaping stays within
//! the 10% string slack the estimate never comes in under the actual size;
//! staying within 10-20% over is the goal. Escape-heavy strings (runs of
//! quotes, backslashes or control characters) can exceed the slack, so the
//! writers reserve entry capacity with the actual serialized length and the
//! budget never rests on the estimate.

use crate::metadata::Metadata;
use serde_json::Value;

/// Empirical size in bytes of a typical graph node. When used to pre-size a
/// collection for all the nodes in an entry, this covers the vast majority of
/// entries with a single reallocation.
pub const AVERAGE_NODE_SIZE: usize = 400;

/// Estimate of how many nodes fit in an entry with the given budget.
pub fn average_entry_node_count(budget: usize) -> usize {
    budget / AVERAGE_NODE_SIZE
}

/// Estimates the serialized JSON size of a value.
///
/// String sizes are inflated 10% to account for escaping, and a delimiter is
/// counted for every collection element (even the last), so the result leans
/// over rather than under.
pub fn estimate(value: &Value) -> usize {
    match value {
        Value::Null => 4, // "null"
        Value::Bool(b) => {
            if *b {
                4 // "true"
            } else {
                5 // "false"
            }
        }
        Value::Number(n) => n.to_string().len(),
        Value::String(s) => estimate_str(s),
        Value::Array(items) => {
            let mut size = 2; // "[]"
            for item in items {
                size += 1 + estimate(item); // <item> ","
            }
            size
        }
        Value::Object(map) => {
            let mut size = 2; // "{}"
            for (key, item) in map {
                size += 1 + estimate_str(key); // <key> ":"
                size += 1 + estimate(item); // <value> ","
            }
            size
        }
    }
}

/// Estimates the serialized size of a quoted JSON string. The 10% slack
/// covers multi-byte expansion and light escaping, not strings dominated by
/// escaped characters.
pub fn estimate_str(s: &str) -> usize {
    let len = s.len();
    2 + len + len.div_ceil(10) // '"' <s> '"' plus 10% escaping slack
}

/// Estimate of the per-entry envelope overhead for the given metadata.
///
/// The envelope is `{"@id":<ID>,"@graph":[<NODES>]}`: a fixed 20 bytes plus
/// the size of the identifier.
pub fn entry_overhead(metadata: &Metadata) -> usize {
    20 + estimate_str(metadata.id())
}
