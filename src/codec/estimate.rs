//! Size estimation for encode buffers.

use crate::types::Value;

/// Flat per-node margin covering the header byte and length field.
const NODE_MARGIN: usize = 5;

/// Returns a conservative upper bound on the encoded size of `value`.
///
/// The encoder allocates exactly this many bytes and bounds-checks
/// every write against them, so the bound must never under-shoot:
/// `estimate(v) >= encode_value(v)?.len()` for every legal tree. It is
/// a loose heuristic, not a tight fit; scalar costs are padded and each
/// node carries a flat margin.
pub fn estimate(value: &Value) -> usize {
    let bytes = match value {
        // Null has no wire representation; the margin alone covers it.
        Value::Null => 0,
        Value::Bool(_) => 4,
        Value::Int(_) | Value::Double(_) => 8,
        // Worst case of a widened representation.
        Value::Text(s) => s.chars().count() * 2,
        Value::Binary(b) => b.len(),
        Value::Sequence(items) => items.iter().map(estimate).sum(),
        Value::Map(map) => map.iter().map(|(k, v)| key_cost(k) + estimate(v)).sum(),
    };
    bytes + NODE_MARGIN
}

/// Cost of a map key, emitted as a text value ahead of each entry.
fn key_cost(key: &str) -> usize {
    key.chars().count() * 2 + NODE_MARGIN
}
