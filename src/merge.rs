//! Deep-merge of YAML values: each parse call layers a sparse overlay onto
//! the destination's current state, so unset keys fall through and the last
//! write wins per field.

use serde_yaml::Value;

/// Deep-merge `overlay` on top of `base`.
///
/// Mappings recurse key-by-key. Sequences merge element-wise: `null` overlay
/// entries are padding synthesized by the document builder for indices the
/// caller did not address, so the base element is kept; a longer overlay
/// extends the base. Everything else the overlay wins, with one concession:
/// a non-string scalar layered onto a string keeps the string type, so
/// `--name=42` still decodes into a `String` field.
pub(crate) fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Mapping(base_map)
        }
        (Value::Sequence(mut base_seq), Value::Sequence(overlay_seq)) => {
            for (index, overlay_val) in overlay_seq.into_iter().enumerate() {
                if index >= base_seq.len() {
                    base_seq.push(overlay_val);
                } else if !overlay_val.is_null() {
                    let base_val = std::mem::replace(&mut base_seq[index], Value::Null);
                    base_seq[index] = deep_merge(base_val, overlay_val);
                }
            }
            Value::Sequence(base_seq)
        }
        (Value::String(_), Value::Bool(overlay_val)) => Value::String(overlay_val.to_string()),
        (Value::String(_), Value::Number(overlay_val)) => Value::String(overlay_val.to_string()),
        (_, overlay) => overlay,
    }
}
