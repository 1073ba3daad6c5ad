//! Canonical JSON encoding for signature reproducibility.
//!
//! Two payloads with the same key/value sets must serialize to identical
//! bytes regardless of construction order, otherwise every signature over
//! them silently diverges between signer and verifier. Rules: object keys
//! sorted lexicographically at every nesting level, no insignificant
//! whitespace, integers rendered without a decimal point, UTF-8 throughout.

use serde_json::Value;

/// Encode `value` into canonical JSON bytes.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Object(map) => {
            // Sort explicitly rather than relying on the map's internal
            // ordering, which changes with serde_json's `preserve_order`.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(out, &Value::String(key.clone()));
                out.push(b':');
                write_value(out, item);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item);
            }
            out.push(b']');
        }
        scalar => write_scalar(out, scalar),
    }
}

/// Scalars (and strings used as keys) already have a single canonical
/// rendering in serde_json: integers without a decimal point, standard
/// JSON string escapes, UTF-8 passed through unescaped.
fn write_scalar(out: &mut Vec<u8>, value: &Value) {
    serde_json::to_writer(&mut *out, value).expect("writing JSON scalar to a Vec cannot fail");
}
