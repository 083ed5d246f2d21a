//! Input sanitisation: control characters out, sizes bounded.

pub const MAX_MESSAGE_LEN: usize = 2000;
pub const MAX_PAYLOAD_KEYS: usize = 20;
pub const MAX_PAYLOAD_DEPTH: usize = 3;
pub const MAX_PAYLOAD_VALUE_LEN: usize = 500;

fn strip_control(s: &str, allow_newline: bool) -> String {
    s.chars()
        .filter(|c| {
            (allow_newline && (*c == '\n' || *c == '\t'))
                || (*c as u32 >= 0x20 && *c as u32 != 0x7F)
        })
        .collect()
}

/// Trim, drop control characters, truncate to `max_len` (char-wise, so a
/// multi-byte boundary is never split).
pub fn sanitize_string(value: &str, max_len: usize, allow_newline: bool) -> String {
    let s = strip_control(value.trim(), allow_newline);
    if s.chars().count() > max_len {
        s.chars().take(max_len).collect()
    } else {
        s
    }
}

/// Bound a JSON payload: key count, nesting depth, value sizes. Non-scalar
/// leaves are stringified and truncated.
pub fn sanitize_payload(payload: &serde_json::Value, depth: usize) -> serde_json::Value {
    if depth > MAX_PAYLOAD_DEPTH {
        return serde_json::Value::Object(Default::default());
    }
    let Some(map) = payload.as_object() else {
        return serde_json::Value::Object(Default::default());
    };
    let mut out = serde_json::Map::new();
    for (i, (k, v)) in map.iter().enumerate() {
        if i >= MAX_PAYLOAD_KEYS {
            break;
        }
        let key = sanitize_string(k, 64, false);
        if key.is_empty() {
            continue;
        }
        let value = match v {
            serde_json::Value::Object(_) => sanitize_payload(v, depth + 1),
            serde_json::Value::String(s) => {
                serde_json::Value::String(sanitize_string(s, MAX_PAYLOAD_VALUE_LEN, false))
            }
            serde_json::Value::Null
            | serde_json::Value::Bool(_)
            | serde_json::Value::Number(_) => v.clone(),
            other => serde_json::Value::String(sanitize_string(
                &other.to_string(),
                MAX_PAYLOAD_VALUE_LEN,
                false,
            )),
        };
        out.insert(key, value);
    }
    serde_json::Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chars_are_stripped() {
        assert_eq!(sanitize_string("a\x00b\x1bc", 100, false), "abc");
        assert_eq!(sanitize_string("linha1\nlinha2", 100, true), "linha1\nlinha2");
        assert_eq!(sanitize_string("linha1\nlinha2", 100, false), "linha1linha2");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = sanitize_string("ããããã", 3, false);
        assert_eq!(s.chars().count(), 3);
    }

    #[test]
    fn payload_is_bounded() {
        let big = serde_json::json!({
            "nome": "bolo",
            "nested": {"a": {"b": {"c": {"d": "too deep"}}}},
            "arr": [1, 2, 3]
        });
        let clean = sanitize_payload(&big, 0);
        assert_eq!(clean["nome"], "bolo");
        assert!(clean["arr"].is_string()); // stringified leaf
    }
}
