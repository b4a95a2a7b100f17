//! Textual (JSON) form of a document.
//!
//! Key order follows the text (`serde_json` is built with `preserve_order`).
//! Output is pretty-printed with four-space indentation.

use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Number, Serializer, Value};

use crate::document::Document;
use crate::util::{Error, Result};

/// Parse JSON text into a document.
pub fn parse(text: &[u8]) -> Result<Document> {
    let value: Value = serde_json::from_slice(text)?;
    from_json(&value)
}

/// Render a document as pretty-printed JSON text.
pub fn to_pretty(document: &Document) -> Result<Vec<u8>> {
    let value = to_json(document)?;
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    serde::Serialize::serialize(&value, &mut ser)?;
    Ok(out)
}

/// Convert a JSON value into a document.
///
/// Integers become [`Document::Int`], other numbers [`Document::Float`]
/// (narrowed to `f32`). `null` and booleans have no binary counterpart.
pub fn from_json(value: &Value) -> Result<Document> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), from_json(v)?)))
            .collect::<Result<Vec<_>>>()
            .map(Document::Object),
        Value::Array(items) => items
            .iter()
            .map(from_json)
            .collect::<Result<Vec<_>>>()
            .map(Document::Array),
        Value::String(s) => Ok(Document::String(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Document::Int(i))
            } else if n.is_u64() {
                Err(Error::schema(format!("integer {} is out of range", n)))
            } else {
                n.as_f64()
                    .map(|f| Document::Float(f as f32))
                    .ok_or_else(|| Error::schema(format!("unrepresentable number {}", n)))
            }
        }
        Value::Bool(_) | Value::Null => Err(Error::schema(format!(
            "JSON {} has no point-cache representation",
            value
        ))),
    }
}

/// Convert a document into a JSON value.
pub fn to_json(document: &Document) -> Result<Value> {
    Ok(match document {
        Document::Object(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (k, v) in entries {
                map.insert(k.clone(), to_json(v)?);
            }
            Value::Object(map)
        }
        Document::Array(items) => {
            Value::Array(items.iter().map(to_json).collect::<Result<Vec<_>>>()?)
        }
        Document::String(s) => Value::String(s.clone()),
        Document::Int(v) => Value::Number((*v).into()),
        Document::Float(v) => Value::Number(float_number(*v)?),
    })
}

/// Widen an `f32` through its shortest decimal form, so `0.1f32` prints as
/// `0.1` rather than `0.10000000149011612`.
fn float_number(v: f32) -> Result<Number> {
    let widened: f64 = v
        .to_string()
        .parse()
        .map_err(|_| Error::schema(format!("float {} cannot be written as JSON", v)))?;
    Number::from_f64(widened)
        .ok_or_else(|| Error::schema(format!("float {} cannot be written as JSON", v)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_key_order() {
        let doc = parse(br#"{"z": 1, "a": [1.5, "s"], "m": {"k": -2}}"#).unwrap();
        let keys: Vec<&str> = doc
            .as_entries()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(
            doc.get("a"),
            Some(&Document::Array(vec![Document::Float(1.5), "s".into()]))
        );
        assert_eq!(doc.get("m").and_then(|m| m.get("k")), Some(&Document::Int(-2)));
    }

    #[test]
    fn test_float_vs_int_literals() {
        let doc = parse(b"[1, 1.0]").unwrap();
        assert_eq!(doc, Document::Array(vec![Document::Int(1), Document::Float(1.0)]));
    }

    #[test]
    fn test_pretty_output() {
        let doc = Document::builder()
            .with("version", "1.0")
            .with("attrib_size", vec![1, 3])
            .with("scale", 0.1f32)
            .build();
        let text = String::from_utf8(to_pretty(&doc).unwrap()).unwrap();
        assert_eq!(
            text,
            concat!(
                "{\n",
                "    \"version\": \"1.0\",\n",
                "    \"attrib_size\": [\n",
                "        1,\n",
                "        3\n",
                "    ],\n",
                "    \"scale\": 0.1\n",
                "}"
            )
        );
    }

    #[test]
    fn test_text_roundtrip_is_stable() {
        let doc = parse(br#"{"P": [0.333, 1.0, -2.75], "id": 4}"#).unwrap();
        let again = parse(&to_pretty(&doc).unwrap()).unwrap();
        assert_eq!(doc, again);
    }

    #[test]
    fn test_unsupported_values() {
        assert!(matches!(parse(b"{\"a\": null}"), Err(Error::SchemaViolation(_))));
        assert!(matches!(parse(b"[true]"), Err(Error::SchemaViolation(_))));
        assert!(matches!(parse(b"[18446744073709551615]"), Err(Error::SchemaViolation(_))));
        assert!(matches!(parse(b"{"), Err(Error::Json(_))));
    }

    #[test]
    fn test_non_finite_float_rejected() {
        assert!(to_json(&Document::Float(f32::NAN)).is_err());
    }
}
