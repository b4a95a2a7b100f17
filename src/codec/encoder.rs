//! Document to binary encoder.

use byteorder::{LittleEndian, WriteBytesExt};
use tracing::{debug, debug_span};

use crate::document::{Document, Entries};
use crate::format::{
    field_rule, int_in_range, AttributeKind, FieldRule, Marker, SchemaField, SchemaState,
    MAX_DEPTH, MAX_STRING_LEN,
};
use crate::util::{Error, Result};

/// Encode a document into the binary point-cache form.
pub fn encode(document: &Document) -> Result<Vec<u8>> {
    Encoder::new().encode(document)
}

/// Tree-walking encoder. One instance serves one document.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
    state: SchemaState,
    depth: usize,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `document`, which must be an object, and return the bytes.
    pub fn encode(mut self, document: &Document) -> Result<Vec<u8>> {
        let _span = debug_span!("encode").entered();
        let entries = document.as_entries().ok_or_else(|| {
            Error::schema(format!("top-level value must be an object, got {}", document.kind()))
        })?;

        self.write_marker(Marker::ObjectStart);
        self.write_object(entries)?;
        self.write_marker(Marker::ObjectEnd);

        debug!(bytes = self.buf.len(), "encoded document");
        Ok(self.buf)
    }

    #[inline]
    fn write_marker(&mut self, marker: Marker) {
        self.buf.push(marker.code());
    }

    fn write_uint8_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        if bytes.len() > MAX_STRING_LEN {
            return Err(Error::schema(format!(
                "string of {} bytes exceeds the {}-byte limit",
                bytes.len(),
                MAX_STRING_LEN
            )));
        }
        self.buf.push(bytes.len() as u8);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::schema(format!("nesting deeper than {} levels", MAX_DEPTH)));
        }
        Ok(())
    }

    /// Write object entries. The surrounding braces are written by the caller.
    fn write_object(&mut self, entries: &Entries) -> Result<()> {
        self.enter()?;
        for (key, value) in entries {
            self.write_marker(Marker::Uint8);
            self.write_uint8_string(key)?;
            self.write_value(key, value)?;
            if let Some(field) = SchemaField::from_key(key) {
                self.state.record(field, value)?;
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn write_value(&mut self, key: &str, value: &Document) -> Result<()> {
        match field_rule(key) {
            FieldRule::Uint32 => {
                let v = int_in_range(key, value, 0, u32::MAX as i64)?;
                self.buf.write_u32::<LittleEndian>(v as u32)?;
            }
            FieldRule::Uint16 => {
                let v = int_in_range(key, value, 0, u16::MAX as i64)?;
                self.buf.write_u16::<LittleEndian>(v as u16)?;
            }
            FieldRule::FrameData => {
                let points = value.as_array().ok_or_else(|| {
                    Error::schema(format!("{} must be an array, got {}", key, value.kind()))
                })?;
                self.write_frame_data(points)?;
            }
            FieldRule::Generic => match value {
                Document::Array(items) => self.write_array(items)?,
                Document::Object(entries) => {
                    self.write_marker(Marker::ObjectStart);
                    self.write_object(entries)?;
                    self.write_marker(Marker::ObjectEnd);
                }
                Document::String(s) => {
                    self.write_marker(Marker::Uint8);
                    self.write_uint8_string(s)?;
                }
                scalar => {
                    self.write_marker(Marker::Uint8);
                    self.write_uint8_string(&scalar.to_string())?;
                }
            },
        }
        Ok(())
    }

    fn write_array(&mut self, items: &[Document]) -> Result<()> {
        self.enter()?;
        self.write_marker(Marker::ArrayStart);
        for item in items {
            match item {
                Document::String(s) => {
                    self.write_marker(Marker::Uint8);
                    self.write_uint8_string(s)?;
                }
                Document::Object(entries) => {
                    self.write_marker(Marker::ObjectStart);
                    self.write_object(entries)?;
                    self.write_marker(Marker::ObjectEnd);
                }
                Document::Array(nested) => self.write_array(nested)?,
                Document::Int(v) => self.buf.push(raw_scalar(*v)?),
                Document::Float(v) => {
                    return Err(Error::schema(format!(
                        "float {} cannot be stored as a raw array byte",
                        v
                    )))
                }
            }
        }
        self.write_marker(Marker::ArrayEnd);
        self.depth -= 1;
        Ok(())
    }

    fn write_frame_data(&mut self, points: &[Document]) -> Result<()> {
        let layout = self.state.frame_layout()?;
        if points.len() != layout.num_points {
            return Err(Error::schema(format!(
                "frame_data has {} points but num_points is {}",
                points.len(),
                layout.num_points
            )));
        }

        let start = self.buf.len();
        self.write_marker(Marker::ArrayStart);
        for (p, point) in points.iter().enumerate() {
            let attributes = point
                .as_array()
                .ok_or_else(|| Error::schema(format!("point {} is not an array", p)))?;
            if attributes.len() != layout.attributes.len() {
                return Err(Error::schema(format!(
                    "point {} has {} attributes but num_attrib is {}",
                    p,
                    attributes.len(),
                    layout.attributes.len()
                )));
            }

            self.write_marker(Marker::ArrayStart);
            for (i, (attribute, slot)) in attributes.iter().zip(&layout.attributes).enumerate() {
                let components = attribute.as_array().ok_or_else(|| {
                    Error::schema(format!("point {} attribute {} is not an array", p, i))
                })?;
                if components.len() != slot.size {
                    return Err(Error::schema(format!(
                        "point {} attribute {} has {} components but attrib_size is {}",
                        p,
                        i,
                        components.len(),
                        slot.size
                    )));
                }
                if let Some(kind) = uniform_kind(components)
                    .map_err(|e| Error::schema(format!("point {} attribute {}: {}", p, i, e)))?
                {
                    if kind != slot.kind {
                        return Err(Error::schema(format!(
                            "point {} attribute {} holds {} but attrib_data_type declares {}",
                            p,
                            i,
                            kind.name(),
                            slot.kind.name()
                        )));
                    }
                }
                self.write_components(components)?;
            }
            self.write_marker(Marker::ArrayEnd);
        }
        self.write_marker(Marker::ArrayEnd);

        debug!(
            points = points.len(),
            bytes = self.buf.len() - start,
            "encoded frame_data block"
        );
        Ok(())
    }

    /// Raw payload of one attribute. Kind uniformity is checked by the caller.
    fn write_components(&mut self, components: &[Document]) -> Result<()> {
        for c in components {
            match c {
                Document::Int(v) => {
                    let v = i32::try_from(*v).map_err(|_| {
                        Error::schema(format!("component {} does not fit in int32", v))
                    })?;
                    self.buf.write_i32::<LittleEndian>(v)?;
                }
                Document::Float(v) => self.buf.write_f32::<LittleEndian>(*v)?,
                other => {
                    return Err(Error::schema(format!(
                        "attribute component must be numeric, got {}",
                        other.kind()
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Common numeric kind of an attribute's components, `None` when empty.
fn uniform_kind(components: &[Document]) -> std::result::Result<Option<AttributeKind>, String> {
    let mut kind = None;
    for c in components {
        let this = match c {
            Document::Int(_) => AttributeKind::Int32,
            Document::Float(_) => AttributeKind::Float32,
            other => return Err(format!("component must be numeric, got {}", other.kind())),
        };
        match kind {
            None => kind = Some(this),
            Some(k) if k != this => {
                return Err("mixes integer and floating-point components".to_string())
            }
            Some(_) => {}
        }
    }
    Ok(kind)
}

/// Validate an integer written as a bare byte inside a generic array.
fn raw_scalar(v: i64) -> Result<u8> {
    let byte = u8::try_from(v)
        .map_err(|_| Error::schema(format!("array scalar {} does not fit in one byte", v)))?;
    if Marker::is_dispatch(byte) {
        return Err(Error::schema(format!(
            "array scalar {} collides with the '{}' marker",
            v, byte as char
        )));
    }
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_doc(frame_data: Document) -> Document {
        Document::builder()
            .with("num_points", 1u32)
            .with("num_attrib", 2u16)
            .with("attrib_size", vec![1, 3])
            .with("attrib_data_type", vec![102, 102])
            .with("frame_data", frame_data)
            .build()
    }

    fn one_point(attrs: Vec<Document>) -> Document {
        Document::Array(vec![Document::Array(attrs)])
    }

    #[test]
    fn test_top_level_layout() {
        let bytes = encode(&Document::builder().with("version", "1.0").build()).unwrap();
        assert_eq!(bytes, b"{B\x07versionB\x031.0}");
    }

    #[test]
    fn test_uint16_width() {
        let bytes = encode(&Document::builder().with("num_attrib", 20).build()).unwrap();
        assert_eq!(bytes.len(), 1 + 1 + 1 + 10 + 2 + 1);
        assert_eq!(&bytes[13..15], &[20, 0]);
    }

    #[test]
    fn test_uint32_width_chosen_by_key() {
        let bytes = encode(&Document::builder().with("num_points", 70000).build()).unwrap();
        assert_eq!(bytes.len(), 1 + 1 + 1 + 10 + 4 + 1);
        assert_eq!(&bytes[13..17], &70000u32.to_le_bytes());

        let bytes = encode(&Document::builder().with("time", 1).build()).unwrap();
        assert_eq!(&bytes[7..11], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_frame_data_block() {
        let doc = schema_doc(one_point(vec![
            vec![2.5f32].into(),
            vec![1.0f32, 1.0, 1.0].into(),
        ]));
        let bytes = encode(&doc).unwrap();

        let mut payload = Vec::new();
        for v in [2.5f32, 1.0, 1.0, 1.0] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(payload.len(), 16);

        let mut tail = b"\x0aframe_data[[".to_vec();
        tail.extend_from_slice(&payload);
        tail.extend_from_slice(b"]]}");
        assert!(bytes.ends_with(&tail));
    }

    #[test]
    fn test_int_attribute_payload() {
        let doc = Document::builder()
            .with("num_points", 1)
            .with("num_attrib", 1)
            .with("attrib_size", vec![2])
            .with("attrib_data_type", vec![108])
            .with("frame_data", one_point(vec![vec![-1, 1073741824].into()]))
            .build();
        let bytes = encode(&doc).unwrap();
        let mut tail = b"[[".to_vec();
        tail.extend_from_slice(&(-1i32).to_le_bytes());
        tail.extend_from_slice(&1073741824i32.to_le_bytes());
        tail.extend_from_slice(b"]]}");
        assert!(bytes.ends_with(&tail));
    }

    #[test]
    fn test_mixed_attribute_rejected() {
        let doc = schema_doc(one_point(vec![
            vec![Document::Float(2.5)].into(),
            vec![Document::Int(1), Document::Float(1.0), Document::Float(1.0)].into(),
        ]));
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(ref m)) if m.contains("mixes")));
    }

    #[test]
    fn test_kind_disagreeing_with_schema_rejected() {
        let doc = schema_doc(one_point(vec![vec![2].into(), vec![1.0f32, 1.0, 1.0].into()]));
        let err = encode(&doc).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("declares")));
    }

    #[test]
    fn test_component_count_rejected() {
        let doc = schema_doc(one_point(vec![vec![2.5f32].into(), vec![1.0f32, 1.0].into()]));
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_point_count_rejected() {
        let doc = schema_doc(Document::Array(vec![]));
        let err = encode(&doc).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("num_points")));
    }

    #[test]
    fn test_frame_data_needs_schema() {
        let doc = Document::builder().with("frame_data", Document::Array(vec![])).build();
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_scalars_are_stringified() {
        let doc = Document::builder().with("scale", 1.5f32).with("id", 7).build();
        let bytes = encode(&doc).unwrap();
        assert_eq!(bytes, b"{B\x05scaleB\x031.5B\x02idB\x017}");
    }

    #[test]
    fn test_generic_array_raw_bytes() {
        let doc = Document::builder().with("attrib_data_type", vec![108, 102]).build();
        let bytes = encode(&doc).unwrap();
        assert!(bytes.ends_with(b"[lf]}"));

        let doc = Document::builder()
            .with("list", vec![Document::from("a"), Document::Int(3)])
            .build();
        let bytes = encode(&doc).unwrap();
        assert!(bytes.ends_with(b"[B\x01a\x03]}"));
    }

    #[test]
    fn test_raw_byte_limits() {
        let too_big = Document::builder().with("list", vec![256]).build();
        assert!(matches!(encode(&too_big), Err(Error::SchemaViolation(_))));

        let collides = Document::builder().with("list", vec![b'[' as i32]).build();
        assert!(matches!(encode(&collides), Err(Error::SchemaViolation(_))));

        let float = Document::builder().with("list", vec![0.5f32]).build();
        assert!(matches!(encode(&float), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_width_field_type_checked() {
        let doc = Document::builder().with("num_points", "ten").build();
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(_))));
        let doc = Document::builder().with("num_attrib", 65536).build();
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_long_key_rejected() {
        let doc = Document::builder().with("k".repeat(256), "v").build();
        assert!(matches!(encode(&doc), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_mismatched_tables_without_frames() {
        let header = Document::builder()
            .with("num_attrib", 2)
            .with("attrib_name", vec!["a"])
            .with("attrib_size", vec![1, 3, 5])
            .with("attrib_data_type", vec![102, 7, 9]);
        let doc = Document::builder().with("header", header).build();
        let err = encode(&doc).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_name")));
    }

    #[test]
    fn test_attrib_name_after_frame_data_checked() {
        let doc = Document::builder()
            .with("num_points", 1)
            .with("num_attrib", 1)
            .with("attrib_size", vec![1])
            .with("attrib_data_type", vec![102])
            .with("frame_data", one_point(vec![vec![1.5f32].into()]))
            .with("attrib_name", vec!["a", "b", "c"])
            .build();
        let err = encode(&doc).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_name")));
    }

    #[test]
    fn test_top_level_must_be_object() {
        assert!(matches!(encode(&Document::Int(1)), Err(Error::SchemaViolation(_))));
    }
}
