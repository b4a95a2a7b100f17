//! Binary to document decoder.

use tracing::{debug, debug_span};

use super::cursor::ByteCursor;
use crate::document::{Document, Entries};
use crate::format::{
    describe, field_rule, AttributeKind, FieldRule, FrameLayout, Marker, SchemaField,
    SchemaState, MAX_DEPTH,
};
use crate::util::{Error, Result};

/// Decode a binary point-cache buffer into a document.
pub fn decode(bytes: &[u8]) -> Result<Document> {
    Decoder::new(bytes).decode()
}

/// Marker-dispatching decoder with a per-call schema context.
pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    state: SchemaState,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(bytes),
            state: SchemaState::new(),
            depth: 0,
        }
    }

    /// Decode the whole buffer. The stream must hold exactly one object.
    pub fn decode(mut self) -> Result<Document> {
        let _span = debug_span!("decode", bytes = self.cursor.remaining()).entered();

        self.cursor.expect(Marker::ObjectStart)?;
        let entries = self.read_object()?;

        if self.cursor.remaining() > 0 {
            return Err(Error::malformed(
                self.cursor.pos(),
                format!("{} trailing byte(s) after the top-level object", self.cursor.remaining()),
            ));
        }
        debug!(keys = entries.len(), "decoded document");
        Ok(Document::Object(entries))
    }

    /// Schema fields seen so far.
    pub fn schema(&self) -> &SchemaState {
        &self.state
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::malformed(
                self.cursor.pos(),
                format!("nesting deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(())
    }

    /// Read entries up to and including the object-end marker.
    fn read_object(&mut self) -> Result<Entries> {
        self.enter()?;
        let mut entries = Entries::new();
        loop {
            let offset = self.cursor.pos();
            let marker = self.cursor.read_u8()?;
            if marker == Marker::ObjectEnd.code() {
                break;
            }
            if marker != Marker::Uint8.code() {
                return Err(Error::malformed(
                    offset,
                    format!("expected key or object end, found {}", describe(marker)),
                ));
            }

            let key = self.cursor.read_uint8_string()?;
            let value = self.read_value(&key)?;
            if let Some(field) = SchemaField::from_key(&key) {
                self.state.record(field, &value)?;
            }
            entries.push((key, value));
        }
        self.depth -= 1;
        Ok(entries)
    }

    fn read_value(&mut self, key: &str) -> Result<Document> {
        match field_rule(key) {
            FieldRule::Uint32 => Ok(Document::Int(self.cursor.read_u32()? as i64)),
            FieldRule::Uint16 => Ok(Document::Int(self.cursor.read_u16()? as i64)),
            FieldRule::FrameData => self.read_frame_data(),
            FieldRule::Generic => {
                let offset = self.cursor.pos();
                let marker = self.cursor.read_u8()?;
                match Marker::from_u8(marker) {
                    Some(Marker::Uint8) => Ok(Document::String(self.cursor.read_uint8_string()?)),
                    Some(Marker::ObjectStart) => Ok(Document::Object(self.read_object()?)),
                    Some(Marker::ArrayStart) => Ok(Document::Array(self.read_array()?)),
                    _ => Err(Error::malformed(
                        offset,
                        format!("expected value for '{}', found {}", key, describe(marker)),
                    )),
                }
            }
        }
    }

    /// Read elements up to and including the array-end marker.
    fn read_array(&mut self) -> Result<Vec<Document>> {
        self.enter()?;
        let mut items = Vec::new();
        loop {
            let marker = self.cursor.read_u8()?;
            let item = match Marker::from_u8(marker) {
                Some(Marker::ArrayEnd) => break,
                Some(Marker::Uint8) => Document::String(self.cursor.read_uint8_string()?),
                Some(Marker::ObjectStart) => Document::Object(self.read_object()?),
                Some(Marker::ArrayStart) => Document::Array(self.read_array()?),
                _ => Document::Int(marker as i64),
            };
            items.push(item);
        }
        self.depth -= 1;
        Ok(items)
    }

    fn read_frame_data(&mut self) -> Result<Document> {
        let layout = self.state.frame_layout()?;
        let point_bytes = layout.point_bytes();
        debug!(
            points = layout.num_points,
            attributes = layout.attributes.len(),
            point_bytes,
            "decoding frame_data block"
        );

        self.cursor.expect(Marker::ArrayStart)?;
        let capacity = layout.num_points.min(self.cursor.remaining() / point_bytes);
        let mut points = Vec::with_capacity(capacity);
        for _ in 0..layout.num_points {
            points.push(self.read_point(&layout)?);
        }
        self.cursor.expect(Marker::ArrayEnd)?;
        Ok(Document::Array(points))
    }

    fn read_point(&mut self, layout: &FrameLayout) -> Result<Document> {
        self.cursor.expect(Marker::ArrayStart)?;
        let mut attributes = Vec::with_capacity(layout.attributes.len());
        for slot in &layout.attributes {
            let mut components = Vec::with_capacity(slot.size.min(self.cursor.remaining() / 4));
            for _ in 0..slot.size {
                let value = match slot.kind {
                    AttributeKind::Int32 => Document::Int(self.cursor.read_i32()? as i64),
                    AttributeKind::Float32 => Document::Float(self.cursor.read_f32()?),
                };
                components.push(value);
            }
            attributes.push(Document::Array(components));
        }
        self.cursor.expect(Marker::ArrayEnd)?;
        Ok(Document::Array(attributes))
    }
}
