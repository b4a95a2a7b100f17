//! Typed point-cache view.
//!
//! Producers hand the codec a generic [`Document`]; this module gives that
//! document a checked shape. [`PointCache::to_document`] always emits header
//! fields before any `frame_data`, which the binary form depends on.

use crate::document::Document;
use crate::format::{int_in_range, AttributeKind, SchemaField, SchemaState, FRAME_DATA};
use crate::util::{Error, Result};

/// Header format version written by default.
pub const DEFAULT_VERSION: &str = "1.0";

/// Default `data_type` value (interpolation mode of the cache).
pub const DEFAULT_DATA_TYPE: &str = "linear";

/// One declared per-point attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    /// Number of scalar components (1 for scalars, 3 for vectors).
    pub size: u32,
    pub kind: AttributeKind,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, size: u32, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            size,
            kind,
        }
    }
}

/// Cache header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: String,
    pub num_samples: u32,
    pub num_frames: u32,
    pub num_points: u32,
    pub attributes: Vec<AttributeDef>,
    pub data_type: String,
}

impl Header {
    /// Create a header with default version and data type and no attributes.
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            num_samples: 0,
            num_frames: 0,
            num_points: 0,
            attributes: Vec::new(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
        }
    }

    /// Number of attributes.
    pub fn num_attrib(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Build the header object in schema order.
    pub fn to_document(&self) -> Result<Document> {
        let num_attrib = u16::try_from(self.attributes.len()).map_err(|_| {
            Error::schema(format!(
                "{} attributes exceed the u16 count",
                self.attributes.len()
            ))
        })?;
        Ok(Document::builder()
            .with("version", self.version.as_str())
            .with("num_samples", self.num_samples)
            .with("num_frames", self.num_frames)
            .with("num_points", self.num_points)
            .with("num_attrib", num_attrib)
            .with(
                "attrib_name",
                self.attributes.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
            )
            .with("attrib_size", self.attributes.iter().map(|a| a.size).collect::<Vec<_>>())
            .with(
                "attrib_data_type",
                self.attributes.iter().map(|a| a.kind.tag()).collect::<Vec<_>>(),
            )
            .with("data_type", self.data_type.as_str())
            .build())
    }

    /// Read a header object. All schema fields are required.
    pub fn from_document(doc: &Document) -> Result<Self> {
        let entries = doc
            .as_entries()
            .ok_or_else(|| Error::schema("header must be an object"))?;

        let mut state = SchemaState::new();
        for (key, value) in entries {
            if let Some(field) = SchemaField::from_key(key) {
                state.record(field, value)?;
            }
        }

        let layout = state.frame_layout()?;
        let names = state
            .attrib_name
            .clone()
            .ok_or_else(|| Error::schema("header is missing attrib_name"))?;
        let attributes = names
            .into_iter()
            .zip(&layout.attributes)
            .map(|(name, slot)| AttributeDef::new(name, slot.size as u32, slot.kind))
            .collect();

        Ok(Self {
            version: string_field(doc, "version")?,
            num_samples: state
                .num_samples
                .ok_or_else(|| Error::schema("header is missing num_samples"))?,
            num_frames: state
                .num_frames
                .ok_or_else(|| Error::schema("header is missing num_frames"))?,
            num_points: layout.num_points as u32,
            attributes,
            data_type: string_field(doc, "data_type")?,
        })
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// Components of one attribute of one point.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValues {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

impl AttributeValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Int(_) => AttributeKind::Int32,
            Self::Float(_) => AttributeKind::Float32,
        }
    }

    fn to_document(&self) -> Document {
        match self {
            Self::Int(v) => v.clone().into(),
            Self::Float(v) => v.clone().into(),
        }
    }

    fn from_document(doc: &Document, kind: AttributeKind) -> Result<Self> {
        let items = doc
            .as_array()
            .ok_or_else(|| {
                Error::schema(format!("attribute must be an array, got {}", doc.kind()))
            })?;
        match kind {
            AttributeKind::Int32 => items
                .iter()
                .map(|c| {
                    int_in_range("component", c, i32::MIN as i64, i32::MAX as i64)
                        .map(|v| v as i32)
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Int),
            AttributeKind::Float32 => items
                .iter()
                .map(|c| {
                    c.as_float().ok_or_else(|| {
                        Error::schema(format!("expected float component, got {}", c.kind()))
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Float),
        }
    }
}

/// All attributes of one point, in header order.
pub type Point = Vec<AttributeValues>;

/// One cached frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub number: u32,
    pub time: u32,
    pub points: Vec<Point>,
}

impl Frame {
    pub fn new(number: u32, time: u32) -> Self {
        Self {
            number,
            time,
            points: Vec::new(),
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    fn to_document(&self) -> Result<Document> {
        let num_points = u32::try_from(self.points.len())
            .map_err(|_| Error::schema("frame holds more than u32::MAX points"))?;
        let frame_data: Vec<Document> = self
            .points
            .iter()
            .map(|p| Document::Array(p.iter().map(AttributeValues::to_document).collect()))
            .collect();
        Ok(Document::builder()
            .with("number", self.number)
            .with("time", self.time)
            .with("num_points", num_points)
            .with(FRAME_DATA, frame_data)
            .build())
    }

    fn from_document(doc: &Document, header: &Header) -> Result<Self> {
        let number = u32_field(doc, "number")?;
        let time = u32_field(doc, "time")?;
        let num_points = u32_field(doc, "num_points")? as usize;
        let data = doc
            .get(FRAME_DATA)
            .and_then(Document::as_array)
            .ok_or_else(|| Error::schema(format!("frame {} is missing frame_data", number)))?;
        if data.len() != num_points {
            return Err(Error::schema(format!(
                "frame {} declares {} points but holds {}",
                number,
                num_points,
                data.len()
            )));
        }

        let points = data
            .iter()
            .map(|point| {
                let attrs = point
                    .as_array()
                    .ok_or_else(|| {
                        Error::schema(format!("frame {} has a non-array point", number))
                    })?;
                if attrs.len() != header.num_attrib() {
                    return Err(Error::schema(format!(
                        "frame {} point has {} attributes, header declares {}",
                        number,
                        attrs.len(),
                        header.num_attrib()
                    )));
                }
                attrs
                    .iter()
                    .zip(&header.attributes)
                    .map(|(a, def)| AttributeValues::from_document(a, def.kind))
                    .collect::<Result<Point>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { number, time, points })
    }
}

/// Header plus frames.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCache {
    pub header: Header,
    pub frames: Vec<Frame>,
}

impl PointCache {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            frames: Vec::new(),
        }
    }

    /// Check every frame against the declared attributes.
    pub fn validate(&self) -> Result<()> {
        let defs = &self.header.attributes;
        for frame in &self.frames {
            for (p, point) in frame.points.iter().enumerate() {
                if point.len() != defs.len() {
                    return Err(Error::schema(format!(
                        "frame {} point {} has {} attributes, header declares {}",
                        frame.number,
                        p,
                        point.len(),
                        defs.len()
                    )));
                }
                for (values, def) in point.iter().zip(defs) {
                    if values.kind() != def.kind || values.len() != def.size as usize {
                        return Err(Error::schema(format!(
                            "frame {} point {} attribute '{}' is {} x {}, header declares {} x {}",
                            frame.number,
                            p,
                            def.name,
                            values.len(),
                            values.kind().name(),
                            def.size,
                            def.kind.name()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Build the generic document: `{"header": .., "cache_data": {"frames": [..]}}`.
    pub fn to_document(&self) -> Result<Document> {
        self.validate()?;
        let frames = self
            .frames
            .iter()
            .map(Frame::to_document)
            .collect::<Result<Vec<_>>>()?;
        Ok(Document::builder()
            .with("header", self.header.to_document()?)
            .with("cache_data", Document::builder().with("frames", frames))
            .build())
    }

    /// Read and validate a document in the layout produced by [`to_document`](Self::to_document).
    pub fn from_document(doc: &Document) -> Result<Self> {
        let header = Header::from_document(
            doc.get("header")
                .ok_or_else(|| Error::schema("document is missing header"))?,
        )?;
        let frames = doc
            .get("cache_data")
            .and_then(|c| c.get("frames"))
            .and_then(Document::as_array)
            .ok_or_else(|| Error::schema("document is missing cache_data.frames"))?
            .iter()
            .map(|f| Frame::from_document(f, &header))
            .collect::<Result<Vec<_>>>()?;

        let cache = Self { header, frames };
        cache.validate()?;
        Ok(cache)
    }
}

fn string_field(doc: &Document, key: &str) -> Result<String> {
    doc.get(key)
        .and_then(Document::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::schema(format!("missing string field {}", key)))
}

fn u32_field(doc: &Document, key: &str) -> Result<u32> {
    let value = doc
        .get(key)
        .ok_or_else(|| Error::schema(format!("missing field {}", key)))?;
    int_in_range(key, value, 0, u32::MAX as i64).map(|v| v as u32)
}
