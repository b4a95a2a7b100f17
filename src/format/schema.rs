//! Running schema context for one encode or decode call.
//!
//! `frame_data` carries neither lengths nor types. Both directions remember
//! the header fields as they pass them and derive the frame layout from what
//! has been seen so far, so field order in the document is significant.

use tracing::trace;

use super::fields::SchemaField;
use super::marker::Marker;
use crate::document::Document;
use crate::util::{Error, Result};

/// Numeric kind of one attribute's components.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Int32,
    Float32,
}

impl AttributeKind {
    /// Map an `attrib_data_type` entry to a kind.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match Marker::from_u8(tag) {
            Some(Marker::Int32) => Ok(Self::Int32),
            Some(Marker::Float32) => Ok(Self::Float32),
            _ => Err(Error::schema(format!(
                "unrecognized attribute type tag {} (expected {} or {})",
                tag,
                Marker::Int32.code(),
                Marker::Float32.code()
            ))),
        }
    }

    /// Tag byte stored in `attrib_data_type`.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Int32 => Marker::Int32.code(),
            Self::Float32 => Marker::Float32.code(),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Float32 => "float32",
        }
    }
}

/// Size and kind of one attribute slot of a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeLayout {
    pub size: usize,
    pub kind: AttributeKind,
}

/// Everything needed to walk a `frame_data` block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameLayout {
    pub num_points: usize,
    pub attributes: Vec<AttributeLayout>,
}

impl FrameLayout {
    /// Encoded size of one point, including its two markers.
    pub fn point_bytes(&self) -> usize {
        self.attributes
            .iter()
            .fold(2, |acc, a| acc.saturating_add(a.size.saturating_mul(4)))
    }
}

/// Header fields seen so far in the current call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaState {
    pub num_samples: Option<u32>,
    pub num_frames: Option<u32>,
    pub num_points: Option<u32>,
    pub num_attrib: Option<u16>,
    pub attrib_name: Option<Vec<String>>,
    pub attrib_size: Option<Vec<u32>>,
    pub attrib_data_type: Option<Vec<u8>>,
}

impl SchemaState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a tracked field's value.
    pub fn record(&mut self, field: SchemaField, value: &Document) -> Result<()> {
        let key = field.key();
        match field {
            SchemaField::NumSamples => self.num_samples = Some(count_u32(key, value)?),
            SchemaField::NumFrames => self.num_frames = Some(count_u32(key, value)?),
            SchemaField::NumPoints => self.num_points = Some(count_u32(key, value)?),
            SchemaField::NumAttrib => {
                let v = int_in_range(key, value, 0, u16::MAX as i64)?;
                self.num_attrib = Some(v as u16);
            }
            SchemaField::AttribName => {
                let names = array_of(key, value)?
                    .iter()
                    .map(|item| {
                        item.as_str().map(str::to_string).ok_or_else(|| {
                            Error::schema(format!("{} entries must be strings", key))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.attrib_name = Some(names);
            }
            SchemaField::AttribSize => {
                let sizes = array_of(key, value)?
                    .iter()
                    .map(|item| int_in_range(key, item, 0, u32::MAX as i64).map(|v| v as u32))
                    .collect::<Result<Vec<_>>>()?;
                self.attrib_size = Some(sizes);
            }
            SchemaField::AttribDataType => {
                let tags = array_of(key, value)?
                    .iter()
                    .map(|item| int_in_range(key, item, 0, u8::MAX as i64).map(|v| v as u8))
                    .collect::<Result<Vec<_>>>()?;
                self.attrib_data_type = Some(tags);
            }
        }
        trace!(field = key, "schema field cached");
        self.check_tables()
    }

    /// Check every per-attribute table seen so far against `num_attrib`.
    fn check_tables(&self) -> Result<()> {
        let Some(num_attrib) = self.num_attrib.map(usize::from) else {
            return Ok(());
        };
        let tables = [
            ("attrib_name", self.attrib_name.as_ref().map(Vec::len)),
            ("attrib_size", self.attrib_size.as_ref().map(Vec::len)),
            ("attrib_data_type", self.attrib_data_type.as_ref().map(Vec::len)),
        ];
        for (key, len) in tables {
            if let Some(len) = len {
                check_len(key, len, num_attrib)?;
            }
        }
        Ok(())
    }

    /// Derive the frame layout, checking that every prerequisite was seen
    /// and that the per-attribute tables agree with `num_attrib`.
    pub fn frame_layout(&self) -> Result<FrameLayout> {
        let num_points = self.num_points.ok_or_else(|| missing("num_points"))?;
        let num_attrib = self.num_attrib.ok_or_else(|| missing("num_attrib"))? as usize;
        let sizes = self.attrib_size.as_ref().ok_or_else(|| missing("attrib_size"))?;
        let tags = self
            .attrib_data_type
            .as_ref()
            .ok_or_else(|| missing("attrib_data_type"))?;

        check_len("attrib_size", sizes.len(), num_attrib)?;
        check_len("attrib_data_type", tags.len(), num_attrib)?;
        if let Some(names) = &self.attrib_name {
            check_len("attrib_name", names.len(), num_attrib)?;
        }

        let attributes = sizes
            .iter()
            .zip(tags)
            .map(|(&size, &tag)| {
                Ok(AttributeLayout {
                    size: size as usize,
                    kind: AttributeKind::from_tag(tag)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FrameLayout {
            num_points: num_points as usize,
            attributes,
        })
    }
}

fn missing(key: &str) -> Error {
    Error::schema(format!("{} must appear before frame_data", key))
}

fn check_len(key: &str, len: usize, num_attrib: usize) -> Result<()> {
    if len != num_attrib {
        return Err(Error::schema(format!(
            "{} has {} entries but num_attrib is {}",
            key, len, num_attrib
        )));
    }
    Ok(())
}

fn array_of<'a>(key: &str, value: &'a Document) -> Result<&'a [Document]> {
    value
        .as_array()
        .ok_or_else(|| Error::schema(format!("{} must be an array, got {}", key, value.kind())))
}

fn count_u32(key: &str, value: &Document) -> Result<u32> {
    int_in_range(key, value, 0, u32::MAX as i64).map(|v| v as u32)
}

/// Extract an integer and check it lies in `min..=max`.
pub(crate) fn int_in_range(key: &str, value: &Document, min: i64, max: i64) -> Result<i64> {
    let v = value
        .as_int()
        .ok_or_else(|| Error::schema(format!("{} must be an integer, got {}", key, value.kind())))?;
    if v < min || v > max {
        return Err(Error::schema(format!(
            "{} value {} out of range {}..={}",
            key, v, min, max
        )));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> SchemaState {
        let mut state = SchemaState::new();
        state.record(SchemaField::NumPoints, &Document::Int(2)).unwrap();
        state.record(SchemaField::NumAttrib, &Document::Int(2)).unwrap();
        state
            .record(SchemaField::AttribName, &vec!["id", "P"].into())
            .unwrap();
        state
            .record(SchemaField::AttribSize, &vec![1, 3].into())
            .unwrap();
        state
            .record(SchemaField::AttribDataType, &vec![108, 102].into())
            .unwrap();
        state
    }

    #[test]
    fn test_frame_layout() {
        let layout = populated().frame_layout().unwrap();
        assert_eq!(layout.num_points, 2);
        assert_eq!(
            layout.attributes,
            vec![
                AttributeLayout { size: 1, kind: AttributeKind::Int32 },
                AttributeLayout { size: 3, kind: AttributeKind::Float32 },
            ]
        );
        assert_eq!(layout.point_bytes(), 18);
    }

    #[test]
    fn test_missing_prerequisite() {
        let mut state = populated();
        state.attrib_data_type = None;
        let err = state.frame_layout().unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_data_type")));
    }

    #[test]
    fn test_length_mismatch() {
        let mut state = populated();
        let err = state.record(SchemaField::AttribSize, &vec![1].into()).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_size")));

        let mut state = populated();
        let err = state
            .record(SchemaField::AttribName, &vec!["only"].into())
            .unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_name")));
    }

    #[test]
    fn test_tables_checked_when_num_attrib_arrives_late() {
        let mut state = SchemaState::new();
        state.record(SchemaField::AttribSize, &vec![1, 3, 5].into()).unwrap();
        state.record(SchemaField::AttribName, &vec!["a"].into()).unwrap();
        let err = state.record(SchemaField::NumAttrib, &Document::Int(1)).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(ref m) if m.contains("attrib_size")));
    }

    #[test]
    fn test_frame_layout_rechecks_lengths() {
        let mut state = populated();
        state.attrib_size = Some(vec![1]);
        assert!(matches!(state.frame_layout(), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_unknown_tag() {
        let mut state = populated();
        state
            .record(SchemaField::AttribDataType, &vec![108, b'd' as i32].into())
            .unwrap();
        assert!(matches!(state.frame_layout(), Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_record_rejects_bad_values() {
        let mut state = SchemaState::new();
        assert!(state.record(SchemaField::NumAttrib, &Document::Int(70000)).is_err());
        assert!(state.record(SchemaField::NumPoints, &Document::Int(-1)).is_err());
        assert!(state.record(SchemaField::NumPoints, &"3".into()).is_err());
        assert!(state
            .record(SchemaField::AttribName, &vec![1, 2].into())
            .is_err());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(AttributeKind::from_tag(108).unwrap(), AttributeKind::Int32);
        assert_eq!(AttributeKind::from_tag(102).unwrap(), AttributeKind::Float32);
        assert_eq!(AttributeKind::Float32.tag(), b'f');
        assert!(AttributeKind::from_tag(b'L').is_err());
    }
}
