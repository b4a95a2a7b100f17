//! Field-name driven encoding rules.
//!
//! The binary form carries no type information for some values: their width
//! and layout are chosen by the key they are stored under. Both directions
//! consult the same table.

/// How a keyed value is laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRule {
    /// Bare unsigned 32-bit little-endian integer, no marker.
    Uint32,
    /// Bare unsigned 16-bit little-endian integer, no marker.
    Uint16,
    /// Schema-driven raw attribute block.
    FrameData,
    /// Marker-dispatched value: string, object or generic array.
    Generic,
}

/// Key of the per-frame attribute payload.
pub const FRAME_DATA: &str = "frame_data";

/// Static rule table. Keys not listed use [`FieldRule::Generic`].
pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    ("num_samples", FieldRule::Uint32),
    ("num_frames", FieldRule::Uint32),
    ("num_points", FieldRule::Uint32),
    ("number", FieldRule::Uint32),
    ("time", FieldRule::Uint32),
    ("num_attrib", FieldRule::Uint16),
    (FRAME_DATA, FieldRule::FrameData),
];

/// Look up the encoding rule for a key.
pub fn field_rule(key: &str) -> FieldRule {
    FIELD_RULES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, rule)| *rule)
        .unwrap_or(FieldRule::Generic)
}

/// Header fields remembered while walking a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaField {
    NumSamples,
    NumFrames,
    NumPoints,
    NumAttrib,
    AttribName,
    AttribSize,
    AttribDataType,
}

impl SchemaField {
    pub const ALL: [SchemaField; 7] = [
        Self::NumSamples,
        Self::NumFrames,
        Self::NumPoints,
        Self::NumAttrib,
        Self::AttribName,
        Self::AttribSize,
        Self::AttribDataType,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::NumSamples => "num_samples",
            Self::NumFrames => "num_frames",
            Self::NumPoints => "num_points",
            Self::NumAttrib => "num_attrib",
            Self::AttribName => "attrib_name",
            Self::AttribSize => "attrib_size",
            Self::AttribDataType => "attrib_data_type",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_rules() {
        for key in ["num_samples", "num_frames", "num_points", "number", "time"] {
            assert_eq!(field_rule(key), FieldRule::Uint32, "{key}");
        }
        assert_eq!(field_rule("num_attrib"), FieldRule::Uint16);
        assert_eq!(field_rule("frame_data"), FieldRule::FrameData);
        assert_eq!(field_rule("version"), FieldRule::Generic);
        assert_eq!(field_rule("attrib_size"), FieldRule::Generic);
    }

    #[test]
    fn test_schema_keys() {
        for field in SchemaField::ALL {
            assert_eq!(SchemaField::from_key(field.key()), Some(field));
        }
        assert_eq!(SchemaField::from_key("number"), None);
        assert_eq!(SchemaField::from_key("frame_data"), None);
    }
}
