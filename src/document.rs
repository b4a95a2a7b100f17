//! Generic document tree exchanged between the binary and textual forms.

use std::fmt;

/// Ordered key/value entries of an object. Insertion order is preserved.
pub type Entries = Vec<(String, Document)>;

/// A node of the document tree.
///
/// Integers are stored widened to `i64` so unsigned 32-bit counts and signed
/// 32-bit attribute components share one variant; the codec checks the range
/// required by each position when it writes. Floats are `f32`, the only
/// floating width the binary form carries.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Object(Entries),
    Array(Vec<Document>),
    String(String),
    Int(i64),
    Float(f32),
}

/// Accumulates object entries in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectBuilder {
    entries: Entries,
}

impl ObjectBuilder {
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Document>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Document>) -> Self {
        self.push(key, value);
        self
    }

    pub fn build(self) -> Document {
        Document::Object(self.entries)
    }
}

impl From<ObjectBuilder> for Document {
    fn from(builder: ObjectBuilder) -> Self {
        builder.build()
    }
}

impl Document {
    /// Start building an object.
    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::default()
    }

    /// Look up the first entry with `key` in an object.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_entries(&self) -> Option<&Entries> {
        match self {
            Self::Object(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Document]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Short variant name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
        }
    }
}

impl fmt::Display for Document {
    /// Scalar text used when a value is stringified into the binary form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Object(entries) => write!(f, "<object with {} keys>", entries.len()),
            Self::Array(items) => write!(f, "<array of {}>", items.len()),
        }
    }
}

impl From<&str> for Document {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Document {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i32> for Document {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u8> for Document {
    fn from(v: u8) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u16> for Document {
    fn from(v: u16) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u32> for Document {
    fn from(v: u32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Document {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Document {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl<T: Into<Document>> From<Vec<T>> for Document {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keeps_order() {
        let doc = Document::builder()
            .with("zeta", 1)
            .with("alpha", "a")
            .with("mid", 2.5f32)
            .build();
        let keys: Vec<&str> = doc
            .as_entries()
            .map(|e| e.iter().map(|(k, _)| k.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(doc.get("alpha").and_then(Document::as_str), Some("a"));
        assert_eq!(doc.get("missing"), None);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Document::from("1.0").to_string(), "1.0");
        assert_eq!(Document::Int(-3).to_string(), "-3");
        assert_eq!(Document::Float(1.0).to_string(), "1.0");
        assert_eq!(Document::Float(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_builder_push_and_nesting() {
        let mut inner = Document::builder();
        inner.push("k", 1);
        let doc = Document::builder().with("inner", inner).build();
        assert_eq!(
            doc,
            Document::Object(vec![(
                "inner".to_string(),
                Document::Object(vec![("k".to_string(), Document::Int(1))])
            )])
        );
    }

    #[test]
    fn test_from_vec() {
        let doc: Document = vec![1.0f32, 2.0].into();
        assert_eq!(doc.as_array().map(<[Document]>::len), Some(2));
        assert_eq!(doc.kind(), "array");
    }
}
