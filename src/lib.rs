//! # hbjson
//!
//! Codec for the tagged binary point-cache format (`.hbjson`).
//!
//! The format mirrors a JSON-like document but stores per-point attribute
//! payloads as raw little-endian `int32`/`float32` values. Those payloads
//! carry no lengths or types of their own: their layout comes from the
//! header fields (`num_points`, `num_attrib`, `attrib_size`,
//! `attrib_data_type`) that precede them in the same document.
//!
//! ## Modules
//!
//! - [`util`] - Error types
//! - [`format`] - Marker table, field rules and schema state shared by both directions
//! - [`document`] - Generic document tree
//! - [`codec`] - Binary encoder and decoder
//! - [`text`] - JSON textual form
//! - [`cache`] - Typed header/frame view
//! - [`convert`] - `.json` <-> `.hbjson` file conversion
//!
//! ## Example
//!
//! ```ignore
//! use hbjson::prelude::*;
//!
//! let doc = hbjson::text::parse(br#"{"header": {"version": "1.0"}}"#)?;
//! let bytes = encode(&doc)?;
//! assert_eq!(decode(&bytes)?, doc);
//! ```

pub mod util;
pub mod format;
pub mod document;
pub mod codec;
pub mod text;
pub mod cache;
pub mod convert;

// Re-export commonly used types
pub use util::{Error, Result};
pub use document::{Document, ObjectBuilder};
pub use codec::{decode, encode};
pub use convert::{convert_file, output_path, Direction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::document::{Document, ObjectBuilder};
    pub use crate::codec::{decode, encode, Decoder, Encoder};
    pub use crate::format::{AttributeKind, Marker};
    pub use crate::cache::{AttributeDef, AttributeValues, Frame, Header, PointCache};
    pub use crate::convert::{convert_all, convert_file, output_path, Conversion, Direction};
}
