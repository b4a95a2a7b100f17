//! Wire-format contract shared by the encoder and decoder.
//!
//! ## Grammar
//!
//! ```text
//! stream     := '{' object '}'
//! object     := ( 'B' len:u8 key:utf8 value )*
//! value      := u32-le            ; num_samples, num_frames, num_points, number, time
//!             | u16-le            ; num_attrib
//!             | frame-data        ; frame_data
//!             | 'B' len:u8 utf8   ; string (other scalars are stringified)
//!             | '{' object '}'
//!             | '[' element* ']'
//! element    := 'B' len:u8 utf8 | '{' object '}' | '[' element* ']' | raw:u8
//! frame-data := '[' ( '[' payload ']' ){num_points} ']'
//! payload    := per attribute i: attrib_size[i] x (i32-le | f32-le)
//! ```

mod fields;
mod marker;
mod schema;

pub use fields::*;
pub use marker::*;
pub use schema::*;

/// Maximum object/array nesting accepted in either direction.
pub const MAX_DEPTH: usize = 128;

/// Longest key or string a one-byte length prefix can describe.
pub const MAX_STRING_LEN: usize = u8::MAX as usize;
