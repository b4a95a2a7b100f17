//! Binary encoder and decoder.
//!
//! The two directions share only the [`format`](crate::format) tables; each
//! call owns its buffer, cursor and schema state.

mod cursor;
mod decoder;
mod encoder;

pub use cursor::ByteCursor;
pub use decoder::{decode, Decoder};
pub use encoder::{encode, Encoder};
