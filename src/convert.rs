//! File-level conversion between `.json` and `.hbjson`.
//!
//! The direction is chosen by the input extension and the output is the
//! sibling path with the other extension. Output is fully rendered in memory
//! before the file is created.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::codec::{decode, encode};
use crate::text;
use crate::util::{Error, Result};

/// Extension of the textual form.
pub const JSON_EXT: &str = "json";

/// Extension of the binary form.
pub const HBJSON_EXT: &str = "hbjson";

/// Which way a file is converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// `.json` to `.hbjson`
    Encode,
    /// `.hbjson` to `.json`
    Decode,
}

impl Direction {
    /// Pick a direction from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(JSON_EXT) => Ok(Self::Encode),
            Some(HBJSON_EXT) => Ok(Self::Decode),
            Some(other) => Err(Error::UnsupportedExtension(format!(".{}", other))),
            None => Err(Error::UnsupportedExtension(String::new())),
        }
    }

    /// Extension of the file this direction produces.
    pub fn output_ext(self) -> &'static str {
        match self {
            Self::Encode => HBJSON_EXT,
            Self::Decode => JSON_EXT,
        }
    }
}

/// Sibling output path: same base name, extension swapped.
pub fn output_path(input: &Path) -> Result<PathBuf> {
    let direction = Direction::from_path(input)?;
    Ok(input.with_extension(direction.output_ext()))
}

/// Outcome of one successful conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub direction: Direction,
    /// Bytes written to `output`.
    pub bytes: usize,
}

/// Whole input file, memory-mapped when possible.
pub enum InputBuffer {
    #[cfg(feature = "mmap")]
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl InputBuffer {
    /// Read a file, mapping it with `mmap` when the feature is enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Read a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();

        #[cfg(feature = "mmap")]
        if use_mmap && size > 0 {
            // Safety: the file is opened read-only and the map lives only for one conversion
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            return Ok(Self::Mapped(mmap));
        }
        #[cfg(not(feature = "mmap"))]
        let _ = use_mmap;

        let mut buf = Vec::with_capacity(size as usize);
        file.read_to_end(&mut buf)?;
        Ok(Self::Owned(buf))
    }
}

impl Deref for InputBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            #[cfg(feature = "mmap")]
            Self::Mapped(m) => &m[..],
            Self::Owned(v) => v.as_slice(),
        }
    }
}

/// Convert bytes in memory according to `direction`.
pub fn convert_bytes(input: &[u8], direction: Direction) -> Result<Vec<u8>> {
    match direction {
        Direction::Encode => encode(&text::parse(input)?),
        Direction::Decode => text::to_pretty(&decode(input)?),
    }
}

/// Convert one file to its sibling in the other form.
pub fn convert_file(input: impl AsRef<Path>) -> Result<Conversion> {
    let input = input.as_ref();
    let _span = info_span!("convert", input = %input.display()).entered();

    let direction = Direction::from_path(input)?;
    let output = input.with_extension(direction.output_ext());

    let data = InputBuffer::open(input)?;
    debug!(bytes = data.len(), ?direction, "read input");
    let rendered = convert_bytes(&data, direction)?;
    drop(data);

    let mut writer = BufWriter::new(File::create(&output)?);
    writer.write_all(&rendered)?;
    writer.flush()?;

    info!(output = %output.display(), bytes = rendered.len(), "converted");
    Ok(Conversion {
        input: input.to_path_buf(),
        output,
        direction,
        bytes: rendered.len(),
    })
}

/// Convert many independent files in parallel. Results keep input order.
pub fn convert_all<P: AsRef<Path> + Sync>(inputs: &[P]) -> Vec<Result<Conversion>> {
    inputs.par_iter().map(convert_file).collect()
}
