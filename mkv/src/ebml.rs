//! EBML primitive readers.
//!
//! EBML numbers ("vints") use a leading-1 length marker: the number of zero
//! bits before the first set bit of the first byte gives the total width.
//!
//! ```text
//! 1xxx xxxx                      1 byte,  7 value bits
//! 01xx xxxx xxxx xxxx            2 bytes, 14 value bits
//! ...
//! 0000 0001 xxxx xxxx ...        8 bytes, 56 value bits
//! ```
//!
//! Element IDs keep the marker bit; element lengths have it masked out, and a
//! length with every value bit set means "unknown".

use std::io::{Read, Seek, SeekFrom};

use crate::error::{MkvError, Result};

/// Sentinel returned by [`read_length`] for streamed / indeterminate masters.
pub const UNKNOWN_LENGTH: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// Widest element ID accepted, in bytes.
pub const MAX_ID_BYTES: usize = 4;

/// Widest element length accepted, in bytes.
pub const MAX_LENGTH_BYTES: usize = 8;

/// An opaque binary element value.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Binary {
    length: usize,
    /// Absolute byte offset of the payload in the source stream.
    position: u64,
    #[serde(skip)]
    data: Vec<u8>,
}

impl Binary {
    pub fn new(data: Vec<u8>, position: u64) -> Self {
        Self {
            length: data.len(),
            position,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Replace the payload, keeping the recorded source offset.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.length = data.len();
        self.data = data;
    }

    pub fn clear(&mut self) {
        self.set_data(Vec::new());
    }
}

fn read_exact_at<R: Read>(reader: &mut R, buf: &mut [u8], offset: u64) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => MkvError::Eof { offset },
        _ => MkvError::Io(e),
    })
}

/// Read an EBML variable-length number of at most `max_bytes` bytes.
///
/// Returns the value with the marker bit removed and the number of bytes consumed.
pub fn read_vint<R: Read + Seek>(reader: &mut R, max_bytes: usize) -> Result<(u64, usize)> {
    let offset = reader.stream_position()?;

    let mut first = [0u8; 1];
    read_exact_at(reader, &mut first, offset)?;
    let first = first[0];

    // A zero leading byte can't encode any width; also doubles as the EOF
    // marker for zero-padded tails.
    if first == 0 {
        return Err(MkvError::MalformedVint {
            offset,
            reason: "leading byte is zero",
        });
    }

    let width = first.leading_zeros() as usize + 1;
    if width > max_bytes {
        return Err(MkvError::MalformedVint {
            offset,
            reason: "wider than allowed for this field",
        });
    }

    let mut value = u64::from(first) & (0xFFu64 >> width);
    let mut rest = [0u8; 7];
    let rest = &mut rest[..width - 1];
    read_exact_at(reader, rest, offset)?;
    for b in rest.iter() {
        value = (value << 8) | u64::from(*b);
    }

    Ok((value, width))
}

/// Read an element ID, restoring the marker bit so the result matches the
/// constants in [`crate::ids`].
pub fn read_id<R: Read + Seek>(reader: &mut R) -> Result<u32> {
    let (value, width) = read_vint(reader, MAX_ID_BYTES)?;
    Ok((value | 1 << (7 * width)) as u32)
}

/// Read an element length. All-ones values of any width map to [`UNKNOWN_LENGTH`].
pub fn read_length<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let (value, width) = read_vint(reader, MAX_LENGTH_BYTES)?;
    if value == (1u64 << (7 * width)) - 1 {
        return Ok(UNKNOWN_LENGTH);
    }
    Ok(value)
}

fn fixed_width<'a>(buf: &'a mut [u8; 8], size: u64, offset: u64) -> Result<&'a mut [u8]> {
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    buf.get_mut(..size).ok_or(MkvError::MalformedVint {
        offset,
        reason: "integer wider than 8 bytes",
    })
}

/// Read a big-endian unsigned integer of `size` (0..=8) bytes.
pub fn read_uint<R: Read + Seek>(reader: &mut R, size: u64) -> Result<u64> {
    let offset = reader.stream_position()?;
    let mut buf = [0u8; 8];
    let bytes = fixed_width(&mut buf, size, offset)?;
    read_exact_at(reader, bytes, offset)?;
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

/// Read a big-endian two's complement integer of `size` (0..=8) bytes.
pub fn read_sint<R: Read + Seek>(reader: &mut R, size: u64) -> Result<i64> {
    let offset = reader.stream_position()?;
    let mut buf = [0u8; 8];
    let bytes = fixed_width(&mut buf, size, offset)?;
    read_exact_at(reader, bytes, offset)?;

    let Some((first, rest)) = bytes.split_first() else {
        return Ok(0);
    };
    // Sign-extend from the first byte
    let mut value = i64::from(*first as i8);
    for b in rest {
        value = (value << 8) | i64::from(*b);
    }
    Ok(value)
}

/// Read an IEEE float element (0, 4 or 8 bytes).
pub fn read_float<R: Read + Seek>(reader: &mut R, size: u64) -> Result<f64> {
    let offset = reader.stream_position()?;
    match size {
        0 => Ok(0.0),
        4 => {
            let mut buf = [0u8; 4];
            read_exact_at(reader, &mut buf, offset)?;
            Ok(f64::from(f32::from_be_bytes(buf)))
        }
        8 => {
            let mut buf = [0u8; 8];
            read_exact_at(reader, &mut buf, offset)?;
            Ok(f64::from_be_bytes(buf))
        }
        _ => Err(MkvError::InvalidFloatSize { offset, size }),
    }
}

/// Read a string element. EBML strings may be NUL-padded; the value ends at
/// the first NUL.
pub fn read_ascii<R: Read + Seek>(reader: &mut R, size: u64) -> Result<String> {
    let bin = read_binary(reader, size)?;
    let data = bin.data();
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    Ok(String::from_utf8_lossy(&data[..end]).into_owned())
}

/// Read `size` bytes of binary payload.
///
/// The buffer grows as data actually arrives, so a corrupt length near the
/// 256 MiB cap can't force a large allocation on a short file.
pub fn read_binary<R: Read + Seek>(reader: &mut R, size: u64) -> Result<Binary> {
    let position = reader.stream_position()?;
    let mut data = Vec::new();
    reader.by_ref().take(size).read_to_end(&mut data)?;
    if data.len() as u64 != size {
        return Err(MkvError::Eof {
            offset: position + data.len() as u64,
        });
    }
    Ok(Binary::new(data, position))
}

/// Skip `size` bytes of payload.
pub fn skip<R: Read + Seek>(reader: &mut R, size: u64) -> Result<()> {
    let offset = reader.stream_position()?;
    let delta = i64::try_from(size).map_err(|_| MkvError::MalformedVint {
        offset,
        reason: "skip length out of range",
    })?;
    reader.seek(SeekFrom::Current(delta))?;
    Ok(())
}

/// Decode an unsigned EBML number from the front of `data`.
///
/// Returns the value and the number of bytes it occupied, or `None` if the
/// slice is too short or starts with a zero byte.
pub fn ebml_num_from_slice(data: &[u8]) -> Option<(u64, usize)> {
    let first = *data.first()?;
    if first == 0 {
        return None;
    }
    let width = first.leading_zeros() as usize + 1;
    let bytes = data.get(..width)?;
    let value = bytes[1..]
        .iter()
        .fold(u64::from(first) & (0xFFu64 >> width), |acc, b| {
            (acc << 8) | u64::from(*b)
        });
    Some((value, width))
}

/// Signed variant of [`ebml_num_from_slice`], as used by EBML lacing: the
/// value is stored with a bias of `2^(7n-1) - 1`.
pub fn ebml_snum_from_slice(data: &[u8]) -> Option<(i64, usize)> {
    let (value, width) = ebml_num_from_slice(data)?;
    let bias = (1i64 << (7 * width - 1)) - 1;
    Some((value as i64 - bias, width))
}
