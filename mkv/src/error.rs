use thiserror::Error;

#[derive(Error, Debug)]
pub enum MkvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected EOF at offset 0x{offset:X}")]
    Eof { offset: u64 },

    #[error("malformed EBML number at offset 0x{offset:X}: {reason}")]
    MalformedVint { offset: u64, reason: &'static str },

    #[error("element 0x{id:X} declares {length} bytes, limit for its type is {max}")]
    SchemaLimitExceeded { id: u32, length: u64, max: u64 },

    #[error("invalid float size {size} at offset 0x{offset:X} (must be 0, 4 or 8)")]
    InvalidFloatSize { offset: u64, size: u64 },

    #[error("cannot skip element 0x{id:X} of unknown length at offset 0x{offset:X}")]
    UnknownLength { id: u32, offset: u64 },

    #[error("element nesting exceeds the maximum depth of {depth}")]
    DepthExceeded { depth: usize },

    #[error("too many top-level elements or circular SeekHead (while adding 0x{id:X})")]
    TooManyTopLevelElements { id: u32 },

    #[error("no recognisable top-level element after offset 0x{offset:X}; file is unrecoverable")]
    Unrecoverable { offset: u64 },

    #[error("schema node 0x{id:X} does not match the field type of its destination record")]
    FieldMismatch { id: u32 },

    #[error("not an EBML document: expected magic 1A 45 DF A3, got {got:02X?}")]
    NotEbml { got: [u8; 4] },

    #[error("unsupported EBML header: {0}")]
    UnsupportedHeader(String),

    #[error("track {track} is invalid: {reason}")]
    TracksInvalid { track: u64, reason: String },
}

impl MkvError {
    /// True for errors that abort the whole open rather than a single element.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MkvError::Unrecoverable { .. }
                | MkvError::NotEbml { .. }
                | MkvError::UnsupportedHeader(_)
                | MkvError::TracksInvalid { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MkvError>;
