//! Schema-driven parser for the EBML/Matroska container format (`.mkv`, `.webm`).
//!
//! [`reader::MatroskaDemuxer`] is the entry point: it reads the EBML header
//! and Segment metadata, recovers from damaged regions by resyncing on the
//! next top-level element, follows the SeekHead, and summarises the tracks
//! into an [`model::Asset`]. Cues and Clusters are read on demand.

pub mod ebml;
pub mod error;
pub mod ids;
pub mod index;
pub mod level;
pub mod model;
pub mod parser;
pub mod probe;
pub mod reader;
pub mod schema;
pub mod seekhead;
pub mod syntax;
pub mod tracks;
pub mod version;

#[cfg(test)]
mod testutil;

pub use error::{MkvError, Result};
pub use model::Asset;
pub use reader::{MatroskaDemuxer, MatroskaFile, ParseState, open_mkv, parse_mkv};
