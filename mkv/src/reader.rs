use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{debug, info, warn};

use crate::error::{MkvError, Result};
use crate::index::{self, IndexEntry};
use crate::level::Level1Element;
use crate::model::{Asset, Cluster, ClusterList, EbmlHeader, Segment, Track};
use crate::parser::{EbmlParser, Status};
use crate::schema;
use crate::syntax::Syntax;
use crate::tracks;

/// First four bytes of every EBML document.
pub const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Used when the Segment has no usable TimecodeScale.
const DEFAULT_TIME_SCALE: u64 = 1_000_000;

/// A reader that transparently handles both plain and gzip-compressed files.
pub enum MkvReader {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for MkvReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            MkvReader::File(r) => r.read(buf),
            MkvReader::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for MkvReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            MkvReader::File(r) => r.seek(pos),
            MkvReader::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a `.mkv`/`.webm` file, or a `.gz`-compressed one, as a seekable reader.
///
/// Gzip input is inflated into memory in full; it is only used for test
/// fixtures, where files are small.
pub fn open_mkv(path: &Path) -> std::io::Result<MkvReader> {
    let is_gz = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    let file = File::open(path)?;
    if is_gz {
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(MkvReader::Memory(Cursor::new(buf)))
    } else {
        Ok(MkvReader::File(BufReader::new(file)))
    }
}

/// Where the demuxer is in opening a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Start,
    HeaderParsed,
    /// Linear Segment parse, including any resyncs.
    SegmentParsing,
    SeekHeadResolved,
    TracksParsed,
    /// Deferred Cues have been read and the index built.
    CuesParsed,
    Ready,
    /// Terminal: no element could be found after a parse failure.
    Unrecoverable,
    /// Terminal: a track could not be set up.
    TracksInvalid,
}

/// Reads the structure of a Matroska/WebM document.
///
/// [`read_header`](Self::read_header) parses everything up to the first
/// Cluster (following the SeekHead for anything stored later) and fills in
/// the asset summary. The index and the Clusters are read on demand.
pub struct MatroskaDemuxer<R> {
    parser: EbmlParser<R>,
    header: EbmlHeader,
    segment: Segment,
    state: ParseState,
    index: Option<Vec<IndexEntry>>,
}

impl<R: Read + Seek> MatroskaDemuxer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            parser: EbmlParser::new(reader),
            header: EbmlHeader::default(),
            segment: Segment::default(),
            state: ParseState::Start,
            index: None,
        }
    }

    pub fn header(&self) -> &EbmlHeader {
        &self.header
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn tracks(&self) -> &[Track] {
        &self.segment.tracks
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Absolute offset of the Segment payload.
    pub fn segment_start(&self) -> u64 {
        self.parser.segment_start()
    }

    /// True if SeekHead or Cues resolution failed; the index may be incomplete.
    pub fn is_index_broken(&self) -> bool {
        self.parser.is_index_broken()
    }

    pub fn top_level_elements(&self) -> Vec<Level1Element> {
        self.parser.level1().iter().copied().collect()
    }

    pub fn into_inner(self) -> R {
        self.parser.into_inner()
    }

    fn set_state(&mut self, next: ParseState) {
        debug!("state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn is_ready(&self) -> bool {
        matches!(self.state, ParseState::Ready | ParseState::CuesParsed)
    }

    /// Parse the EBML header and the Segment's top-level metadata, then
    /// summarise the tracks into `asset`.
    ///
    /// Parse failures inside the Segment are recovered from by scanning
    /// forward for the next top-level element. Only a failure to find one,
    /// a bad header or an unusable track is returned as an error.
    pub fn read_header(&mut self, asset: &mut Asset) -> Result<()> {
        if self.state != ParseState::Start {
            warn!("header already read (state {:?})", self.state);
            return Ok(());
        }

        self.read_ebml_header()?;
        self.set_state(ParseState::HeaderParsed);

        self.set_state(ParseState::SegmentParsing);
        if let Err(e) = self.read_segment() {
            if e.is_fatal() {
                self.set_state(ParseState::Unrecoverable);
            }
            return Err(e);
        }

        self.parser.execute_seekhead(&mut self.segment);
        self.set_state(ParseState::SeekHeadResolved);

        if self.segment.info.time_scale == 0 {
            self.segment.info.time_scale = DEFAULT_TIME_SCALE;
        }

        if let Err(e) = tracks::aggregate(&mut self.segment.tracks, asset) {
            warn!("{e}");
            self.set_state(ParseState::TracksInvalid);
            return Err(e);
        }
        self.set_state(ParseState::TracksParsed);

        info!(
            "{} track(s), {} cue point(s), segment at 0x{:X}",
            self.segment.tracks.len(),
            self.segment.cues.len(),
            self.segment_start()
        );
        self.set_state(ParseState::Ready);
        Ok(())
    }

    fn read_ebml_header(&mut self) -> Result<()> {
        self.parser.seek(0)?;
        let mut magic = [0u8; 4];
        if let Err(e) = self.parser.reader.read_exact(&mut magic) {
            if e.kind() != std::io::ErrorKind::UnexpectedEof {
                return Err(e.into());
            }
        }
        if magic != EBML_MAGIC {
            return Err(MkvError::NotEbml { got: magic });
        }
        self.parser.seek(0)?;

        self.parser.parse(&schema::EBML, &mut self.header)?;

        let h = &self.header;
        if h.version > 1 {
            return Err(MkvError::UnsupportedHeader(format!(
                "EBML read version {} (only 1 is supported)",
                h.version
            )));
        }
        if h.max_size > 8 {
            return Err(MkvError::UnsupportedHeader(format!(
                "EBML max size length {} (at most 8 is supported)",
                h.max_size
            )));
        }
        if h.id_length > 4 {
            return Err(MkvError::UnsupportedHeader(format!(
                "EBML max ID length {} (at most 4 is supported)",
                h.id_length
            )));
        }

        match h.doctype.as_deref() {
            Some("matroska") | Some("webm") => {}
            other => warn!(
                "unknown doctype {:?}, parsing as matroska",
                other.unwrap_or_default()
            ),
        }
        debug!(
            "EBML header: doctype {:?} version {}",
            h.doctype.as_deref().unwrap_or_default(),
            h.doctype_version
        );
        Ok(())
    }

    /// Parse top-level Segment elements until the first Cluster or the end
    /// of the stream, resyncing after every failure.
    ///
    /// Elements ahead of the Segment (Void, CRC-32) are skipped. A resync
    /// always lands inside the Segment.
    fn read_segment(&mut self) -> Result<()> {
        let mut resynced = false;
        loop {
            let in_segment = resynced || self.parser.segment_start() != 0;
            let table: &'static [Syntax] = if in_segment {
                &schema::SEGMENT
            } else {
                &schema::SEGMENTS
            };
            let pos = self.parser.position()?;
            match self.parser.parse(table, &mut self.segment) {
                Ok(Status::Stop) => break,
                Ok(Status::Continue) => {}
                Err(e) => {
                    warn!("parse error after 0x{pos:X}: {e}; resyncing");
                    self.parser.resync(pos)?;
                    resynced = true;
                }
            }
        }
        Ok(())
    }

    /// The seek index, parsing deferred Cues the first time it is asked for.
    ///
    /// Empty until [`read_header`](Self::read_header) has succeeded.
    pub fn index(&mut self) -> Result<&[IndexEntry]> {
        if !self.is_ready() {
            return Ok(&[]);
        }

        if self.index.is_none() {
            self.parser.parse_cues(&mut self.segment);
            let entries = index::build_index(&self.segment, self.parser.segment_start());
            self.set_state(ParseState::CuesParsed);
            self.index = Some(entries);
            self.set_state(ParseState::Ready);
        }

        Ok(self.index.as_deref().unwrap_or_default())
    }

    /// Read the next Cluster in file order.
    ///
    /// Returns `None` at the end of the stream, or when no further top-level
    /// element can be found after a damaged Cluster.
    pub fn next_cluster(&mut self) -> Result<Option<Cluster>> {
        if !self.is_ready() {
            return Ok(None);
        }

        let mut list = ClusterList::default();
        loop {
            let pos = self.parser.position()?;
            let depth = self.parser.depth();
            match self.parser.parse(&schema::CLUSTERS, &mut list) {
                Ok(status) => {
                    // Only the end of the stream stops a Cluster; drop any
                    // unknown-length level it left open.
                    if status == Status::Stop {
                        self.parser.levels.truncate(depth);
                    }
                    if let Some(cluster) = list.clusters.pop() {
                        return Ok(Some(cluster));
                    }
                    if status == Status::Stop {
                        return Ok(None);
                    }
                }
                Err(e) => {
                    warn!("damaged cluster after 0x{pos:X}: {e}; resyncing");
                    list.clusters.clear();
                    match self.parser.resync(pos) {
                        Ok(()) => {}
                        Err(MkvError::Unrecoverable { .. }) => return Ok(None),
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }
}

/// Everything known about a file after opening it.
#[derive(Debug, Clone, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct MatroskaFile {
    pub header: EbmlHeader,
    pub segment: Segment,
    pub asset: Asset,
    pub index: Vec<IndexEntry>,
    pub top_level: Vec<Level1Element>,
    pub index_broken: bool,
}

/// Parse a Matroska/WebM file's header, metadata and index.
pub fn parse_mkv<R: Read + Seek>(reader: &mut R) -> Result<MatroskaFile> {
    let mut demuxer = MatroskaDemuxer::new(reader);
    let mut asset = Asset::default();
    demuxer.read_header(&mut asset)?;
    let index = demuxer.index()?.to_vec();

    Ok(MatroskaFile {
        header: demuxer.header.clone(),
        top_level: demuxer.top_level_elements(),
        index_broken: demuxer.is_index_broken(),
        segment: demuxer.segment,
        asset,
        index,
    })
}
