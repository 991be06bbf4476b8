//! Parsed Matroska records.
//!
//! Records start zeroed (`Default`); schema defaults are only applied when
//! the corresponding master element is actually present in the file. A track
//! without a `Video` element therefore keeps an all-zero `video` record.

use crate::ebml::{Binary, ebml_num_from_slice, ebml_snum_from_slice};
use crate::syntax::{Field, Record, Slot};

/// Track type codes.
pub const TRACK_TYPE_VIDEO: u64 = 0x1;
pub const TRACK_TYPE_AUDIO: u64 = 0x2;
pub const TRACK_TYPE_COMPLEX: u64 = 0x3;
pub const TRACK_TYPE_LOGO: u64 = 0x10;
pub const TRACK_TYPE_SUBTITLE: u64 = 0x11;
pub const TRACK_TYPE_CONTROL: u64 = 0x20;
pub const TRACK_TYPE_METADATA: u64 = 0x21;

/// ContentCompAlgo value for header stripping.
pub const COMP_HEADER_STRIP: u64 = 3;

/// Value of unset chapter start/end times.
pub const NO_TIMESTAMP: u64 = 0x8000_0000_0000_0000;

pub fn track_type_name(track_type: u64) -> &'static str {
    match track_type {
        TRACK_TYPE_VIDEO => "video",
        TRACK_TYPE_AUDIO => "audio",
        TRACK_TYPE_COMPLEX => "complex",
        TRACK_TYPE_LOGO => "logo",
        TRACK_TYPE_SUBTITLE => "subtitle",
        TRACK_TYPE_CONTROL => "control",
        TRACK_TYPE_METADATA => "metadata",
        _ => "unknown",
    }
}

/// The EBML header at the start of the document.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct EbmlHeader {
    /// EBMLReadVersion: minimum parser version required.
    pub version: u64,
    pub max_size: u64,
    pub id_length: u64,
    pub doctype: Option<String>,
    /// DocTypeReadVersion.
    pub doctype_version: u64,
}

impl Record for EbmlHeader {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::EbmlReadVersion => Slot::UInt(&mut self.version),
            Field::EbmlMaxSizeLength => Slot::UInt(&mut self.max_size),
            Field::EbmlMaxIdLength => Slot::UInt(&mut self.id_length),
            Field::DocType => Slot::Str(&mut self.doctype),
            Field::DocTypeReadVersion => Slot::UInt(&mut self.doctype_version),
            _ => return None,
        })
    }
}

/// Segment-level metadata from the Info element.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SegmentInfo {
    /// Nanoseconds per segment timecode tick.
    pub time_scale: u64,
    /// Duration in timecode ticks.
    pub duration: f64,
    pub title: Option<String>,
    pub muxing_app: Option<String>,
    pub date_utc: Binary,
}

impl Record for SegmentInfo {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::TimeScale => Slot::UInt(&mut self.time_scale),
            Field::Duration => Slot::Float(&mut self.duration),
            Field::Title => Slot::Str(&mut self.title),
            Field::MuxingApp => Slot::Str(&mut self.muxing_app),
            Field::DateUtc => Slot::Binary(&mut self.date_utc),
            _ => return None,
        })
    }
}

/// Everything parsed from the Segment's top-level elements (except Clusters).
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Segment {
    pub info: SegmentInfo,
    pub tracks: Vec<Track>,
    pub attachments: Vec<Attachment>,
    pub chapters: Vec<Chapter>,
    pub cues: Vec<CuePoint>,
    pub tags: Vec<Tag>,
    pub seekhead: Vec<SeekEntry>,
}

impl Segment {
    /// Linear scan by track number.
    pub fn find_track(&self, number: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.number == number)
    }
}

impl Record for Segment {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::Info => Slot::Record(&mut self.info),
            Field::Tracks => Slot::List(&mut self.tracks),
            Field::Attachments => Slot::List(&mut self.attachments),
            Field::Chapters => Slot::List(&mut self.chapters),
            Field::Cues => Slot::List(&mut self.cues),
            Field::Tags => Slot::List(&mut self.tags),
            Field::SeekHead => Slot::List(&mut self.seekhead),
            _ => return None,
        })
    }
}

/// A TrackEntry.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Track {
    pub number: u64,
    pub uid: u64,
    pub track_type: u64,
    pub name: Option<String>,
    pub codec_id: Option<String>,
    pub codec_private: Binary,
    pub codec_delay: u64,
    pub seek_preroll: u64,
    pub language: Option<String>,
    /// Nanoseconds per frame; derived from the frame rate when absent.
    pub default_duration: u64,
    pub time_scale: f64,
    pub flag_default: u64,
    pub flag_forced: u64,
    pub max_block_addition_id: u64,
    pub video: VideoTrack,
    pub audio: AudioTrack,
    pub operation: TrackOperation,
    pub encodings: Vec<ContentEncoding>,
}

impl Track {
    pub fn is_video(&self) -> bool {
        self.track_type == TRACK_TYPE_VIDEO
    }

    pub fn is_audio(&self) -> bool {
        self.track_type == TRACK_TYPE_AUDIO
    }
}

impl Record for Track {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::TrackNumber => Slot::UInt(&mut self.number),
            Field::TrackUid => Slot::UInt(&mut self.uid),
            Field::TrackType => Slot::UInt(&mut self.track_type),
            Field::TrackName => Slot::Str(&mut self.name),
            Field::CodecId => Slot::Str(&mut self.codec_id),
            Field::CodecPrivate => Slot::Binary(&mut self.codec_private),
            Field::CodecDelay => Slot::UInt(&mut self.codec_delay),
            Field::SeekPreroll => Slot::UInt(&mut self.seek_preroll),
            Field::Language => Slot::Str(&mut self.language),
            Field::DefaultDuration => Slot::UInt(&mut self.default_duration),
            Field::TrackTimeScale => Slot::Float(&mut self.time_scale),
            Field::FlagDefault => Slot::UInt(&mut self.flag_default),
            Field::FlagForced => Slot::UInt(&mut self.flag_forced),
            Field::MaxBlockAdditionId => Slot::UInt(&mut self.max_block_addition_id),
            Field::Video => Slot::Record(&mut self.video),
            Field::Audio => Slot::Record(&mut self.audio),
            Field::Operation => Slot::Record(&mut self.operation),
            Field::Encodings => Slot::List(&mut self.encodings),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VideoTrack {
    pub frame_rate: f64,
    /// `u64::MAX` until resolved against the pixel size.
    pub display_width: u64,
    pub display_height: u64,
    pub pixel_width: u64,
    pub pixel_height: u64,
    /// FourCC, when present.
    pub colour_space: Binary,
    pub alpha_mode: u64,
    pub colour: Vec<VideoColour>,
    pub projection: VideoProjection,
    pub display_unit: u64,
    pub interlaced: u64,
    pub field_order: u64,
    pub stereo_mode: u64,
}

impl Record for VideoTrack {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::FrameRate => Slot::Float(&mut self.frame_rate),
            Field::DisplayWidth => Slot::UInt(&mut self.display_width),
            Field::DisplayHeight => Slot::UInt(&mut self.display_height),
            Field::PixelWidth => Slot::UInt(&mut self.pixel_width),
            Field::PixelHeight => Slot::UInt(&mut self.pixel_height),
            Field::ColourSpace => Slot::Binary(&mut self.colour_space),
            Field::AlphaMode => Slot::UInt(&mut self.alpha_mode),
            Field::Colour => Slot::List(&mut self.colour),
            Field::Projection => Slot::Record(&mut self.projection),
            Field::DisplayUnit => Slot::UInt(&mut self.display_unit),
            Field::Interlaced => Slot::UInt(&mut self.interlaced),
            Field::FieldOrder => Slot::UInt(&mut self.field_order),
            Field::StereoMode => Slot::UInt(&mut self.stereo_mode),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VideoColour {
    pub matrix_coefficients: u64,
    pub bits_per_channel: u64,
    pub chroma_sub_horz: u64,
    pub chroma_sub_vert: u64,
    pub cb_sub_horz: u64,
    pub cb_sub_vert: u64,
    pub chroma_siting_horz: u64,
    pub chroma_siting_vert: u64,
    pub range: u64,
    pub transfer_characteristics: u64,
    pub primaries: u64,
    pub max_cll: u64,
    pub max_fall: u64,
    pub mastering_meta: MasteringMeta,
}

impl Record for VideoColour {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::MatrixCoefficients => Slot::UInt(&mut self.matrix_coefficients),
            Field::BitsPerChannel => Slot::UInt(&mut self.bits_per_channel),
            Field::ChromaSubHorz => Slot::UInt(&mut self.chroma_sub_horz),
            Field::ChromaSubVert => Slot::UInt(&mut self.chroma_sub_vert),
            Field::CbSubHorz => Slot::UInt(&mut self.cb_sub_horz),
            Field::CbSubVert => Slot::UInt(&mut self.cb_sub_vert),
            Field::ChromaSitingHorz => Slot::UInt(&mut self.chroma_siting_horz),
            Field::ChromaSitingVert => Slot::UInt(&mut self.chroma_siting_vert),
            Field::Range => Slot::UInt(&mut self.range),
            Field::TransferCharacteristics => Slot::UInt(&mut self.transfer_characteristics),
            Field::Primaries => Slot::UInt(&mut self.primaries),
            Field::MaxCll => Slot::UInt(&mut self.max_cll),
            Field::MaxFall => Slot::UInt(&mut self.max_fall),
            Field::MasteringMeta => Slot::Record(&mut self.mastering_meta),
            _ => return None,
        })
    }
}

/// SMPTE 2086 mastering display metadata. `-1` marks an absent value.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct MasteringMeta {
    pub r_x: f64,
    pub r_y: f64,
    pub g_x: f64,
    pub g_y: f64,
    pub b_x: f64,
    pub b_y: f64,
    pub white_x: f64,
    pub white_y: f64,
    pub min_luminance: f64,
    pub max_luminance: f64,
}

impl Record for MasteringMeta {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::RedX => Slot::Float(&mut self.r_x),
            Field::RedY => Slot::Float(&mut self.r_y),
            Field::GreenX => Slot::Float(&mut self.g_x),
            Field::GreenY => Slot::Float(&mut self.g_y),
            Field::BlueX => Slot::Float(&mut self.b_x),
            Field::BlueY => Slot::Float(&mut self.b_y),
            Field::WhiteX => Slot::Float(&mut self.white_x),
            Field::WhiteY => Slot::Float(&mut self.white_y),
            Field::MinLuminance => Slot::Float(&mut self.min_luminance),
            Field::MaxLuminance => Slot::Float(&mut self.max_luminance),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VideoProjection {
    pub projection_type: u64,
    pub private: Binary,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Record for VideoProjection {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::ProjectionType => Slot::UInt(&mut self.projection_type),
            Field::ProjectionPrivate => Slot::Binary(&mut self.private),
            Field::Yaw => Slot::Float(&mut self.yaw),
            Field::Pitch => Slot::Float(&mut self.pitch),
            Field::Roll => Slot::Float(&mut self.roll),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct AudioTrack {
    pub sample_rate: f64,
    /// Effective output rate; equals `sample_rate` unless the file says otherwise.
    pub out_sample_rate: f64,
    pub bit_depth: u64,
    pub channels: u64,
}

impl Record for AudioTrack {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::SampleRate => Slot::Float(&mut self.sample_rate),
            Field::OutSampleRate => Slot::Float(&mut self.out_sample_rate),
            Field::BitDepth => Slot::UInt(&mut self.bit_depth),
            Field::Channels => Slot::UInt(&mut self.channels),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ContentEncoding {
    /// Bit 1: frames, bit 2: codec private.
    pub scope: u64,
    /// 0 compression, 1 encryption.
    pub encoding_type: u64,
    pub compression: ContentCompression,
    pub encryption: ContentEncryption,
}

impl Record for ContentEncoding {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::EncodingScope => Slot::UInt(&mut self.scope),
            Field::EncodingType => Slot::UInt(&mut self.encoding_type),
            Field::Compression => Slot::Record(&mut self.compression),
            Field::Encryption => Slot::Record(&mut self.encryption),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ContentCompression {
    pub algo: u64,
    pub settings: Binary,
}

impl Record for ContentCompression {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::CompressionAlgo => Slot::UInt(&mut self.algo),
            Field::CompressionSettings => Slot::Binary(&mut self.settings),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ContentEncryption {
    pub algo: u64,
    pub key_id: Binary,
}

impl Record for ContentEncryption {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::EncryptionAlgo => Slot::UInt(&mut self.algo),
            Field::EncryptionKeyId => Slot::Binary(&mut self.key_id),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct TrackOperation {
    pub combine_planes: Vec<TrackPlane>,
}

impl Record for TrackOperation {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        match field {
            Field::CombinePlanes => Some(Slot::List(&mut self.combine_planes)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct TrackPlane {
    pub uid: u64,
    pub plane_type: u64,
}

impl Record for TrackPlane {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::PlaneUid => Slot::UInt(&mut self.uid),
            Field::PlaneType => Slot::UInt(&mut self.plane_type),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Attachment {
    pub uid: u64,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub data: Binary,
}

impl Record for Attachment {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::FileUid => Slot::UInt(&mut self.uid),
            Field::FileName => Slot::Str(&mut self.file_name),
            Field::FileMimeType => Slot::Str(&mut self.mime_type),
            Field::FileData => Slot::Binary(&mut self.data),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Chapter {
    /// Nanoseconds, or [`NO_TIMESTAMP`].
    pub start: u64,
    pub end: u64,
    pub uid: u64,
    pub title: Option<String>,
}

impl Record for Chapter {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::ChapterStart => Slot::UInt(&mut self.start),
            Field::ChapterEnd => Slot::UInt(&mut self.end),
            Field::ChapterUid => Slot::UInt(&mut self.uid),
            Field::ChapterTitle => Slot::Str(&mut self.title),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CuePoint {
    /// Segment timecode ticks.
    pub time: u64,
    pub positions: Vec<CueTrackPosition>,
}

impl Record for CuePoint {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::CueTime => Slot::UInt(&mut self.time),
            Field::CuePositions => Slot::List(&mut self.positions),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CueTrackPosition {
    pub track: u64,
    /// Cluster offset relative to the Segment payload start.
    pub cluster_position: u64,
}

impl Record for CueTrackPosition {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::CueTrack => Slot::UInt(&mut self.track),
            Field::CueClusterPosition => Slot::UInt(&mut self.cluster_position),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Tag {
    pub targets: TagTargets,
    pub simple_tags: Vec<SimpleTag>,
}

impl Record for Tag {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::TagTargets => Slot::Record(&mut self.targets),
            Field::SimpleTags => Slot::List(&mut self.simple_tags),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct TagTargets {
    pub target_type: Option<String>,
    pub type_value: u64,
    pub track_uid: u64,
    pub chapter_uid: u64,
    pub attach_uid: u64,
}

impl Record for TagTargets {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::TargetType => Slot::Str(&mut self.target_type),
            Field::TargetTypeValue => Slot::UInt(&mut self.type_value),
            Field::TargetTrackUid => Slot::UInt(&mut self.track_uid),
            Field::TargetChapterUid => Slot::UInt(&mut self.chapter_uid),
            Field::TargetAttachUid => Slot::UInt(&mut self.attach_uid),
            _ => return None,
        })
    }
}

/// A name/value pair, possibly with nested tags.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SimpleTag {
    pub name: Option<String>,
    pub value: Option<String>,
    pub language: Option<String>,
    pub default: u64,
    pub children: Vec<SimpleTag>,
}

impl Record for SimpleTag {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::TagName => Slot::Str(&mut self.name),
            Field::TagString => Slot::Str(&mut self.value),
            Field::TagLanguage => Slot::Str(&mut self.language),
            Field::TagDefault => Slot::UInt(&mut self.default),
            Field::SimpleTags => Slot::List(&mut self.children),
            _ => return None,
        })
    }
}

/// One SeekHead pointer.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SeekEntry {
    /// Target element ID (with marker bit).
    pub id: u64,
    /// Offset relative to the Segment payload start.
    pub position: u64,
}

impl Record for SeekEntry {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::SeekId => Slot::UInt(&mut self.id),
            Field::SeekPosition => Slot::UInt(&mut self.position),
            _ => return None,
        })
    }
}

/// A Cluster: a timecode plus the blocks it holds.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Cluster {
    pub timecode: u64,
    pub blocks: Vec<Block>,
}

impl Record for Cluster {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::ClusterTimecode => Slot::UInt(&mut self.timecode),
            Field::Blocks => Slot::List(&mut self.blocks),
            _ => return None,
        })
    }
}

/// Destination for the top-level cluster schema.
#[derive(Debug, Default)]
pub(crate) struct ClusterList {
    pub clusters: Vec<Cluster>,
}

impl Record for ClusterList {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        match field {
            Field::Clusters => Some(Slot::List(&mut self.clusters)),
            _ => None,
        }
    }
}

/// A Block (from a BlockGroup) or SimpleBlock.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Block {
    pub duration: u64,
    /// Relative timecode of a referenced frame; `i64::MIN` when none.
    pub reference: i64,
    /// 1 for blocks read from a BlockGroup, 0 for SimpleBlocks.
    pub non_simple: u64,
    pub data: Binary,
    pub additional_id: u64,
    pub additional: Binary,
    pub discard_padding: i64,
}

impl Block {
    /// Decode the block header at the front of the payload.
    pub fn header(&self) -> Option<BlockHeader> {
        BlockHeader::parse(self.data.data())
    }

    pub fn is_keyframe(&self) -> bool {
        if self.non_simple != 0 {
            return self.reference == i64::MIN;
        }
        self.header().is_some_and(|h| h.flags & 0x80 != 0)
    }

    /// Split the payload after the block header into frames.
    ///
    /// `None` if the lace sizes do not fit the payload.
    pub fn frames(&self) -> Option<Vec<&[u8]>> {
        let data = self.data.data();
        let header = BlockHeader::parse(data)?;
        let body = data.get(header.size..)?;
        let lacing = header.lacing();
        if lacing == Lacing::None {
            return Some(vec![body]);
        }

        let (&last, mut rest) = body.split_first()?;
        let count = usize::from(last) + 1;
        let mut sizes = match lacing {
            Lacing::Xiph => xiph_lace_sizes(&mut rest, count - 1)?,
            Lacing::Ebml => ebml_lace_sizes(&mut rest, count - 1)?,
            Lacing::FixedSize | Lacing::None => {
                if rest.len() % count != 0 {
                    return None;
                }
                vec![rest.len() / count; count - 1]
            }
        };
        let used = sizes.iter().try_fold(0usize, |acc, &s| acc.checked_add(s))?;
        sizes.push(rest.len().checked_sub(used)?);

        let mut frames = Vec::with_capacity(count);
        for size in sizes {
            let (frame, tail) = rest.split_at_checked(size)?;
            frames.push(frame);
            rest = tail;
        }
        Some(frames)
    }
}

/// Sizes of all but the last frame: runs of 255 ended by a smaller byte.
fn xiph_lace_sizes(data: &mut &[u8], n: usize) -> Option<Vec<usize>> {
    let mut sizes = Vec::with_capacity(n + 1);
    for _ in 0..n {
        let mut size = 0usize;
        loop {
            let (&b, rest) = data.split_first()?;
            *data = rest;
            size += usize::from(b);
            if b != 0xFF {
                break;
            }
        }
        sizes.push(size);
    }
    Some(sizes)
}

/// Sizes of all but the last frame: an EBML number, then signed deltas.
fn ebml_lace_sizes(data: &mut &[u8], n: usize) -> Option<Vec<usize>> {
    let mut sizes = Vec::with_capacity(n + 1);
    if n == 0 {
        return Some(sizes);
    }
    let (first, width) = ebml_num_from_slice(data)?;
    *data = data.get(width..)?;
    let mut size = i64::try_from(first).ok()?;
    sizes.push(usize::try_from(size).ok()?);
    for _ in 1..n {
        let (delta, width) = ebml_snum_from_slice(data)?;
        *data = data.get(width..)?;
        size = size.checked_add(delta)?;
        sizes.push(usize::try_from(size).ok()?);
    }
    Some(sizes)
}

impl Record for Block {
    fn slot(&mut self, field: Field) -> Option<Slot<'_>> {
        Some(match field {
            Field::BlockData => Slot::Binary(&mut self.data),
            Field::BlockDuration => Slot::UInt(&mut self.duration),
            Field::BlockReference => Slot::SInt(&mut self.reference),
            Field::NonSimple => Slot::UInt(&mut self.non_simple),
            Field::AdditionalId => Slot::UInt(&mut self.additional_id),
            Field::Additional => Slot::Binary(&mut self.additional),
            Field::DiscardPadding => Slot::SInt(&mut self.discard_padding),
            _ => return None,
        })
    }
}

/// Lacing mode from block header flags bits 1-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Lacing {
    None,
    Xiph,
    FixedSize,
    Ebml,
}

/// The fixed header at the start of every Block/SimpleBlock payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct BlockHeader {
    pub track: u64,
    /// Relative to the cluster timecode.
    pub timecode: i16,
    pub flags: u8,
    /// Bytes occupied by the header; frame data follows.
    pub size: usize,
}

impl BlockHeader {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (track, n) = ebml_num_from_slice(data)?;
        let rest = data.get(n..n + 3)?;
        Some(Self {
            track,
            timecode: i16::from_be_bytes([rest[0], rest[1]]),
            flags: rest[2],
            size: n + 3,
        })
    }

    pub fn lacing(&self) -> Lacing {
        match (self.flags >> 1) & 0x3 {
            0 => Lacing::None,
            1 => Lacing::Xiph,
            2 => Lacing::FixedSize,
            _ => Lacing::Ebml,
        }
    }

    pub fn invisible(&self) -> bool {
        self.flags & 0x08 != 0
    }

    /// SimpleBlock only.
    pub fn discardable(&self) -> bool {
        self.flags & 0x01 != 0
    }
}

/// Asset-level summary of the file, filled in by track aggregation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Asset {
    pub video_data: bool,
    /// Number of video tracks.
    pub layers: u32,
    pub width: u64,
    pub height: u64,
    pub audio_data: bool,
    /// Sum of channels across audio tracks.
    pub channels: u64,
    pub sample_rate: f64,
}
