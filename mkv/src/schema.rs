use crate::ids;
use crate::syntax::{Field, Syntax};

/// Matroska "unspecified" value for colour matrix/transfer/primaries.
const COLOUR_UNSPECIFIED: u64 = 2;
/// StereoMode "not set": one past the last defined mode.
const STEREO_MODE_UNSET: u64 = 15;
/// FieldOrder "undetermined".
const FIELD_ORDER_UNDETERMINED: u64 = 2;

pub static EBML_HEADER: [Syntax; 7] = [
    Syntax::uint(ids::EBML_READ_VERSION, Field::EbmlReadVersion).default_uint(1),
    Syntax::uint(ids::EBML_MAX_SIZE_LENGTH, Field::EbmlMaxSizeLength).default_uint(8),
    Syntax::uint(ids::EBML_MAX_ID_LENGTH, Field::EbmlMaxIdLength).default_uint(4),
    Syntax::string(ids::DOCTYPE, Field::DocType).default_str("(none)"),
    Syntax::uint(ids::DOCTYPE_READ_VERSION, Field::DocTypeReadVersion).default_uint(1),
    Syntax::skip(ids::EBML_VERSION),
    Syntax::skip(ids::DOCTYPE_VERSION),
];

/// Document root: the EBML header.
pub static EBML: [Syntax; 1] = [Syntax::nest(ids::EBML_HEADER, &EBML_HEADER, Field::Inline)];

pub static INFO: [Syntax; 7] = [
    Syntax::uint(ids::TIMECODE_SCALE, Field::TimeScale).default_uint(1_000_000),
    Syntax::float(ids::DURATION, Field::Duration),
    Syntax::utf8(ids::TITLE, Field::Title),
    Syntax::skip(ids::WRITING_APP),
    Syntax::utf8(ids::MUXING_APP, Field::MuxingApp),
    Syntax::binary(ids::DATE_UTC, Field::DateUtc),
    Syntax::skip(ids::SEGMENT_UID),
];

pub static MASTERING_META: [Syntax; 10] = [
    Syntax::float(ids::MASTERING_RX, Field::RedX).default_float(-1.0),
    Syntax::float(ids::MASTERING_RY, Field::RedY).default_float(-1.0),
    Syntax::float(ids::MASTERING_GX, Field::GreenX).default_float(-1.0),
    Syntax::float(ids::MASTERING_GY, Field::GreenY).default_float(-1.0),
    Syntax::float(ids::MASTERING_BX, Field::BlueX).default_float(-1.0),
    Syntax::float(ids::MASTERING_BY, Field::BlueY).default_float(-1.0),
    Syntax::float(ids::MASTERING_WHITE_X, Field::WhiteX).default_float(-1.0),
    Syntax::float(ids::MASTERING_WHITE_Y, Field::WhiteY).default_float(-1.0),
    Syntax::float(ids::MASTERING_LUMINANCE_MIN, Field::MinLuminance).default_float(-1.0),
    Syntax::float(ids::MASTERING_LUMINANCE_MAX, Field::MaxLuminance).default_float(-1.0),
];

pub static COLOUR: [Syntax; 14] = [
    Syntax::uint(ids::COLOUR_MATRIX_COEFFICIENTS, Field::MatrixCoefficients)
        .default_uint(COLOUR_UNSPECIFIED),
    Syntax::uint(ids::COLOUR_BITS_PER_CHANNEL, Field::BitsPerChannel).default_uint(0),
    Syntax::uint(ids::COLOUR_CHROMA_SUB_HORZ, Field::ChromaSubHorz).default_uint(0),
    Syntax::uint(ids::COLOUR_CHROMA_SUB_VERT, Field::ChromaSubVert).default_uint(0),
    Syntax::uint(ids::COLOUR_CB_SUB_HORZ, Field::CbSubHorz).default_uint(0),
    Syntax::uint(ids::COLOUR_CB_SUB_VERT, Field::CbSubVert).default_uint(0),
    Syntax::uint(ids::COLOUR_CHROMA_SITING_HORZ, Field::ChromaSitingHorz).default_uint(0),
    Syntax::uint(ids::COLOUR_CHROMA_SITING_VERT, Field::ChromaSitingVert).default_uint(0),
    Syntax::uint(ids::COLOUR_RANGE, Field::Range).default_uint(0),
    Syntax::uint(ids::COLOUR_TRANSFER_CHARACTERISTICS, Field::TransferCharacteristics)
        .default_uint(COLOUR_UNSPECIFIED),
    Syntax::uint(ids::COLOUR_PRIMARIES, Field::Primaries).default_uint(COLOUR_UNSPECIFIED),
    Syntax::uint(ids::COLOUR_MAX_CLL, Field::MaxCll).default_uint(0),
    Syntax::uint(ids::COLOUR_MAX_FALL, Field::MaxFall).default_uint(0),
    Syntax::nest(ids::COLOUR_MASTERING_META, &MASTERING_META, Field::MasteringMeta),
];

pub static PROJECTION: [Syntax; 5] = [
    Syntax::uint(ids::PROJECTION_TYPE, Field::ProjectionType).default_uint(0),
    Syntax::binary(ids::PROJECTION_PRIVATE, Field::ProjectionPrivate),
    Syntax::float(ids::PROJECTION_POSE_YAW, Field::Yaw).default_float(0.0),
    Syntax::float(ids::PROJECTION_POSE_PITCH, Field::Pitch).default_float(0.0),
    Syntax::float(ids::PROJECTION_POSE_ROLL, Field::Roll).default_float(0.0),
];

pub static VIDEO: [Syntax; 18] = [
    Syntax::float(ids::VIDEO_FRAME_RATE, Field::FrameRate),
    Syntax::uint(ids::VIDEO_DISPLAY_WIDTH, Field::DisplayWidth).default_uint(u64::MAX),
    Syntax::uint(ids::VIDEO_DISPLAY_HEIGHT, Field::DisplayHeight).default_uint(u64::MAX),
    Syntax::uint(ids::VIDEO_PIXEL_WIDTH, Field::PixelWidth),
    Syntax::uint(ids::VIDEO_PIXEL_HEIGHT, Field::PixelHeight),
    Syntax::binary(ids::VIDEO_COLOUR_SPACE, Field::ColourSpace),
    Syntax::uint(ids::VIDEO_ALPHA_MODE, Field::AlphaMode),
    Syntax::nest(ids::VIDEO_COLOUR, &COLOUR, Field::Colour).repeated(),
    Syntax::nest(ids::VIDEO_PROJECTION, &PROJECTION, Field::Projection),
    Syntax::skip(ids::VIDEO_PIXEL_CROP_BOTTOM),
    Syntax::skip(ids::VIDEO_PIXEL_CROP_TOP),
    Syntax::skip(ids::VIDEO_PIXEL_CROP_LEFT),
    Syntax::skip(ids::VIDEO_PIXEL_CROP_RIGHT),
    Syntax::uint(ids::VIDEO_DISPLAY_UNIT, Field::DisplayUnit).default_uint(0),
    Syntax::uint(ids::VIDEO_FLAG_INTERLACED, Field::Interlaced).default_uint(0),
    Syntax::uint(ids::VIDEO_FIELD_ORDER, Field::FieldOrder).default_uint(FIELD_ORDER_UNDETERMINED),
    Syntax::uint(ids::VIDEO_STEREO_MODE, Field::StereoMode).default_uint(STEREO_MODE_UNSET),
    Syntax::skip(ids::VIDEO_ASPECT_RATIO),
];

pub static AUDIO: [Syntax; 4] = [
    Syntax::float(ids::AUDIO_SAMPLING_FREQ, Field::SampleRate).default_float(8000.0),
    Syntax::float(ids::AUDIO_OUTPUT_SAMPLING_FREQ, Field::OutSampleRate),
    Syntax::uint(ids::AUDIO_BIT_DEPTH, Field::BitDepth),
    Syntax::uint(ids::AUDIO_CHANNELS, Field::Channels).default_uint(1),
];

pub static COMPRESSION: [Syntax; 2] = [
    Syntax::uint(ids::ENCODING_COMP_ALGO, Field::CompressionAlgo).default_uint(0),
    Syntax::binary(ids::ENCODING_COMP_SETTINGS, Field::CompressionSettings),
];

pub static ENCRYPTION: [Syntax; 7] = [
    Syntax::uint(ids::ENCODING_ENC_ALGO, Field::EncryptionAlgo).default_uint(0),
    Syntax::binary(ids::ENCODING_ENC_KEY_ID, Field::EncryptionKeyId),
    Syntax::skip(ids::ENCODING_ENC_AES_SETTINGS),
    Syntax::skip(ids::ENCODING_SIG_ALGO),
    Syntax::skip(ids::ENCODING_SIG_HASH_ALGO),
    Syntax::skip(ids::ENCODING_SIG_KEY_ID),
    Syntax::skip(ids::ENCODING_SIGNATURE),
];

pub static ENCODING: [Syntax; 5] = [
    Syntax::uint(ids::ENCODING_SCOPE, Field::EncodingScope).default_uint(1),
    Syntax::uint(ids::ENCODING_TYPE, Field::EncodingType).default_uint(0),
    Syntax::nest(ids::ENCODING_COMPRESSION, &COMPRESSION, Field::Compression),
    Syntax::nest(ids::ENCODING_ENCRYPTION, &ENCRYPTION, Field::Encryption),
    Syntax::skip(ids::ENCODING_ORDER),
];

pub static ENCODINGS: [Syntax; 1] =
    [Syntax::nest(ids::TRACK_CONTENT_ENCODING, &ENCODING, Field::Encodings).repeated()];

pub static PLANE: [Syntax; 2] = [
    Syntax::uint(ids::TRACK_PLANE_UID, Field::PlaneUid),
    Syntax::uint(ids::TRACK_PLANE_TYPE, Field::PlaneType),
];

pub static COMBINE_PLANES: [Syntax; 1] =
    [Syntax::nest(ids::TRACK_PLANE, &PLANE, Field::CombinePlanes).repeated()];

pub static OPERATION: [Syntax; 1] =
    [Syntax::nest(ids::TRACK_COMBINE_PLANES, &COMBINE_PLANES, Field::Inline)];

pub static TRACK: [Syntax; 26] = [
    Syntax::uint(ids::TRACK_NUMBER, Field::TrackNumber),
    Syntax::utf8(ids::TRACK_NAME, Field::TrackName),
    Syntax::uint(ids::TRACK_UID, Field::TrackUid),
    Syntax::uint(ids::TRACK_TYPE, Field::TrackType),
    Syntax::string(ids::CODEC_ID, Field::CodecId),
    Syntax::binary(ids::CODEC_PRIVATE, Field::CodecPrivate),
    Syntax::uint(ids::CODEC_DELAY, Field::CodecDelay),
    Syntax::utf8(ids::TRACK_LANGUAGE, Field::Language).default_str("eng"),
    Syntax::uint(ids::TRACK_DEFAULT_DURATION, Field::DefaultDuration),
    Syntax::float(ids::TRACK_TIMECODE_SCALE, Field::TrackTimeScale).default_float(1.0),
    Syntax::uint(ids::TRACK_FLAG_DEFAULT, Field::FlagDefault).default_uint(1),
    Syntax::uint(ids::TRACK_FLAG_FORCED, Field::FlagForced).default_uint(0),
    Syntax::nest(ids::TRACK_VIDEO, &VIDEO, Field::Video),
    Syntax::nest(ids::TRACK_AUDIO, &AUDIO, Field::Audio),
    Syntax::nest(ids::TRACK_OPERATION, &OPERATION, Field::Operation),
    Syntax::nest(ids::TRACK_CONTENT_ENCODINGS, &ENCODINGS, Field::Inline),
    Syntax::uint(ids::TRACK_MAX_BLOCK_ADDITION_ID, Field::MaxBlockAdditionId),
    Syntax::uint(ids::SEEK_PREROLL, Field::SeekPreroll),
    Syntax::skip(ids::TRACK_FLAG_ENABLED),
    Syntax::skip(ids::TRACK_FLAG_LACING),
    Syntax::skip(ids::CODEC_NAME),
    Syntax::skip(ids::CODEC_DECODE_ALL),
    Syntax::skip(ids::CODEC_INFO_URL),
    Syntax::skip(ids::CODEC_DOWNLOAD_URL),
    Syntax::skip(ids::TRACK_MIN_CACHE),
    Syntax::skip(ids::TRACK_MAX_CACHE),
];

pub static TRACKS: [Syntax; 1] = [Syntax::nest(ids::TRACK_ENTRY, &TRACK, Field::Tracks).repeated()];

pub static ATTACHMENT: [Syntax; 5] = [
    Syntax::uint(ids::FILE_UID, Field::FileUid),
    Syntax::utf8(ids::FILE_NAME, Field::FileName),
    Syntax::string(ids::FILE_MIME_TYPE, Field::FileMimeType),
    Syntax::binary(ids::FILE_DATA, Field::FileData),
    Syntax::skip(ids::FILE_DESCRIPTION),
];

pub static ATTACHMENTS: [Syntax; 1] =
    [Syntax::nest(ids::ATTACHED_FILE, &ATTACHMENT, Field::Attachments).repeated()];

pub static CHAPTER_DISPLAY: [Syntax; 3] = [
    Syntax::utf8(ids::CHAP_STRING, Field::ChapterTitle),
    Syntax::skip(ids::CHAP_LANGUAGE),
    Syntax::skip(ids::CHAP_COUNTRY),
];

pub static CHAPTER_ATOM: [Syntax; 8] = [
    Syntax::uint(ids::CHAPTER_TIME_START, Field::ChapterStart).default_uint(crate::model::NO_TIMESTAMP),
    Syntax::uint(ids::CHAPTER_TIME_END, Field::ChapterEnd).default_uint(crate::model::NO_TIMESTAMP),
    Syntax::uint(ids::CHAPTER_UID, Field::ChapterUid),
    Syntax::nest(ids::CHAPTER_DISPLAY, &CHAPTER_DISPLAY, Field::Inline),
    Syntax::skip(ids::CHAPTER_FLAG_HIDDEN),
    Syntax::skip(ids::CHAPTER_FLAG_ENABLED),
    Syntax::skip(ids::CHAPTER_PHYSICAL_EQUIV),
    // Nested chapters are not flattened
    Syntax::skip(ids::CHAPTER_ATOM),
];

pub static EDITION: [Syntax; 5] = [
    Syntax::nest(ids::CHAPTER_ATOM, &CHAPTER_ATOM, Field::Chapters).repeated(),
    Syntax::skip(ids::EDITION_UID),
    Syntax::skip(ids::EDITION_FLAG_HIDDEN),
    Syntax::skip(ids::EDITION_FLAG_DEFAULT),
    Syntax::skip(ids::EDITION_FLAG_ORDERED),
];

pub static CHAPTERS: [Syntax; 1] = [Syntax::nest(ids::EDITION_ENTRY, &EDITION, Field::Inline)];

pub static CUE_TRACK_POSITIONS: [Syntax; 5] = [
    Syntax::uint(ids::CUE_TRACK, Field::CueTrack),
    Syntax::uint(ids::CUE_CLUSTER_POSITION, Field::CueClusterPosition),
    Syntax::skip(ids::CUE_RELATIVE_POSITION),
    Syntax::skip(ids::CUE_DURATION),
    Syntax::skip(ids::CUE_BLOCK_NUMBER),
];

pub static CUE_POINT: [Syntax; 2] = [
    Syntax::uint(ids::CUE_TIME, Field::CueTime),
    Syntax::nest(ids::CUE_TRACK_POSITIONS, &CUE_TRACK_POSITIONS, Field::CuePositions).repeated(),
];

pub static CUES: [Syntax; 1] = [Syntax::nest(ids::CUE_POINT, &CUE_POINT, Field::Cues).repeated()];

pub static SIMPLE_TAG: [Syntax; 6] = [
    Syntax::utf8(ids::TAG_NAME, Field::TagName),
    Syntax::utf8(ids::TAG_STRING, Field::TagString),
    Syntax::string(ids::TAG_LANGUAGE, Field::TagLanguage).default_str("und"),
    Syntax::uint(ids::TAG_DEFAULT, Field::TagDefault),
    Syntax::uint(ids::TAG_DEFAULT_BUG, Field::TagDefault),
    Syntax::nest(ids::SIMPLE_TAG, &SIMPLE_TAG, Field::SimpleTags).repeated(),
];

pub static TAG_TARGETS: [Syntax; 5] = [
    Syntax::string(ids::TAG_TARGETS_TYPE, Field::TargetType),
    Syntax::uint(ids::TAG_TARGETS_TYPE_VALUE, Field::TargetTypeValue).default_uint(50),
    Syntax::uint(ids::TAG_TARGETS_TRACK_UID, Field::TargetTrackUid),
    Syntax::uint(ids::TAG_TARGETS_CHAPTER_UID, Field::TargetChapterUid),
    Syntax::uint(ids::TAG_TARGETS_ATTACH_UID, Field::TargetAttachUid),
];

pub static TAG: [Syntax; 2] = [
    Syntax::nest(ids::SIMPLE_TAG, &SIMPLE_TAG, Field::SimpleTags).repeated(),
    Syntax::nest(ids::TAG_TARGETS, &TAG_TARGETS, Field::TagTargets),
];

pub static TAGS: [Syntax; 1] = [Syntax::nest(ids::TAG, &TAG, Field::Tags).repeated()];

pub static SEEK_ENTRY: [Syntax; 2] = [
    Syntax::uint(ids::SEEK_ID, Field::SeekId),
    Syntax::uint(ids::SEEK_POSITION, Field::SeekPosition).default_uint(u64::MAX),
];

pub static SEEKHEAD: [Syntax; 1] =
    [Syntax::nest(ids::SEEK_ENTRY, &SEEK_ENTRY, Field::SeekHead).repeated()];

/// Children of the Segment. Parsing stops at the first Cluster.
pub static SEGMENT: [Syntax; 8] = [
    Syntax::level1(ids::INFO, &INFO, Field::Info),
    Syntax::level1(ids::TRACKS, &TRACKS, Field::Inline),
    Syntax::level1(ids::ATTACHMENTS, &ATTACHMENTS, Field::Inline),
    Syntax::level1(ids::CHAPTERS, &CHAPTERS, Field::Inline),
    Syntax::level1(ids::CUES, &CUES, Field::Inline),
    Syntax::level1(ids::TAGS, &TAGS, Field::Inline),
    Syntax::level1(ids::SEEKHEAD, &SEEKHEAD, Field::Inline),
    Syntax::stop(ids::CLUSTER),
];

/// Root after the EBML header.
pub static SEGMENTS: [Syntax; 1] = [Syntax::nest(ids::SEGMENT, &SEGMENT, Field::Inline)];

pub static BLOCK_MORE: [Syntax; 2] = [
    Syntax::uint(ids::BLOCK_ADD_ID, Field::AdditionalId),
    Syntax::binary(ids::BLOCK_ADDITIONAL, Field::Additional),
];

pub static BLOCK_ADDITIONS: [Syntax; 1] =
    [Syntax::nest(ids::BLOCK_MORE, &BLOCK_MORE, Field::Inline)];

/// ID that never occurs in a file. Its only effect is the `non_simple`
/// default applied when a BlockGroup is opened.
const NON_SIMPLE_MARKER: u32 = 1;

pub static BLOCK_GROUP: [Syntax; 8] = [
    Syntax::binary(ids::BLOCK, Field::BlockData),
    Syntax::nest(ids::BLOCK_ADDITIONS, &BLOCK_ADDITIONS, Field::Inline),
    Syntax::binary(ids::SIMPLE_BLOCK, Field::BlockData),
    Syntax::uint(ids::BLOCK_DURATION, Field::BlockDuration),
    Syntax::sint(ids::DISCARD_PADDING, Field::DiscardPadding),
    Syntax::sint(ids::BLOCK_REFERENCE, Field::BlockReference).default_sint(i64::MIN),
    Syntax::skip(ids::CODEC_STATE),
    Syntax::uint(NON_SIMPLE_MARKER, Field::NonSimple).default_uint(1),
];

pub static CLUSTER: [Syntax; 5] = [
    Syntax::uint(ids::CLUSTER_TIMECODE, Field::ClusterTimecode),
    Syntax::nest(ids::BLOCK_GROUP, &BLOCK_GROUP, Field::Blocks).repeated(),
    Syntax::pass(ids::SIMPLE_BLOCK, &BLOCK_GROUP, Field::Blocks).repeated(),
    Syntax::skip(ids::CLUSTER_POSITION),
    Syntax::skip(ids::CLUSTER_PREV_SIZE),
];

/// Top-level elements seen while walking clusters after the header.
pub static CLUSTERS: [Syntax; 5] = [
    Syntax::nest(ids::CLUSTER, &CLUSTER, Field::Clusters).repeated(),
    Syntax::skip(ids::INFO),
    Syntax::skip(ids::CUES),
    Syntax::skip(ids::TAGS),
    Syntax::skip(ids::SEEKHEAD),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClusterList, EbmlHeader, Segment};
    use crate::syntax::{ElementKind, Record, Slot};

    /// Walk `schema` against `dest`, creating list elements as the engine
    /// would, and report the first node whose field doesn't fit.
    fn check(schema: &'static [Syntax], dest: &mut dyn Record, depth: usize) -> Result<(), String> {
        // SimpleTag is self-recursive
        if depth > 6 {
            return Ok(());
        }
        for node in schema {
            if node.repeated {
                let Some(Slot::List(list)) = dest.slot(node.field) else {
                    return Err(format!("0x{:X}: repeated node without a list field", node.id));
                };
                let elem = list.push_default();
                check_value(node, elem, true, depth)?;
            } else {
                check_value(node, dest, false, depth)?;
            }
        }
        Ok(())
    }

    fn check_value(node: &Syntax, dest: &mut dyn Record, in_list: bool, depth: usize) -> Result<(), String> {
        let mismatch = || format!("0x{:X}: field {:?} has the wrong type", node.id, node.field);
        match node.kind {
            ElementKind::Nest(children) | ElementKind::Level1(children) => {
                if in_list || node.field == Field::Inline {
                    return check(children, dest, depth + 1);
                }
                match dest.slot(node.field) {
                    Some(Slot::Record(r)) => check(children, r, depth + 1),
                    _ => Err(mismatch()),
                }
            }
            ElementKind::Pass(children) => check_pass(node.id, children, dest),
            ElementKind::Stop | ElementKind::None => Ok(()),
            kind => {
                let ok = matches!(
                    (kind, dest.slot(node.field)),
                    (ElementKind::UInt, Some(Slot::UInt(_)))
                        | (ElementKind::SInt, Some(Slot::SInt(_)))
                        | (ElementKind::Float, Some(Slot::Float(_)))
                        | (ElementKind::Str | ElementKind::Utf8, Some(Slot::Str(_)))
                        | (ElementKind::Binary, Some(Slot::Binary(_)))
                );
                if ok { Ok(()) } else { Err(mismatch()) }
            }
        }
    }

    fn check_pass(id: u32, children: &'static [Syntax], dest: &mut dyn Record) -> Result<(), String> {
        let Some(target) = crate::syntax::find(children, id) else {
            return Err(format!("0x{id:X}: pass target schema has no node for the same ID"));
        };
        check_value(target, dest, false, 0)
    }

    #[test]
    fn test_schema_fields_resolve() {
        check(&EBML, &mut EbmlHeader::default(), 0).unwrap();
        check(&SEGMENTS, &mut Segment::default(), 0).unwrap();
        check(&CLUSTERS, &mut ClusterList::default(), 0).unwrap();
    }

    #[test]
    fn test_no_duplicate_ids_within_a_table() {
        let tables: [&[Syntax]; 12] = [
            &EBML_HEADER, &INFO, &VIDEO, &COLOUR, &TRACK, &ENCODING,
            &CHAPTER_ATOM, &CUE_POINT, &SIMPLE_TAG, &SEGMENT, &BLOCK_GROUP, &CLUSTER,
        ];
        for table in tables {
            let mut ids: Vec<u32> = table.iter().map(|s| s.id).collect();
            ids.sort_unstable();
            let len = ids.len();
            ids.dedup();
            assert_eq!(ids.len(), len);
        }
    }

    #[test]
    fn test_segment_stops_at_cluster() {
        let node = crate::syntax::find(&SEGMENT, ids::CLUSTER).unwrap();
        assert!(matches!(node.kind, ElementKind::Stop));
    }
}
