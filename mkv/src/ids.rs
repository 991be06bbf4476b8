// On-the-wire form: IDs keep their length marker bit.

// EBML header
pub const EBML_HEADER: u32 = 0x1A45DFA3;
pub const EBML_VERSION: u32 = 0x4286;
pub const EBML_READ_VERSION: u32 = 0x42F7;
pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
pub const DOCTYPE: u32 = 0x4282;
pub const DOCTYPE_VERSION: u32 = 0x4287;
pub const DOCTYPE_READ_VERSION: u32 = 0x4285;

// Global elements
pub const VOID: u32 = 0xEC;
pub const CRC32: u32 = 0xBF;

pub const SEGMENT: u32 = 0x18538067;

// Top-level (level 1) elements
pub const INFO: u32 = 0x1549A966;
pub const TRACKS: u32 = 0x1654AE6B;
pub const CUES: u32 = 0x1C53BB6B;
pub const TAGS: u32 = 0x1254C367;
pub const SEEKHEAD: u32 = 0x114D9B74;
pub const ATTACHMENTS: u32 = 0x1941A469;
pub const CLUSTER: u32 = 0x1F43B675;
pub const CHAPTERS: u32 = 0x1043A770;

/// IDs that the resync scanner accepts as the start of a top-level element.
pub const RESYNC_IDS: [u32; 8] = [
    INFO, TRACKS, CUES, TAGS, SEEKHEAD, ATTACHMENTS, CLUSTER, CHAPTERS,
];

// Info
pub const TIMECODE_SCALE: u32 = 0x2AD7B1;
pub const DURATION: u32 = 0x4489;
pub const TITLE: u32 = 0x7BA9;
pub const WRITING_APP: u32 = 0x5741;
pub const MUXING_APP: u32 = 0x4D80;
pub const DATE_UTC: u32 = 0x4461;
pub const SEGMENT_UID: u32 = 0x73A4;

// Tracks
pub const TRACK_ENTRY: u32 = 0xAE;
pub const TRACK_NUMBER: u32 = 0xD7;
pub const TRACK_UID: u32 = 0x73C5;
pub const TRACK_TYPE: u32 = 0x83;
pub const TRACK_VIDEO: u32 = 0xE0;
pub const TRACK_AUDIO: u32 = 0xE1;
pub const TRACK_OPERATION: u32 = 0xE2;
pub const TRACK_COMBINE_PLANES: u32 = 0xE3;
pub const TRACK_PLANE: u32 = 0xE4;
pub const TRACK_PLANE_UID: u32 = 0xE5;
pub const TRACK_PLANE_TYPE: u32 = 0xE6;
pub const CODEC_ID: u32 = 0x86;
pub const CODEC_PRIVATE: u32 = 0x63A2;
pub const CODEC_NAME: u32 = 0x258688;
pub const CODEC_INFO_URL: u32 = 0x3B4040;
pub const CODEC_DOWNLOAD_URL: u32 = 0x26B240;
pub const CODEC_DECODE_ALL: u32 = 0xAA;
pub const CODEC_DELAY: u32 = 0x56AA;
pub const SEEK_PREROLL: u32 = 0x56BB;
pub const TRACK_NAME: u32 = 0x536E;
pub const TRACK_LANGUAGE: u32 = 0x22B59C;
pub const TRACK_FLAG_ENABLED: u32 = 0xB9;
pub const TRACK_FLAG_DEFAULT: u32 = 0x88;
pub const TRACK_FLAG_FORCED: u32 = 0x55AA;
pub const TRACK_FLAG_LACING: u32 = 0x9C;
pub const TRACK_MIN_CACHE: u32 = 0x6DE7;
pub const TRACK_MAX_CACHE: u32 = 0x6DF8;
pub const TRACK_DEFAULT_DURATION: u32 = 0x23E383;
pub const TRACK_CONTENT_ENCODINGS: u32 = 0x6D80;
pub const TRACK_CONTENT_ENCODING: u32 = 0x6240;
pub const TRACK_TIMECODE_SCALE: u32 = 0x23314F;
pub const TRACK_MAX_BLOCK_ADDITION_ID: u32 = 0x55EE;

// Video
pub const VIDEO_FRAME_RATE: u32 = 0x2383E3;
pub const VIDEO_DISPLAY_WIDTH: u32 = 0x54B0;
pub const VIDEO_DISPLAY_HEIGHT: u32 = 0x54BA;
pub const VIDEO_PIXEL_WIDTH: u32 = 0xB0;
pub const VIDEO_PIXEL_HEIGHT: u32 = 0xBA;
pub const VIDEO_PIXEL_CROP_BOTTOM: u32 = 0x54AA;
pub const VIDEO_PIXEL_CROP_TOP: u32 = 0x54BB;
pub const VIDEO_PIXEL_CROP_LEFT: u32 = 0x54CC;
pub const VIDEO_PIXEL_CROP_RIGHT: u32 = 0x54DD;
pub const VIDEO_DISPLAY_UNIT: u32 = 0x54B2;
pub const VIDEO_FLAG_INTERLACED: u32 = 0x9A;
pub const VIDEO_FIELD_ORDER: u32 = 0x9D;
pub const VIDEO_STEREO_MODE: u32 = 0x53B8;
pub const VIDEO_ALPHA_MODE: u32 = 0x53C0;
pub const VIDEO_ASPECT_RATIO: u32 = 0x54B3;
pub const VIDEO_COLOUR_SPACE: u32 = 0x2EB524;
pub const VIDEO_COLOUR: u32 = 0x55B0;

// Colour
pub const COLOUR_MATRIX_COEFFICIENTS: u32 = 0x55B1;
pub const COLOUR_BITS_PER_CHANNEL: u32 = 0x55B2;
pub const COLOUR_CHROMA_SUB_HORZ: u32 = 0x55B3;
pub const COLOUR_CHROMA_SUB_VERT: u32 = 0x55B4;
pub const COLOUR_CB_SUB_HORZ: u32 = 0x55B5;
pub const COLOUR_CB_SUB_VERT: u32 = 0x55B6;
pub const COLOUR_CHROMA_SITING_HORZ: u32 = 0x55B7;
pub const COLOUR_CHROMA_SITING_VERT: u32 = 0x55B8;
pub const COLOUR_RANGE: u32 = 0x55B9;
pub const COLOUR_TRANSFER_CHARACTERISTICS: u32 = 0x55BA;
pub const COLOUR_PRIMARIES: u32 = 0x55BB;
pub const COLOUR_MAX_CLL: u32 = 0x55BC;
pub const COLOUR_MAX_FALL: u32 = 0x55BD;
pub const COLOUR_MASTERING_META: u32 = 0x55D0;
pub const MASTERING_RX: u32 = 0x55D1;
pub const MASTERING_RY: u32 = 0x55D2;
pub const MASTERING_GX: u32 = 0x55D3;
pub const MASTERING_GY: u32 = 0x55D4;
pub const MASTERING_BX: u32 = 0x55D5;
pub const MASTERING_BY: u32 = 0x55D6;
pub const MASTERING_WHITE_X: u32 = 0x55D7;
pub const MASTERING_WHITE_Y: u32 = 0x55D8;
pub const MASTERING_LUMINANCE_MAX: u32 = 0x55D9;
pub const MASTERING_LUMINANCE_MIN: u32 = 0x55DA;

// Projection
pub const VIDEO_PROJECTION: u32 = 0x7670;
pub const PROJECTION_TYPE: u32 = 0x7671;
pub const PROJECTION_PRIVATE: u32 = 0x7672;
pub const PROJECTION_POSE_YAW: u32 = 0x7673;
pub const PROJECTION_POSE_PITCH: u32 = 0x7674;
pub const PROJECTION_POSE_ROLL: u32 = 0x7675;

// Audio
pub const AUDIO_SAMPLING_FREQ: u32 = 0xB5;
pub const AUDIO_OUTPUT_SAMPLING_FREQ: u32 = 0x78B5;
pub const AUDIO_BIT_DEPTH: u32 = 0x6264;
pub const AUDIO_CHANNELS: u32 = 0x9F;

// Content encoding
pub const ENCODING_ORDER: u32 = 0x5031;
pub const ENCODING_SCOPE: u32 = 0x5032;
pub const ENCODING_TYPE: u32 = 0x5033;
pub const ENCODING_COMPRESSION: u32 = 0x5034;
pub const ENCODING_COMP_ALGO: u32 = 0x4254;
pub const ENCODING_COMP_SETTINGS: u32 = 0x4255;
pub const ENCODING_ENCRYPTION: u32 = 0x5035;
pub const ENCODING_ENC_AES_SETTINGS: u32 = 0x47E7;
pub const ENCODING_ENC_ALGO: u32 = 0x47E1;
pub const ENCODING_ENC_KEY_ID: u32 = 0x47E2;
pub const ENCODING_SIG_ALGO: u32 = 0x47E5;
pub const ENCODING_SIG_HASH_ALGO: u32 = 0x47E6;
pub const ENCODING_SIG_KEY_ID: u32 = 0x47E4;
pub const ENCODING_SIGNATURE: u32 = 0x47E3;

// Cues
pub const CUE_POINT: u32 = 0xBB;
pub const CUE_TIME: u32 = 0xB3;
pub const CUE_TRACK_POSITIONS: u32 = 0xB7;
pub const CUE_TRACK: u32 = 0xF7;
pub const CUE_CLUSTER_POSITION: u32 = 0xF1;
pub const CUE_RELATIVE_POSITION: u32 = 0xF0;
pub const CUE_DURATION: u32 = 0xB2;
pub const CUE_BLOCK_NUMBER: u32 = 0x5378;

// Tags
pub const TAG: u32 = 0x7373;
pub const SIMPLE_TAG: u32 = 0x67C8;
pub const TAG_NAME: u32 = 0x45A3;
pub const TAG_STRING: u32 = 0x4487;
pub const TAG_LANGUAGE: u32 = 0x447A;
pub const TAG_DEFAULT: u32 = 0x4484;
/// Misspelt TagDefault written by some old muxers.
pub const TAG_DEFAULT_BUG: u32 = 0x44B4;
pub const TAG_TARGETS: u32 = 0x63C0;
pub const TAG_TARGETS_TYPE: u32 = 0x63CA;
pub const TAG_TARGETS_TYPE_VALUE: u32 = 0x68CA;
pub const TAG_TARGETS_TRACK_UID: u32 = 0x63C5;
pub const TAG_TARGETS_CHAPTER_UID: u32 = 0x63C4;
pub const TAG_TARGETS_ATTACH_UID: u32 = 0x63C6;

// SeekHead
pub const SEEK_ENTRY: u32 = 0x4DBB;
pub const SEEK_ID: u32 = 0x53AB;
pub const SEEK_POSITION: u32 = 0x53AC;

// Cluster
pub const CLUSTER_TIMECODE: u32 = 0xE7;
pub const CLUSTER_POSITION: u32 = 0xA7;
pub const CLUSTER_PREV_SIZE: u32 = 0xAB;
pub const BLOCK_GROUP: u32 = 0xA0;
pub const BLOCK_ADDITIONS: u32 = 0x75A1;
pub const BLOCK_MORE: u32 = 0xA6;
pub const BLOCK_ADD_ID: u32 = 0xEE;
pub const BLOCK_ADDITIONAL: u32 = 0xA5;
pub const SIMPLE_BLOCK: u32 = 0xA3;
pub const BLOCK: u32 = 0xA1;
pub const BLOCK_DURATION: u32 = 0x9B;
pub const BLOCK_REFERENCE: u32 = 0xFB;
pub const CODEC_STATE: u32 = 0xA4;
pub const DISCARD_PADDING: u32 = 0x75A2;

// Attachments
pub const ATTACHED_FILE: u32 = 0x61A7;
pub const FILE_DESCRIPTION: u32 = 0x467E;
pub const FILE_NAME: u32 = 0x466E;
pub const FILE_MIME_TYPE: u32 = 0x4660;
pub const FILE_DATA: u32 = 0x465C;
pub const FILE_UID: u32 = 0x46AE;

// Chapters
pub const EDITION_ENTRY: u32 = 0x45B9;
pub const CHAPTER_ATOM: u32 = 0xB6;
pub const CHAPTER_TIME_START: u32 = 0x91;
pub const CHAPTER_TIME_END: u32 = 0x92;
pub const CHAPTER_DISPLAY: u32 = 0x80;
pub const CHAP_STRING: u32 = 0x85;
pub const CHAP_LANGUAGE: u32 = 0x437C;
pub const CHAP_COUNTRY: u32 = 0x437E;
pub const EDITION_UID: u32 = 0x45BC;
pub const EDITION_FLAG_HIDDEN: u32 = 0x45BD;
pub const EDITION_FLAG_DEFAULT: u32 = 0x45DB;
pub const EDITION_FLAG_ORDERED: u32 = 0x45DD;
pub const CHAPTER_UID: u32 = 0x73C4;
pub const CHAPTER_FLAG_HIDDEN: u32 = 0x98;
pub const CHAPTER_FLAG_ENABLED: u32 = 0x4598;
pub const CHAPTER_PHYSICAL_EQUIV: u32 = 0x63C3;

/// Human-readable name for the IDs the tooling prints.
pub fn name(id: u32) -> Option<&'static str> {
    Some(match id {
        EBML_HEADER => "EBML",
        SEGMENT => "Segment",
        INFO => "Info",
        TRACKS => "Tracks",
        CUES => "Cues",
        TAGS => "Tags",
        SEEKHEAD => "SeekHead",
        ATTACHMENTS => "Attachments",
        CLUSTER => "Cluster",
        CHAPTERS => "Chapters",
        VOID => "Void",
        CRC32 => "CRC-32",
        _ => return None,
    })
}

/// Checks that the marker bit of an on-the-wire ID agrees with its byte width.
///
/// The highest non-zero byte carries the length marker, so an ID whose top
/// set bit sits at position `b` must occupy exactly `8 - b % 8` bytes.
pub fn is_valid_id(id: u32) -> bool {
    if id == 0 {
        return false;
    }
    let bits = 31 - id.leading_zeros();
    (bits + 7) / 8 == 8 - bits % 8
}
