//! Declarative element schema.
//!
//! A schema is a static table of [`Syntax`] nodes. Each node says what to do
//! with one element ID when it appears inside a given master element: which
//! primitive decodes it, which field of the destination record receives it,
//! whether each occurrence appends a new list element, and the value the
//! field takes when the element is absent.
//!
//! Destination records are reached through [`Record::slot`], which maps a
//! [`Field`] to a typed mutable reference. The engine never needs to know the
//! concrete record type.

use crate::ebml::Binary;

/// How an element's payload is interpreted.
#[derive(Debug, Clone, Copy)]
pub enum ElementKind {
    UInt,
    SInt,
    Float,
    /// ASCII string.
    Str,
    /// UTF-8 string.
    Utf8,
    Binary,
    /// Master element; children are parsed with the given schema.
    Nest(&'static [Syntax]),
    /// Top-level master element, also recorded in the Level1 table.
    Level1(&'static [Syntax]),
    /// Hand the already-read ID to the given schema without consuming a length.
    Pass(&'static [Syntax]),
    /// End the current nested parse without error.
    Stop,
    /// Skip the payload.
    None,
}

impl ElementKind {
    /// Largest payload accepted for this kind. `None` means unbounded.
    pub fn max_length(&self) -> Option<u64> {
        match self {
            ElementKind::UInt | ElementKind::SInt | ElementKind::Float => Some(8),
            // 16 MiB
            ElementKind::Str | ElementKind::Utf8 => Some(0x100_0000),
            // 256 MiB
            ElementKind::Binary => Some(0x1000_0000),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            ElementKind::UInt | ElementKind::SInt | ElementKind::Float | ElementKind::Str | ElementKind::Utf8
        )
    }
}

/// Value written into a scalar field before a master's children are parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    None,
    UInt(u64),
    SInt(i64),
    Float(f64),
    Str(&'static str),
}

/// Names one field of a destination record.
///
/// `Inline` means the destination record itself: a master element whose
/// children land directly in its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Inline,

    // EBML header
    EbmlReadVersion,
    EbmlMaxSizeLength,
    EbmlMaxIdLength,
    DocType,
    DocTypeReadVersion,

    // Segment
    Info,
    Tracks,
    Attachments,
    Chapters,
    Cues,
    Tags,
    SeekHead,

    // Info
    TimeScale,
    Duration,
    Title,
    MuxingApp,
    DateUtc,

    // TrackEntry
    TrackNumber,
    TrackUid,
    TrackType,
    TrackName,
    CodecId,
    CodecPrivate,
    CodecDelay,
    SeekPreroll,
    Language,
    DefaultDuration,
    TrackTimeScale,
    FlagDefault,
    FlagForced,
    MaxBlockAdditionId,
    Video,
    Audio,
    Operation,
    Encodings,

    // Video
    FrameRate,
    DisplayWidth,
    DisplayHeight,
    PixelWidth,
    PixelHeight,
    ColourSpace,
    AlphaMode,
    Colour,
    Projection,
    DisplayUnit,
    Interlaced,
    FieldOrder,
    StereoMode,

    // Colour
    MatrixCoefficients,
    BitsPerChannel,
    ChromaSubHorz,
    ChromaSubVert,
    CbSubHorz,
    CbSubVert,
    ChromaSitingHorz,
    ChromaSitingVert,
    Range,
    TransferCharacteristics,
    Primaries,
    MaxCll,
    MaxFall,
    MasteringMeta,

    // Mastering metadata
    RedX,
    RedY,
    GreenX,
    GreenY,
    BlueX,
    BlueY,
    WhiteX,
    WhiteY,
    MinLuminance,
    MaxLuminance,

    // Projection
    ProjectionType,
    ProjectionPrivate,
    Yaw,
    Pitch,
    Roll,

    // Audio
    SampleRate,
    OutSampleRate,
    BitDepth,
    Channels,

    // ContentEncoding
    EncodingScope,
    EncodingType,
    Compression,
    Encryption,
    CompressionAlgo,
    CompressionSettings,
    EncryptionAlgo,
    EncryptionKeyId,

    // TrackOperation
    CombinePlanes,
    PlaneUid,
    PlaneType,

    // AttachedFile
    FileUid,
    FileName,
    FileMimeType,
    FileData,

    // ChapterAtom
    ChapterStart,
    ChapterEnd,
    ChapterUid,
    ChapterTitle,

    // CuePoint
    CueTime,
    CuePositions,
    CueTrack,
    CueClusterPosition,

    // Tag
    TagTargets,
    SimpleTags,
    TagName,
    TagString,
    TagLanguage,
    TagDefault,
    TargetType,
    TargetTypeValue,
    TargetTrackUid,
    TargetChapterUid,
    TargetAttachUid,

    // Seek
    SeekId,
    SeekPosition,

    // Cluster
    Clusters,
    ClusterTimecode,
    Blocks,
    BlockData,
    BlockDuration,
    BlockReference,
    NonSimple,
    AdditionalId,
    Additional,
    DiscardPadding,
}

/// Typed mutable access to one field of a record.
pub enum Slot<'a> {
    UInt(&'a mut u64),
    SInt(&'a mut i64),
    Float(&'a mut f64),
    Str(&'a mut Option<String>),
    Binary(&'a mut Binary),
    Record(&'a mut dyn Record),
    List(&'a mut dyn RecordList),
}

/// A destination the engine can write parsed elements into.
pub trait Record {
    /// Return the slot for `field`, or `None` if this record has no such field.
    fn slot(&mut self, field: Field) -> Option<Slot<'_>>;
}

/// A growable list of records, filled by repeated schema nodes.
pub trait RecordList {
    /// Append a default element and return it.
    fn push_default(&mut self) -> &mut dyn Record;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Record + Default + 'static> RecordList for Vec<T> {
    fn push_default(&mut self) -> &mut dyn Record {
        self.push(T::default());
        let last = self.len() - 1;
        &mut self[last]
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// One schema node.
#[derive(Debug, Clone, Copy)]
pub struct Syntax {
    pub id: u32,
    pub kind: ElementKind,
    /// Every occurrence appends a new element to the list named by `field`.
    pub repeated: bool,
    pub field: Field,
    pub default: DefaultValue,
}

impl Syntax {
    const fn new(id: u32, kind: ElementKind, field: Field) -> Self {
        Self {
            id,
            kind,
            repeated: false,
            field,
            default: DefaultValue::None,
        }
    }

    pub const fn uint(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::UInt, field)
    }

    pub const fn sint(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::SInt, field)
    }

    pub const fn float(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::Float, field)
    }

    pub const fn string(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::Str, field)
    }

    pub const fn utf8(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::Utf8, field)
    }

    pub const fn binary(id: u32, field: Field) -> Self {
        Self::new(id, ElementKind::Binary, field)
    }

    pub const fn nest(id: u32, children: &'static [Syntax], field: Field) -> Self {
        Self::new(id, ElementKind::Nest(children), field)
    }

    pub const fn level1(id: u32, children: &'static [Syntax], field: Field) -> Self {
        Self::new(id, ElementKind::Level1(children), field)
    }

    pub const fn pass(id: u32, children: &'static [Syntax], field: Field) -> Self {
        Self::new(id, ElementKind::Pass(children), field)
    }

    pub const fn stop(id: u32) -> Self {
        Self::new(id, ElementKind::Stop, Field::Inline)
    }

    pub const fn skip(id: u32) -> Self {
        Self::new(id, ElementKind::None, Field::Inline)
    }

    pub const fn repeated(self) -> Self {
        Self {
            repeated: true,
            ..self
        }
    }

    pub const fn default_uint(self, value: u64) -> Self {
        Self {
            default: DefaultValue::UInt(value),
            ..self
        }
    }

    pub const fn default_sint(self, value: i64) -> Self {
        Self {
            default: DefaultValue::SInt(value),
            ..self
        }
    }

    pub const fn default_float(self, value: f64) -> Self {
        Self {
            default: DefaultValue::Float(value),
            ..self
        }
    }

    pub const fn default_str(self, value: &'static str) -> Self {
        Self {
            default: DefaultValue::Str(value),
            ..self
        }
    }
}

/// Find the node for `id` in `schema`.
pub fn find(schema: &'static [Syntax], id: u32) -> Option<&'static Syntax> {
    schema.iter().find(|s| s.id == id)
}
