//! Schema-driven recursive descent over EBML elements.
//!
//! The engine keeps one buffered element ID. An ID is read, matched against
//! the current schema table, and cleared once its length has been consumed.
//! An ID that stays buffered signals the end of every enclosing level up to
//! whoever can handle it; this is how an unknown-length Cluster ends when the
//! next Cluster starts, and how a resync hands its found ID to the caller.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, trace, warn};

use crate::ebml::{self, UNKNOWN_LENGTH};
use crate::error::{MkvError, Result};
use crate::ids;
use crate::level::{Level, Level1Table, LevelLength, LevelStack};
use crate::syntax::{self, DefaultValue, ElementKind, Field, Record, Slot, Syntax};

/// Outcome of parsing one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep going.
    Continue,
    /// A `Stop` node was hit or no further element could be read.
    Stop,
}

/// Parser state shared by the header, SeekHead and cluster passes.
pub struct EbmlParser<R> {
    pub(crate) reader: R,
    pub(crate) levels: LevelStack,
    pub(crate) level1: Level1Table,
    pub(crate) current_id: Option<u32>,
    /// Offset of the first byte of the Segment payload; SeekHead and Cue
    /// positions are relative to it.
    pub(crate) segment_start: u64,
    /// Set when SeekHead or deferred Cues resolution failed.
    pub(crate) index_broken: bool,
}

impl<R: Read + Seek> EbmlParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            levels: LevelStack::new(),
            level1: Level1Table::new(),
            current_id: None,
            segment_start: 0,
            index_broken: false,
        }
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn segment_start(&self) -> u64 {
        self.segment_start
    }

    pub fn current_id(&self) -> Option<u32> {
        self.current_id
    }

    pub fn depth(&self) -> usize {
        self.levels.depth()
    }

    pub fn level1(&self) -> &Level1Table {
        &self.level1
    }

    pub fn is_index_broken(&self) -> bool {
        self.index_broken
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Parse one element against `schema`, reading its ID first unless one
    /// is already buffered. Failing to read an ID ends the parse quietly.
    pub fn parse(&mut self, schema: &'static [Syntax], dest: &mut dyn Record) -> Result<Status> {
        let id = match self.current_id {
            Some(id) => id,
            None => match ebml::read_id(&mut self.reader) {
                Ok(id) => {
                    self.current_id = Some(id);
                    id
                }
                Err(e) => {
                    trace!("no further element: {e}");
                    return Ok(Status::Stop);
                }
            },
        };
        self.parse_id(schema, id, dest)
    }

    fn parse_id(&mut self, schema: &'static [Syntax], id: u32, dest: &mut dyn Record) -> Result<Status> {
        if let Some(node) = syntax::find(schema, id) {
            return self.parse_element(node, dest);
        }

        // A Cluster ID where none is expected ends an open unknown-length
        // master. Leave the ID buffered for the level above.
        if id == ids::CLUSTER
            && self
                .levels
                .top()
                .is_some_and(|l| l.length == LevelLength::Unknown)
        {
            return Ok(Status::Continue);
        }

        self.skip_element(id)
    }

    fn skip_element(&mut self, id: u32) -> Result<Status> {
        self.current_id = None;
        let offset = self.position()?;
        let length = ebml::read_length(&mut self.reader)?;
        if length == UNKNOWN_LENGTH {
            return Err(MkvError::UnknownLength { id, offset });
        }
        trace!("skipping 0x{id:X} ({length} bytes) at 0x{offset:X}");
        ebml::skip(&mut self.reader, length)?;
        Ok(Status::Continue)
    }

    fn parse_element(&mut self, node: &'static Syntax, dest: &mut dyn Record) -> Result<Status> {
        if node.repeated {
            let Some(Slot::List(list)) = dest.slot(node.field) else {
                return Err(MkvError::FieldMismatch { id: node.id });
            };
            let elem = list.push_default();
            return self.parse_value(node, elem, true);
        }
        self.parse_value(node, dest, false)
    }

    fn parse_value(&mut self, node: &'static Syntax, dest: &mut dyn Record, in_list: bool) -> Result<Status> {
        let id = node.id;

        match node.kind {
            ElementKind::Stop => return Ok(Status::Stop),
            ElementKind::Pass(children) => {
                let target = nested_target(node, dest, in_list)?;
                return self.parse_id(children, id, target);
            }
            _ => {}
        }

        self.current_id = None;
        let offset = self.position()?;
        let length = ebml::read_length(&mut self.reader)?;
        if let Some(max) = node.kind.max_length() {
            if length > max {
                return Err(MkvError::SchemaLimitExceeded { id, length, max });
            }
        }
        trace!(
            "0x{id:X} {} ({length} bytes) at 0x{offset:X}",
            ids::name(id).unwrap_or("?")
        );

        match node.kind {
            ElementKind::Nest(children) | ElementKind::Level1(children) => {
                self.read_master(length)?;
                if id == ids::SEGMENT {
                    self.segment_start = self.position()?;
                    debug!("segment payload starts at 0x{:X}", self.segment_start);
                }
                if id == ids::CUES {
                    self.index_broken = false;
                }
                if matches!(node.kind, ElementKind::Level1(_)) {
                    self.mark_level1_parsed(id);
                }
                let target = nested_target(node, dest, in_list)?;
                self.parse_nest(children, target)
            }
            ElementKind::None | ElementKind::Stop | ElementKind::Pass(_) => {
                if length == UNKNOWN_LENGTH {
                    return Err(MkvError::UnknownLength { id, offset });
                }
                ebml::skip(&mut self.reader, length)?;
                Ok(Status::Continue)
            }
            _ if in_list => Err(MkvError::FieldMismatch { id }),
            _ => {
                self.read_scalar(node, dest, length)?;
                Ok(Status::Continue)
            }
        }
    }

    fn mark_level1_parsed(&mut self, id: u32) {
        let Some(idx) = self.level1.lookup(id) else {
            return;
        };
        if let Some(elem) = self.level1.get_mut(idx) {
            if elem.parsed {
                warn!("duplicate top-level element 0x{id:X} {}", ids::name(id).unwrap_or("?"));
            }
            elem.parsed = true;
        }
    }

    fn read_scalar(&mut self, node: &Syntax, dest: &mut dyn Record, length: u64) -> Result<()> {
        let reader = &mut self.reader;
        match (node.kind, dest.slot(node.field)) {
            (ElementKind::UInt, Some(Slot::UInt(v))) => *v = ebml::read_uint(reader, length)?,
            (ElementKind::SInt, Some(Slot::SInt(v))) => *v = ebml::read_sint(reader, length)?,
            (ElementKind::Float, Some(Slot::Float(v))) => *v = ebml::read_float(reader, length)?,
            (ElementKind::Str | ElementKind::Utf8, Some(Slot::Str(v))) => {
                *v = Some(ebml::read_ascii(reader, length)?)
            }
            (ElementKind::Binary, Some(Slot::Binary(v))) => match ebml::read_binary(reader, length) {
                Ok(bin) => *v = bin,
                Err(e) => {
                    v.clear();
                    return Err(e);
                }
            },
            _ => return Err(MkvError::FieldMismatch { id: node.id }),
        }
        Ok(())
    }

    /// Open a master element starting at the current offset.
    pub fn read_master(&mut self, length: u64) -> Result<()> {
        let start = self.position()?;
        let length = if length == UNKNOWN_LENGTH {
            LevelLength::Unknown
        } else {
            LevelLength::Known(length)
        };
        self.levels.push(Level { start, length })
    }

    /// Apply defaults, then parse children until the level ends or a child
    /// stops the parse.
    pub fn parse_nest(&mut self, schema: &'static [Syntax], dest: &mut dyn Record) -> Result<Status> {
        apply_defaults(schema, dest)?;

        let mut status = Status::Continue;
        while status == Status::Continue && !self.level_is_exhausted()? {
            status = self.parse(schema, dest)?;
        }
        Ok(status)
    }

    /// True (and the innermost level is closed) once the offset has reached
    /// the end of a known-length level, or when an ID is buffered.
    pub fn level_is_exhausted(&mut self) -> Result<bool> {
        let pos = self.position()?;
        let Some(level) = self.levels.top() else {
            return Ok(false);
        };
        let reached_end = match level.length {
            LevelLength::Known(length) => pos.saturating_sub(level.start) >= length,
            LevelLength::Unknown | LevelLength::Detached => false,
        };
        if reached_end || self.current_id.is_some() {
            self.levels.pop();
            return Ok(true);
        }
        Ok(false)
    }

    /// Scan forward from `last_pos + 1` for the next top-level element ID.
    ///
    /// On success the ID is buffered and the reader sits just after it.
    pub fn resync(&mut self, last_pos: u64) -> Result<()> {
        self.current_id = None;
        self.levels.clear();

        let start = last_pos.saturating_add(1);
        self.seek(start)?;

        let mut window: u32 = 0;
        let mut seen = 0usize;
        let mut byte = [0u8; 1];
        loop {
            if let Err(e) = self.reader.read_exact(&mut byte) {
                return match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => Err(MkvError::Unrecoverable { offset: last_pos }),
                    _ => Err(MkvError::Io(e)),
                };
            }
            window = (window << 8) | u32::from(byte[0]);
            seen += 1;

            if seen >= 4 && ids::RESYNC_IDS.contains(&window) {
                let at = start + seen as u64 - 4;
                debug!(
                    "resynced on {} at 0x{at:X}",
                    ids::name(window).unwrap_or("?")
                );
                self.current_id = Some(window);
                return Ok(());
            }
        }
    }
}

/// The record a master element's children are written into.
fn nested_target<'a>(node: &Syntax, dest: &'a mut dyn Record, in_list: bool) -> Result<&'a mut dyn Record> {
    if in_list || node.field == Field::Inline {
        return Ok(dest);
    }
    match dest.slot(node.field) {
        Some(Slot::Record(record)) => Ok(record),
        _ => Err(MkvError::FieldMismatch { id: node.id }),
    }
}

/// Reset every scalar field named by `schema` to its default. Numbers without
/// a declared default become zero; strings without one are left alone.
fn apply_defaults(schema: &[Syntax], dest: &mut dyn Record) -> Result<()> {
    for node in schema {
        if node.repeated || !node.kind.is_scalar() {
            continue;
        }
        let Some(slot) = dest.slot(node.field) else {
            return Err(MkvError::FieldMismatch { id: node.id });
        };
        match (slot, node.default) {
            (Slot::UInt(v), DefaultValue::UInt(d)) => *v = d,
            (Slot::UInt(v), _) => *v = 0,
            (Slot::SInt(v), DefaultValue::SInt(d)) => *v = d,
            (Slot::SInt(v), _) => *v = 0,
            (Slot::Float(v), DefaultValue::Float(d)) => *v = d,
            (Slot::Float(v), _) => *v = 0.0,
            (Slot::Str(v), DefaultValue::Str(d)) => *v = Some(d.to_string()),
            (Slot::Str(_), _) => {}
            _ => return Err(MkvError::FieldMismatch { id: node.id }),
        }
    }
    Ok(())
}
