use std::io::{Read, Seek};

use log::{debug, warn};

use crate::error::Result;
use crate::ids;
use crate::level::{Level, LevelLength};
use crate::model::Segment;
use crate::parser::{EbmlParser, Status};
use crate::schema;

impl<R: Read + Seek> EbmlParser<R> {
    /// Parse the element at `position` (relative to the Segment payload) with
    /// the Segment schema, then restore the reader, the level stack and the
    /// buffered ID exactly as they were.
    pub fn parse_seekhead_entry(&mut self, position: u64, segment: &mut Segment) -> Result<Status> {
        let saved_depth = self.levels.depth();
        let saved_id = self.current_id;
        let before = self.position()?;

        let result = self.parse_detached(position, segment);

        self.levels.truncate(saved_depth);
        self.seek(before)?;
        self.current_id = saved_id;

        result
    }

    fn parse_detached(&mut self, position: u64, segment: &mut Segment) -> Result<Status> {
        let offset = self.segment_start.saturating_add(position);
        self.seek(offset)?;

        // Keeps whatever level the caller is in from being closed by the
        // out-of-order element.
        self.levels.push(Level {
            start: 0,
            length: LevelLength::Detached,
        })?;
        self.current_id = None;

        debug!("parsing seek target at 0x{offset:X}");
        self.parse(&schema::SEGMENT, segment)
    }

    /// Follow every SeekHead entry to a top-level element not yet parsed.
    ///
    /// Cues are only recorded here and parsed on demand. A failed target marks
    /// the index broken and ends resolution.
    pub fn execute_seekhead(&mut self, segment: &mut Segment) {
        // Resolving a SeekHead may append further entries.
        let mut i = 0;
        while i < segment.seekhead.len() {
            let entry = &segment.seekhead[i];
            let (target, position) = (entry.id, entry.position);
            i += 1;

            let Ok(id) = u32::try_from(target) else {
                continue;
            };
            let Some(idx) = self.level1.lookup(id) else {
                continue;
            };
            let Some(elem) = self.level1.get_mut(idx) else {
                continue;
            };
            if elem.parsed {
                continue;
            }
            elem.position = position;

            if id == ids::CUES {
                debug!("deferring Cues at segment offset {position}");
                continue;
            }

            if let Err(e) = self.parse_seekhead_entry(position, segment) {
                warn!(
                    "failed to parse {} via SeekHead, index is broken: {e}",
                    ids::name(id).unwrap_or("element")
                );
                self.index_broken = true;
                break;
            }

            if let Some(elem) = self.level1.get_mut(idx) {
                elem.parsed = true;
            }
        }
    }

    /// Parse Cues elements that were deferred by [`execute_seekhead`](Self::execute_seekhead).
    pub fn parse_cues(&mut self, segment: &mut Segment) {
        for idx in 0..self.level1.len() {
            let Some(elem) = self.level1.get(idx).copied() else {
                continue;
            };
            if elem.id != ids::CUES || elem.parsed {
                continue;
            }

            if self.index_broken {
                debug!("index broken, not seeking to deferred Cues");
            } else if let Err(e) = self.parse_seekhead_entry(elem.position, segment) {
                warn!("failed to parse deferred Cues: {e}");
                self.index_broken = true;
            }

            if let Some(elem) = self.level1.get_mut(idx) {
                elem.parsed = true;
            }
        }
    }
}
