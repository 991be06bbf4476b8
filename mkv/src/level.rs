use log::warn;

use crate::error::{MkvError, Result};
use crate::ids;

/// Maximum nesting of master elements.
pub const MAX_DEPTH: usize = 16;

/// Maximum number of tracked top-level elements.
///
/// Every SeekHead gets its own entry, so this also bounds how far a circular
/// chain of SeekHeads can be followed.
pub const MAX_LEVEL1_ELEMENTS: usize = 64;

/// Extent of an open master element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelLength {
    Known(u64),
    /// Length field had every value bit set.
    Unknown,
    /// Placeholder pushed while parsing a SeekHead target out of order; never
    /// ends on its own.
    #[default]
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Level {
    /// Offset of the first payload byte.
    pub start: u64,
    pub length: LevelLength,
}

/// Fixed-capacity stack of open masters.
#[derive(Debug, Default)]
pub struct LevelStack {
    levels: [Level; MAX_DEPTH],
    depth: usize,
}

impl LevelStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level) -> Result<()> {
        let Some(slot) = self.levels.get_mut(self.depth) else {
            return Err(MkvError::DepthExceeded { depth: MAX_DEPTH });
        };
        *slot = level;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Level> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        Some(self.levels[self.depth])
    }

    pub fn top(&self) -> Option<&Level> {
        self.depth.checked_sub(1).map(|i| &self.levels[i])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Drop levels above `depth`.
    pub fn truncate(&mut self, depth: usize) {
        self.depth = self.depth.min(depth);
    }

    pub fn clear(&mut self) {
        self.depth = 0;
    }
}

/// A top-level element seen in the Segment, either parsed in place or
/// referenced from a SeekHead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Level1Element {
    pub id: u32,
    /// Offset relative to the Segment payload start, when known from a SeekHead.
    pub position: u64,
    pub parsed: bool,
}

#[derive(Debug, Default)]
pub struct Level1Table {
    elements: Vec<Level1Element>,
}

impl Level1Table {
    pub fn new() -> Self {
        Self {
            elements: Vec::with_capacity(MAX_LEVEL1_ELEMENTS),
        }
    }

    /// Index of the entry for `id`, creating one if needed.
    ///
    /// Returns `Ok(None)` for IDs that are never tracked: malformed IDs and
    /// Clusters (some muxers index every cluster). SeekHeads always get a fresh
    /// entry since a file may contain several.
    pub fn find_or_insert(&mut self, id: u32) -> Result<Option<usize>> {
        if !ids::is_valid_id(id) || id == ids::CLUSTER {
            return Ok(None);
        }

        if id != ids::SEEKHEAD {
            if let Some(i) = self.elements.iter().position(|e| e.id == id) {
                return Ok(Some(i));
            }
        }

        if self.elements.len() >= MAX_LEVEL1_ELEMENTS {
            return Err(MkvError::TooManyTopLevelElements { id });
        }

        self.elements.push(Level1Element {
            id,
            ..Default::default()
        });
        Ok(Some(self.elements.len() - 1))
    }

    /// Like [`find_or_insert`](Self::find_or_insert), but a full table is
    /// logged and treated as "not tracked".
    pub fn lookup(&mut self, id: u32) -> Option<usize> {
        match self.find_or_insert(id) {
            Ok(idx) => idx,
            Err(e) => {
                warn!("{e}");
                None
            }
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Level1Element> {
        self.elements.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Level1Element> {
        self.elements.get_mut(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level1Element> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
