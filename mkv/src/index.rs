use log::debug;

use crate::model::Segment;

/// A seek point: a time and the absolute byte offsets of the clusters
/// holding it, one per indexed track.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexEntry {
    /// Segment timecode ticks.
    pub time: u64,
    pub positions: Vec<IndexPosition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexPosition {
    pub track: u64,
    /// Absolute file offset of the Cluster.
    pub byte_offset: u64,
}

impl IndexEntry {
    /// Entry time in nanoseconds given the segment's `time_scale`.
    pub fn time_ns(&self, time_scale: u64) -> u64 {
        self.time.saturating_mul(time_scale)
    }
}

/// Convert the segment's Cue points into index entries.
///
/// A single cue point is not a usable index, so fewer than two yield
/// nothing. Positions for tracks that do not exist are dropped.
pub fn build_index(segment: &Segment, segment_start: u64) -> Vec<IndexEntry> {
    if segment.cues.len() < 2 {
        debug!("{} cue points, no index", segment.cues.len());
        return Vec::new();
    }

    let entries: Vec<IndexEntry> = segment
        .cues
        .iter()
        .filter_map(|cue| {
            let positions: Vec<IndexPosition> = cue
                .positions
                .iter()
                .filter(|p| segment.find_track(p.track).is_some())
                .map(|p| IndexPosition {
                    track: p.track,
                    byte_offset: p.cluster_position.saturating_add(segment_start),
                })
                .collect();
            (!positions.is_empty()).then_some(IndexEntry {
                time: cue.time,
                positions,
            })
        })
        .collect();

    debug!("built {} index entries from {} cue points", entries.len(), segment.cues.len());
    entries
}
