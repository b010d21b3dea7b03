//! Segment - distal dendrites and the arena that holds them.
//!
//! All segments of a layer are preallocated in one flat [`SegmentArena`] sized
//! `columns × cells_per_column × segments_per_cell`. A cell's segments are the
//! first `segment_count` slots of its slice; slots are only ever appended, up
//! to `segments_per_cell`, and never removed.
//!
//! # Layout
//!
//! ```text
//! column 0                         column 1
//! +--------------+--------------+  +--------------+---
//! | cell 0       | cell 1       |  | cell 0       |
//! | s0 s1 .. sN  | s0 s1 .. sN  |  | s0 s1 .. sN  | ...
//! +--------------+--------------+  +--------------+---
//! ```
//!
//! Callers address segments with a typed [`SegmentHandle`]; raw arena offsets
//! stay private to this module.

use crate::params::SYNAPSE_CONNECTED_PERMANENCE;
use crate::synapse::{Synapse, SynapseTarget};
use crate::utils::{rand_index, rand_real};
use rand::Rng;

/// Typed address of a segment: `(column, cell, slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentHandle {
    pub column: usize,
    pub cell: usize,
    pub slot: usize,
}

impl SegmentHandle {
    #[inline]
    pub fn new(column: usize, cell: usize, slot: usize) -> Self {
        Self { column, cell, slot }
    }
}

/// Flat arena offset of `(column, cell, slot)`.
#[inline]
pub fn segment_index(
    column: usize,
    cell: usize,
    slot: usize,
    cells_per_column: usize,
    segments_per_cell: usize,
) -> usize {
    (column * cells_per_column + cell) * segments_per_cell + slot
}

/// One distal dendrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Fixed-size synapse pool
    pub synapses: Vec<Synapse>,
    pub active_duty_cycle: f32,
    /// Never raised by the current learning rules; kept for reporting
    pub sequence_segment: bool,
    /// Queued for growth by the active-state phase
    pub sequence_update_queued: bool,
    /// Not yet positively reinforced
    pub new_segment: bool,
    /// Fired during the current step's predictive phase
    pub active: bool,
    /// Fired during the previous step
    pub predicting: bool,
    /// Punished by negative reinforcement in the current step
    pub mispredicted: bool,
    /// Index of the owning cell within its column
    pub parent_cell: usize,
    /// Layer iteration at which the segment was grown
    pub created_at: u64,
}

impl Segment {
    /// Create an empty segment with `pool` synapses.
    pub fn new(pool: usize) -> Self {
        Self {
            synapses: vec![Synapse::default(); pool],
            active_duty_cycle: 0.0,
            sequence_segment: false,
            sequence_update_queued: false,
            new_segment: false,
            active: false,
            predicting: false,
            mispredicted: false,
            parent_cell: 0,
            created_at: 0,
        }
    }

    /// Reinitialize the segment for a freshly claimed slot.
    ///
    /// Synapses get random targets among `columns × cells_per_column` cells and
    /// permanences scattered around the connected threshold.
    pub fn reset<R: Rng>(
        &mut self,
        parent_cell: usize,
        created_at: u64,
        columns: usize,
        cells_per_column: usize,
        rng: &mut R,
    ) {
        self.active_duty_cycle = 0.1 + rand_real(0.0, 0.9, rng);
        self.sequence_segment = false;
        self.sequence_update_queued = false;
        self.new_segment = true;
        self.active = false;
        self.predicting = false;
        self.mispredicted = false;
        self.parent_cell = parent_cell;
        self.created_at = created_at;

        for syn in self.synapses.iter_mut() {
            let permanence = SYNAPSE_CONNECTED_PERMANENCE - 0.1 + rand_real(0.0, 0.2, rng);
            let target = SynapseTarget::new(
                rand_index(columns, rng),
                rand_index(cells_per_column, rng),
            );
            *syn = Synapse::new(target, permanence);
        }
    }

    /// Clear per-step flags and remember whether the segment fired.
    #[inline]
    pub fn shift(&mut self) {
        self.predicting = self.active;
        self.active = false;
        self.mispredicted = false;
    }

    /// Approximate heap + inline size in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.synapses.capacity() * std::mem::size_of::<Synapse>()
    }
}

/// Fixed-capacity store of every segment in a layer.
#[derive(Debug, Clone)]
pub struct SegmentArena {
    segments: Vec<Segment>,
    columns: usize,
    cells_per_column: usize,
    segments_per_cell: usize,
}

impl SegmentArena {
    /// Preallocate every slot.
    pub fn new(
        columns: usize,
        cells_per_column: usize,
        segments_per_cell: usize,
        synapses_per_segment: usize,
    ) -> Self {
        let slots = columns * cells_per_column * segments_per_cell;
        Self {
            segments: vec![Segment::new(synapses_per_segment); slots],
            columns,
            cells_per_column,
            segments_per_cell,
        }
    }

    #[inline]
    fn offset(&self, h: SegmentHandle) -> usize {
        assert!(h.column < self.columns, "segment column out of bounds");
        assert!(h.cell < self.cells_per_column, "segment cell out of bounds");
        assert!(h.slot < self.segments_per_cell, "segment slot out of bounds");
        segment_index(
            h.column,
            h.cell,
            h.slot,
            self.cells_per_column,
            self.segments_per_cell,
        )
    }

    /// Segment at a handle.
    #[inline]
    pub fn get(&self, h: SegmentHandle) -> &Segment {
        &self.segments[self.offset(h)]
    }

    /// Mutable segment at a handle.
    #[inline]
    pub fn get_mut(&mut self, h: SegmentHandle) -> &mut Segment {
        let i = self.offset(h);
        &mut self.segments[i]
    }

    /// The first `count` slots of a cell.
    pub fn cell_segments(&self, column: usize, cell: usize, count: usize) -> &[Segment] {
        let beg = self.offset(SegmentHandle::new(column, cell, 0));
        &self.segments[beg..beg + count.min(self.segments_per_cell)]
    }

    /// Mutable view of the first `count` slots of a cell.
    pub fn cell_segments_mut(&mut self, column: usize, cell: usize, count: usize) -> &mut [Segment] {
        let beg = self.offset(SegmentHandle::new(column, cell, 0));
        let end = beg + count.min(self.segments_per_cell);
        &mut self.segments[beg..end]
    }

    /// Total number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.segments.len()
    }

    /// Slots per cell.
    #[inline]
    pub fn segments_per_cell(&self) -> usize {
        self.segments_per_cell
    }

    /// Approximate memory footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.segments.iter().map(Segment::memory_usage).sum::<usize>()
    }
}
