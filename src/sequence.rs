//! Segment-level sequence memory operations.
//!
//! These are the building blocks the per-step phases in [`crate::cla`] are
//! made of: measuring segment activation, choosing segments, growing new ones,
//! queueing and committing distal synapse updates, and refilling the learning
//! cache. Every randomized scan draws from the layer's own generator.

use crate::cell::{CellFlag, Moment};
use crate::column::Column;
use crate::layer::Layer;
use crate::segment::{Segment, SegmentHandle};
use crate::synapse::{Synapse, SynapseTarget};
use crate::utils::{permanence_update, rand_index};
use tracing::trace;

/// Number of non-fresh synapses whose target cell has `flag` set at `when`.
///
/// With `only_connected`, synapses below the connected threshold are skipped.
pub fn segment_activation_level(
    columns: &[Column],
    segment: &Segment,
    when: Moment,
    flag: CellFlag,
    only_connected: bool,
) -> usize {
    segment
        .synapses
        .iter()
        .filter(|s| !s.fresh && (!only_connected || s.is_connected()))
        .filter(|s| columns[s.target.column].cells[s.target.cell].check(when, flag))
        .count()
}

impl Layer {
    /// Activation of the segment at `h`.
    #[inline]
    pub fn segment_activation(
        &self,
        h: SegmentHandle,
        when: Moment,
        flag: CellFlag,
        only_connected: bool,
    ) -> usize {
        segment_activation_level(&self.columns, self.segments.get(h), when, flag, only_connected)
    }

    /// Does the segment at `h` reach the activation threshold?
    #[inline]
    pub fn check_segment_state(
        &self,
        h: SegmentHandle,
        when: Moment,
        flag: CellFlag,
        only_connected: bool,
    ) -> bool {
        self.segment_activation(h, when, flag, only_connected)
            >= self.params.segment_activation_threshold
    }

    /// Grow a segment on the cell of column `c` with the fewest segments.
    ///
    /// Only cells below capacity are candidates; the scan starts at a random
    /// cell and the first cell with the fewest segments wins. Returns `None`
    /// when every cell is full.
    pub fn add_new_segment(&mut self, c: usize) -> Option<SegmentHandle> {
        let cells = self.params.cells_per_column;
        let capacity = self.params.segments_per_cell;
        let start = rand_index(cells, &mut self.rng);

        let mut selected = None;
        let mut fewest = capacity;
        for k in 0..cells {
            let i = (start + k) % cells;
            let count = self.columns[c].cells[i].segment_count();
            if count < fewest {
                fewest = count;
                selected = Some(i);
            }
        }

        match selected {
            Some(i) => self.add_new_segment_to_cell(c, i),
            None => {
                trace!(column = c, "no segment slot left in column");
                None
            }
        }
    }

    /// Grow a segment on cell `i` of column `c`, `None` if the cell is full.
    pub fn add_new_segment_to_cell(&mut self, c: usize, i: usize) -> Option<SegmentHandle> {
        let cell = &mut self.columns[c].cells[i];
        if cell.segment_count() >= self.params.segments_per_cell {
            trace!(column = c, cell = i, "cell segment capacity reached");
            return None;
        }

        let slot = cell.claim_segment_slot();
        cell.segment_change = true;

        let h = SegmentHandle::new(c, i, slot);
        let columns = self.params.columns;
        let cells_per_column = self.params.cells_per_column;
        let created_at = self.iteration;
        self.segments
            .get_mut(h)
            .reset(i, created_at, columns, cells_per_column, &mut self.rng);

        Some(h)
    }

    /// Segment of column `c` best matching the activity at `when`.
    ///
    /// Counts all non-fresh synapses, connected or not. The winner must reach
    /// the activation threshold; cells and segments are scanned from random
    /// starts and the first strictly highest activation wins.
    pub fn get_best_matching_segment(&mut self, c: usize, when: Moment) -> Option<SegmentHandle> {
        let cells = self.params.cells_per_column;
        let threshold = self.params.segment_activation_threshold;
        let cell_start = rand_index(cells, &mut self.rng);

        let mut best = None;
        let mut highest = 0;
        for k in 0..cells {
            let i = (cell_start + k) % cells;
            let count = self.columns[c].cells[i].segment_count();
            if count == 0 {
                continue;
            }
            let seg_start = rand_index(count, &mut self.rng);
            for n in 0..count {
                let h = SegmentHandle::new(c, i, (seg_start + n) % count);
                let activation = self.segment_activation(h, when, CellFlag::Active, false);
                if activation > highest && activation >= threshold {
                    highest = activation;
                    best = Some(h);
                }
            }
        }
        best
    }

    /// Most active segment of cell `i` in column `c` at `when`.
    ///
    /// Only connected synapses count and the threshold must be reached. A
    /// segment flagged as a sequence segment is preferred over any other.
    pub fn get_active_segment(
        &mut self,
        c: usize,
        i: usize,
        when: Moment,
        flag: CellFlag,
    ) -> Option<SegmentHandle> {
        let count = self.columns[c].cells[i].segment_count();
        if count == 0 {
            return None;
        }
        let threshold = self.params.segment_activation_threshold;
        let start = rand_index(count, &mut self.rng);

        let mut active = None;
        let mut highest = 0;
        let mut sequence = None;
        let mut sequence_highest = 0;
        for n in 0..count {
            let h = SegmentHandle::new(c, i, (start + n) % count);
            let activation = self.segment_activation(h, when, flag, true);
            if activation < threshold {
                continue;
            }
            if self.segments.get(h).sequence_segment && activation > sequence_highest {
                sequence_highest = activation;
                sequence = Some(h);
            }
            if activation > highest {
                highest = activation;
                active = Some(h);
            }
        }
        sequence.or(active)
    }

    /// Queue the synapses of `h` whose target was active at `when`.
    ///
    /// With `new_synapses`, inactive synapses are replaced by fresh ones copied
    /// from the learning cache while fewer than `new_synapse_count` synapses are
    /// queued or grown. Growth stops quietly once the cache is empty.
    pub fn get_segment_active_synapses(
        &mut self,
        h: SegmentHandle,
        when: Moment,
        new_synapses: bool,
    ) {
        let limit = self.params.new_synapse_count;
        let segment = self.segments.get_mut(h);
        let n = segment.synapses.len();
        let start = rand_index(n, &mut self.rng);

        let mut active_count = 0;
        for k in 0..n {
            let syn = &mut segment.synapses[(start + k) % n];
            let target = syn.target;
            if self.columns[target.column].cells[target.cell].check(when, CellFlag::Active) {
                syn.update_queued = true;
                active_count += 1;
                continue;
            }

            let grown = if new_synapses && active_count < limit {
                self.learning_cache.sample(&mut self.rng)
            } else {
                None
            };
            match grown {
                Some(target) => {
                    *syn = Synapse::grown(target);
                    active_count += 1;
                }
                None => syn.update_queued = false,
            }
        }
    }

    /// Commit queued updates on every segment of cell `i` in column `c`.
    ///
    /// Positive: queued synapses gain `sm_permanence_increment`, the rest lose
    /// `sm_permanence_decrement`. Negative: queued synapses lose
    /// `sm_permanence_decrement` and are flagged mispredicted. Fresh synapses
    /// sit out one pass and lose the flag.
    ///
    /// Synapse queues survive the commit; they are rewritten only when the
    /// segment is evaluated again, so a cell that learned while predicting is
    /// still punished if that prediction fails at the next step.
    pub fn adapt_segments(&mut self, c: usize, i: usize, positive: bool) {
        let inc = self.params.sm_permanence_increment;
        let dec = self.params.sm_permanence_decrement;
        let count = self.columns[c].cells[i].segment_count();

        for segment in self.segments.cell_segments_mut(c, i, count) {
            let mut punished = false;
            for syn in segment.synapses.iter_mut() {
                let queued = syn.update_queued;
                syn.mispredicted = !positive && queued;
                if std::mem::take(&mut syn.fresh) {
                    continue;
                }
                let delta = match (positive, queued) {
                    (true, true) => inc,
                    (true, false) => -dec,
                    (false, true) => -dec,
                    (false, false) => continue,
                };
                punished |= !positive;
                permanence_update(&mut syn.permanence, delta);
            }

            if positive {
                segment.new_segment = false;
            } else if punished {
                segment.mispredicted = true;
            }
            segment.sequence_update_queued = false;
        }
    }

    /// Empty the learning cache.
    pub fn reset_learning_cache(&mut self) {
        self.learning_cache.reset();
    }

    /// Add every cell learning now to the learning cache.
    pub fn fill_learning_cache(&mut self) {
        let mut dropped = 0usize;
        for (c, column) in self.columns.iter().enumerate() {
            for (i, cell) in column.cells.iter().enumerate() {
                if cell.check(Moment::Now, CellFlag::Learning)
                    && !self.learning_cache.push(SynapseTarget::new(c, i))
                {
                    dropped += 1;
                }
            }
        }
        if dropped > 0 {
            trace!(dropped, "learning cache full");
        }
    }
}
