//! Per-step sequence memory phases.
//!
//! One step of the sequence memory is, in order:
//!
//! 1. [`Layer::time_step`] - refill the learning cache, then move every "now"
//!    state into "previous";
//! 2. [`Layer::compute_active_state`] - decide which cells of the active
//!    columns fire and which one learns, using last step's predictions;
//! 3. [`Layer::compute_predictive_state`] - mark cells whose segments see
//!    enough active cells now, queueing their synapses;
//! 4. [`Layer::update_synapses`] - commit queued updates: reward learning
//!    cells, punish cells that predicted but stayed silent.
//!
//! The spatial pooler selects the active columns between steps 1 and 2.

use crate::cell::{CellFlag, Moment};
use crate::layer::Layer;
use crate::params::SM_SEGMENT_DUTY_CYCLE_DECAY;
use crate::segment::SegmentHandle;

impl Layer {
    /// Compute the active and learning state of every cell.
    ///
    /// In an active column, cells that were predicting through a segment active
    /// at the previous step fire; if none were, the whole column bursts. With
    /// temporal learning, a cell whose winning segment also tracked the
    /// previous learning cells learns; otherwise the best-matching segment of
    /// the column (or a new one) is chosen and queued for growth.
    pub fn compute_active_state(&mut self) {
        let cells = self.params.cells_per_column;
        let learn = self.params.temporal_learning_enabled;

        for c in 0..self.columns.len() {
            let column = &mut self.columns[c];
            let was_predicting = column.predicting.previous;
            if !column.active.now {
                column.mispredicted = was_predicting;
                continue;
            }
            column.predicted = was_predicting;
            column.unpredicted = !was_predicting;

            let mut predicted = false;
            let mut chosen = false;
            for i in 0..cells {
                if !self.columns[c].cells[i].check(Moment::Previous, CellFlag::Predicting) {
                    continue;
                }
                let Some(h) = self.get_active_segment(c, i, Moment::Previous, CellFlag::Active) else {
                    continue;
                };

                predicted = true;
                self.columns[c].cells[i].set(CellFlag::Active);

                if learn && self.check_segment_state(h, Moment::Previous, CellFlag::Learning, true) {
                    chosen = true;
                    self.columns[c].cells[i].set(CellFlag::Learning);
                }
            }

            if !predicted {
                for cell in self.columns[c].cells.iter_mut() {
                    cell.set(CellFlag::Active);
                }
            }

            if learn && !chosen {
                let best = self
                    .get_best_matching_segment(c, Moment::Previous)
                    .or_else(|| self.add_new_segment(c));
                if let Some(h) = best {
                    self.queue_learning_segment(h);
                }
            }
        }
    }

    /// Make the owner of `h` learn and queue `h` for growth.
    fn queue_learning_segment(&mut self, h: SegmentHandle) {
        self.columns[h.column].cells[h.cell].set(CellFlag::Learning);
        self.get_segment_active_synapses(h, Moment::Previous, true);
        self.segments.get_mut(h).sequence_update_queued = true;
    }

    /// Compute the predictive state of every cell from current activity.
    ///
    /// A segment fires when its connected synapses see at least
    /// `segment_activation_threshold` cells active now. With temporal learning
    /// its active synapses are queued (no growth) and its duty cycle decays.
    pub fn compute_predictive_state(&mut self) {
        let learn = self.params.temporal_learning_enabled;

        for c in 0..self.columns.len() {
            for i in 0..self.params.cells_per_column {
                let count = self.columns[c].cells[i].segment_count();
                for slot in 0..count {
                    let h = SegmentHandle::new(c, i, slot);
                    if !self.check_segment_state(h, Moment::Now, CellFlag::Active, true) {
                        continue;
                    }

                    self.columns[c].cells[i].set(CellFlag::Predicting);
                    self.columns[c].predicting.now = true;

                    let segment = self.segments.get_mut(h);
                    segment.active = true;
                    if learn {
                        segment.active_duty_cycle =
                            (segment.active_duty_cycle - SM_SEGMENT_DUTY_CYCLE_DECAY).max(0.0);
                        self.get_segment_active_synapses(h, Moment::Now, false);
                    }
                }
            }
        }
    }

    /// Commit queued distal updates.
    ///
    /// Learning cells are reinforced; cells that were predicting but are not
    /// active now are punished.
    pub fn update_synapses(&mut self) {
        if !self.params.temporal_learning_enabled {
            return;
        }

        for c in 0..self.columns.len() {
            for i in 0..self.params.cells_per_column {
                let cell = &self.columns[c].cells[i];
                if cell.check(Moment::Now, CellFlag::Learning) {
                    self.adapt_segments(c, i, true);
                } else if !cell.check(Moment::Now, CellFlag::Active)
                    && cell.check(Moment::Previous, CellFlag::Predicting)
                {
                    self.adapt_segments(c, i, false);
                }
            }
        }
    }

    /// Advance time by one step.
    ///
    /// The learning cache is rebuilt from the cells learning now before any
    /// state moves; then every column, cell and live segment shifts its "now"
    /// state into "previous".
    pub fn time_step(&mut self) {
        self.reset_learning_cache();
        self.fill_learning_cache();

        for (c, column) in self.columns.iter_mut().enumerate() {
            column.shift();
            for (i, cell) in column.cells.iter_mut().enumerate() {
                let count = cell.segment_count();
                for segment in self.segments.cell_segments_mut(c, i, count) {
                    segment.shift();
                }
                cell.shift();
            }
        }

        self.iteration += 1;
    }
}
