//! Spatial pooler phases.
//!
//! Overlap is the signed correlation `Σ (p − 0.5)(x − 0.5)` between a column's
//! proximal permanences and the binary input, so unconnected synapses on
//! active bits count against a column. Selection is a global top-k over all
//! columns; the inhibition radius is carried in the parameters but plays no
//! part. Proximal learning is driven by the dynamic reconstruction error
//! rather than by overlap alone.

use crate::error::{ClaError, Result};
use crate::layer::Layer;
use crate::synapse::Synapse;
use crate::utils::{permanence_update, rand_index, sgn};

/// Signed overlap of a proximal pool against an input vector.
#[inline]
pub fn column_overlap(synapses: &[Synapse], input: &[f32]) -> f32 {
    synapses
        .iter()
        .map(|s| (s.permanence - 0.5) * (input[s.target.column] - 0.5))
        .sum()
}

/// Reconstruction-error step for one proximal synapse input.
///
/// `|x − 0.5| · |x − r| · sgn(x − r)` for input bit `x` and reconstruction `r`.
#[inline]
fn proximal_update(x: f32, r: f32) -> f32 {
    (x - 0.5).abs() * (x - r).abs() * sgn(x - r)
}

impl Layer {
    /// Reject input vectors of the wrong length.
    pub(crate) fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.params.input_vector_length {
            return Err(ClaError::InvalidInputSize {
                expected: self.params.input_vector_length,
                actual: input.len(),
            });
        }
        Ok(())
    }

    /// Store `input` and compute every column's overlap against it.
    ///
    /// Any non-zero value counts as a set bit. Also tracks the best and worst
    /// overlap and, with spatial learning on, each column's overlap duty cycle.
    pub fn calculate_overlap(&mut self, input: &[f32]) -> Result<()> {
        self.check_input(input)?;

        for (dst, &x) in self.input.iter_mut().zip(input) {
            *dst = if x != 0.0 { 1.0 } else { 0.0 };
        }

        self.number_of_columns_active = 0;
        self.best_column_overlap = f32::NEG_INFINITY;
        self.worst_column_overlap = f32::INFINITY;

        let weight = self.params.duty_cycle_history_weight;
        let learn = self.params.spatial_learning_enabled;
        let min_overlap = self.params.min_overlap;

        for column in self.columns.iter_mut() {
            column.overlap = column_overlap(&column.synapses, &self.input);

            self.best_column_overlap = self.best_column_overlap.max(column.overlap);
            self.worst_column_overlap = self.worst_column_overlap.min(column.overlap);

            if learn {
                let hit = if column.overlap >= min_overlap { 1.0 } else { 0.0 };
                column.overlap_duty_cycle = weight * column.overlap_duty_cycle + (1.0 - weight) * hit;
            }
        }

        Ok(())
    }

    /// Select the `max_active_columns` best columns.
    ///
    /// Current activity is cleared first; exactly
    /// `min(max_active_columns, columns)` distinct columns end up active.
    pub fn inhibit_neighboring_columns(&mut self) {
        for column in self.columns.iter_mut() {
            column.active.now = false;
        }
        self.number_of_columns_active = 0;

        let budget = self.params.max_active_columns.min(self.columns.len());
        for _ in 0..budget {
            match self.find_best_active_column() {
                Some(c) => self.activate_column(c),
                None => break,
            }
        }
    }

    /// Highest-overlap column that is not yet active.
    ///
    /// The scan starts at a random column, so among equal overlaps the first
    /// one met wins.
    pub fn find_best_active_column(&mut self) -> Option<usize> {
        let n = self.columns.len();
        let start = rand_index(n, &mut self.rng);

        let mut best = None;
        let mut highest = f32::NEG_INFINITY;
        for k in 0..n {
            let c = (start + k) % n;
            let column = &self.columns[c];
            if !column.active.now && column.overlap > highest {
                highest = column.overlap;
                best = Some(c);
            }
        }
        best
    }

    /// Mark column `c` active now.
    pub fn activate_column(&mut self, c: usize) {
        assert!(c < self.columns.len(), "column index out of bounds");
        let column = &mut self.columns[c];
        if !column.active.now {
            column.active.now = true;
            self.number_of_columns_active += 1;
        }
    }

    /// Adapt proximal permanences against the dynamic reconstruction.
    ///
    /// Active columns move towards the input by
    /// `permanence_increment · multiplier · (columns − k)/columns`, inactive
    /// ones away from it by `k/columns`, where `k` is the active budget. Run
    /// [`Layer::compute_dynamic_reconstruction`] first. Without spatial learning
    /// only the permanence sums are refreshed.
    pub fn update_columns(&mut self, multiplier: f32) {
        if self.params.spatial_learning_enabled {
            let columns = self.columns.len() as f32;
            let budget = self.params.max_active_columns.min(self.columns.len()) as f32;
            let rate = self.params.permanence_increment * multiplier;
            let active_scale = rate * (columns - budget) / columns;
            let inactive_scale = -rate * budget / columns;

            let input = &self.input;
            let reconstruction = &self.dynamic_reconstruction.vector;

            for column in self.columns.iter_mut() {
                let scale = if column.active.now {
                    active_scale
                } else {
                    inactive_scale
                };
                for syn in column.synapses.iter_mut() {
                    let i = syn.target.column;
                    let update = proximal_update(input[i], reconstruction[i]);
                    permanence_update(&mut syn.permanence, scale * update);
                }
            }

            self.update_duty_cycles();
        }

        for column in self.columns.iter_mut() {
            column.sum_of_permanences = column.synapses.iter().map(|s| s.permanence).sum();
        }
        self.max_sum_of_permanences = self.get_max_sum_of_permanences();
    }

    /// Active duty cycle, minimum duty cycle and boost bookkeeping.
    fn update_duty_cycles(&mut self) {
        let weight = self.params.duty_cycle_history_weight;
        for column in self.columns.iter_mut() {
            let hit = if column.active.now { 1.0 } else { 0.0 };
            column.active_duty_cycle = weight * column.active_duty_cycle + (1.0 - weight) * hit;
        }

        let min_duty = 0.01 * self.max_duty_cycle();
        let step = self.params.boost_step;
        let initial = self.params.initial_column_boost;
        for column in self.columns.iter_mut() {
            column.min_duty_cycle = min_duty;
            if column.active_duty_cycle < min_duty {
                column.boost += step;
            } else {
                column.boost = initial;
            }
        }
    }

    /// Largest active duty cycle over all columns.
    pub fn max_duty_cycle(&self) -> f32 {
        self.columns
            .iter()
            .map(|c| c.active_duty_cycle)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Largest per-column sum of proximal permanences.
    pub fn get_max_sum_of_permanences(&self) -> f32 {
        self.columns
            .iter()
            .map(|c| c.sum_of_permanences)
            .fold(0.0, f32::max)
    }

    /// L2 norm of column `c`'s proximal permanences.
    pub fn compute_column_permanence(&self, c: usize) -> Result<f32> {
        let column = self.column(c)?;
        Ok(column
            .synapses
            .iter()
            .map(|s| s.permanence * s.permanence)
            .sum::<f32>()
            .sqrt())
    }

    /// Cosine similarity of two columns' static reconstructions, centred at 0.5.
    ///
    /// Needs [`Layer::compute_static_reconstruction`] to have run. Returns 0.0
    /// when either centred vector is all zeros.
    pub fn compute_orthogonality(&self, c0: usize, c1: usize) -> Result<f32> {
        self.column(c0)?;
        self.column(c1)?;
        if !self.static_reconstruction_ready {
            return Err(ClaError::NotInitialized("static reconstruction"));
        }

        let a = &self.static_reconstruction[c0].vector;
        let b = &self.static_reconstruction[c1].vector;

        let (mut dot, mut len_a, mut len_b) = (0.0f32, 0.0f32, 0.0f32);
        for (&x, &y) in a.iter().zip(b) {
            let (x, y) = (x - 0.5, y - 0.5);
            dot += x * y;
            len_a += x * x;
            len_b += y * y;
        }

        let denom = len_a.sqrt() * len_b.sqrt();
        if denom == 0.0 {
            return Ok(0.0);
        }
        Ok(dot / denom)
    }

    /// Per-column activity at the current step.
    pub fn active_columns_to_bit_vector(&self) -> Vec<bool> {
        self.columns.iter().map(|c| c.active.now).collect()
    }

    /// Per-column overlap at the current step.
    pub fn active_columns_to_float_vector(&self) -> Vec<f32> {
        self.columns.iter().map(|c| c.overlap).collect()
    }

    /// Indices of the columns active now.
    pub fn active_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.active.now)
            .map(|(i, _)| i)
            .collect()
    }
}
