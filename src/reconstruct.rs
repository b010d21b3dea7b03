//! Reconstruction - recovering an input-space view from proximal permanences.
//!
//! Three kinds are kept, each as a float vector plus a "binary" vector built
//! from connected synapses only:
//!
//! - **static**, one per column: what that column responds to, independent of
//!   the current input;
//! - **dynamic**: what input the currently active columns stand for. Its float
//!   vector drives [`Layer::update_columns`];
//! - **prediction**: what input the currently predicting columns expect next.
//!
//! All of them are recomputed from scratch on request.

use crate::error::{ClaError, Result};
use crate::layer::Layer;

/// An input-length reconstruction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub vector: Vec<f32>,
    pub binary: Vec<f32>,
}

impl Reconstruction {
    pub fn new(len: usize) -> Self {
        Self {
            vector: vec![0.0; len],
            binary: vec![0.0; len],
        }
    }

    /// Zero both vectors.
    pub fn reset(&mut self) {
        self.vector.fill(0.0);
        self.binary.fill(0.0);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vector.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + (self.vector.capacity() + self.binary.capacity()) * std::mem::size_of::<f32>()
    }
}

impl Layer {
    /// Rebuild every column's static reconstruction.
    ///
    /// The float vector sums permanences per input position; the binary vector
    /// sums `2p − 0.5` over connected synapses.
    pub fn compute_static_reconstruction(&mut self) {
        for (column, rec) in self.columns.iter().zip(self.static_reconstruction.iter_mut()) {
            rec.reset();
            for syn in &column.synapses {
                let i = syn.target.column;
                rec.vector[i] += syn.permanence;
                if syn.is_connected() {
                    rec.binary[i] += syn.permanence * 2.0 - 0.5;
                }
            }
        }
        self.static_reconstruction_ready = true;
    }

    /// Rebuild the reconstruction of the current input from active columns.
    ///
    /// Every proximal synapse of an active column adds `p − 0.5`; connected ones
    /// add `overlap · p` to the binary vector.
    pub fn compute_dynamic_reconstruction(&mut self) {
        let rec = &mut self.dynamic_reconstruction;
        rec.reset();
        for column in self.columns.iter().filter(|c| c.active.now) {
            for syn in &column.synapses {
                let i = syn.target.column;
                rec.vector[i] += syn.permanence - 0.5;
                if syn.is_connected() {
                    rec.binary[i] += column.overlap * syn.permanence;
                }
            }
        }
    }

    /// Rebuild the reconstruction of the expected next input from predicting
    /// columns.
    pub fn compute_prediction_reconstruction(&mut self) {
        let rec = &mut self.prediction_reconstruction;
        rec.reset();
        for column in self.columns.iter().filter(|c| c.predicting.now) {
            for syn in &column.synapses {
                let i = syn.target.column;
                rec.vector[i] += syn.permanence;
                if syn.is_connected() {
                    rec.binary[i] += 1.0;
                }
            }
        }
    }

    /// Fit of the dynamic reconstruction over the set input bits.
    ///
    /// `sqrt(max(0, 1 − Σ(r − x)² / n))` over the `n` set positions; `None`
    /// when no input bit is set.
    pub fn compute_dynamic_reconstruction_score(&self) -> Option<f32> {
        let (error, total) = self
            .input
            .iter()
            .zip(&self.dynamic_reconstruction.vector)
            .filter(|(&x, _)| x != 0.0)
            .fold((0.0f32, 0usize), |(err, n), (&x, &r)| {
                (err + (r - x) * (r - x), n + 1)
            });

        if total == 0 {
            return None;
        }
        Some((1.0 - error / total as f32).max(0.0).sqrt())
    }

    /// Permanence of proximal synapse `s` of column `c`.
    pub fn get_permanence(&self, c: usize, s: usize) -> Result<f32> {
        let column = self.column(c)?;
        column
            .synapses
            .get(s)
            .map(|syn| syn.permanence)
            .ok_or(ClaError::IndexOutOfBounds {
                index: s,
                length: column.synapses.len(),
            })
    }

    /// Static reconstruction of column `c`.
    pub fn static_reconstruction(&self, c: usize) -> Result<&Reconstruction> {
        self.column(c)?;
        if !self.static_reconstruction_ready {
            return Err(ClaError::NotInitialized("static reconstruction"));
        }
        Ok(&self.static_reconstruction[c])
    }

    #[inline]
    pub fn dynamic_reconstruction(&self) -> &Reconstruction {
        &self.dynamic_reconstruction
    }

    #[inline]
    pub fn prediction_reconstruction(&self) -> &Reconstruction {
        &self.prediction_reconstruction
    }
}
