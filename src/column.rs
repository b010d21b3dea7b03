//! Column - spatial pooler unit owning proximal synapses and cells.

use crate::cell::{Cell, Moments};
use crate::params::{LayerParams, SYNAPSE_CONNECTED_PERMANENCE};
use crate::synapse::{Synapse, SynapseTarget};
use crate::utils::rand_real;
use rand::Rng;

/// A column of the layer.
#[derive(Debug, Clone)]
pub struct Column {
    /// Feedforward synapses into the input vector
    pub synapses: Vec<Synapse>,
    /// Cells of this column
    pub cells: Vec<Cell>,

    pub boost: f32,
    /// Signed correlation with the current input
    pub overlap: f32,
    pub active_duty_cycle: f32,
    pub min_duty_cycle: f32,
    pub overlap_duty_cycle: f32,
    /// Sum of proximal permanences, refreshed by `update_columns`
    pub sum_of_permanences: f32,

    /// Selected by inhibition
    pub active: Moments<bool>,
    /// At least one cell predicting
    pub predicting: Moments<bool>,

    // Classification of the current step, cleared by time_step
    pub unpredicted: bool,
    pub predicted: bool,
    pub mispredicted: bool,
}

impl Column {
    /// Build a column with its potential pool.
    ///
    /// Proximal synapse `s` targets input position `s mod input_vector_length`
    /// with a permanence within ±0.05 of the connected threshold.
    pub fn new<R: Rng>(params: &LayerParams, rng: &mut R) -> Self {
        let synapses = (0..params.proximal_synapses_per_column)
            .map(|s| {
                let permanence = SYNAPSE_CONNECTED_PERMANENCE - 0.05 + rand_real(0.0, 0.1, rng);
                Synapse::new(
                    SynapseTarget::new(s % params.input_vector_length, 0),
                    permanence,
                )
            })
            .collect::<Vec<_>>();

        let sum_of_permanences = synapses.iter().map(|s| s.permanence).sum();

        Self {
            synapses,
            cells: vec![Cell::new(); params.cells_per_column],
            boost: params.initial_column_boost,
            overlap: 0.0,
            active_duty_cycle: params.initial_active_duty_cycle + rand_real(0.0, 0.05, rng),
            min_duty_cycle: params.initial_min_duty_cycle,
            overlap_duty_cycle: params.initial_overlap_duty_cycle,
            sum_of_permanences,
            active: Moments::default(),
            predicting: Moments::default(),
            unpredicted: false,
            predicted: false,
            mispredicted: false,
        }
    }

    /// Advance column state by one step.
    pub fn shift(&mut self) {
        self.active.shift();
        self.predicting.shift();
        self.unpredicted = false;
        self.predicted = false;
        self.mispredicted = false;
    }

    /// Approximate memory footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.synapses.capacity() * std::mem::size_of::<Synapse>()
            + self.cells.capacity() * std::mem::size_of::<Cell>()
    }
}
