//! Layer configuration.
//!
//! [`LayerParams`] carries every tunable of a layer: the capacities that size
//! the arenas at construction time, the spatial pooler's homeostasis and
//! learning rates, and the sequence memory's segment and synapse rules. It is a
//! plain serde struct so a configuration can be written out and read back; the
//! learned state of a layer is never serialized.
//!
//! # Examples
//!
//! ```
//! use htm_cla::LayerParams;
//!
//! let mut params = LayerParams::default();
//! params.set_layer_parameters(128, 64, 64, 8, true, true);
//! params.validate().unwrap();
//!
//! let json = params.to_json().unwrap();
//! let restored = LayerParams::from_json(&json).unwrap();
//! assert_eq!(params, restored);
//! ```

use crate::error::{ClaError, Result};
use serde::{Deserialize, Serialize};

/// Lowest permanence any synapse may hold.
pub const PERMANENCE_MIN: f32 = 0.0;

/// Highest permanence any synapse may hold.
pub const PERMANENCE_MAX: f32 = 1.0;

/// A synapse is connected iff its permanence is at least this value.
///
/// 0.5 is also the neutral point of the signed overlap and reconstruction.
pub const SYNAPSE_CONNECTED_PERMANENCE: f32 = 0.5;

/// Permanence given to a distal synapse grown from the learning cache.
pub const SYNAPSE_INITIAL_PERMANENCE: f32 = 0.6;

/// Distal synapses below this permanence are reported as invalid.
pub const SYNAPSE_MINIMUM_PERMANENCE: f32 = 0.1;

/// Cells per column.
pub const SM_CELLS_PER_COLUMN: usize = 4;

/// Segment slots per cell.
pub const SM_SEGMENTS_PER_CELL: usize = 8;

/// Synapses per distal segment.
pub const SM_SEGMENT_POTENTIAL_POOL: usize = 32;

/// Upper bound on synapses grown into one segment per learning pass.
pub const SM_SEGMENT_NEW_SYNAPSE_COUNT: usize = 16;

/// Active synapses needed for a segment to fire.
pub const SM_SEGMENT_ACTIVATION_THRESHOLD: usize = 8;

/// Capacity of the learning cache.
pub const SM_SYNAPSE_LEARNING_CACHE_MAX_SIZE: usize = 4096;

/// Distal reinforcement step.
pub const SM_SYNAPSE_PERMANENCE_INCREMENT: f32 = 0.05;

/// Distal decay / punishment step.
pub const SM_SYNAPSE_PERMANENCE_DECREMENT: f32 = 0.01;

/// Amount an active segment's duty cycle drops each time it predicts.
pub const SM_SEGMENT_DUTY_CYCLE_DECAY: f32 = 0.01;

pub const DEFAULT_SP_COLUMNS: usize = 256;
pub const DEFAULT_SP_INPUT_VECTOR_LENGTH: usize = 256;
pub const DEFAULT_SP_PROXIMAL_SYNAPSES_PER_COLUMN: usize = 256;
pub const DEFAULT_SP_MAX_COLUMNS: usize = 8;
pub const DEFAULT_SP_LOCAL_INHIBITION_RADIUS: usize = 16;
pub const DEFAULT_SP_INITIAL_COLUMN_BOOST: f32 = 1.0;
pub const DEFAULT_SP_INITIAL_ACTIVE_DUTY_CYCLE: f32 = 0.0;
pub const DEFAULT_SP_INITIAL_MIN_DUTY_CYCLE: f32 = 0.0;
pub const DEFAULT_SP_INITIAL_OVERLAP_DUTY_CYCLE: f32 = 0.0;
pub const DEFAULT_SP_MIN_OVERLAP: f32 = 0.0;
pub const DEFAULT_SP_DUTY_CYCLE_HISTORY_WEIGHT: f32 = 0.99;
pub const DEFAULT_SP_BOOST_STEP: f32 = 0.01;
pub const DEFAULT_SP_SYNAPSE_PERMANENCE_INCREMENT: f32 = 0.01;

/// Complete configuration of a [`crate::Layer`].
///
/// Capacities and rates are fixed once the layer is built; the learning
/// switches may be flipped between steps through
/// [`crate::Layer::set_spatial_learning`] and
/// [`crate::Layer::set_temporal_learning`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    // Spatial pooler capacity
    /// Number of columns
    pub columns: usize,
    /// Length of the input vector
    pub input_vector_length: usize,
    /// Proximal synapses owned by each column
    pub proximal_synapses_per_column: usize,

    // Sequence memory capacity
    /// Cells owned by each column
    pub cells_per_column: usize,
    /// Segment slots per cell
    pub segments_per_cell: usize,
    /// Synapses per distal segment
    pub synapses_per_segment: usize,
    /// Upper bound on synapses grown per segment per pass
    pub new_synapse_count: usize,
    /// Capacity of the learning cache
    pub learning_cache_capacity: usize,

    // Spatial pooler
    /// Number of columns activated per step (global top-k)
    pub max_active_columns: usize,
    /// Accepted for compatibility; column selection is global and ignores it
    pub inhibition_radius: usize,
    pub initial_column_boost: f32,
    pub initial_active_duty_cycle: f32,
    pub initial_min_duty_cycle: f32,
    pub initial_overlap_duty_cycle: f32,
    /// Overlap a column needs to count towards its overlap duty cycle
    pub min_overlap: f32,
    /// Weight of history in the duty cycle moving averages
    pub duty_cycle_history_weight: f32,
    pub boost_step: f32,
    /// Proximal learning rate
    pub permanence_increment: f32,

    // Sequence memory
    /// Active connected synapses needed for a segment to fire
    pub segment_activation_threshold: usize,
    pub sm_permanence_increment: f32,
    pub sm_permanence_decrement: f32,

    // Learning switches
    pub spatial_learning_enabled: bool,
    pub temporal_learning_enabled: bool,

    /// Seed of the layer's random generator
    pub seed: u64,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            columns: DEFAULT_SP_COLUMNS,
            input_vector_length: DEFAULT_SP_INPUT_VECTOR_LENGTH,
            proximal_synapses_per_column: DEFAULT_SP_PROXIMAL_SYNAPSES_PER_COLUMN,
            cells_per_column: SM_CELLS_PER_COLUMN,
            segments_per_cell: SM_SEGMENTS_PER_CELL,
            synapses_per_segment: SM_SEGMENT_POTENTIAL_POOL,
            new_synapse_count: SM_SEGMENT_NEW_SYNAPSE_COUNT,
            learning_cache_capacity: SM_SYNAPSE_LEARNING_CACHE_MAX_SIZE,
            max_active_columns: DEFAULT_SP_MAX_COLUMNS,
            inhibition_radius: DEFAULT_SP_LOCAL_INHIBITION_RADIUS,
            initial_column_boost: DEFAULT_SP_INITIAL_COLUMN_BOOST,
            initial_active_duty_cycle: DEFAULT_SP_INITIAL_ACTIVE_DUTY_CYCLE,
            initial_min_duty_cycle: DEFAULT_SP_INITIAL_MIN_DUTY_CYCLE,
            initial_overlap_duty_cycle: DEFAULT_SP_INITIAL_OVERLAP_DUTY_CYCLE,
            min_overlap: DEFAULT_SP_MIN_OVERLAP,
            duty_cycle_history_weight: DEFAULT_SP_DUTY_CYCLE_HISTORY_WEIGHT,
            boost_step: DEFAULT_SP_BOOST_STEP,
            permanence_increment: DEFAULT_SP_SYNAPSE_PERMANENCE_INCREMENT,
            segment_activation_threshold: SM_SEGMENT_ACTIVATION_THRESHOLD,
            sm_permanence_increment: SM_SYNAPSE_PERMANENCE_INCREMENT,
            sm_permanence_decrement: SM_SYNAPSE_PERMANENCE_DECREMENT,
            spatial_learning_enabled: true,
            temporal_learning_enabled: true,
            seed: 0,
        }
    }
}

impl LayerParams {
    /// Overwrite the options most drivers tune.
    ///
    /// # Arguments
    ///
    /// * `columns` - Number of columns
    /// * `inputs` - Input vector length
    /// * `synapses` - Proximal synapses per column
    /// * `inhibition_radius` - Stored, not used by the global column selection
    /// * `spatial_learning_on` - Enable proximal adaptation
    /// * `temporal_learning_on` - Enable distal growth and adaptation
    pub fn set_layer_parameters(
        &mut self,
        columns: usize,
        inputs: usize,
        synapses: usize,
        inhibition_radius: usize,
        spatial_learning_on: bool,
        temporal_learning_on: bool,
    ) {
        self.columns = columns;
        self.input_vector_length = inputs;
        self.proximal_synapses_per_column = synapses;
        self.inhibition_radius = inhibition_radius;
        self.spatial_learning_enabled = spatial_learning_on;
        self.temporal_learning_enabled = temporal_learning_on;
    }

    /// Check the configuration for values no layer can be built from.
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("columns", self.columns),
            ("input_vector_length", self.input_vector_length),
            ("proximal_synapses_per_column", self.proximal_synapses_per_column),
            ("cells_per_column", self.cells_per_column),
            ("segments_per_cell", self.segments_per_cell),
            ("synapses_per_segment", self.synapses_per_segment),
            ("segment_activation_threshold", self.segment_activation_threshold),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(ClaError::invalid(format!("{} must be > 0", name)));
            }
        }

        let products = [
            (
                "columns * cells_per_column * segments_per_cell * synapses_per_segment",
                [
                    self.columns,
                    self.cells_per_column,
                    self.segments_per_cell,
                    self.synapses_per_segment,
                ],
            ),
            (
                "columns * proximal_synapses_per_column",
                [self.columns, self.proximal_synapses_per_column, 1, 1],
            ),
            (
                "columns * input_vector_length",
                [self.columns, self.input_vector_length, 1, 1],
            ),
        ];
        for (name, factors) in products {
            if factors
                .iter()
                .try_fold(1usize, |acc, &f| acc.checked_mul(f))
                .is_none()
            {
                return Err(ClaError::invalid(format!("{} overflows usize", name)));
            }
        }

        if self.new_synapse_count > self.synapses_per_segment {
            return Err(ClaError::invalid(format!(
                "new_synapse_count ({}) must be <= synapses_per_segment ({})",
                self.new_synapse_count, self.synapses_per_segment
            )));
        }

        let rates = [
            ("permanence_increment", self.permanence_increment),
            ("sm_permanence_increment", self.sm_permanence_increment),
            ("sm_permanence_decrement", self.sm_permanence_decrement),
            ("boost_step", self.boost_step),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(ClaError::invalid(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.duty_cycle_history_weight) {
            return Err(ClaError::invalid(
                "duty_cycle_history_weight must be 0.0-1.0",
            ));
        }

        Ok(())
    }

    /// Total number of cells in the layer.
    ///
    /// Cannot overflow once [`LayerParams::validate`] has passed.
    #[inline]
    pub fn total_cells(&self) -> usize {
        self.columns * self.cells_per_column
    }

    /// Total number of segment slots in the arena.
    #[inline]
    pub fn total_segment_slots(&self) -> usize {
        self.total_cells() * self.segments_per_cell
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode from bincode and validate.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let params: Self = bincode::deserialize(bytes)?;
        params.validate()?;
        Ok(params)
    }
}
