//! Layer - the single owner of all spatial pooler and sequence memory state.
//!
//! A [`Layer`] allocates every column, cell, segment and synapse once in
//! [`Layer::new`] and mutates them in place for the rest of its life. The
//! per-step phases are implemented as `impl Layer` blocks in the
//! [`crate::spatial`], [`crate::cla`], [`crate::sequence`] and
//! [`crate::reconstruct`] modules; this module holds construction, queries and
//! the full-step driver.
//!
//! # Step order
//!
//! Phases read state left by the phase before them, so a driver calls them in
//! this order once per input sample:
//!
//! 1. [`Layer::time_step`]
//! 2. [`Layer::calculate_overlap`]
//! 3. [`Layer::inhibit_neighboring_columns`]
//! 4. [`Layer::compute_active_state`]
//! 5. [`Layer::compute_predictive_state`]
//! 6. [`Layer::compute_dynamic_reconstruction`]
//! 7. [`Layer::update_columns`]
//! 8. [`Layer::update_synapses`]
//!
//! [`Layer::execute`] runs exactly this sequence.
//!
//! # Examples
//!
//! ```
//! use htm_cla::{Layer, LayerParams};
//!
//! let mut params = LayerParams::default();
//! params.set_layer_parameters(32, 16, 16, 4, true, true);
//! params.max_active_columns = 2;
//!
//! let mut layer = Layer::new(params).unwrap();
//! let mut input = vec![0.0; 16];
//! input[3] = 1.0;
//!
//! layer.execute(&input, 1.0).unwrap();
//! let active = layer.active_columns_to_bit_vector();
//! assert_eq!(active.iter().filter(|&&a| a).count(), 2);
//! ```

use crate::cell::Cell;
use crate::column::Column;
use crate::error::{ClaError, Result};
use crate::learning_cache::LearningCache;
use crate::params::LayerParams;
use crate::reconstruct::Reconstruction;
use crate::segment::{Segment, SegmentArena, SegmentHandle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

/// A spatial pooler plus sequence memory over one input space.
#[derive(Debug, Clone)]
pub struct Layer {
    id: u32,
    pub(crate) params: LayerParams,
    pub(crate) columns: Vec<Column>,
    pub(crate) segments: SegmentArena,
    pub(crate) learning_cache: LearningCache,
    /// Current input, one 0.0/1.0 value per input position
    pub(crate) input: Vec<f32>,
    pub(crate) static_reconstruction: Vec<Reconstruction>,
    pub(crate) static_reconstruction_ready: bool,
    pub(crate) dynamic_reconstruction: Reconstruction,
    pub(crate) prediction_reconstruction: Reconstruction,
    pub(crate) rng: StdRng,
    /// Steps taken, advanced by `time_step`
    pub(crate) iteration: u64,
    pub(crate) number_of_columns_active: usize,
    pub(crate) best_column_overlap: f32,
    pub(crate) worst_column_overlap: f32,
    pub(crate) max_sum_of_permanences: f32,
}

impl Layer {
    /// Validate `params` and allocate every arena.
    ///
    /// Capacities are fixed from here on.
    pub fn new(params: LayerParams) -> Result<Self> {
        static NEXT_ID: AtomicU32 = AtomicU32::new(0);

        params.validate()?;

        let mut rng = StdRng::seed_from_u64(params.seed);
        let columns = (0..params.columns)
            .map(|_| Column::new(&params, &mut rng))
            .collect::<Vec<_>>();

        let segments = SegmentArena::new(
            params.columns,
            params.cells_per_column,
            params.segments_per_cell,
            params.synapses_per_segment,
        );

        let n = params.input_vector_length;
        let layer = Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            columns,
            segments,
            learning_cache: LearningCache::new(params.learning_cache_capacity),
            input: vec![0.0; n],
            static_reconstruction: vec![Reconstruction::new(n); params.columns],
            static_reconstruction_ready: false,
            dynamic_reconstruction: Reconstruction::new(n),
            prediction_reconstruction: Reconstruction::new(n),
            rng,
            iteration: 0,
            number_of_columns_active: 0,
            best_column_overlap: 0.0,
            worst_column_overlap: 0.0,
            max_sum_of_permanences: 0.0,
            params,
        };

        debug!(
            layer = layer.id,
            columns = layer.params.columns,
            cells = layer.params.total_cells(),
            segment_slots = layer.segments.capacity(),
            spatial_bytes = layer.spatial_memory_usage(),
            sequence_bytes = layer.sequence_memory_usage(),
            reconstruction_bytes = layer.reconstruction_memory_usage(),
            "layer initialized"
        );

        Ok(layer)
    }

    /// Release the layer, returning the number of bytes it held.
    pub fn destroy(self) -> usize {
        let bytes = self.memory_usage();
        debug!(layer = self.id, bytes, "layer destroyed");
        bytes
    }

    /// Run one full step on `input`.
    ///
    /// `multiplier` scales the proximal learning rate for this step.
    pub fn execute(&mut self, input: &[f32], multiplier: f32) -> Result<()> {
        self.check_input(input)?;
        self.time_step();
        self.calculate_overlap(input)?;
        self.inhibit_neighboring_columns();
        self.compute_active_state();
        self.compute_predictive_state();
        self.compute_dynamic_reconstruction();
        self.update_columns(multiplier);
        self.update_synapses();
        Ok(())
    }

    /// Unique layer id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn params(&self) -> &LayerParams {
        &self.params
    }

    /// Switch proximal adaptation on or off.
    pub fn set_spatial_learning(&mut self, enabled: bool) {
        self.params.spatial_learning_enabled = enabled;
    }

    /// Switch distal growth and adaptation on or off.
    pub fn set_temporal_learning(&mut self, enabled: bool) {
        self.params.temporal_learning_enabled = enabled;
    }

    /// Steps taken so far.
    #[inline]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current input vector as stored by `calculate_overlap`.
    #[inline]
    pub fn input(&self) -> &[f32] {
        &self.input
    }

    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, c: usize) -> Result<&Column> {
        self.columns.get(c).ok_or(ClaError::IndexOutOfBounds {
            index: c,
            length: self.columns.len(),
        })
    }

    pub fn cell(&self, c: usize, i: usize) -> Result<&Cell> {
        let column = self.column(c)?;
        column.cells.get(i).ok_or(ClaError::IndexOutOfBounds {
            index: i,
            length: column.cells.len(),
        })
    }

    /// Live segments of cell `i` in column `c`.
    pub fn cell_segments(&self, c: usize, i: usize) -> Result<&[Segment]> {
        let count = self.cell(c, i)?.segment_count();
        Ok(self.segments.cell_segments(c, i, count))
    }

    /// Live segment at `h`.
    pub fn segment(&self, h: SegmentHandle) -> Result<&Segment> {
        let count = self.cell(h.column, h.cell)?.segment_count();
        if h.slot >= count {
            return Err(ClaError::IndexOutOfBounds {
                index: h.slot,
                length: count,
            });
        }
        Ok(self.segments.get(h))
    }

    /// Handles of every live segment, column-major.
    pub fn segment_handles(&self) -> impl Iterator<Item = SegmentHandle> + '_ {
        self.columns.iter().enumerate().flat_map(|(c, column)| {
            column.cells.iter().enumerate().flat_map(move |(i, cell)| {
                (0..cell.segment_count()).map(move |slot| SegmentHandle::new(c, i, slot))
            })
        })
    }

    #[inline]
    pub fn learning_cache(&self) -> &LearningCache {
        &self.learning_cache
    }

    /// Columns selected by the last inhibition pass.
    #[inline]
    pub fn number_of_columns_active(&self) -> usize {
        self.number_of_columns_active
    }

    #[inline]
    pub fn best_column_overlap(&self) -> f32 {
        self.best_column_overlap
    }

    #[inline]
    pub fn worst_column_overlap(&self) -> f32 {
        self.worst_column_overlap
    }

    /// Largest per-column permanence sum as of the last `update_columns`.
    #[inline]
    pub fn max_sum_of_permanences(&self) -> f32 {
        self.max_sum_of_permanences
    }

    /// Bytes held by columns, proximal synapses and cells.
    pub fn spatial_memory_usage(&self) -> usize {
        self.columns.iter().map(Column::memory_usage).sum::<usize>()
            + self.input.capacity() * std::mem::size_of::<f32>()
    }

    /// Bytes held by the segment arena and learning cache.
    pub fn sequence_memory_usage(&self) -> usize {
        self.segments.memory_usage() + self.learning_cache.memory_usage()
    }

    /// Bytes held by the reconstruction buffers.
    pub fn reconstruction_memory_usage(&self) -> usize {
        self.static_reconstruction
            .iter()
            .map(Reconstruction::memory_usage)
            .sum::<usize>()
            + self.dynamic_reconstruction.memory_usage()
            + self.prediction_reconstruction.memory_usage()
    }

    /// Total bytes held by the layer.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.spatial_memory_usage()
            + self.sequence_memory_usage()
            + self.reconstruction_memory_usage()
    }
}
