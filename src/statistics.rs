//! PerformanceStatistics - read-only snapshot of a layer.
//!
//! [`PerformanceStatistics::collect`] walks every column, cell, segment and
//! synapse once and counts what it sees. It never mutates the layer, so it can
//! be taken between any two steps.
//!
//! # Examples
//!
//! ```
//! use htm_cla::{Layer, LayerParams, PerformanceStatistics};
//!
//! let mut params = LayerParams::default();
//! params.set_layer_parameters(16, 8, 8, 2, true, true);
//! params.max_active_columns = 2;
//! let mut layer = Layer::new(params).unwrap();
//! layer.execute(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0], 1.0).unwrap();
//!
//! let stats = PerformanceStatistics::collect(&layer);
//! assert_eq!(stats.active_columns, 2);
//! println!("{}", stats.to_json().unwrap());
//! ```

use crate::cell::{CellFlag, Moment};
use crate::error::Result;
use crate::layer::Layer;
use crate::params::SYNAPSE_MINIMUM_PERMANENCE;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Counters over one layer at one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStatistics {
    pub iteration: u64,

    // Columns
    pub active_columns: usize,
    pub predicted_columns: usize,
    pub unpredicted_columns: usize,
    pub predicting_columns: usize,
    pub mispredicted_columns: usize,

    // Proximal synapses
    pub total_connected_proximal_synapses: usize,
    /// Connected synapses of active columns on a set input bit
    pub active_connected_proximal_synapses: usize,
    /// Unconnected synapses of active columns on a set input bit
    pub active_disconnected_proximal_synapses: usize,
    pub sum_of_permanences_proximal_synapses: f64,
    pub avg_column_boost: f64,

    // Cells
    pub active_cells: usize,
    pub learning_cells: usize,
    /// Active now and predicting at the previous step
    pub predicted_cells: usize,
    pub predicting_cells: usize,
    /// Active now without a prediction
    pub unpredicted_cells: usize,
    /// Predicting at the previous step but silent now
    pub mispredicted_cells: usize,
    pub segment_change_cells: usize,
    pub fewest_segments: usize,
    pub mean_segments: f64,
    pub most_segments: usize,

    // Segments
    pub total_segments: usize,
    pub active_segments: usize,
    pub sequence_segments: usize,
    pub new_segments: usize,
    pub mispredicted_segments: usize,
    /// Age in steps
    pub min_segment_age: u64,
    pub avg_segment_age: f64,
    pub max_segment_age: u64,
    pub avg_active_duty_cycle: f64,

    // Distal synapses
    pub total_connected_distal_synapses: usize,
    /// Target cell active now
    pub active_distal_synapses: usize,
    pub active_connected_distal_synapses: usize,
    pub active_disconnected_distal_synapses: usize,
    /// Permanence below the minimum
    pub invalid_distal_synapses: usize,
    pub valid_distal_synapses: usize,
    pub mispredicting_distal_synapses: usize,
    /// Queued for the next commit
    pub cached_distal_synapses: usize,
    /// Grown and not yet adapted
    pub fresh_distal_synapses: usize,

    pub learning_cache_size: usize,

    // Memory in bytes
    pub spatial_memory: usize,
    pub sequence_memory: usize,
    pub reconstruction_memory: usize,
}

impl PerformanceStatistics {
    /// Take a snapshot of `layer`.
    pub fn collect(layer: &Layer) -> Self {
        let mut stats = Self {
            iteration: layer.iteration(),
            learning_cache_size: layer.learning_cache().len(),
            spatial_memory: layer.spatial_memory_usage(),
            sequence_memory: layer.sequence_memory_usage(),
            reconstruction_memory: layer.reconstruction_memory_usage(),
            fewest_segments: usize::MAX,
            min_segment_age: u64::MAX,
            ..Default::default()
        };

        let input = layer.input();
        let columns = layer.columns();
        let mut boost_sum = 0.0f64;
        let mut cell_total = 0usize;
        let mut age_sum = 0u64;
        let mut duty_sum = 0.0f64;

        for (c, column) in columns.iter().enumerate() {
            let active = column.active.now;
            stats.active_columns += active as usize;
            stats.predicted_columns += column.predicted as usize;
            stats.unpredicted_columns += column.unpredicted as usize;
            stats.predicting_columns += column.predicting.now as usize;
            stats.mispredicted_columns += column.mispredicted as usize;
            boost_sum += column.boost as f64;

            for syn in &column.synapses {
                let connected = syn.is_connected();
                stats.total_connected_proximal_synapses += connected as usize;
                stats.sum_of_permanences_proximal_synapses += syn.permanence as f64;
                if active && input[syn.target.column] != 0.0 {
                    if connected {
                        stats.active_connected_proximal_synapses += 1;
                    } else {
                        stats.active_disconnected_proximal_synapses += 1;
                    }
                }
            }

            for (i, cell) in column.cells.iter().enumerate() {
                let now_active = cell.check(Moment::Now, CellFlag::Active);
                let was_predicting = cell.check(Moment::Previous, CellFlag::Predicting);
                stats.active_cells += now_active as usize;
                stats.learning_cells += cell.check(Moment::Now, CellFlag::Learning) as usize;
                stats.predicting_cells += cell.check(Moment::Now, CellFlag::Predicting) as usize;
                stats.predicted_cells += (now_active && was_predicting) as usize;
                stats.unpredicted_cells += (now_active && !was_predicting) as usize;
                stats.mispredicted_cells += (!now_active && was_predicting) as usize;
                stats.segment_change_cells += cell.segment_change as usize;

                let count = cell.segment_count();
                stats.fewest_segments = stats.fewest_segments.min(count);
                stats.most_segments = stats.most_segments.max(count);
                cell_total += 1;

                // segment slice of a validated layer cannot be out of range
                let segments = layer.cell_segments(c, i).unwrap_or(&[]);
                for segment in segments {
                    stats.total_segments += 1;
                    stats.active_segments += segment.active as usize;
                    stats.sequence_segments += segment.sequence_segment as usize;
                    stats.new_segments += segment.new_segment as usize;
                    stats.mispredicted_segments += segment.mispredicted as usize;

                    let age = layer.iteration().saturating_sub(segment.created_at);
                    stats.min_segment_age = stats.min_segment_age.min(age);
                    stats.max_segment_age = stats.max_segment_age.max(age);
                    age_sum += age;
                    duty_sum += segment.active_duty_cycle as f64;

                    for syn in &segment.synapses {
                        let connected = syn.is_connected();
                        stats.total_connected_distal_synapses += connected as usize;
                        if columns[syn.target.column].cells[syn.target.cell]
                            .check(Moment::Now, CellFlag::Active)
                        {
                            stats.active_distal_synapses += 1;
                            if connected {
                                stats.active_connected_distal_synapses += 1;
                            } else {
                                stats.active_disconnected_distal_synapses += 1;
                            }
                        }
                        if syn.permanence < SYNAPSE_MINIMUM_PERMANENCE {
                            stats.invalid_distal_synapses += 1;
                        } else {
                            stats.valid_distal_synapses += 1;
                        }
                        stats.mispredicting_distal_synapses += syn.mispredicted as usize;
                        stats.cached_distal_synapses += syn.update_queued as usize;
                        stats.fresh_distal_synapses += syn.fresh as usize;
                    }
                }
            }
        }

        if cell_total == 0 {
            stats.fewest_segments = 0;
        } else {
            stats.mean_segments = stats.total_segments as f64 / cell_total as f64;
        }
        if !columns.is_empty() {
            stats.avg_column_boost = boost_sum / columns.len() as f64;
        }
        if stats.total_segments == 0 {
            stats.min_segment_age = 0;
        } else {
            stats.avg_segment_age = age_sum as f64 / stats.total_segments as f64;
            stats.avg_active_duty_cycle = duty_sum / stats.total_segments as f64;
        }

        stats
    }

    /// Fraction of active columns that were predicted, `None` with no activity.
    pub fn prediction_rate(&self) -> Option<f64> {
        if self.active_columns == 0 {
            None
        } else {
            Some(self.predicted_columns as f64 / self.active_columns as f64)
        }
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Emit a one-line summary at `info` level.
    pub fn log(&self) {
        info!(
            iteration = self.iteration,
            active_columns = self.active_columns,
            predicted_columns = self.predicted_columns,
            mispredicted_columns = self.mispredicted_columns,
            active_cells = self.active_cells,
            total_segments = self.total_segments,
            connected_distal = self.total_connected_distal_synapses,
            cache = self.learning_cache_size,
            "layer statistics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LayerParams;

    fn layer() -> Layer {
        let mut params = LayerParams::default();
        params.set_layer_parameters(16, 8, 8, 2, false, true);
        params.max_active_columns = 2;
        Layer::new(params).unwrap()
    }

    #[test]
    fn test_fresh_layer() {
        let layer = layer();
        let stats = PerformanceStatistics::collect(&layer);
        assert_eq!(stats.active_columns, 0);
        assert_eq!(stats.total_segments, 0);
        assert_eq!(stats.fewest_segments, 0);
        assert_eq!(stats.min_segment_age, 0);
        assert_eq!(stats.prediction_rate(), None);
        assert!(stats.spatial_memory > 0);
    }

    #[test]
    fn test_after_first_step() {
        let mut layer = layer();
        layer
            .execute(&[1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0], 1.0)
            .unwrap();
        let stats = PerformanceStatistics::collect(&layer);

        assert_eq!(stats.iteration, 1);
        assert_eq!(stats.active_columns, 2);
        assert_eq!(stats.unpredicted_columns, 2);
        // both active columns burst
        assert_eq!(stats.active_cells, 2 * 4);
        assert_eq!(stats.unpredicted_cells, 2 * 4);
        // one learning cell and one new segment per bursting column
        assert_eq!(stats.learning_cells, 2);
        assert_eq!(stats.total_segments, 2);
        assert_eq!(stats.new_segments, 0);
        assert_eq!(stats.segment_change_cells, 2);
        assert_eq!(stats.most_segments, 1);
        assert_eq!(stats.prediction_rate(), Some(0.0));
    }

    #[test]
    fn test_to_json() {
        let stats = PerformanceStatistics::collect(&layer());
        let json = stats.to_json().unwrap();
        assert!(json.contains("\"active_columns\": 0"));
        let restored: PerformanceStatistics = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.spatial_memory, stats.spatial_memory);
        assert_eq!(restored.fewest_segments, stats.fewest_segments);
    }
}
