//! htm-cla - Online Spatial Pooler and Sequence Memory
//!
//! An implementation of the cortical learning algorithm core: a binary input
//! vector is mapped to a sparse set of active **columns**, and the **cells** of
//! those columns learn, from temporal co-occurrence alone, which columns will
//! become active next. There is no gradient descent; learning is rule-based
//! permanence increment/decrement plus structural growth of segments and
//! synapses under fixed capacity limits.
//!
//! # Architecture
//!
//! - **Synapse**: permanence-weighted connection to an input bit or a cell
//! - **Segment**: distal dendrite with a fixed synapse pool, stored in one flat
//!   arena and addressed by [`SegmentHandle`]
//! - **Cell**: active/learning/predicting state now and at the previous step
//! - **Column**: proximal synapses, cells and homeostasis statistics
//! - **Layer**: owner of all of the above, the learning cache and the
//!   reconstruction buffers
//!
//! The step phases live in [`spatial`] (overlap, top-k selection, proximal
//! learning), [`cla`] and [`sequence`] (cell state and distal learning) and
//! [`reconstruct`] (input reconstruction and score).
//!
//! # Examples
//!
//! ```
//! use htm_cla::{Layer, LayerParams, PerformanceStatistics};
//!
//! let mut params = LayerParams::default();
//! params.set_layer_parameters(64, 32, 32, 8, true, true);
//! params.max_active_columns = 4;
//! params.seed = 7;
//!
//! let mut layer = Layer::new(params).unwrap();
//!
//! let a: Vec<f32> = (0..32).map(|i| if i < 16 { 1.0 } else { 0.0 }).collect();
//! let b: Vec<f32> = (0..32).map(|i| if i >= 16 { 1.0 } else { 0.0 }).collect();
//!
//! for step in 0..20 {
//!     let input = if step % 2 == 0 { &a } else { &b };
//!     layer.execute(input, 1.0).unwrap();
//! }
//!
//! let score = layer.compute_dynamic_reconstruction_score().unwrap();
//! assert!((0.0..=1.0).contains(&score));
//!
//! let stats = PerformanceStatistics::collect(&layer);
//! assert_eq!(stats.active_columns, 4);
//! ```
//!
//! # Determinism
//!
//! Every randomized choice (initial permanences, scan starts, cache sampling)
//! draws from the layer's own `StdRng` seeded from [`LayerParams::seed`], so
//! equal parameters and equal inputs reproduce a run exactly.
//!
//! # Safety
//!
//! Caller mistakes (bad configuration, wrongly sized input, out-of-range
//! queries) come back as [`ClaError`]. Broken internal invariants panic with
//! an assertion message. Running out of segment slots or learning-cache
//! entries is not an error; growth just stops for that attempt.

pub mod error;
pub mod params;
pub mod utils;

pub mod cell;
pub mod column;
pub mod learning_cache;
pub mod segment;
pub mod synapse;

pub mod layer;

pub mod cla;
pub mod reconstruct;
pub mod sequence;
pub mod spatial;

pub mod statistics;

pub use error::{ClaError, Result};
pub use params::{
    LayerParams, PERMANENCE_MAX, PERMANENCE_MIN, SYNAPSE_CONNECTED_PERMANENCE,
    SYNAPSE_INITIAL_PERMANENCE, SYNAPSE_MINIMUM_PERMANENCE,
};

pub use cell::{Cell, CellFlag, CellState, Moment, Moments};
pub use column::Column;
pub use learning_cache::LearningCache;
pub use segment::{Segment, SegmentArena, SegmentHandle};
pub use synapse::{Synapse, SynapseTarget};

pub use layer::Layer;
pub use reconstruct::Reconstruction;
pub use sequence::segment_activation_level;
pub use spatial::column_overlap;
pub use statistics::PerformanceStatistics;
