//! Synapse - a permanence-weighted connection.
//!
//! The same type serves both kinds of connection in the layer:
//!
//! - **Proximal** synapses belong to a [`crate::Column`]; their target's
//!   `column` field is a position in the input vector and `cell` is unused.
//! - **Distal** synapses belong to a [`crate::Segment`]; their target is a cell
//!   of another column.
//!
//! A synapse is owned by exactly one column or segment. Growth copies targets
//! out of the learning cache, never shares a synapse.

use crate::params::{SYNAPSE_CONNECTED_PERMANENCE, SYNAPSE_INITIAL_PERMANENCE};

/// What a synapse connects to: `(column, cell)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SynapseTarget {
    /// Column index, or input position for proximal synapses
    pub column: usize,
    /// Cell index within the column (0 for proximal synapses)
    pub cell: usize,
}

impl SynapseTarget {
    /// Create a target.
    #[inline]
    pub fn new(column: usize, cell: usize) -> Self {
        Self { column, cell }
    }
}

/// A single synapse.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Synapse {
    /// Connection strength in `[PERMANENCE_MIN, PERMANENCE_MAX]`
    pub permanence: f32,
    /// Connected column/cell
    pub target: SynapseTarget,
    /// Punished by the latest distal adaptation
    pub mispredicted: bool,
    /// Target was active at the segment's latest evaluation
    pub update_queued: bool,
    /// Just grown; ignored by activation and spared one adaptation pass
    pub fresh: bool,
}

impl Synapse {
    /// Create an unflagged synapse.
    #[inline]
    pub fn new(target: SynapseTarget, permanence: f32) -> Self {
        Self {
            permanence,
            target,
            mispredicted: false,
            update_queued: false,
            fresh: false,
        }
    }

    /// Create a freshly grown distal synapse towards `target`.
    #[inline]
    pub fn grown(target: SynapseTarget) -> Self {
        Self {
            fresh: true,
            ..Self::new(target, SYNAPSE_INITIAL_PERMANENCE)
        }
    }

    /// Is permanence at or above the connected threshold?
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.permanence >= SYNAPSE_CONNECTED_PERMANENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_threshold() {
        let target = SynapseTarget::new(3, 1);
        assert!(Synapse::new(target, SYNAPSE_CONNECTED_PERMANENCE).is_connected());
        assert!(!Synapse::new(target, SYNAPSE_CONNECTED_PERMANENCE - 0.01).is_connected());
    }

    #[test]
    fn test_grown_is_fresh() {
        let s = Synapse::grown(SynapseTarget::new(2, 0));
        assert!(s.fresh);
        assert!(!s.update_queued);
        assert_eq!(s.permanence, SYNAPSE_INITIAL_PERMANENCE);
        assert_eq!(s.target, SynapseTarget::new(2, 0));
    }
}
