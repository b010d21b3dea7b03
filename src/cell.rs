//! Cell - per-cell temporal state.
//!
//! Every cell tracks three state bits (active, learning, predicting) at two
//! moments: now and the previous time step. [`Moments::shift`] advances time
//! by copying `now` into `previous` and clearing `now`; it runs exactly once per
//! step, in [`crate::Layer::time_step`].

/// Which of the two tracked moments to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    /// The step being computed
    Now,
    /// The step before it
    Previous,
}

/// One of the three cell state bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFlag {
    Active,
    Learning,
    Predicting,
}

/// The three state bits of a cell at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellState {
    pub active: bool,
    pub learning: bool,
    pub predicting: bool,
}

impl CellState {
    /// Read one flag.
    #[inline]
    pub fn get(&self, flag: CellFlag) -> bool {
        match flag {
            CellFlag::Active => self.active,
            CellFlag::Learning => self.learning,
            CellFlag::Predicting => self.predicting,
        }
    }

    /// Raise one flag.
    #[inline]
    pub fn set(&mut self, flag: CellFlag) {
        match flag {
            CellFlag::Active => self.active = true,
            CellFlag::Learning => self.learning = true,
            CellFlag::Predicting => self.predicting = true,
        }
    }
}

/// A value tracked at the current and the previous step.
///
/// # Examples
///
/// ```
/// use htm_cla::Moments;
///
/// let mut active = Moments::<bool>::default();
/// active.now = true;
/// active.shift();
/// assert!(active.previous);
/// assert!(!active.now);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Moments<T> {
    pub now: T,
    pub previous: T,
}

impl<T: Copy + Default> Moments<T> {
    /// Value at the given moment.
    #[inline]
    pub fn at(&self, when: Moment) -> T {
        match when {
            Moment::Now => self.now,
            Moment::Previous => self.previous,
        }
    }

    /// Advance one step: `previous := now`, `now := default`.
    #[inline]
    pub fn shift(&mut self) {
        self.previous = self.now;
        self.now = T::default();
    }

    /// Clear both moments.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A cell of a column.
///
/// Segments are not stored here; they live in the layer's segment arena and
/// the cell only records how many of its slots are in use.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// State bits now and at the previous step
    pub state: Moments<CellState>,
    /// A segment was grown on this cell during the current step
    pub segment_change: bool,
    segment_count: usize,
}

impl Cell {
    /// Create an idle cell with no segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a state bit at a moment.
    #[inline]
    pub fn check(&self, when: Moment, flag: CellFlag) -> bool {
        self.state.at(when).get(flag)
    }

    /// Raise a state bit for the current step.
    #[inline]
    pub fn set(&mut self, flag: CellFlag) {
        self.state.now.set(flag);
    }

    /// Number of live segments (prefix of the cell's arena slice).
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Claim the next segment slot, returning its index.
    ///
    /// The caller checks capacity first.
    #[inline]
    pub(crate) fn claim_segment_slot(&mut self) -> usize {
        let slot = self.segment_count;
        self.segment_count += 1;
        slot
    }

    /// Advance the cell's state by one step.
    #[inline]
    pub fn shift(&mut self) {
        self.state.shift();
        self.segment_change = false;
    }
}
