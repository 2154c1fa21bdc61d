use crate::float_types::Real;

/// Numeric knobs for one compile. Immutable once the core is entered, so a
/// reference can be shared freely between worker tasks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Options {
    /// Maximum coordinate magnitude; geometry beyond it is bogus and gets
    /// dropped.
    pub worldextent: Real,
    /// Brush fragments whose volume falls below this are discarded after a
    /// split.
    pub microvolume: Real,
    /// Point-on-plane tolerance for winding clips.
    pub on_epsilon: Real,
    /// When nonzero, nodes holding more than this fraction of the input
    /// brushes are split with the cheap midsplit strategy.
    pub midsplitbrushfraction: Real,
    /// Nodes wider than this on any axis are midsplit. Only honored at 64
    /// and above.
    pub maxnodesize: Real,
    /// General distance comparison epsilon.
    pub epsilon: Real,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            worldextent: 65536.0,
            microvolume: 1.0,
            on_epsilon: 1e-4,
            midsplitbrushfraction: 0.0,
            maxnodesize: 1024.0,
            epsilon: 1e-4,
        }
    }
}
