use thiserror::Error;

/// Plane bookkeeping violations that abort a build. Geometric degeneracies
/// (tiny windings, zero-volume fragments, out-of-world bounds) are never
/// errors; they are handled locally and show up in the build statistics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BspError {
    /// A candidate split plane is already in use by an ancestor node.
    #[error("plane {0} was already used as a splitter by a parent node")]
    TriedParentPlane(usize),
    /// A brush has a side lying on the candidate plane, yet windings of the
    /// same brush were counted as crossing it.
    #[error("brush facing plane {planenum} also counted {splits} crossing windings")]
    FacingWithSplits { planenum: usize, splits: usize },
}
