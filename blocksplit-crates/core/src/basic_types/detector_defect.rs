/// An internal inconsistency detected while running a detector.
///
/// A defect aborts the detector call which raised it. The scheduler disables the detector for the
/// remainder of the run; decompositions which were registered before are not affected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectorDefect {
    #[error("graph node {node} could not be assigned a color")]
    MissingColor { node: usize },
    #[error("orbit representative {representative} lies outside of 0..{len}")]
    OrbitOutOfRange { representative: usize, len: usize },
    #[error("expected {expected} entries for {what}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("inconsistent partition: {0}")]
    InconsistentPartition(String),
}
