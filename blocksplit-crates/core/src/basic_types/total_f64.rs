use std::cmp::Ordering;
use std::hash::Hash;
use std::hash::Hasher;

/// An `f64` with a total order, so that bounds and coefficients can be used in sorted keys and
/// hash maps. Ordering and equality follow [`f64::total_cmp`]; in particular `-0.0 < 0.0`, which
/// is why zeros are normalised on construction.
#[derive(Clone, Copy, Debug)]
pub struct TotalF64(f64);

impl TotalF64 {
    pub fn new(value: f64) -> Self {
        if value == 0.0 {
            TotalF64(0.0)
        } else {
            TotalF64(value)
        }
    }

    /// `-1`, `0`, or `1` depending on the sign of `value`; infinities keep their sign.
    pub fn sign_of(value: f64) -> Self {
        if value == 0.0 || value.is_nan() {
            TotalF64(0.0)
        } else {
            TotalF64(value.signum())
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TotalF64 {}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TotalF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for TotalF64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}
