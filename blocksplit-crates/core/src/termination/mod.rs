//! A [`TerminationCondition`] is polled by the scheduler between two detector invocations. It
//! indicates when the detection should stop, even if not every detector has been called on every
//! seeed. The most common example would be [`TimeBudget`], which gives the detection a certain
//! wall-clock budget.
//!
//! A single detector call is never interrupted; the budget is only checked in between calls.

mod call_budget;
mod combinator;
mod indefinite;
mod time_budget;

pub use call_budget::CallBudget;
pub use combinator::Combinator;
pub use indefinite::Indefinite;
pub use time_budget::TimeBudget;

/// The central trait that defines a termination condition. A termination condition determines when
/// the scheduler should stop invoking detectors.
pub trait TerminationCondition {
    /// Returns `true` when the scheduler should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;

    /// Called by the scheduler after every detector invocation.
    fn detector_invoked(&mut self) {}
}

impl<T: TerminationCondition> TerminationCondition for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(t) => t.should_stop(),
            None => false,
        }
    }

    fn detector_invoked(&mut self) {
        if let Some(t) = self {
            t.detector_invoked()
        }
    }
}

impl<T: TerminationCondition + ?Sized> TerminationCondition for &mut T {
    fn should_stop(&mut self) -> bool {
        (**self).should_stop()
    }

    fn detector_invoked(&mut self) {
        (**self).detector_invoked()
    }
}
