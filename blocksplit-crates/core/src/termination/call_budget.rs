use super::TerminationCondition;

/// A [`TerminationCondition`] which triggers after a fixed number of detector invocations.
#[derive(Debug, Copy, Clone)]
pub struct CallBudget {
    budget: u64,
    num_calls: u64,
}

impl CallBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_calls: 0,
        }
    }
}

impl TerminationCondition for CallBudget {
    fn should_stop(&mut self) -> bool {
        self.num_calls >= self.budget
    }

    fn detector_invoked(&mut self) {
        self.num_calls += 1;
    }
}
