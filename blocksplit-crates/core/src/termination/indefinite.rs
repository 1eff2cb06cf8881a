use super::TerminationCondition;

/// A [`TerminationCondition`] which never triggers; every detector is called on every seeed.
#[derive(Clone, Copy, Debug)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}
