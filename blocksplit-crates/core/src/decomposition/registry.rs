use log::debug;

use super::Decomposition;
use super::DecompositionScore;
use crate::create_statistics_struct;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

create_statistics_struct!(
    /// The statistics of the [`DecompositionRegistry`].
    RegistryStatistics {
        num_added: usize,
        num_duplicates: usize,
    }
);

/// Collects the decompositions found during detection, keeping one per distinct partition.
#[derive(Clone, Debug, Default)]
pub struct DecompositionRegistry {
    decompositions: Vec<Decomposition>,
    statistics: RegistryStatistics,
}

impl DecompositionRegistry {
    pub fn new() -> Self {
        DecompositionRegistry::default()
    }

    /// Add `decomposition` unless a decomposition with the same partition is registered already.
    /// In that case, the provenance of `decomposition` is merged into the registered one.
    ///
    /// Returns whether the decomposition was added.
    pub fn add_if_unique(&mut self, decomposition: Decomposition) -> bool {
        if let Some(existing) = self
            .decompositions
            .iter_mut()
            .find(|existing| existing.has_same_partition(&decomposition))
        {
            debug!(
                "decomposition by {:?} was also found by {:?}",
                existing.detectors(),
                decomposition.detectors()
            );
            existing.merge_provenance(&decomposition);
            self.statistics.num_duplicates += 1;
            return false;
        }

        self.decompositions.push(decomposition);
        self.statistics.num_added += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.decompositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decompositions.is_empty()
    }

    /// The registered decompositions, in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Decomposition> {
        self.decompositions.iter()
    }

    pub fn statistics(&self) -> &RegistryStatistics {
        &self.statistics
    }

    pub fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger)
    }

    /// The registered decompositions, best score first. Decompositions with equal scores keep the
    /// order in which they were added.
    pub fn into_sorted(self) -> Vec<Decomposition> {
        let mut scored: Vec<(DecompositionScore, Decomposition)> = self
            .decompositions
            .into_iter()
            .map(|decomposition| (DecompositionScore::of(&decomposition), decomposition))
            .collect();
        scored.sort_by(|(a, _), (b, _)| a.compare(b));

        scored
            .into_iter()
            .map(|(_, decomposition)| decomposition)
            .collect()
    }
}
