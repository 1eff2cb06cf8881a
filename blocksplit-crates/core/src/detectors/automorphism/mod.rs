//! Finds symmetric constraints and proposes every orbit of constraints as the blocks of a
//! decomposition.
//!
//! The open part of a seeed is turned into an [`AutomorphismGraph`], whose automorphisms are
//! computed by an [`AutomorphismSearch`]. Constraints in the same orbit are interchangeable, which
//! makes them good candidates for identical blocks.
mod graph;
mod orbits;
mod search;

pub use graph::AutomorphismGraph;
pub use graph::ColoredGraph;
pub use graph::NodeSignature;
pub use search::AutomorphismSearch;
pub use search::RefinementSearch;

use std::hash::Hash;
use std::hash::Hasher;

use enumset::enum_set;
use enumset::EnumSet;
use fnv::FnvHasher;
use log::debug;

use super::Detector;
use super::DetectorHook;
use super::DetectorOutcome;
use crate::basic_types::DetectorDefect;
use crate::containers::HashMap;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::decomposition::DecompositionBuilder;
use crate::decomposition::Seeed;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::ModelSubset;
use crate::statistics::CumulativeMovingAverage;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// How coefficients, sides, bounds, and objective coefficients color the automorphism graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CoefficientMode {
    /// Nodes with different values receive different colors.
    Exact,
    /// Only the sign of every value is taken into account.
    SignOnly,
    /// Use exact values, and retry with signs only when no two constraints are symmetric.
    #[default]
    ExactThenSignOnly,
}

/// The options of the [`AutomorphismDetector`].
#[derive(Clone, Copy, Debug)]
pub struct AutomorphismOptions {
    pub coefficient_mode: CoefficientMode,
    /// The maximum number of orbits turned into candidates per call.
    pub max_candidates: usize,
    /// Try larger orbits first.
    pub reorder_by_size: bool,
    /// The maximum number of search nodes visited per automorphism search.
    pub node_budget: usize,
}

impl Default for AutomorphismOptions {
    fn default() -> Self {
        AutomorphismOptions {
            coefficient_mode: CoefficientMode::default(),
            max_candidates: 8,
            reorder_by_size: true,
            node_budget: 100_000,
        }
    }
}

create_statistics_struct!(
    /// The statistics of the [`AutomorphismDetector`].
    AutomorphismStatistics {
        num_calls: usize,
        num_searches: usize,
        num_generators: usize,
        num_sign_only_fallbacks: usize,
        num_candidates: usize,
        average_num_nontrivial_orbits: CumulativeMovingAverage<u64>,
    }
);

/// Proposes the orbits of the open constraints under the automorphisms of the model as blocks.
///
/// For every non-trivial orbit, the open constraints outside of the orbit are put in the master
/// and the orbit constraints are completed into blocks. Orbits which were tried least recently go
/// first. The sizes of the orbits are also collected as hints for the number of blocks.
#[derive(Debug)]
pub struct AutomorphismDetector<Search = RefinementSearch> {
    options: AutomorphismOptions,
    search: Search,
    /// The call in which an orbit, identified by [`orbit_key`], was last turned into a
    /// candidate. Cleared when detection ends.
    last_tried: HashMap<u64, usize>,
    num_calls: usize,
    hints: Vec<usize>,
    statistics: AutomorphismStatistics,
}

impl AutomorphismDetector<RefinementSearch> {
    pub fn new(options: AutomorphismOptions) -> Self {
        AutomorphismDetector::with_search(options, RefinementSearch::new(options.node_budget))
    }
}

impl Default for AutomorphismDetector<RefinementSearch> {
    fn default() -> Self {
        AutomorphismDetector::new(AutomorphismOptions::default())
    }
}

impl<Search: AutomorphismSearch> AutomorphismDetector<Search> {
    pub fn with_search(options: AutomorphismOptions, search: Search) -> Self {
        AutomorphismDetector {
            options,
            search,
            last_tried: HashMap::default(),
            num_calls: 0,
            hints: Vec::new(),
            statistics: AutomorphismStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &AutomorphismStatistics {
        &self.statistics
    }

    /// The orbits of the constraints of `model`, including trivial ones.
    fn constraint_orbits<M: IncidenceModel>(
        &mut self,
        model: &M,
        sign_only: bool,
    ) -> Result<Vec<Vec<ConstraintId>>, DetectorDefect> {
        let graph = AutomorphismGraph::build(model, sign_only)?;
        let generators = self.search.generators(graph.graph());
        self.statistics.num_searches += 1;
        self.statistics.num_generators += generators.len();

        let orbits = orbits::point_orbits(
            graph.num_constraint_nodes(),
            &generators,
            self.options.reorder_by_size,
        )?;

        Ok(orbits
            .into_iter()
            .map(|orbit| orbit.into_iter().map(|node| graph.constraint(node)).collect())
            .collect())
    }

    fn add_hints(&mut self, orbits: &[Vec<ConstraintId>]) {
        self.hints
            .extend(orbits::block_number_hints(orbits.iter().map(Vec::len)));
        self.hints.sort_unstable();
        self.hints.dedup();
    }
}

fn orbit_key(orbit: &[ConstraintId]) -> u64 {
    let mut hasher = FnvHasher::default();
    orbit.hash(&mut hasher);
    hasher.finish()
}

fn has_nontrivial_orbit(orbits: &[Vec<ConstraintId>]) -> bool {
    orbits.iter().any(|orbit| orbit.len() > 1)
}

impl<M: IncidenceModel, Search: AutomorphismSearch> Detector<M> for AutomorphismDetector<Search> {
    fn name(&self) -> &str {
        "automorphism"
    }

    fn hooks(&self) -> EnumSet<DetectorHook> {
        enum_set!(DetectorHook::Propagate)
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger)
    }

    fn propagate_seeed(
        &mut self,
        model: &M,
        seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        if seeed.num_open_constraints() < 2 {
            return Ok(DetectorOutcome::DidNotRun);
        }
        self.num_calls += 1;
        self.statistics.num_calls += 1;

        let view = ModelSubset::new(model, seeed.open_constraints());
        let orbits = match self.options.coefficient_mode {
            CoefficientMode::Exact => self.constraint_orbits(&view, false)?,
            CoefficientMode::SignOnly => self.constraint_orbits(&view, true)?,
            CoefficientMode::ExactThenSignOnly => {
                let exact = self.constraint_orbits(&view, false)?;
                if has_nontrivial_orbit(&exact) {
                    exact
                } else {
                    self.statistics.num_sign_only_fallbacks += 1;
                    self.constraint_orbits(&view, true)?
                }
            }
        };

        let mut nontrivial: Vec<Vec<ConstraintId>> =
            orbits.into_iter().filter(|orbit| orbit.len() > 1).collect();
        self.statistics
            .average_num_nontrivial_orbits
            .add_term(nontrivial.len() as u64);
        if nontrivial.is_empty() {
            debug!("no symmetric constraints among {} open constraints", view.len());
            return Ok(DetectorOutcome::NotFound);
        }
        self.add_hints(&nontrivial);

        nontrivial.sort_by_key(|orbit| self.last_tried.get(&orbit_key(orbit)).copied());
        nontrivial.truncate(self.options.max_candidates);

        let mut candidates = Vec::new();
        for orbit in nontrivial {
            let mut in_orbit = KeyedVec::with_len(seeed.num_constraints(), false);
            for &constraint in &orbit {
                in_orbit[constraint] = true;
            }

            let mut child = seeed.child();
            for constraint in seeed.open_constraints() {
                if !in_orbit[constraint] {
                    child.set_master(constraint);
                }
            }
            DecompositionBuilder::complete(model, &mut child);

            let _ = self.last_tried.insert(orbit_key(&orbit), self.num_calls);
            if child.num_blocks() >= 2 {
                candidates.push(child);
            }
        }

        if candidates.is_empty() {
            return Ok(DetectorOutcome::NotFound);
        }

        self.statistics.num_candidates += candidates.len();
        Ok(DetectorOutcome::Found(candidates))
    }

    fn block_number_hints(&self) -> Vec<usize> {
        self.hints.clone()
    }

    fn exit(&mut self) {
        self.last_tried.clear();
        self.hints.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::decomposition::ConstraintAssignment;
    use crate::decomposition::SeeedId;
    use crate::model::test_models::binaries;
    use crate::model::test_models::linear;
    use crate::model::test_models::symmetric_packing;
    use crate::model::test_models::three_constraints_with_linking;
    use crate::model::Model;

    fn frozen_root(model: &Model) -> Seeed {
        let mut seeed = Seeed::new(model);
        seeed.freeze(SeeedId::create_from_index(0), None);
        seeed
    }

    fn propagate(detector: &mut AutomorphismDetector, model: &Model) -> DetectorOutcome {
        detector
            .propagate_seeed(model, &frozen_root(model))
            .unwrap()
    }

    /// `c0: a <= 1` and `c1: 2 b <= 1`, which are only symmetric when looking at signs.
    fn symmetric_up_to_sign() -> (Model, [ConstraintId; 2]) {
        let mut model = Model::default();
        let x = binaries(&mut model, &["a", "b"]);
        let c0 = linear(&mut model, "c0", f64::NEG_INFINITY, 1.0, &[(x[0], 1.0)]);
        let c1 = linear(&mut model, "c1", f64::NEG_INFINITY, 1.0, &[(x[1], 2.0)]);
        (model, [c0, c1])
    }

    #[test]
    fn symmetric_packing_orbit_gives_two_blocks() {
        let (model, [c0, c1, c2, c3]) = symmetric_packing();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions::default());

        let DetectorOutcome::Found(candidates) = propagate(&mut detector, &model) else {
            panic!("expected a candidate");
        };

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].blocks(), vec![vec![c0], vec![c2]]);
        assert_eq!(candidates[0].assignment(c1), Some(ConstraintAssignment::Master));
        assert_eq!(candidates[0].assignment(c3), Some(ConstraintAssignment::Master));
        assert_eq!(
            <AutomorphismDetector as Detector<Model>>::block_number_hints(&detector),
            vec![2]
        );
        assert_eq!(detector.statistics().num_sign_only_fallbacks, 0);
    }

    #[test]
    fn symmetric_linking_scenario() {
        let (model, [c0, c1, c2]) = three_constraints_with_linking();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions::default());

        let DetectorOutcome::Found(candidates) = propagate(&mut detector, &model) else {
            panic!("expected a candidate");
        };

        assert_eq!(candidates[0].blocks(), vec![vec![c0], vec![c1]]);
        assert_eq!(candidates[0].assignment(c2), Some(ConstraintAssignment::Master));
    }

    #[test]
    fn sign_only_fallback_finds_symmetry() {
        let (model, [c0, c1]) = symmetric_up_to_sign();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions::default());

        let DetectorOutcome::Found(candidates) = propagate(&mut detector, &model) else {
            panic!("expected a candidate");
        };

        assert_eq!(candidates[0].blocks(), vec![vec![c0], vec![c1]]);
        assert_eq!(detector.statistics().num_sign_only_fallbacks, 1);
    }

    #[test]
    fn exact_mode_does_not_fall_back() {
        let (model, _) = symmetric_up_to_sign();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions {
            coefficient_mode: CoefficientMode::Exact,
            ..Default::default()
        });

        assert!(matches!(
            propagate(&mut detector, &model),
            DetectorOutcome::NotFound
        ));
    }

    #[test]
    fn single_open_constraint_does_not_run() {
        let (model, [c0, c1, _, c3]) = symmetric_packing();
        let mut seeed = Seeed::new(&model);
        seeed.set_master(c0);
        seeed.set_master(c1);
        seeed.set_master(c3);
        seeed.freeze(SeeedId::create_from_index(0), None);

        let mut detector = AutomorphismDetector::new(AutomorphismOptions::default());

        assert!(matches!(
            detector.propagate_seeed(&model, &seeed).unwrap(),
            DetectorOutcome::DidNotRun
        ));
    }

    #[test]
    fn tried_orbits_remember_the_call() {
        let (model, _) = symmetric_packing();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions {
            max_candidates: 1,
            ..Default::default()
        });

        let _ = propagate(&mut detector, &model);
        let _ = propagate(&mut detector, &model);

        assert_eq!(detector.statistics().num_calls, 2);
        assert_eq!(detector.last_tried.values().copied().max(), Some(2));
    }

    #[test]
    fn tried_orbits_are_forgotten_when_detection_ends() {
        let (model, _) = symmetric_packing();
        let mut detector = AutomorphismDetector::new(AutomorphismOptions::default());

        let _ = propagate(&mut detector, &model);
        assert!(!detector.last_tried.is_empty());

        <AutomorphismDetector as Detector<Model>>::exit(&mut detector);

        assert!(detector.last_tried.is_empty());
        assert!(<AutomorphismDetector as Detector<Model>>::block_number_hints(&detector).is_empty());
    }
}
