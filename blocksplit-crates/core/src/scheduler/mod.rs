//! Chains the detectors: every detector refines the seeeds produced by the previous round, and
//! every complete seeed becomes a candidate decomposition.
//!
//! Detection proceeds in three phases:
//! 1. Rounds: every enabled detector is called on every incomplete seeed of the round, in order of
//!    priority. The new seeeds form the next round.
//! 2. Finishing: the seeeds which are still incomplete are completed by the finishing detectors.
//! 3. Postprocessing: the complete seeeds are refined by the postprocessing detectors.
//!
//! Seeeds with the same structure are only kept once. The [`TerminationCondition`] is polled in
//! between detector calls.
mod options;

use std::cmp::Reverse;
use std::time::Duration;
use std::time::Instant;

use enum_map::EnumMap;
use log::debug;
use log::info;
use log::warn;
pub use options::DetectionOptions;
pub use options::DetectorSettings;

use crate::containers::HashMap;
use crate::containers::KeyGenerator;
use crate::create_statistics_struct;
use crate::decomposition::Decomposition;
use crate::decomposition::DecompositionRegistry;
use crate::decomposition::DetectorStage;
use crate::decomposition::RegistryStatistics;
use crate::decomposition::Seeed;
use crate::decomposition::SeeedId;
use crate::detectors::Detector;
use crate::detectors::DetectorHook;
use crate::detectors::DetectorOutcome;
use crate::model::IncidenceModel;
use crate::statistics::log_statistic_postfix;
use crate::statistics::should_log_statistics;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;
use crate::termination::TerminationCondition;

/// The name under which seeeds handed to [`DetectorChainScheduler::add_given_seeed`] are recorded
/// in the provenance.
pub const GIVEN_SEEED_DETECTOR: &str = "given";

create_statistics_struct!(
    /// The statistics of the [`DetectorChainScheduler`].
    SchedulerStatistics {
        num_rounds: usize,
        num_seeeds: usize,
        num_duplicate_seeeds: usize,
        num_defects: usize,
        num_decompositions: usize,
        detection_time_ms: u128,
    }
);

/// The outcome of [`DetectorChainScheduler::detect`].
#[derive(Debug)]
pub struct DetectionResult {
    /// The distinct decompositions which were found, best score first.
    pub decompositions: Vec<Decomposition>,
    /// Numbers of blocks suggested by the detectors, sorted.
    pub block_number_hints: Vec<usize>,
    /// Whether the termination condition stopped the detection.
    pub stopped_early: bool,
}

struct RegisteredDetector<M: IncidenceModel> {
    detector: Box<dyn Detector<M>>,
    settings: DetectorSettings,
    /// Set when the detector raised a defect; it is not called again during this run.
    disabled: bool,
    num_calls: EnumMap<DetectorHook, usize>,
    time_spent: Duration,
}

impl<M: IncidenceModel> RegisteredDetector<M> {
    fn takes_part_in(&self, hook: DetectorHook) -> bool {
        let phase_enabled = match hook {
            DetectorHook::Propagate => true,
            DetectorHook::Finish => self.settings.finishing,
            DetectorHook::Postprocess => self.settings.postprocessing,
        };

        phase_enabled
            && self.settings.enabled
            && !self.disabled
            && self.detector.hooks().contains(hook)
    }
}

enum Admission {
    New(usize),
    Duplicate(Seeed),
}

/// The frozen seeeds of one run, each structure stored once.
#[derive(Default)]
struct SeeedPool {
    seeeds: Vec<Seeed>,
    by_hash: HashMap<u64, Vec<usize>>,
    ids: KeyGenerator<SeeedId>,
}

impl SeeedPool {
    fn insert(&mut self, mut seeed: Seeed, stage: Option<DetectorStage>) -> Admission {
        seeed.freeze(self.ids.next_key(), stage);
        let hash = seeed.hash().unwrap_or_default();
        let canonical = seeed.canonical_form();

        let positions = self.by_hash.entry(hash).or_default();
        if let Some(&existing) = positions
            .iter()
            .find(|&&position| self.seeeds[position].canonical_form() == canonical)
        {
            self.seeeds[existing].merge_provenance(seeed.stages());
            return Admission::Duplicate(seeed);
        }

        positions.push(self.seeeds.len());
        self.seeeds.push(seeed);
        Admission::New(self.seeeds.len() - 1)
    }

    fn positions_where(&self, predicate: impl Fn(&Seeed) -> bool) -> Vec<usize> {
        (0..self.seeeds.len())
            .filter(|&position| predicate(&self.seeeds[position]))
            .collect()
    }
}

/// Runs a chain of [`Detector`]s over a model and collects the decompositions they find.
pub struct DetectorChainScheduler<M: IncidenceModel> {
    detectors: Vec<RegisteredDetector<M>>,
    given: Vec<Seeed>,
    options: DetectionOptions,
    statistics: SchedulerStatistics,
    registry_statistics: RegistryStatistics,
}

impl<M: IncidenceModel> std::fmt::Debug for DetectorChainScheduler<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorChainScheduler")
            .field("detectors", &self.detectors.len())
            .field("given", &self.given.len())
            .field("options", &self.options)
            .field("statistics", &self.statistics)
            .finish()
    }
}

impl<M: IncidenceModel> DetectorChainScheduler<M> {
    pub fn new(options: DetectionOptions) -> Self {
        DetectorChainScheduler {
            detectors: Vec::new(),
            given: Vec::new(),
            options,
            statistics: SchedulerStatistics::default(),
            registry_statistics: RegistryStatistics::default(),
        }
    }

    pub fn add_detector(
        &mut self,
        detector: impl Detector<M> + 'static,
        settings: DetectorSettings,
    ) -> &mut Self {
        self.detectors.push(RegisteredDetector {
            detector: Box::new(detector),
            settings,
            disabled: false,
            num_calls: EnumMap::default(),
            time_spent: Duration::ZERO,
        });
        self
    }

    /// Add a seeed which is known beforehand, e.g. read from a block file. A complete seeed is
    /// registered as a decomposition; an incomplete one joins the first round.
    pub fn add_given_seeed(&mut self, seeed: Seeed) -> &mut Self {
        self.given.push(seeed);
        self
    }

    pub fn statistics(&self) -> &SchedulerStatistics {
        &self.statistics
    }

    /// Run the detection on `model` until all phases are done or `termination` triggers.
    pub fn detect(
        &mut self,
        model: &M,
        mut termination: impl TerminationCondition,
    ) -> DetectionResult {
        let started = Instant::now();
        let mut pool = SeeedPool::default();
        let mut registry = DecompositionRegistry::new();
        let mut stopped_early = false;

        for entry in &mut self.detectors {
            entry.detector.init(model);
        }

        let mut current: Vec<usize> = Vec::new();
        current.extend(self.admit(model, &mut pool, &mut registry, Seeed::new(model), None));
        for seeed in std::mem::take(&mut self.given) {
            let stage = DetectorStage {
                detector: GIVEN_SEEED_DETECTOR.to_owned(),
                duration: Duration::ZERO,
                constraints_moved: percentage(
                    seeed.num_constraints() - seeed.num_open_constraints(),
                    seeed.num_constraints(),
                ),
                variables_moved: 0.0,
            };
            current.extend(self.admit(model, &mut pool, &mut registry, seeed, Some(stage)));
        }

        let order = self.priority_order();

        'rounds: for round in 0..self.options.max_rounds {
            current.retain(|&position| !pool.seeeds[position].is_complete());
            if current.is_empty() {
                break;
            }
            self.statistics.num_rounds += 1;
            info!("detection round {round} on {} seeeds", current.len());

            let mut next = Vec::new();
            for &position in &current {
                for &index in &order {
                    if !self.detectors[index].takes_part_in(DetectorHook::Propagate) {
                        continue;
                    }
                    if termination.should_stop() {
                        stopped_early = true;
                        break 'rounds;
                    }

                    next.extend(self.run_hook(
                        index,
                        DetectorHook::Propagate,
                        model,
                        &mut pool,
                        &mut registry,
                        position,
                    ));
                    termination.detector_invoked();
                }
            }
            current = next;
        }

        for (hook, enabled) in [
            (DetectorHook::Finish, self.options.enable_finishing),
            (DetectorHook::Postprocess, self.options.enable_postprocessing),
        ] {
            if !enabled || stopped_early {
                continue;
            }

            let positions = match hook {
                DetectorHook::Postprocess => pool.positions_where(Seeed::is_complete),
                _ => pool.positions_where(|seeed| !seeed.is_complete()),
            };
            debug!("{} on {} seeeds", hook.name(), positions.len());

            'phase: for position in positions {
                for &index in &order {
                    if !self.detectors[index].takes_part_in(hook) {
                        continue;
                    }
                    if termination.should_stop() {
                        stopped_early = true;
                        break 'phase;
                    }

                    let _ = self.run_hook(index, hook, model, &mut pool, &mut registry, position);
                    termination.detector_invoked();
                }
            }
        }

        let mut block_number_hints: Vec<usize> = self
            .detectors
            .iter()
            .flat_map(|entry| entry.detector.block_number_hints())
            .collect();
        block_number_hints.sort_unstable();
        block_number_hints.dedup();

        for entry in &mut self.detectors {
            entry.detector.exit();
        }

        if stopped_early {
            warn!("detection stopped early with {} decompositions", registry.len());
        }
        self.statistics.detection_time_ms = started.elapsed().as_millis();
        self.registry_statistics = *registry.statistics();

        DetectionResult {
            decompositions: registry.into_sorted(),
            block_number_hints,
            stopped_early,
        }
    }

    /// Logs the statistics of the scheduler, the registry, and every detector.
    pub fn log_statistics(&self) {
        if !should_log_statistics() {
            return;
        }

        self.statistics.log(StatisticLogger::new(["scheduler"]));
        self.registry_statistics
            .log(StatisticLogger::new(["registry"]));

        for entry in &self.detectors {
            let statistic_logger = StatisticLogger::new([entry.detector.name()]);
            for (hook, num_calls) in &entry.num_calls {
                statistic_logger
                    .attach_to_prefix(format!("{}_calls", hook.name()))
                    .log_statistic(num_calls);
            }
            statistic_logger
                .attach_to_prefix("time_spent_ms")
                .log_statistic(entry.time_spent.as_millis());
            entry.detector.log_statistics(statistic_logger);
        }

        log_statistic_postfix();
    }

    /// Detector indices by descending priority; ties keep the order in which they were added.
    fn priority_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.detectors.len()).collect();
        order.sort_by_key(|&index| Reverse(self.detectors[index].settings.priority));
        order
    }

    /// Call `hook` of detector `index` on the seeed at `position` and admit its children. Returns
    /// the positions of the new seeeds.
    fn run_hook(
        &mut self,
        index: usize,
        hook: DetectorHook,
        model: &M,
        pool: &mut SeeedPool,
        registry: &mut DecompositionRegistry,
        position: usize,
    ) -> Vec<usize> {
        let parent = &pool.seeeds[position];
        let parent_open_constraints = parent.num_open_constraints();
        let parent_open_variables = parent.open_variables(model).len();

        let entry = &mut self.detectors[index];
        entry.num_calls[hook] += 1;

        let started = Instant::now();
        let outcome = match hook {
            DetectorHook::Propagate => entry.detector.propagate_seeed(model, parent),
            DetectorHook::Finish => entry.detector.finish_seeed(model, parent),
            DetectorHook::Postprocess => entry.detector.postprocess_seeed(model, parent),
        };
        let duration = started.elapsed();
        entry.time_spent += duration;

        let children = match outcome {
            Ok(DetectorOutcome::Found(children)) => children,
            Ok(DetectorOutcome::NotFound | DetectorOutcome::DidNotRun) => return Vec::new(),
            Err(defect) => {
                warn!(
                    "detector {} is disabled for the rest of the run: {defect}",
                    entry.detector.name()
                );
                entry.disabled = true;
                self.statistics.num_defects += 1;
                return Vec::new();
            }
        };
        debug!(
            "{} found {} seeeds during {} of {:?}",
            entry.detector.name(),
            children.len(),
            hook.name(),
            parent.id()
        );

        let detector = entry.detector.name().to_owned();
        let mut admitted = Vec::new();
        for child in children {
            let stage = DetectorStage {
                detector: detector.clone(),
                duration,
                constraints_moved: percentage(
                    parent_open_constraints.saturating_sub(child.num_open_constraints()),
                    model.num_constraints(),
                ),
                variables_moved: percentage(
                    parent_open_variables.saturating_sub(child.open_variables(model).len()),
                    model.num_variables(),
                ),
            };
            admitted.extend(self.admit(model, pool, registry, child, Some(stage)));
        }
        admitted
    }

    /// Freeze `seeed` and add it to the pool; complete seeeds with enough blocks are registered.
    /// Returns the position of the seeed unless it was a duplicate.
    fn admit(
        &mut self,
        model: &M,
        pool: &mut SeeedPool,
        registry: &mut DecompositionRegistry,
        seeed: Seeed,
        stage: Option<DetectorStage>,
    ) -> Option<usize> {
        match pool.insert(seeed, stage) {
            Admission::New(position) => {
                self.statistics.num_seeeds += 1;
                self.register(model, registry, &pool.seeeds[position]);
                Some(position)
            }
            Admission::Duplicate(seeed) => {
                self.statistics.num_duplicate_seeeds += 1;
                // Registering the duplicate merges its provenance into the registered copy.
                self.register(model, registry, &seeed);
                None
            }
        }
    }

    fn register(&mut self, model: &M, registry: &mut DecompositionRegistry, seeed: &Seeed) {
        if !seeed.is_complete() || seeed.num_blocks() < self.options.min_blocks() {
            return;
        }

        match Decomposition::from_seeed(model, seeed) {
            Ok(decomposition) => {
                if registry.add_if_unique(decomposition) {
                    self.statistics.num_decompositions += 1;
                }
            }
            Err(defect) => {
                warn!("{:?} cannot be registered: {defect}", seeed.id());
                self.statistics.num_defects += 1;
            }
        }
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}
