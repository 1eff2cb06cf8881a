use enumset::EnumSet;
use log::debug;

use super::Detector;
use super::DetectorHook;
use super::DetectorOutcome;
use crate::basic_types::DetectorDefect;
use crate::containers::KeyedVec;
use crate::create_statistics_struct;
use crate::decomposition::label_blocks;
use crate::decomposition::BlockLabels;
use crate::decomposition::DecompositionBuilder;
use crate::decomposition::Seeed;
use crate::model::ConstraintId;
use crate::model::IncidenceModel;
use crate::model::ModelSubset;
use crate::statistics::CumulativeMovingAverage;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// Decides which constraints are structurally forced into the master before the connected
/// components are computed.
pub trait IrrelevancePolicy<M: IncidenceModel> {
    fn is_irrelevant(&self, model: &M, constraint: ConstraintId) -> bool;
}

impl<M: IncidenceModel, F: Fn(&M, ConstraintId) -> bool> IrrelevancePolicy<M> for F {
    fn is_irrelevant(&self, model: &M, constraint: ConstraintId) -> bool {
        self(model, constraint)
    }
}

/// Routes set covering, packing, and partitioning constraints, logic-or constraints, and
/// constraints in which every coefficient is one and every variable integral to the master.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetConstraintPolicy;

impl<M: IncidenceModel> IrrelevancePolicy<M> for SetConstraintPolicy {
    fn is_irrelevant(&self, model: &M, constraint: ConstraintId) -> bool {
        if model.handler_type(constraint).is_set_constraint() {
            return true;
        }

        let mut variables = model.variables_of(constraint).peekable();
        variables.peek().is_some()
            && variables
                .all(|(variable, coefficient)| coefficient == 1.0 && model.is_integral(variable))
    }
}

/// Considers every constraint relevant.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIrrelevantConstraints;

impl<M: IncidenceModel> IrrelevancePolicy<M> for NoIrrelevantConstraints {
    fn is_irrelevant(&self, _model: &M, _constraint: ConstraintId) -> bool {
        false
    }
}

/// The built-in irrelevance policies, selectable from the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum IrrelevancePolicyKind {
    /// See [`SetConstraintPolicy`].
    #[default]
    SetConstraints,
    /// See [`NoIrrelevantConstraints`].
    Nothing,
}

/// The options of the [`ConnectedComponentDetector`].
#[derive(Clone, Copy, Debug)]
pub struct ConnectedComponentOptions {
    pub irrelevance: IrrelevancePolicyKind,
    /// Accept a single component when constraints were routed to the master, which gives a
    /// bordered structure with one block.
    pub seek_bordered: bool,
}

impl Default for ConnectedComponentOptions {
    fn default() -> Self {
        ConnectedComponentOptions {
            irrelevance: IrrelevancePolicyKind::SetConstraints,
            seek_bordered: false,
        }
    }
}

create_statistics_struct!(
    /// The statistics of the [`ConnectedComponentDetector`].
    ConnectedComponentStatistics {
        num_calls: usize,
        num_found: usize,
        num_irrelevant_constraints: usize,
        num_blocks_split: usize,
        average_num_blocks: CumulativeMovingAverage<u64>,
    }
);

/// Finds the connected components of the open constraints, where two constraints are connected
/// when they share a variable.
///
/// When propagating, irrelevant constraints are first routed to the master by an
/// [`IrrelevancePolicy`]. When finishing, the open constraints are completed without routing
/// anything to the master. When postprocessing, every block of a complete seeed is split into its
/// connected components.
pub struct ConnectedComponentDetector<M: IncidenceModel> {
    policy: Box<dyn IrrelevancePolicy<M>>,
    seek_bordered: bool,
    statistics: ConnectedComponentStatistics,
}

impl<M: IncidenceModel> std::fmt::Debug for ConnectedComponentDetector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedComponentDetector")
            .field("policy", &"<IrrelevancePolicy>")
            .field("seek_bordered", &self.seek_bordered)
            .field("statistics", &self.statistics)
            .finish()
    }
}

impl<M: IncidenceModel> ConnectedComponentDetector<M> {
    pub fn new(options: ConnectedComponentOptions) -> Self {
        let policy: Box<dyn IrrelevancePolicy<M>> = match options.irrelevance {
            IrrelevancePolicyKind::SetConstraints => Box::new(SetConstraintPolicy),
            IrrelevancePolicyKind::Nothing => Box::new(NoIrrelevantConstraints),
        };

        ConnectedComponentDetector {
            policy,
            seek_bordered: options.seek_bordered,
            statistics: ConnectedComponentStatistics::default(),
        }
    }

    /// Create a detector with a custom irrelevance policy.
    pub fn with_policy(policy: impl IrrelevancePolicy<M> + 'static, seek_bordered: bool) -> Self {
        ConnectedComponentDetector {
            policy: Box::new(policy),
            seek_bordered,
            statistics: ConnectedComponentStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &ConnectedComponentStatistics {
        &self.statistics
    }
}

impl<M: IncidenceModel> Detector<M> for ConnectedComponentDetector<M> {
    fn name(&self) -> &str {
        "connected_components"
    }

    fn hooks(&self) -> EnumSet<DetectorHook> {
        EnumSet::all()
    }

    fn log_statistics(&self, statistic_logger: StatisticLogger) {
        self.statistics.log(statistic_logger)
    }

    fn propagate_seeed(
        &mut self,
        model: &M,
        seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        if seeed.num_open_constraints() == 0 {
            return Ok(DetectorOutcome::DidNotRun);
        }
        self.statistics.num_calls += 1;

        let mut child = seeed.child();
        let open: Vec<ConstraintId> = seeed.open_constraints().collect();
        let mut num_irrelevant = 0;
        for &constraint in &open {
            if self.policy.is_irrelevant(model, constraint) {
                child.set_master(constraint);
                num_irrelevant += 1;
            }
        }
        self.statistics.num_irrelevant_constraints += num_irrelevant;

        if num_irrelevant == open.len() {
            debug!("all {} open constraints are irrelevant", open.len());
            return Ok(DetectorOutcome::NotFound);
        }

        DecompositionBuilder::complete(model, &mut child);
        let num_blocks = child.num_blocks();
        self.statistics.average_num_blocks.add_term(num_blocks as u64);

        if num_blocks == 0 || (num_blocks == 1 && !(self.seek_bordered && num_irrelevant > 0)) {
            debug!("found {num_blocks} component(s), which is no structure");
            return Ok(DetectorOutcome::NotFound);
        }

        self.statistics.num_found += 1;
        Ok(DetectorOutcome::Found(vec![child]))
    }

    fn finish_seeed(&mut self, model: &M, seeed: &Seeed) -> Result<DetectorOutcome, DetectorDefect> {
        if seeed.is_complete() {
            return Ok(DetectorOutcome::DidNotRun);
        }

        let mut child = seeed.child();
        DecompositionBuilder::complete(model, &mut child);

        Ok(DetectorOutcome::Found(vec![child]))
    }

    fn postprocess_seeed(
        &mut self,
        model: &M,
        seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        if !seeed.is_complete() || seeed.num_blocks() == 0 {
            return Ok(DetectorOutcome::DidNotRun);
        }

        match split_blocks(model, seeed) {
            Some(child) => {
                self.statistics.num_blocks_split += child.num_blocks() - seeed.num_blocks();
                Ok(DetectorOutcome::Found(vec![child]))
            }
            None => Ok(DetectorOutcome::NotFound),
        }
    }
}

/// Split every block of `seeed` into its connected components. Returns [`None`] when every block
/// is already connected.
pub fn split_blocks<M: IncidenceModel>(model: &M, seeed: &Seeed) -> Option<Seeed> {
    let mut labels: KeyedVec<ConstraintId, Option<usize>> =
        KeyedVec::with_len(seeed.num_constraints(), None);
    let mut num_blocks = 0;
    let mut split = false;

    for constraints in seeed.blocks() {
        let view = ModelSubset::new(model, constraints.iter().copied());
        let BlockLabels {
            labels: components,
            num_blocks: num_components,
        } = label_blocks(&view, &KeyedVec::new(), 0);

        split |= num_components > 1;
        for constraint in constraints {
            // Constraints without variables stay with the first component.
            labels[constraint] = Some(num_blocks + components[constraint].unwrap_or(0));
        }
        num_blocks += num_components.max(1);
    }

    if !split {
        return None;
    }

    let mut child = seeed.child();
    child.set_blocks(&labels, num_blocks);
    Some(child)
}
