//! Detectors search for block structure in the open part of a [`Seeed`].
//!
//! A detector implements [`Detector`]. The scheduler calls its hooks in three phases:
//! - [`Detector::propagate_seeed`] during the detection rounds, on every seeed of the round;
//! - [`Detector::finish_seeed`] on seeeds which are still incomplete after the last round;
//! - [`Detector::postprocess_seeed`] on complete seeeds, to refine them further.
//!
//! Every hook returns a three-valued [`DetectorOutcome`]: the detector found new seeeds, it ran but
//! found no structure, or it did not run at all. Internal inconsistencies are reported as a
//! [`DetectorDefect`] instead; the scheduler then disables the detector for the rest of the run.
mod automorphism;
mod color_classes;
mod connected_components;

pub use automorphism::*;
pub use color_classes::*;
pub use connected_components::*;
use enum_map::Enum;
use enumset::EnumSet;
use enumset::EnumSetType;

use crate::basic_types::DetectorDefect;
use crate::decomposition::Seeed;
use crate::model::IncidenceModel;
use crate::statistics::StatisticLogger;

/// The hooks of a [`Detector`] which the scheduler can call.
#[derive(Debug, EnumSetType, Enum)]
pub enum DetectorHook {
    Propagate,
    Finish,
    Postprocess,
}

impl DetectorHook {
    pub fn name(self) -> &'static str {
        match self {
            DetectorHook::Propagate => "propagate",
            DetectorHook::Finish => "finish",
            DetectorHook::Postprocess => "postprocess",
        }
    }
}

/// The result of calling a [`Detector`] hook.
#[derive(Debug)]
pub enum DetectorOutcome {
    /// The detector produced the given new seeeds. They are children of the input seeed and are
    /// not frozen yet.
    Found(Vec<Seeed>),
    /// The detector ran, but the structure it looks for is absent.
    NotFound,
    /// A precondition of the detector was not met, e.g. there was nothing left to assign.
    DidNotRun,
}

impl DetectorOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, DetectorOutcome::Found(_))
    }
}

/// A structure detection algorithm.
///
/// All hooks have a default implementation which does nothing, so a detector only implements the
/// hooks it supports and lists them in [`Detector::hooks`]. Hooks receive the frozen input seeed
/// by reference and must never modify it; new seeeds are created with [`Seeed::child`].
pub trait Detector<M: IncidenceModel> {
    /// The name of the detector, used in the provenance of seeeds and in logging.
    fn name(&self) -> &str;

    /// The hooks which the detector implements.
    fn hooks(&self) -> EnumSet<DetectorHook>;

    /// Logs statistics of the detector using the provided [`StatisticLogger`].
    ///
    /// It is recommended to create a struct through the [`crate::create_statistics_struct!`]
    /// macro!
    fn log_statistics(&self, _statistic_logger: StatisticLogger) {}

    /// Called once before the first round.
    fn init(&mut self, _model: &M) {}

    /// Called once after the last hook invocation.
    fn exit(&mut self) {}

    /// Search for structure in the open part of `seeed`.
    fn propagate_seeed(
        &mut self,
        _model: &M,
        _seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        Ok(DetectorOutcome::DidNotRun)
    }

    /// Complete `seeed`, which is still open after the last round.
    fn finish_seeed(
        &mut self,
        _model: &M,
        _seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        Ok(DetectorOutcome::DidNotRun)
    }

    /// Refine the complete `seeed`.
    fn postprocess_seeed(
        &mut self,
        _model: &M,
        _seeed: &Seeed,
    ) -> Result<DetectorOutcome, DetectorDefect> {
        Ok(DetectorOutcome::DidNotRun)
    }

    /// Numbers of blocks which the detector considers promising, gathered over all its calls.
    fn block_number_hints(&self) -> Vec<usize> {
        Vec::new()
    }
}
