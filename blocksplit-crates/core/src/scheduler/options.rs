/// The options of the [`super::DetectorChainScheduler`].
#[derive(Clone, Copy, Debug)]
pub struct DetectionOptions {
    /// The number of rounds in which every detector is called on every seeed of the round.
    pub max_rounds: usize,
    /// Register decompositions with a single block.
    pub allow_single_block: bool,
    /// Complete the seeeds which are still open after the last round.
    pub enable_finishing: bool,
    /// Refine complete seeeds once detection has finished.
    pub enable_postprocessing: bool,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        DetectionOptions {
            max_rounds: 2,
            allow_single_block: false,
            enable_finishing: true,
            enable_postprocessing: true,
        }
    }
}

impl DetectionOptions {
    /// The smallest number of blocks of a decomposition which is registered.
    pub(crate) fn min_blocks(&self) -> usize {
        if self.allow_single_block {
            1
        } else {
            2
        }
    }
}

/// How the scheduler uses one detector.
#[derive(Clone, Copy, Debug)]
pub struct DetectorSettings {
    pub enabled: bool,
    /// Detectors with a higher priority are called first within a round. Detectors with equal
    /// priority are called in the order in which they were added.
    pub priority: i32,
    /// Call the detector when finishing seeeds.
    pub finishing: bool,
    /// Call the detector when postprocessing seeeds.
    pub postprocessing: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        DetectorSettings {
            enabled: true,
            priority: 0,
            finishing: true,
            postprocessing: true,
        }
    }
}
