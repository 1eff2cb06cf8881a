//! # blocksplit
//! blocksplit looks for block structure in constraint systems. It permutes the constraints into
//! independent blocks, coupled by a set of master constraints and by linking variables, so that
//! the system can be handed to a decomposition-based solver.
//!
//! The engine lives in `blocksplit-core` and is re-exported from this crate. The file formats in
//! which decompositions are exchanged are available under [`files`].
//!
//! # Detecting structure
//! A [`model::Model`] is built from variables and constraints. The
//! [`DetectorChainScheduler`] then runs its detectors on the model and returns every
//! decomposition it found, best first:
//! ```rust
//! # use blocksplit::detectors::ConnectedComponentDetector;
//! # use blocksplit::detectors::ConnectedComponentOptions;
//! # use blocksplit::model::ConstraintHandler;
//! # use blocksplit::model::Model;
//! # use blocksplit::model::VariableType;
//! # use blocksplit::termination::Indefinite;
//! # use blocksplit::DetectionOptions;
//! # use blocksplit::DetectorChainScheduler;
//! # use blocksplit::DetectorSettings;
//! let mut model = Model::default();
//! let x = model.add_variable("x", VariableType::Integer, 0.0, 5.0, 1.0)?;
//! let y = model.add_variable("y", VariableType::Integer, 0.0, 5.0, 1.0)?;
//!
//! let _ = model.add_constraint("cx", ConstraintHandler::Linear, 1.0, 3.0, [(x, 2.0)])?;
//! let _ = model.add_constraint("cy", ConstraintHandler::Linear, 1.0, 3.0, [(y, 2.0)])?;
//!
//! let mut scheduler = DetectorChainScheduler::new(DetectionOptions::default());
//! let _ = scheduler.add_detector(
//!     ConnectedComponentDetector::new(ConnectedComponentOptions::default()),
//!     DetectorSettings::default(),
//! );
//!
//! let result = scheduler.detect(&model, Indefinite);
//! assert_eq!(result.decompositions.len(), 1);
//! assert_eq!(result.decompositions[0].num_blocks(), 2);
//! # Ok::<(), blocksplit::model::ModelError>(())
//! ```
//!
//! # Exchanging decompositions
//! A decomposition is written as a block assignment file with
//! [`decomposition::block_file_from_decomposition`]; a block file read with
//! [`files::BlockFile::parse`] is turned back into a seeed with
//! [`decomposition::seeed_from_block_file`] and can be handed to the scheduler with
//! [`DetectorChainScheduler::add_given_seeed`].
pub use blocksplit_core::*;

/// Reading and writing block assignment files and partition files.
pub mod files {
    pub use dec_format::*;
}
