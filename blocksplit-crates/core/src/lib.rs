//! # blocksplit-core
//! The structure detection engine of blocksplit. Given a constraint system, it searches for
//! permutations of the rows and columns which reveal a block structure: a set of independent
//! blocks, coupled by linking constraints (the master) and linking variables.
//!
//! The engine is organised around partial decompositions, called [`Seeed`]s. Every constraint of
//! a seeed is open, in the master, or in a block. [`detectors`] assign open constraints, the
//! [`DetectorChainScheduler`] chains them, and every complete seeed becomes a [`Decomposition`].
//!
//! # Example
//! ```rust
//! # use blocksplit_core::detectors::AutomorphismDetector;
//! # use blocksplit_core::detectors::AutomorphismOptions;
//! # use blocksplit_core::model::ConstraintHandler;
//! # use blocksplit_core::model::Model;
//! # use blocksplit_core::model::VariableType;
//! # use blocksplit_core::termination::Indefinite;
//! # use blocksplit_core::DetectionOptions;
//! # use blocksplit_core::DetectorChainScheduler;
//! # use blocksplit_core::DetectorSettings;
//! let mut model = Model::default();
//! let x: Vec<_> = ["x1", "x2", "x3", "x4"]
//!     .into_iter()
//!     .map(|name| model.add_variable(name, VariableType::Binary, 0.0, 1.0, 0.0))
//!     .collect::<Result<_, _>>()?;
//!
//! let _ = model.add_constraint(
//!     "c0",
//!     ConstraintHandler::Linear,
//!     1.0,
//!     1.0,
//!     [(x[0], 1.0), (x[1], 1.0)],
//! )?;
//! let _ = model.add_constraint(
//!     "c1",
//!     ConstraintHandler::Linear,
//!     1.0,
//!     1.0,
//!     [(x[2], 1.0), (x[3], 1.0)],
//! )?;
//! let _ = model.add_constraint(
//!     "c2",
//!     ConstraintHandler::Linear,
//!     f64::NEG_INFINITY,
//!     5.0,
//!     [(x[0], 1.0), (x[2], 1.0)],
//! )?;
//!
//! let mut scheduler = DetectorChainScheduler::new(DetectionOptions::default());
//! let _ = scheduler.add_detector(
//!     AutomorphismDetector::new(AutomorphismOptions::default()),
//!     DetectorSettings::default(),
//! );
//!
//! let result = scheduler.detect(&model, Indefinite);
//! assert_eq!(result.decompositions.len(), 1);
//! assert_eq!(result.decompositions[0].num_blocks(), 2);
//! # Ok::<(), blocksplit_core::model::ModelError>(())
//! ```
pub(crate) mod basic_types;
pub mod asserts;
pub mod containers;
pub mod decomposition;
pub mod detectors;
pub mod model;
pub mod scheduler;
pub mod statistics;
pub mod termination;

pub use convert_case;

pub use crate::basic_types::BlockUnionFind;
pub use crate::basic_types::DetectorDefect;
pub use crate::basic_types::TotalF64;
pub use crate::decomposition::Decomposition;
pub use crate::decomposition::DecompositionBuilder;
pub use crate::decomposition::DecompositionRegistry;
pub use crate::decomposition::Seeed;
pub use crate::scheduler::DetectionOptions;
pub use crate::scheduler::DetectionResult;
pub use crate::scheduler::DetectorChainScheduler;
pub use crate::scheduler::DetectorSettings;
