//! Partial decompositions ([`Seeed`]s), complete [`Decomposition`]s, the
//! [`DecompositionBuilder`] which turns the former into the latter, and the
//! [`DecompositionRegistry`] which collects the results.
mod block_structure;
mod builder;
mod files;
mod registry;
mod score;
mod seeed;

pub use block_structure::ConstraintAssignment;
pub use block_structure::Decomposition;
pub use block_structure::DecompositionType;
pub use block_structure::VariableAssignment;
pub(crate) use builder::label_blocks;
pub(crate) use builder::BlockLabels;
pub use builder::DecompositionBuilder;
pub use files::*;
pub use registry::DecompositionRegistry;
pub use registry::RegistryStatistics;
pub use score::DecompositionScore;
pub use seeed::DetectorStage;
pub use seeed::Seeed;
pub use seeed::SeeedId;
