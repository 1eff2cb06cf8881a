//! The constraint system in which structure is detected, and the read-only incidence view on it
//! that every detector works with.
mod arena;
mod handler;
mod ids;
mod incidence;
#[cfg(test)]
pub(crate) mod test_models;

pub use arena::Model;
pub use arena::ModelError;
pub use handler::ConstraintHandler;
pub use handler::VariableType;
pub use ids::ConstraintId;
pub use ids::VariableId;
pub use incidence::relevant_variable_list;
pub use incidence::relevant_variables;
pub use incidence::IncidenceModel;
pub use incidence::ModelSubset;
