use super::ConstraintHandler;
use super::ConstraintId;
use super::VariableId;
use super::VariableType;
use crate::containers::HashMap;
use crate::containers::KeyedVec;

/// Errors related to adding constraints and variables to a [`Model`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("a constraint named '{0}' already exists")]
    DuplicateConstraintName(String),
    #[error("a variable named '{0}' already exists")]
    DuplicateVariableName(String),
    #[error("constraint '{constraint}' refers to unknown variable {variable}")]
    UnknownVariable {
        constraint: String,
        variable: VariableId,
    },
}

#[derive(Clone, Debug)]
pub(crate) struct VariableData {
    pub(crate) name: String,
    pub(crate) variable_type: VariableType,
    pub(crate) lower_bound: f64,
    pub(crate) upper_bound: f64,
    pub(crate) objective: f64,
}

#[derive(Clone, Debug)]
pub(crate) struct ConstraintData {
    pub(crate) name: String,
    pub(crate) handler: ConstraintHandler,
    pub(crate) lhs: f64,
    pub(crate) rhs: f64,
    /// The nonzero entries of the constraint, sorted by variable.
    pub(crate) entries: Vec<(VariableId, f64)>,
}

/// The constraint system in which structure is detected.
///
/// The model is the arena of the engine: constraints and variables are stored once, and every
/// other structure (seeeds, decompositions, graphs) refers to them through a [`ConstraintId`] or
/// [`VariableId`]. The model is never mutated by detection, except for the block labels which can
/// be written back by [`crate::Decomposition::apply_to_model`].
#[derive(Clone, Debug, Default)]
pub struct Model {
    constraints: KeyedVec<ConstraintId, ConstraintData>,
    variables: KeyedVec<VariableId, VariableData>,
    constraint_names: HashMap<String, ConstraintId>,
    variable_names: HashMap<String, VariableId>,
    constraint_blocks: KeyedVec<ConstraintId, Option<usize>>,
    variable_blocks: KeyedVec<VariableId, Option<usize>>,
}

impl Model {
    /// Add a variable with the given type, bounds, and objective coefficient.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
        objective: f64,
    ) -> Result<VariableId, ModelError> {
        let name = name.into();
        if self.variable_names.contains_key(&name) {
            return Err(ModelError::DuplicateVariableName(name));
        }

        let id = self.variables.push(VariableData {
            name: name.clone(),
            variable_type,
            lower_bound,
            upper_bound,
            objective,
        });
        let _ = self.variable_names.insert(name, id);
        let _ = self.variable_blocks.push(None);

        Ok(id)
    }

    /// Add the constraint `lhs <= sum(coefficient * variable) <= rhs`.
    ///
    /// Zero coefficients are dropped and repeated variables are merged by summing their
    /// coefficients, so every variable appears at most once in [`Model::entries`].
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        handler: ConstraintHandler,
        lhs: f64,
        rhs: f64,
        entries: impl IntoIterator<Item = (VariableId, f64)>,
    ) -> Result<ConstraintId, ModelError> {
        let name = name.into();
        if self.constraint_names.contains_key(&name) {
            return Err(ModelError::DuplicateConstraintName(name));
        }

        let mut merged: Vec<(VariableId, f64)> = Vec::new();
        for (variable, coefficient) in entries {
            if self.variables.get(variable).is_none() {
                return Err(ModelError::UnknownVariable {
                    constraint: name,
                    variable,
                });
            }
            merged.push((variable, coefficient));
        }
        merged.sort_by_key(|&(variable, _)| variable);
        merged.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });
        merged.retain(|&(_, coefficient)| coefficient != 0.0);

        let id = self.constraints.push(ConstraintData {
            name: name.clone(),
            handler,
            lhs,
            rhs,
            entries: merged,
        });
        let _ = self.constraint_names.insert(name, id);
        let _ = self.constraint_blocks.push(None);

        Ok(id)
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// The total number of nonzero coefficients in the model.
    pub fn num_nonzeros(&self) -> usize {
        self.constraints.iter().map(|data| data.entries.len()).sum()
    }

    pub fn constraint_name(&self, constraint: ConstraintId) -> &str {
        &self.constraints[constraint].name
    }

    pub fn variable_name(&self, variable: VariableId) -> &str {
        &self.variables[variable].name
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<ConstraintId> {
        self.constraint_names.get(name).copied()
    }

    pub fn variable_by_name(&self, name: &str) -> Option<VariableId> {
        self.variable_names.get(name).copied()
    }

    pub fn variable_type(&self, variable: VariableId) -> VariableType {
        self.variables[variable].variable_type
    }

    /// The nonzero entries of `constraint`, sorted by variable.
    pub fn entries(&self, constraint: ConstraintId) -> &[(VariableId, f64)] {
        &self.constraints[constraint].entries
    }

    pub(crate) fn constraint_data(&self, constraint: ConstraintId) -> &ConstraintData {
        &self.constraints[constraint]
    }

    pub(crate) fn variable_data(&self, variable: VariableId) -> &VariableData {
        &self.variables[variable]
    }

    pub fn all_constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.constraints.keys()
    }

    pub fn all_variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.variables.keys()
    }

    /// The block the host assigned to `constraint`, [`None`] when it is in the master or has not
    /// been assigned.
    pub fn constraint_block(&self, constraint: ConstraintId) -> Option<usize> {
        self.constraint_blocks[constraint]
    }

    pub fn set_constraint_block(&mut self, constraint: ConstraintId, block: Option<usize>) {
        self.constraint_blocks[constraint] = block;
    }

    /// The block the host assigned to `variable`, [`None`] when it is linking or has not been
    /// assigned.
    pub fn variable_block(&self, variable: VariableId) -> Option<usize> {
        self.variable_blocks[variable]
    }

    pub fn set_variable_block(&mut self, variable: VariableId, block: Option<usize>) {
        self.variable_blocks[variable] = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_variables_are_merged_and_zeros_dropped() {
        let mut model = Model::default();
        let x = model
            .add_variable("x", VariableType::Binary, 0.0, 1.0, 0.0)
            .unwrap();
        let y = model
            .add_variable("y", VariableType::Binary, 0.0, 1.0, 0.0)
            .unwrap();
        let z = model
            .add_variable("z", VariableType::Binary, 0.0, 1.0, 0.0)
            .unwrap();

        let c = model
            .add_constraint(
                "c",
                ConstraintHandler::Linear,
                f64::NEG_INFINITY,
                3.0,
                [(y, 1.0), (x, 2.0), (y, 1.5), (z, 1.0), (z, -1.0)],
            )
            .unwrap();

        assert_eq!(model.entries(c), &[(x, 2.0), (y, 2.5)]);
        assert_eq!(model.num_nonzeros(), 2);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut model = Model::default();
        let _ = model
            .add_variable("x", VariableType::Integer, 0.0, 4.0, 1.0)
            .unwrap();

        assert_eq!(
            model.add_variable("x", VariableType::Integer, 0.0, 4.0, 1.0),
            Err(ModelError::DuplicateVariableName("x".to_owned()))
        );
    }

    #[test]
    fn constraints_are_found_by_name() {
        let mut model = Model::default();
        let x = model
            .add_variable("x", VariableType::Continuous, 0.0, 1.0, 0.0)
            .unwrap();
        let c = model
            .add_constraint("cap", ConstraintHandler::Linear, 0.0, 1.0, [(x, 1.0)])
            .unwrap();

        assert_eq!(model.constraint_by_name("cap"), Some(c));
        assert_eq!(model.constraint_name(c), "cap");
        assert_eq!(model.constraint_by_name("other"), None);
    }
}
