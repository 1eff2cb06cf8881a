use super::ConstraintHandler;
use super::ConstraintId;
use super::Model;
use super::VariableId;
use super::VariableType;
use crate::containers::KeyedVec;

/// A read-only view of constraints, variables, and the nonzero coefficients linking them.
///
/// All detectors and the [`crate::DecompositionBuilder`] are written against this trait, so the
/// same algorithms run on the whole [`Model`] and on a [`ModelSubset`]. Handles that do not belong
/// to the model are a programming error and cause a panic.
pub trait IncidenceModel {
    /// The size of the constraint id space, i.e. the length needed for arrays indexed by
    /// [`ConstraintId`]. A subset view reports the size of the underlying model.
    fn num_constraints(&self) -> usize;

    /// The size of the variable id space.
    fn num_variables(&self) -> usize;

    /// The constraints in the view, in increasing id order.
    fn constraints(&self) -> impl Iterator<Item = ConstraintId> + '_;

    /// The variables of `constraint` with their coefficients. May be empty.
    fn variables_of(&self, constraint: ConstraintId) -> impl Iterator<Item = (VariableId, f64)> + '_;

    fn is_integral(&self, variable: VariableId) -> bool;

    fn is_binary(&self, variable: VariableId) -> bool;

    fn variable_type(&self, variable: VariableId) -> VariableType;

    fn variable_bounds(&self, variable: VariableId) -> (f64, f64);

    fn objective(&self, variable: VariableId) -> f64;

    fn lhs(&self, constraint: ConstraintId) -> f64;

    fn rhs(&self, constraint: ConstraintId) -> f64;

    fn handler_type(&self, constraint: ConstraintId) -> &ConstraintHandler;
}

impl IncidenceModel for Model {
    fn num_constraints(&self) -> usize {
        Model::num_constraints(self)
    }

    fn num_variables(&self) -> usize {
        Model::num_variables(self)
    }

    fn constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.all_constraints()
    }

    fn variables_of(&self, constraint: ConstraintId) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.entries(constraint).iter().copied()
    }

    fn is_integral(&self, variable: VariableId) -> bool {
        self.variable_data(variable).variable_type.is_integral()
    }

    fn is_binary(&self, variable: VariableId) -> bool {
        let data = self.variable_data(variable);
        match data.variable_type {
            VariableType::Binary => true,
            VariableType::Integer | VariableType::ImplicitInteger => {
                data.lower_bound >= 0.0 && data.upper_bound <= 1.0
            }
            VariableType::Continuous => false,
        }
    }

    fn variable_type(&self, variable: VariableId) -> VariableType {
        self.variable_data(variable).variable_type
    }

    fn variable_bounds(&self, variable: VariableId) -> (f64, f64) {
        let data = self.variable_data(variable);
        (data.lower_bound, data.upper_bound)
    }

    fn objective(&self, variable: VariableId) -> f64 {
        self.variable_data(variable).objective
    }

    fn lhs(&self, constraint: ConstraintId) -> f64 {
        self.constraint_data(constraint).lhs
    }

    fn rhs(&self, constraint: ConstraintId) -> f64 {
        self.constraint_data(constraint).rhs
    }

    fn handler_type(&self, constraint: ConstraintId) -> &ConstraintHandler {
        &self.constraint_data(constraint).handler
    }
}

/// A view on a subset of the constraints (and optionally the variables) of another
/// [`IncidenceModel`].
///
/// This is how detectors look at the open part of a seeed: constraints which are already placed
/// are hidden, and variables which are already fixed to the master can be hidden as well, so that
/// they do not connect otherwise independent constraints.
#[derive(Debug)]
pub struct ModelSubset<'model, M> {
    model: &'model M,
    constraints: Vec<ConstraintId>,
    hidden_variables: Option<KeyedVec<VariableId, bool>>,
}

impl<'model, M: IncidenceModel> ModelSubset<'model, M> {
    /// Create a view on the given constraints. The constraints are sorted and deduplicated.
    pub fn new(model: &'model M, constraints: impl IntoIterator<Item = ConstraintId>) -> Self {
        let mut constraints: Vec<ConstraintId> = constraints.into_iter().collect();
        constraints.sort();
        constraints.dedup();

        ModelSubset {
            model,
            constraints,
            hidden_variables: None,
        }
    }

    /// Hide the given variables; they are skipped by [`IncidenceModel::variables_of`].
    pub fn hiding_variables(mut self, variables: impl IntoIterator<Item = VariableId>) -> Self {
        let num_variables = self.model.num_variables();
        let hidden = self
            .hidden_variables
            .get_or_insert_with(|| KeyedVec::with_len(num_variables, false));
        for variable in variables {
            hidden[variable] = true;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    fn is_hidden(&self, variable: VariableId) -> bool {
        self.hidden_variables
            .as_ref()
            .is_some_and(|hidden| hidden[variable])
    }
}

impl<M: IncidenceModel> IncidenceModel for ModelSubset<'_, M> {
    fn num_constraints(&self) -> usize {
        self.model.num_constraints()
    }

    fn num_variables(&self) -> usize {
        self.model.num_variables()
    }

    fn constraints(&self) -> impl Iterator<Item = ConstraintId> + '_ {
        self.constraints.iter().copied()
    }

    fn variables_of(&self, constraint: ConstraintId) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.model
            .variables_of(constraint)
            .filter(|&(variable, _)| !self.is_hidden(variable))
    }

    fn is_integral(&self, variable: VariableId) -> bool {
        self.model.is_integral(variable)
    }

    fn is_binary(&self, variable: VariableId) -> bool {
        self.model.is_binary(variable)
    }

    fn variable_type(&self, variable: VariableId) -> VariableType {
        self.model.variable_type(variable)
    }

    fn variable_bounds(&self, variable: VariableId) -> (f64, f64) {
        self.model.variable_bounds(variable)
    }

    fn objective(&self, variable: VariableId) -> f64 {
        self.model.objective(variable)
    }

    fn lhs(&self, constraint: ConstraintId) -> f64 {
        self.model.lhs(constraint)
    }

    fn rhs(&self, constraint: ConstraintId) -> f64 {
        self.model.rhs(constraint)
    }

    fn handler_type(&self, constraint: ConstraintId) -> &ConstraintHandler {
        self.model.handler_type(constraint)
    }
}

/// Marks the variables which occur in at least one constraint of `model`.
pub fn relevant_variables<M: IncidenceModel>(model: &M) -> KeyedVec<VariableId, bool> {
    let mut relevant = KeyedVec::with_len(model.num_variables(), false);
    for constraint in model.constraints() {
        for (variable, _) in model.variables_of(constraint) {
            relevant[variable] = true;
        }
    }
    relevant
}

/// Collects the relevant variables of `model` in increasing id order.
pub fn relevant_variable_list<M: IncidenceModel>(model: &M) -> Vec<VariableId> {
    relevant_variables(model)
        .enumerate()
        .filter(|(_, &relevant)| relevant)
        .map(|(variable, _)| variable)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_models::three_constraints_with_linking;

    #[test]
    fn subset_only_exposes_selected_constraints() {
        let (model, [c0, _, c2]) = three_constraints_with_linking();
        let subset = ModelSubset::new(&model, [c2, c0, c2]);

        assert_eq!(subset.constraints().collect::<Vec<_>>(), vec![c0, c2]);
        assert_eq!(subset.num_constraints(), 3);
    }

    #[test]
    fn hidden_variables_are_skipped() {
        let (model, [c0, _, c2]) = three_constraints_with_linking();
        let x1 = model.variable_by_name("x1").unwrap();
        let subset = ModelSubset::new(&model, [c0, c2]).hiding_variables([x1]);

        assert!(subset.variables_of(c2).all(|(variable, _)| variable != x1));
        assert_eq!(subset.variables_of(c0).count(), 1);
    }

    #[test]
    fn relevant_variables_of_a_subset() {
        let (model, [c0, _, _]) = three_constraints_with_linking();
        let subset = ModelSubset::new(&model, [c0]);

        let relevant = relevant_variable_list(&subset);
        let names = relevant
            .iter()
            .map(|&variable| model.variable_name(variable))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["x1", "x2"]);
    }
}
