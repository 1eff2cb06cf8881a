use std::fmt::Display;
use std::str::FromStr;

/// The constraint handler (the "kind") of a constraint.
///
/// The declaration order is the order used when sorting constraints into color classes, so
/// changing it changes the enumeration order of the color class detector.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintHandler {
    Linear,
    SetPartitioning,
    SetPacking,
    SetCovering,
    LogicOr,
    Knapsack,
    VarBound,
    /// A handler the engine has no special knowledge about.
    Other(String),
}

impl ConstraintHandler {
    /// Whether constraints of this handler only restrict binary variables in a set covering,
    /// packing, or partitioning fashion.
    pub fn is_set_constraint(&self) -> bool {
        matches!(
            self,
            ConstraintHandler::SetPartitioning
                | ConstraintHandler::SetPacking
                | ConstraintHandler::SetCovering
                | ConstraintHandler::LogicOr
        )
    }

    pub fn name(&self) -> &str {
        match self {
            ConstraintHandler::Linear => "linear",
            ConstraintHandler::SetPartitioning => "setpartitioning",
            ConstraintHandler::SetPacking => "setpacking",
            ConstraintHandler::SetCovering => "setcovering",
            ConstraintHandler::LogicOr => "logicor",
            ConstraintHandler::Knapsack => "knapsack",
            ConstraintHandler::VarBound => "varbound",
            ConstraintHandler::Other(name) => name,
        }
    }
}

impl FromStr for ConstraintHandler {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let handler = match s {
            "linear" => ConstraintHandler::Linear,
            "setpartitioning" | "setppc_partitioning" => ConstraintHandler::SetPartitioning,
            "setpacking" | "setppc_packing" => ConstraintHandler::SetPacking,
            "setcovering" | "setppc_covering" => ConstraintHandler::SetCovering,
            "logicor" => ConstraintHandler::LogicOr,
            "knapsack" => ConstraintHandler::Knapsack,
            "varbound" => ConstraintHandler::VarBound,
            other => ConstraintHandler::Other(other.to_owned()),
        };

        Ok(handler)
    }
}

impl Display for ConstraintHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The type of a variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariableType {
    Binary,
    Integer,
    ImplicitInteger,
    Continuous,
}

impl VariableType {
    pub fn is_integral(self) -> bool {
        !matches!(self, VariableType::Continuous)
    }
}
