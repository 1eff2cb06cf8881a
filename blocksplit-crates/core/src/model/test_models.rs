//! Small models shared by the unit tests of the engine.
use super::ConstraintHandler;
use super::ConstraintId;
use super::Model;
use super::VariableId;
use super::VariableType;

pub(crate) fn binaries(model: &mut Model, names: &[&str]) -> Vec<VariableId> {
    names
        .iter()
        .map(|name| {
            model
                .add_variable(*name, VariableType::Binary, 0.0, 1.0, 0.0)
                .expect("unique variable names")
        })
        .collect()
}

pub(crate) fn linear(
    model: &mut Model,
    name: &str,
    lhs: f64,
    rhs: f64,
    entries: &[(VariableId, f64)],
) -> ConstraintId {
    model
        .add_constraint(name, ConstraintHandler::Linear, lhs, rhs, entries.iter().copied())
        .expect("unique constraint names")
}

/// `c0: x1 + x2 = 1`, `c1: x3 + x4 = 1`, `c2: x1 + x3 <= 5`.
pub(crate) fn three_constraints_with_linking() -> (Model, [ConstraintId; 3]) {
    let mut model = Model::default();
    let x = binaries(&mut model, &["x1", "x2", "x3", "x4"]);

    let c0 = linear(&mut model, "c0", 1.0, 1.0, &[(x[0], 1.0), (x[1], 1.0)]);
    let c1 = linear(&mut model, "c1", 1.0, 1.0, &[(x[2], 1.0), (x[3], 1.0)]);
    let c2 = linear(
        &mut model,
        "c2",
        f64::NEG_INFINITY,
        5.0,
        &[(x[0], 1.0), (x[2], 1.0)],
    );

    (model, [c0, c1, c2])
}

/// Four constraints in two color classes: `c0`, `c1` are equalities with right-hand side 1 and
/// `c2`, `c3` are `<= 2` inequalities. Every constraint shares a variable with the next one.
pub(crate) fn two_color_classes() -> (Model, [ConstraintId; 4]) {
    let mut model = Model::default();
    let x = binaries(&mut model, &["x0", "x1", "x2", "x3", "x4"]);

    let c0 = linear(&mut model, "c0", 1.0, 1.0, &[(x[0], 1.0), (x[1], 1.0)]);
    let c1 = linear(&mut model, "c1", 1.0, 1.0, &[(x[1], 1.0), (x[2], 1.0)]);
    let c2 = linear(
        &mut model,
        "c2",
        f64::NEG_INFINITY,
        2.0,
        &[(x[2], 1.0), (x[3], 1.0)],
    );
    let c3 = linear(
        &mut model,
        "c3",
        f64::NEG_INFINITY,
        2.0,
        &[(x[3], 1.0), (x[4], 1.0)],
    );

    (model, [c0, c1, c2, c3])
}

/// `c0: y0 + y1 <= 1`, `c1: 3 y0 + 3 y1 + 3 y2 + 3 y3 + 2 z <= 7`, `c2: y2 + y3 <= 1`,
/// `c3: z <= 1`.
///
/// Swapping `y0 <-> y2` and `y1 <-> y3` maps `c0` onto `c2` and fixes `c1` and `c3`.
pub(crate) fn symmetric_packing() -> (Model, [ConstraintId; 4]) {
    let mut model = Model::default();
    let y = binaries(&mut model, &["y0", "y1", "y2", "y3"]);
    let z = model
        .add_variable("z", VariableType::Integer, 0.0, 3.0, 1.0)
        .expect("unique variable names");

    let c0 = model
        .add_constraint(
            "c0",
            ConstraintHandler::SetPacking,
            f64::NEG_INFINITY,
            1.0,
            [(y[0], 1.0), (y[1], 1.0)],
        )
        .expect("unique constraint names");
    let c1 = linear(
        &mut model,
        "c1",
        f64::NEG_INFINITY,
        7.0,
        &[
            (y[0], 3.0),
            (y[1], 3.0),
            (y[2], 3.0),
            (y[3], 3.0),
            (z, 2.0),
        ],
    );
    let c2 = model
        .add_constraint(
            "c2",
            ConstraintHandler::SetPacking,
            f64::NEG_INFINITY,
            1.0,
            [(y[2], 1.0), (y[3], 1.0)],
        )
        .expect("unique constraint names");
    let c3 = linear(&mut model, "c3", f64::NEG_INFINITY, 1.0, &[(z, 1.0)]);

    (model, [c0, c1, c2, c3])
}
