//! Reads constraint systems from the plain-text model format of the command-line tool.
//!
//! Every non-empty line which does not start with `#` declares a variable or a constraint:
//! ```text
//! v <name> <b|i|c> [<lb> <ub> [<obj>]]
//! c <name> <handler> <lhs> <rhs> (<coef> <var>)*
//! ```
//! Bounds and sides accept `inf` and `-inf`. Variables have to be declared before the first
//! constraint which uses them.
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::str::SplitWhitespace;

use blocksplit::model::ConstraintHandler;
use blocksplit::model::Model;
use blocksplit::model::ModelError;
use blocksplit::model::VariableType;

#[derive(thiserror::Error, Debug)]
pub(crate) enum ModelFileError {
    #[error("failed to read from source: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse line {line_nr} at '{token}': {reason}")]
    ParseError {
        line_nr: usize,
        token: String,
        reason: &'static str,
    },
    #[error("line {line_nr}: {source}")]
    Model { line_nr: usize, source: ModelError },
}

/// Read a [`Model`]. Reading stops at the first malformed line.
pub(crate) fn parse_model(source: impl Read) -> Result<Model, ModelFileError> {
    let mut model = Model::default();

    for (index, line) in BufReader::new(source).lines().enumerate() {
        let line = line?;
        let mut tokens = Tokens {
            line_nr: index + 1,
            inner: line.split_whitespace(),
        };

        match tokens.inner.next() {
            None => {}
            Some(keyword) if keyword.starts_with('#') => {}
            Some("v") => parse_variable(&mut model, &mut tokens)?,
            Some("c") => parse_constraint(&mut model, &mut tokens)?,
            Some(keyword) => return Err(tokens.error(keyword, "expected 'v' or 'c'")),
        }
    }

    Ok(model)
}

struct Tokens<'a> {
    line_nr: usize,
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn error(&self, token: &str, reason: &'static str) -> ModelFileError {
        ModelFileError::ParseError {
            line_nr: self.line_nr,
            token: token.to_owned(),
            reason,
        }
    }

    fn name(&mut self, reason: &'static str) -> Result<&'a str, ModelFileError> {
        self.inner.next().ok_or_else(|| self.error("", reason))
    }

    fn number(&mut self, reason: &'static str) -> Result<Option<f64>, ModelFileError> {
        let Some(token) = self.inner.next() else {
            return Ok(None);
        };
        token
            .parse::<f64>()
            .map(Some)
            .map_err(|_| self.error(token, reason))
    }

    fn required_number(&mut self, reason: &'static str) -> Result<f64, ModelFileError> {
        self.number(reason)?.ok_or_else(|| self.error("", reason))
    }

    fn model_error(&self, source: ModelError) -> ModelFileError {
        ModelFileError::Model {
            line_nr: self.line_nr,
            source,
        }
    }
}

fn parse_variable(model: &mut Model, tokens: &mut Tokens<'_>) -> Result<(), ModelFileError> {
    let name = tokens.name("expected a variable name")?.to_owned();

    let type_token = tokens.name("expected a variable type")?;
    let (variable_type, default_bounds) = match type_token {
        "b" => (VariableType::Binary, (0.0, 1.0)),
        "i" => (VariableType::Integer, (0.0, f64::INFINITY)),
        "c" => (VariableType::Continuous, (0.0, f64::INFINITY)),
        other => return Err(tokens.error(other, "expected one of 'b', 'i' or 'c'")),
    };

    let (lower_bound, upper_bound) = match tokens.number("expected a lower bound")? {
        Some(lower_bound) => (lower_bound, tokens.required_number("expected an upper bound")?),
        None => default_bounds,
    };
    let objective = tokens
        .number("expected an objective coefficient")?
        .unwrap_or(0.0);

    if let Some(token) = tokens.inner.next() {
        return Err(tokens.error(token, "unexpected token after the objective coefficient"));
    }

    let _ = model
        .add_variable(name, variable_type, lower_bound, upper_bound, objective)
        .map_err(|error| tokens.model_error(error))?;

    Ok(())
}

fn parse_constraint(model: &mut Model, tokens: &mut Tokens<'_>) -> Result<(), ModelFileError> {
    let name = tokens.name("expected a constraint name")?.to_owned();
    let handler = match tokens.name("expected a constraint handler")?.parse::<ConstraintHandler>() {
        Ok(handler) => handler,
        Err(never) => match never {},
    };
    let lhs = tokens.required_number("expected a left-hand side")?;
    let rhs = tokens.required_number("expected a right-hand side")?;

    let mut entries = Vec::new();
    while let Some(coefficient) = tokens.number("expected a coefficient")? {
        let variable_name = tokens.name("expected a variable after the coefficient")?;
        let variable = model
            .variable_by_name(variable_name)
            .ok_or_else(|| tokens.error(variable_name, "undeclared variable"))?;
        entries.push((variable, coefficient));
    }

    let _ = model
        .add_constraint(name, handler, lhs, rhs, entries)
        .map_err(|error| tokens.model_error(error))?;

    Ok(())
}
