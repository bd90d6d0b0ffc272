use std::fmt;
use thiserror::Error;

/// Failure to tokenize, parse or evaluate a category formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated placeholder starting at position {pos}")]
    UnterminatedPlaceholder { pos: usize },

    #[error("empty placeholder at position {pos}")]
    EmptyPlaceholder { pos: usize },

    #[error("'{{' inside placeholder at position {pos}")]
    NestedPlaceholder { pos: usize },

    #[error("invalid number '{text}'")]
    InvalidNumber { text: String },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unexpected {found}")]
    UnexpectedToken { found: String },

    #[error("formula nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("formula has {count} tokens, more than the {max} allowed")]
    TooLong { count: usize, max: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,

    #[error("{expected} placeholder values expected, got {got}")]
    BindingCount { expected: usize, got: usize },
}

/// One inconsistency found while validating a rubric.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaProblem {
    #[error("category name is empty")]
    EmptyName,

    #[error("category name is used more than once")]
    DuplicateCategory,

    #[error("weight must be a positive number, got {0}")]
    InvalidWeight(f64),

    #[error("no subfactors defined")]
    NoSubfactors,

    #[error("subfactor '{0}' is listed more than once")]
    DuplicateSubfactor(String),

    #[error("formula does not parse: {0}")]
    InvalidFormula(FormulaError),

    #[error("subfactors missing from formula: {}", .0.join(", "))]
    MissingPlaceholders(Vec<String>),

    #[error("formula references unknown subfactors: {}", .0.join(", "))]
    UnknownPlaceholders(Vec<String>),

    #[error("formula references subfactors more than once: {}", .0.join(", "))]
    RepeatedPlaceholders(Vec<String>),

    #[error("skip subfactor '{0}' is not one of the category's subfactors")]
    UnknownSkipSubfactor(String),

    #[error("formula divides by a constant zero")]
    DivisionByConstantZero,

    #[error("formula can evaluate to {value} for normalized inputs, outside [0, {weight}]")]
    OutOfBounds { value: f64, weight: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("category '{category}': {problem}")]
pub struct SchemaIssue {
    pub category: String,
    pub problem: SchemaProblem,
}

/// The rubric definition is inconsistent. Carries every issue found, not just the first.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub issues: Vec<SchemaIssue>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid rubric ({} issue(s))", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Failure to turn one category's raw subfactor scores into a weighted result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("subfactor '{subfactor}' scored {value}, outside 0-100")]
    ScoreRange { subfactor: String, value: f64 },

    #[error("subfactor '{subfactor}' has no score")]
    MissingSubfactor { subfactor: String },

    #[error("subfactor '{subfactor}' has non-numeric score {value}")]
    InvalidValue { subfactor: String, value: String },

    #[error("formula evaluation failed: {0}")]
    Formula(#[from] FormulaError),

    #[error("weighted score {value} falls outside [0, {weight}]")]
    OutOfBounds { value: f64, weight: f64 },
}

/// Failure to produce a score report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("category '{category}': {source}")]
    Category {
        category: String,
        #[source]
        source: EvaluationError,
    },

    #[error("every category was skipped, so no overall percentage can be computed")]
    NoApplicableCategories,
}
