//! Error types for model construction and inference.

use thiserror::Error;

/// Raised while turning a model description into a [`Model`](crate::Model).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed model document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown inference method '{name}', expected \"mamdani\" or \"sugeno\"")]
    UnknownMethod { name: String },
    #[error("Unknown {kind} operator '{name}'")]
    UnknownOperator { kind: &'static str, name: String },
    #[error("Unknown membership function shape '{name}'")]
    UnknownMembershipShape { name: String },
    #[error("Invalid parameters for {shape}: {reason}")]
    InvalidParameters { shape: &'static str, reason: String },
    #[error("Variable {variable} has an invalid range [{min}, {max}]")]
    InvalidDomain { variable: String, min: f64, max: f64 },
    #[error("Label '{label}' appears more than once in variable {variable}")]
    DuplicateLabel { variable: String, label: String },
    #[error("Variable {variable} has no membership functions")]
    EmptyVariable { variable: String },
    #[error("Declared {what} count is {expected}, got {actual}")]
    Cardinality {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Rule {rule} has {actual} {side} labels, expected {expected}")]
    RuleArity {
        rule: usize,
        side: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Rule {rule} has conjunction '{name}', expected \"and\" or \"or\"")]
    UnknownConjunction { rule: usize, name: String },
    #[error("Rule {rule} references label '{label}' missing from variable {variable}")]
    MissingLabel {
        rule: usize,
        variable: String,
        label: String,
    },
    #[error("Defuzzification '{defuzz}' cannot be used with the {method} method")]
    IncompatibleDefuzzification {
        defuzz: &'static str,
        method: &'static str,
    },
    #[error("Shape '{shape}' of label '{label}' in variable {variable} is only valid as a Sugeno consequent")]
    ConsequentShape {
        variable: String,
        label: String,
        shape: &'static str,
    },
}

/// Raised by a single inference call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Expected {expected} input values, got {actual}")]
    InputCount { expected: usize, actual: usize },
    #[error("Input {index} is not a finite number: {value}")]
    NonFiniteInput { index: usize, value: f64 },
    #[error("Expected {expected} output discretizations, got {actual}")]
    DiscretizationCount { expected: usize, actual: usize },
    #[error("Length of arrays not equal: {x} x values and {y} y values")]
    LengthMismatch { x: usize, y: usize },
    #[error("Cannot defuzzify an empty curve")]
    EmptyCurve,
    #[error("Total area under the curve is zero")]
    DegenerateArea,
    #[error("Invalid range: start {start} must be smaller than end {end}")]
    InvalidRange { start: f64, end: f64 },
    #[error("Invalid resolution: {reason}")]
    InvalidResolution { reason: String },
}
