//! Mamdani and Sugeno fuzzy-logic controllers.
//!
//! A [`Model`] is built once from a [`ModelConfig`] and then maps crisp input
//! vectors to crisp output vectors:
//!
//! ```no_run
//! use fuzzy_control::{Discretization, Model};
//!
//! # fn run(json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let model = Model::from_json(json)?;
//! let outputs = model.infer(&[2.3, 0.1], &[Discretization::step(-20., 20., 0.01)])?;
//! # Ok(())
//! # }
//! ```
//!
//! Each call to [`Model::infer`] runs its own [`InferenceSession`], so a
//! model can be shared between threads without locking.

mod aggregate;
mod config;
pub mod defuzz;
mod error;
mod inference;
mod linspace;
pub mod membership;
mod ops;
mod rules;
mod variable;

pub use aggregate::{aggregate, Curve, Discretization, Resolution, MAX_SAMPLES};
pub use config::{MembershipConfig, ModelConfig, RuleConfig, SystemConfig, VariableConfig};
pub use error::{ConfigError, InferenceError};
pub use inference::{InferenceSession, Model, Outputs};
pub use membership::{evaluate, Consequent, MembershipFunction, Shape};
pub use ops::{AggregationOp, AndOp, Conjunction, DefuzzificationOp, ImplicationOp, Method, OrOp};
pub use rules::Rule;
pub use variable::Variable;
