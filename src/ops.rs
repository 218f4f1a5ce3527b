use std::str::FromStr;

use num::Float;

use crate::defuzz;
use crate::error::{ConfigError, InferenceError};

fn unknown(kind: &'static str, name: &str) -> ConfigError {
    ConfigError::UnknownOperator {
        kind,
        name: name.to_owned(),
    }
}

/// The inference style of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Curve consequents, aggregated then defuzzified
    Mamdani,
    /// Constant or linear consequents combined by weight
    Sugeno,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mamdani => "mamdani",
            Self::Sugeno => "sugeno",
        }
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mamdani" => Ok(Self::Mamdani),
            "sugeno" => Ok(Self::Sugeno),
            _ => Err(ConfigError::UnknownMethod { name: s.to_owned() }),
        }
    }
}

/// How the clauses of one rule's antecedent combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl FromStr for Conjunction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(unknown("conjunction", s)),
        }
    }
}

/// And operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AndOp {
    Min,
    Prod,
}

impl AndOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Min => F::min(u, v),
            Self::Prod => u * v,
        }
    }

    pub fn identity<F: Float>(self) -> F {
        F::one()
    }
}

impl FromStr for AndOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "prod" | "product" => Ok(Self::Prod),
            _ => Err(unknown("and", s)),
        }
    }
}

/// Or operator method for combining the compositions of propositions
/// in a fuzzy rule premise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrOp {
    Max,
    ProbOr,
    Sum,
}

impl OrOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::ProbOr => u + v - u * v,
            Self::Sum => u + v,
        }
    }

    pub fn identity<F: Float>(self) -> F {
        F::zero()
    }
}

impl FromStr for OrOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "probor" | "probabilistic-sum" => Ok(Self::ProbOr),
            "sum" => Ok(Self::Sum),
            _ => Err(unknown("or", s)),
        }
    }
}

/// Implication operator method for shaping a consequent curve by the
/// strength of the rules that fired it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImplicationOp {
    /// Clips the curve at the cap
    Min,
    /// Scales the curve by the cap
    Prod,
}

impl ImplicationOp {
    pub fn call<F: Float>(self, cap: F, membership: F) -> F {
        match self {
            Self::Min => F::min(cap, membership),
            Self::Prod => cap * membership,
        }
    }
}

impl FromStr for ImplicationOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(Self::Min),
            "prod" | "product" => Ok(Self::Prod),
            _ => Err(unknown("implication", s)),
        }
    }
}

/// Method for aggregating the consequences of the fuzzy rules
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregationOp {
    Max,
    Sum,
    ProbOr,
}

impl AggregationOp {
    pub fn call<F: Float>(self, u: F, v: F) -> F {
        match self {
            Self::Max => F::max(u, v),
            Self::Sum => u + v,
            Self::ProbOr => u + v - u * v,
        }
    }

    pub fn identity<F: Float>(self) -> F {
        F::zero()
    }
}

impl FromStr for AggregationOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max" => Ok(Self::Max),
            "sum" => Ok(Self::Sum),
            "probor" | "probabilistic-sum" => Ok(Self::ProbOr),
            _ => Err(unknown("aggregation", s)),
        }
    }
}

/// Method for defuzzifcating the resulting membership function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefuzzificationOp {
    /// Center of Gravity
    Centroid,
    /// Bisector of Area
    Bisector,
    /// Smallest value for which the membership function is maximum
    Som,
    /// Largest value for which the membership function is maximum
    Lom,
    /// Middle value among those for which the membership function is maximum
    Mom,
    /// Sugeno weighted average of consequent values
    WeightedAverage,
    /// Sugeno weighted sum of consequent values
    WeightedSum,
}

impl DefuzzificationOp {
    pub fn name(self) -> &'static str {
        match self {
            Self::Centroid => "centroid",
            Self::Bisector => "bisector",
            Self::Som => "som",
            Self::Lom => "lom",
            Self::Mom => "mom",
            Self::WeightedAverage => "wtaver",
            Self::WeightedSum => "wtsum",
        }
    }

    /// The inference method this defuzzification belongs to.
    pub fn method(self) -> Method {
        match self {
            Self::WeightedAverage | Self::WeightedSum => Method::Sugeno,
            _ => Method::Mamdani,
        }
    }

    /// Reduces `(x, y)` to a crisp value. For the Sugeno methods `x` holds the
    /// consequent values and `y` their accumulated firing strengths.
    pub fn call<F: Float>(self, x: &[F], y: &[F]) -> Result<F, InferenceError> {
        match self {
            Self::Centroid => defuzz::centroid(x, y),
            Self::Bisector => defuzz::bisector(x, y),
            Self::Som => defuzz::smallest_of_maximum(x, y),
            Self::Lom => defuzz::largest_of_maximum(x, y),
            Self::Mom => defuzz::mean_of_maximum(x, y),
            Self::WeightedAverage => defuzz::weighted_average(x, y),
            Self::WeightedSum => defuzz::weighted_sum(x, y),
        }
    }
}

impl FromStr for DefuzzificationOp {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "centroid" => Ok(Self::Centroid),
            "bisector" => Ok(Self::Bisector),
            "som" => Ok(Self::Som),
            "lom" => Ok(Self::Lom),
            "mom" => Ok(Self::Mom),
            "wtaver" => Ok(Self::WeightedAverage),
            "wtsum" => Ok(Self::WeightedSum),
            _ => Err(unknown("defuzzification", s)),
        }
    }
}

#[test]
fn test_operator_names() {
    assert_eq!("MIN".parse::<AndOp>().unwrap(), AndOp::Min);
    assert_eq!("prod".parse::<AndOp>().unwrap(), AndOp::Prod);
    assert_eq!("probor".parse::<OrOp>().unwrap(), OrOp::ProbOr);
    assert_eq!("sum".parse::<AggregationOp>().unwrap(), AggregationOp::Sum);
    assert_eq!("MOM".parse::<DefuzzificationOp>().unwrap(), DefuzzificationOp::Mom);
    assert_eq!("Sugeno".parse::<Method>().unwrap(), Method::Sugeno);
    assert_eq!("OR".parse::<Conjunction>().unwrap(), Conjunction::Or);
    assert!(matches!(
        "xor".parse::<Conjunction>(),
        Err(ConfigError::UnknownOperator { kind: "conjunction", ref name }) if name == "xor"
    ));

    match "max".parse::<AndOp>() {
        Err(ConfigError::UnknownOperator { kind, name }) => {
            assert_eq!(kind, "and");
            assert_eq!(name, "max");
        },
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        "fuzzy".parse::<Method>(),
        Err(ConfigError::UnknownMethod { .. })
    ));
}

#[test]
fn test_identities() {
    for v in [0., 0.25, 1.] {
        for op in [AndOp::Min, AndOp::Prod] {
            assert_eq!(op.call(op.identity(), v), v);
        }
        for op in [OrOp::Max, OrOp::ProbOr, OrOp::Sum] {
            assert_eq!(op.call(op.identity(), v), v);
        }
        for op in [AggregationOp::Max, AggregationOp::Sum, AggregationOp::ProbOr] {
            assert_eq!(op.call(op.identity(), v), v);
        }
    }

    assert_eq!(OrOp::ProbOr.call(0.5, 0.5), 0.75);
    assert_eq!(ImplicationOp::Min.call(0.3, 0.8), 0.3);
    assert_eq!(ImplicationOp::Prod.call(0.5, 0.8), 0.4);
}
