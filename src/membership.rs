use std::fmt;

use crate::error::ConfigError;

/// A membership curve with validated parameters.
///
/// Every variant maps a crisp value onto a degree in `[0, 1]`. Parameters are
/// checked once in [`Shape::new`], so [`Shape::eval`] never fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Linear rise a→b, fall b→c
    Triangle { a: f64, b: f64, c: f64 },
    /// Rise a→b, plateau on [b, c], fall c→d
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
    /// Quadratic spline descending from 1 to 0 over [a, b]
    Z { a: f64, b: f64 },
    /// Quadratic spline ascending from 0 to 1 over [a, b]
    S { a: f64, b: f64 },
    /// S rise over [a, b] followed by a Z fall over [c, d]
    Pi { a: f64, b: f64, c: f64, d: f64 },
    Gaussian { mean: f64, sigma: f64 },
    /// Gaussian left of `mean1`, 1 in between, Gaussian right of `mean2`
    Gaussian2 {
        mean1: f64,
        sigma1: f64,
        mean2: f64,
        sigma2: f64,
    },
    /// Generalized bell, 1 / (1 + |(x - c) / a|^(2b))
    Bell { a: f64, b: f64, c: f64 },
    Sigmoid { b: f64, c: f64 },
    SigmoidProduct { b1: f64, c1: f64, b2: f64, c2: f64 },
    SigmoidDifference { b1: f64, c1: f64, b2: f64, c2: f64 },
}

impl Shape {
    /// Builds a shape from its configuration name and raw parameter list.
    pub fn new(name: &str, params: &[f64]) -> Result<Self, ConfigError> {
        let shape = match name.to_ascii_lowercase().as_str() {
            "trimf" | "triangle" => {
                let [a, b, c] = arity("trimf", params)?;
                ordered("trimf", &[a, b, c])?;
                Self::Triangle { a, b, c }
            },
            "trapmf" | "trapezoid" => {
                let [a, b, c, d] = arity("trapmf", params)?;
                ordered("trapmf", &[a, b, c, d])?;
                Self::Trapezoid { a, b, c, d }
            },
            "zmf" => {
                let [a, b] = arity("zmf", params)?;
                ordered("zmf", &[a, b])?;
                Self::Z { a, b }
            },
            "smf" => {
                let [a, b] = arity("smf", params)?;
                ordered("smf", &[a, b])?;
                Self::S { a, b }
            },
            "pimf" => {
                let [a, b, c, d] = arity("pimf", params)?;
                ordered("pimf", &[a, b, c, d])?;
                Self::Pi { a, b, c, d }
            },
            "gaussmf" => {
                let [mean, sigma] = arity("gaussmf", params)?;
                positive("gaussmf", sigma)?;
                Self::Gaussian { mean, sigma }
            },
            "gauss2mf" => {
                let [mean1, sigma1, mean2, sigma2] = arity("gauss2mf", params)?;
                positive("gauss2mf", sigma1)?;
                positive("gauss2mf", sigma2)?;
                if mean1 > mean2 {
                    return Err(invalid("gauss2mf", "mean1 <= mean2 is required"));
                }
                Self::Gaussian2 {
                    mean1,
                    sigma1,
                    mean2,
                    sigma2,
                }
            },
            "gbellmf" => {
                let [a, b, c] = arity("gbellmf", params)?;
                if a == 0. {
                    return Err(invalid("gbellmf", "width a must be non-zero"));
                }
                Self::Bell { a, b, c }
            },
            "sigmf" => {
                let [b, c] = arity("sigmf", params)?;
                Self::Sigmoid { b, c }
            },
            "psigmf" => {
                let [b1, c1, b2, c2] = arity("psigmf", params)?;
                Self::SigmoidProduct { b1, c1, b2, c2 }
            },
            "dsigmf" => {
                let [b1, c1, b2, c2] = arity("dsigmf", params)?;
                Self::SigmoidDifference { b1, c1, b2, c2 }
            },
            _ => {
                return Err(ConfigError::UnknownMembershipShape {
                    name: name.to_owned(),
                })
            },
        };

        Ok(shape)
    }

    /// Degree of membership of `x`, always within `[0, 1]`.
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            Self::Triangle { a, b, c } => trimf(a, b, c, x),
            Self::Trapezoid { a, b, c, d } => trapmf(a, b, c, d, x),
            Self::Z { a, b } => zmf(a, b, x),
            Self::S { a, b } => smf(a, b, x),
            Self::Pi { a, b, c, d } => smf(a, b, x) * zmf(c, d, x),
            Self::Gaussian { mean, sigma } => gaussmf(mean, sigma, x),
            Self::Gaussian2 {
                mean1,
                sigma1,
                mean2,
                sigma2,
            } => {
                if x < mean1 {
                    gaussmf(mean1, sigma1, x)
                } else if x > mean2 {
                    gaussmf(mean2, sigma2, x)
                } else {
                    1.
                }
            },
            Self::Bell { a, b, c } => 1. / (1. + ((x - c) / a).abs().powf(2. * b)),
            Self::Sigmoid { b, c } => sigmf(b, c, x),
            Self::SigmoidProduct { b1, c1, b2, c2 } => sigmf(b1, c1, x) * sigmf(b2, c2, x),
            // The difference dips below zero wherever the second sigmoid leads
            Self::SigmoidDifference { b1, c1, b2, c2 } => (sigmf(b1, c1, x) - sigmf(b2, c2, x)).clamp(0., 1.),
        }
    }

    /// The configuration name of this shape.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Triangle { .. } => "trimf",
            Self::Trapezoid { .. } => "trapmf",
            Self::Z { .. } => "zmf",
            Self::S { .. } => "smf",
            Self::Pi { .. } => "pimf",
            Self::Gaussian { .. } => "gaussmf",
            Self::Gaussian2 { .. } => "gauss2mf",
            Self::Bell { .. } => "gbellmf",
            Self::Sigmoid { .. } => "sigmf",
            Self::SigmoidProduct { .. } => "psigmf",
            Self::SigmoidDifference { .. } => "dsigmf",
        }
    }

    /// The first configured parameter, which a Sugeno consequent reads as its
    /// output constant.
    pub fn first_param(&self) -> f64 {
        match *self {
            Self::Triangle { a, .. }
            | Self::Trapezoid { a, .. }
            | Self::Z { a, .. }
            | Self::S { a, .. }
            | Self::Pi { a, .. }
            | Self::Bell { a, .. } => a,
            Self::Gaussian { mean, .. } => mean,
            Self::Gaussian2 { mean1, .. } => mean1,
            Self::Sigmoid { b, .. } => b,
            Self::SigmoidProduct { b1, .. } | Self::SigmoidDifference { b1, .. } => b1,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A labeled term of a variable. Input variables and Mamdani outputs carry a
/// [`Shape`]; Sugeno outputs carry a [`Consequent`].
#[derive(Clone, Debug, PartialEq)]
pub struct MembershipFunction<T = Shape> {
    pub label: String,
    pub shape: T,
}

impl<T> MembershipFunction<T> {
    pub fn new(label: impl Into<String>, shape: T) -> Self {
        Self {
            label: label.into(),
            shape,
        }
    }
}

impl MembershipFunction<Shape> {
    pub fn eval(&self, x: f64) -> f64 {
        self.shape.eval(x)
    }
}

/// What a Sugeno rule contributes to an output before weighting.
#[derive(Clone, Debug, PartialEq)]
pub enum Consequent {
    Constant(f64),
    /// `p1 * x1 + .. + pn * xn + r` over the clamped inputs
    Linear(Vec<f64>),
    /// A curve shape used as a consequent contributes its first parameter
    Curve(Shape),
}

impl Consequent {
    pub fn new(name: &str, params: &[f64], num_inputs: usize) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "constant" => {
                let [value] = arity("constant", params)?;
                Ok(Self::Constant(value))
            },
            "linear" => {
                if params.len() != num_inputs + 1 {
                    return Err(invalid(
                        "linear",
                        format!(
                            "expected {} coefficients (one per input plus an offset), got {}",
                            num_inputs + 1,
                            params.len()
                        ),
                    ));
                }
                finite("linear", params)?;
                Ok(Self::Linear(params.to_vec()))
            },
            _ => Shape::new(name, params).map(Self::Curve),
        }
    }

    /// Whether `name` describes a consequent with no membership curve.
    pub fn is_sugeno_only(name: &str) -> Option<&'static str> {
        match name.to_ascii_lowercase().as_str() {
            "constant" => Some("constant"),
            "linear" => Some("linear"),
            _ => None,
        }
    }

    /// The crisp value this consequent takes for the given clamped inputs.
    pub fn value(&self, inputs: &[f64]) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Linear(coefficients) => {
                let (offset, weights) = coefficients
                    .split_last()
                    .map_or((0., &[][..]), |(r, p)| (*r, p));

                weights
                    .iter()
                    .zip(inputs)
                    .fold(offset, |acc, (p, x)| acc + p * x)
            },
            Self::Curve(shape) => shape.first_param(),
        }
    }
}

/// Validates and evaluates a membership function in one call.
pub fn evaluate(name: &str, params: &[f64], x: f64) -> Result<f64, ConfigError> {
    Shape::new(name, params).map(|shape| shape.eval(x))
}

fn trimf(a: f64, b: f64, c: f64, x: f64) -> f64 {
    if x == b {
        1.
    } else if a < x && x < b {
        ramp(a, b, x)
    } else if b < x && x < c {
        ramp(c, b, x)
    } else {
        0.
    }
}

fn trapmf(a: f64, b: f64, c: f64, d: f64, x: f64) -> f64 {
    if b <= x && x <= c {
        1.
    } else if a < x && x < b {
        ramp(a, b, x)
    } else if c < x && x < d {
        ramp(d, c, x)
    } else {
        0.
    }
}

/// Linear rise from 0 at `from` to 1 at `to`, for `x` between the two.
fn ramp(from: f64, to: f64, x: f64) -> f64 {
    let span = to - from;
    // Only huge operands overflow the span, and halving those is exact
    let ratio = if span.is_finite() {
        (x - from) / span
    } else {
        (x / 2. - from / 2.) / (to / 2. - from / 2.)
    };

    ratio.clamp(0., 1.)
}

fn smf(a: f64, b: f64, x: f64) -> f64 {
    if x <= a {
        0.
    } else if x >= b {
        1.
    } else {
        let t = ramp(a, b, x);

        if t <= 0.5 {
            2. * t.powi(2)
        } else {
            1. - 2. * (1. - t).powi(2)
        }
    }
}

fn zmf(a: f64, b: f64, x: f64) -> f64 {
    1. - smf(a, b, x)
}

fn gaussmf(mean: f64, sigma: f64, x: f64) -> f64 {
    (-0.5 * ((x - mean) / sigma).powi(2)).exp()
}

fn sigmf(b: f64, c: f64, x: f64) -> f64 {
    // Flat everywhere, even where x - b overflows
    if c == 0. {
        return 0.5;
    }

    1. / (1. + (-c * (x - b)).exp())
}

fn invalid(shape: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameters {
        shape,
        reason: reason.into(),
    }
}

fn arity<const N: usize>(shape: &'static str, params: &[f64]) -> Result<[f64; N], ConfigError> {
    let params: [f64; N] = params
        .try_into()
        .map_err(|_| invalid(shape, format!("expected {} parameters, got {}", N, params.len())))?;
    finite(shape, &params)?;

    Ok(params)
}

fn finite(shape: &'static str, params: &[f64]) -> Result<(), ConfigError> {
    match params.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(invalid(shape, format!("parameter {i} is not finite"))),
        None => Ok(()),
    }
}

fn ordered(shape: &'static str, params: &[f64]) -> Result<(), ConfigError> {
    if params.windows(2).all(|w| w[0] <= w[1]) {
        Ok(())
    } else {
        Err(invalid(shape, format!("parameters {params:?} must be non-decreasing")))
    }
}

fn positive(shape: &'static str, sigma: f64) -> Result<(), ConfigError> {
    if sigma > 0. {
        Ok(())
    } else {
        Err(invalid(shape, format!("sigma must be positive, got {sigma}")))
    }
}

#[test]
fn test_triangle() {
    let tri = Shape::new("trimf", &[-1., 0., 2.]).unwrap();

    assert_eq!(tri.eval(-1.), 0.);
    assert_eq!(tri.eval(-0.5), 0.5);
    assert_eq!(tri.eval(0.), 1.);
    assert_eq!(tri.eval(1.), 0.5);
    assert_eq!(tri.eval(2.), 0.);
    assert_eq!(tri.eval(7.), 0.);

    // Degenerate left edge
    let shoulder = Shape::new("triangle", &[3., 3., 5.]).unwrap();

    assert_eq!(shoulder.eval(3.), 1.);
    assert_eq!(shoulder.eval(4.), 0.5);
    assert_eq!(shoulder.eval(2.999), 0.);
}

#[test]
fn test_trapezoid() {
    let trap = Shape::new("trapmf", &[-10., -2., 2., 10.]).unwrap();

    assert_eq!(trap.eval(-10.), 0.);
    assert_eq!(trap.eval(-6.), 0.5);
    assert_eq!(trap.eval(-2.), 1.);
    assert_eq!(trap.eval(0.), 1.);
    assert_eq!(trap.eval(6.), 0.5);
    assert_eq!(trap.eval(10.), 0.);

    let step = Shape::new("trapmf", &[0., 0., 1., 1.]).unwrap();

    assert_eq!(step.eval(0.), 1.);
    assert_eq!(step.eval(1.), 1.);
    assert_eq!(step.eval(1.5), 0.);
}

#[test]
fn test_splines() {
    let s = Shape::new("smf", &[0., 4.]).unwrap();
    let z = Shape::new("zmf", &[0., 4.]).unwrap();

    assert_eq!(s.eval(-1.), 0.);
    assert_eq!(s.eval(1.), 0.125);
    assert_eq!(s.eval(2.), 0.5);
    assert_eq!(s.eval(3.), 0.875);
    assert_eq!(s.eval(5.), 1.);

    for x in [-1., 0.5, 1., 2., 3.3, 4., 9.] {
        assert!((s.eval(x) + z.eval(x) - 1.).abs() < 1e-12);
    }

    let pi = Shape::new("pimf", &[0., 4., 6., 10.]).unwrap();

    assert_eq!(pi.eval(2.), 0.5);
    assert_eq!(pi.eval(5.), 1.);
    assert_eq!(pi.eval(8.), 0.5);
    assert_eq!(pi.eval(11.), 0.);
}

#[test]
fn test_gaussians() {
    let gauss = Shape::new("gaussmf", &[1., 2.]).unwrap();

    assert_eq!(gauss.eval(1.), 1.);
    assert!((gauss.eval(3.) - (-0.5f64).exp()).abs() < 1e-15);

    let gauss2 = Shape::new("gauss2mf", &[0., 1., 2., 1.]).unwrap();

    assert_eq!(gauss2.eval(1.), 1.);
    assert_eq!(gauss2.eval(-1.), gauss2.eval(3.));
    assert!(Shape::new("gauss2mf", &[2., 1., 0., 1.]).is_err());
    assert!(Shape::new("gaussmf", &[0., 0.]).is_err());

    let narrow = Shape::new("gaussmf", &[0., 1e-200]).unwrap();

    assert_eq!(narrow.eval(0.), 1.);
    assert_eq!(narrow.eval(1e-190), 0.);
    assert_eq!(Shape::new("gauss2mf", &[0., 1e-200, 1., 1e-200]).unwrap().eval(1.), 1.);
}

#[test]
fn test_extreme_parameters() {
    let wide = Shape::new("trimf", &[-1e308, 1.7e308, 1.7e308]).unwrap();
    let degree = wide.eval(1e308);

    assert!((degree - 1e308 / 1.35e308).abs() < 1e-12);
    assert_eq!(wide.eval(1.7e308), 1.);

    let plateau = Shape::new("trapmf", &[-f64::MAX, 0., 0., f64::MAX]).unwrap();

    assert!((plateau.eval(f64::MAX / 2.) - 0.5).abs() < 1e-12);
    assert!((plateau.eval(-f64::MAX / 2.) - 0.5).abs() < 1e-12);

    let spline = Shape::new("smf", &[-f64::MAX, f64::MAX]).unwrap();

    assert_eq!(spline.eval(0.), 0.5);
    assert_eq!(Shape::new("zmf", &[-f64::MAX, f64::MAX]).unwrap().eval(0.), 0.5);
    assert_eq!(Shape::new("sigmf", &[-1e308, 0.]).unwrap().eval(1e308), 0.5);
    assert_eq!(Shape::new("dsigmf", &[-1e308, 0., 1e308, 0.]).unwrap().eval(1e308), 0.);
}

#[test]
fn test_bell_and_sigmoids() {
    let bell = Shape::new("gbellmf", &[2., 4., 6.]).unwrap();

    assert_eq!(bell.eval(6.), 1.);
    assert_eq!(bell.eval(8.), 0.5);
    assert!(Shape::new("gbellmf", &[0., 4., 6.]).is_err());

    let sig = Shape::new("sigmf", &[0., 3.]).unwrap();

    assert_eq!(sig.eval(0.), 0.5);

    let psig = Shape::new("psigmf", &[0., 3., 0., 3.]).unwrap();

    assert_eq!(psig.eval(0.), 0.25);

    let dsig = Shape::new("dsigmf", &[5., 2., 0., 2.]).unwrap();

    assert_eq!(dsig.eval(2.5), 0.);
}

#[test]
fn test_invalid_parameters() {
    assert!(matches!(
        Shape::new("trimf", &[2., 1., 3.]),
        Err(ConfigError::InvalidParameters { shape: "trimf", .. })
    ));
    assert!(matches!(
        Shape::new("trapmf", &[0., 1., 2.]),
        Err(ConfigError::InvalidParameters { shape: "trapmf", .. })
    ));
    assert!(matches!(
        Shape::new("smf", &[0., f64::NAN]),
        Err(ConfigError::InvalidParameters { .. })
    ));
    assert!(matches!(
        Shape::new("blob", &[0.]),
        Err(ConfigError::UnknownMembershipShape { .. })
    ));
    assert!(matches!(
        evaluate("TRIMF", &[0., 1., 2.], 1.),
        Ok(d) if d == 1.
    ));
}

#[test]
fn test_consequents() {
    let constant = Consequent::new("constant", &[4.5], 2).unwrap();
    let linear = Consequent::new("linear", &[2., -1., 0.5], 2).unwrap();
    let curve = Consequent::new("trimf", &[1., 2., 3.], 2).unwrap();

    assert_eq!(constant.value(&[1., 1.]), 4.5);
    assert_eq!(linear.value(&[3., 4.]), 2.5);
    assert_eq!(curve.value(&[3., 4.]), 1.);
    assert!(Consequent::new("linear", &[1., 2.], 2).is_err());
    assert_eq!(Consequent::is_sugeno_only("Constant"), Some("constant"));
    assert_eq!(Consequent::is_sugeno_only("trimf"), None);
}
