use num::ToPrimitive;

use crate::error::InferenceError;
use crate::linspace::Linspace;
use crate::membership::MembershipFunction;
use crate::ops::{AggregationOp, ImplicationOp};
use crate::variable::Variable;

// Absorbs the rounding in span / step so 40 / 0.01 gives 4000 steps, not 3999
const STEP_TOLERANCE: f64 = 1e-9;

/// Most samples a single discretization may produce.
pub const MAX_SAMPLES: usize = 1 << 24;

/// How finely an output domain is sampled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// Distance between consecutive samples, in domain units
    Step(f64),
    /// Number of equal segments; the domain end is always sampled
    Segments(usize),
}

impl Resolution {
    fn kind(&self) -> &'static str {
        match self {
            Self::Step(_) => "step",
            Self::Segments(_) => "segments",
        }
    }
}

/// The sampling of one output domain for Mamdani aggregation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Discretization {
    pub start: f64,
    pub end: f64,
    pub resolution: Resolution,
}

impl Discretization {
    pub fn new(start: f64, end: f64, resolution: Resolution) -> Self {
        Self { start, end, resolution }
    }

    /// Samples `start..=end` every `step`.
    pub fn step(start: f64, end: f64, step: f64) -> Self {
        Self::new(start, end, Resolution::Step(step))
    }

    /// Samples the whole range of `var`.
    pub fn over<T>(var: &Variable<T>, resolution: Resolution) -> Self {
        let range = var.range();

        Self::new(*range.start(), *range.end(), resolution)
    }

    /// The sample positions, or why there cannot be at least two of them.
    pub fn samples(&self) -> Result<Vec<f64>, InferenceError> {
        let Self { start, end, resolution } = *self;
        let span = end - start;

        if !(start.is_finite() && end.is_finite() && start < end && span.is_finite()) {
            return Err(InferenceError::InvalidRange { start, end });
        }

        let samples = match resolution {
            Resolution::Step(step) => {
                if !(step.is_finite() && step > 0.) {
                    return Err(InferenceError::InvalidResolution {
                        reason: format!("step must be a positive number, got {step}"),
                    });
                }
                if step > span {
                    return Err(InferenceError::InvalidResolution {
                        reason: format!("step {step} is larger than the range {span}"),
                    });
                }

                let steps = (span / step * (1. + STEP_TOLERANCE)).floor().to_usize();

                Linspace::with_step(start, step, sample_count(steps)?)
            },
            Resolution::Segments(segments) => {
                if segments == 0 {
                    return Err(InferenceError::InvalidResolution {
                        reason: "at least one segment is required".to_owned(),
                    });
                }

                Linspace::new(start, end, sample_count(Some(segments))?)
            },
        };

        Ok(samples.map(|x| x.min(end)).collect())
    }
}

/// One sample per step plus the closing one, within [`MAX_SAMPLES`].
fn sample_count(steps: Option<usize>) -> Result<usize, InferenceError> {
    steps
        .and_then(|steps| steps.checked_add(1))
        .filter(|&count| count <= MAX_SAMPLES)
        .ok_or_else(|| InferenceError::InvalidResolution {
            reason: format!("resolution yields more than {MAX_SAMPLES} samples"),
        })
}

/// A sampled membership curve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Curve {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Builds the aggregated curve of one output.
///
/// `caps[t]` is the cap of term `t`, or `None` when no rule concluded it. At
/// each sample the implied degrees of the capped terms are folded in term
/// order, starting from the aggregation identity.
pub fn aggregate(
    discretization: &Discretization,
    terms: &[MembershipFunction],
    caps: &[Option<f64>],
    imp_op: ImplicationOp,
    agg_op: AggregationOp,
) -> Result<Curve, InferenceError> {
    let x = discretization.samples()?;
    let capped: Vec<_> = terms
        .iter()
        .zip(caps)
        .filter_map(|(term, cap)| cap.map(|cap| (term, cap)))
        .collect();
    let y = x
        .iter()
        .map(|&x| {
            capped
                .iter()
                .fold(agg_op.identity(), |acc, (term, cap)| agg_op.call(acc, imp_op.call(*cap, term.eval(x))))
        })
        .collect();

    Ok(Curve { x, y })
}

/// One call may not mix step sizes with segment counts.
pub(crate) fn check_uniform(discretizations: &[Discretization]) -> Result<(), InferenceError> {
    let mut kinds = discretizations.iter().map(|d| d.resolution.kind());

    match kinds.next() {
        Some(first) if kinds.any(|kind| kind != first) => Err(InferenceError::InvalidResolution {
            reason: "step sizes and segment counts cannot be mixed in one call".to_owned(),
        }),
        _ => Ok(()),
    }
}

#[test]
fn test_sample_counts() {
    assert_eq!(Discretization::step(-20., 20., 0.01).samples().unwrap().len(), 4001);
    assert_eq!(Discretization::step(-6., 6., 0.01).samples().unwrap().len(), 1201);
    assert_eq!(Discretization::step(0., 1., 0.3).samples().unwrap().len(), 4);

    let segments = Discretization::new(0., 1., Resolution::Segments(4)).samples().unwrap();

    assert_eq!(segments, vec![0., 0.25, 0.5, 0.75, 1.]);

    let samples = Discretization::step(-20., 20., 0.01).samples().unwrap();

    assert_eq!(samples[0], -20.);
    assert!(samples.iter().all(|&x| x <= 20.));
    assert!((samples[4000] - 20.).abs() < 1e-9);
}

#[test]
fn test_invalid_discretizations() {
    assert_eq!(
        Discretization::step(1., 1., 0.1).samples(),
        Err(InferenceError::InvalidRange { start: 1., end: 1. })
    );
    assert!(matches!(
        Discretization::step(2., 1., 0.1).samples(),
        Err(InferenceError::InvalidRange { .. })
    ));
    assert!(matches!(
        Discretization::step(0., 1., 2.).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(matches!(
        Discretization::step(0., 1., 0.).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(matches!(
        Discretization::new(0., 1., Resolution::Segments(0)).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(check_uniform(&[
        Discretization::step(0., 1., 0.1),
        Discretization::new(0., 1., Resolution::Segments(10)),
    ])
    .is_err());
    assert!(check_uniform(&[Discretization::step(0., 1., 0.1), Discretization::step(0., 2., 0.5)]).is_ok());
    assert!(check_uniform(&[]).is_ok());
}

#[test]
fn test_sample_count_limits() {
    // The span itself overflows
    assert_eq!(
        Discretization::step(-1e308, 1e308, 1.).samples(),
        Err(InferenceError::InvalidRange { start: -1e308, end: 1e308 })
    );
    assert!(matches!(
        Discretization::new(0., 1., Resolution::Segments(usize::MAX)).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(matches!(
        Discretization::step(-20., 20., 1e-12).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(matches!(
        Discretization::step(0., 1., f64::MIN_POSITIVE).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
    assert!(matches!(
        Discretization::new(0., 1., Resolution::Segments(MAX_SAMPLES)).samples(),
        Err(InferenceError::InvalidResolution { .. })
    ));
}

#[test]
fn test_aggregate_caps() {
    use crate::membership::Shape;

    let terms = vec![
        MembershipFunction::new("low", Shape::new("trimf", &[0., 0., 2.]).unwrap()),
        MembershipFunction::new("mid", Shape::new("trimf", &[0., 2., 4.]).unwrap()),
        MembershipFunction::new("high", Shape::new("trimf", &[2., 4., 4.]).unwrap()),
    ];
    let grid = Discretization::new(0., 4., Resolution::Segments(4));
    let caps = [Some(0.5), None, Some(0.25)];

    let clipped = aggregate(&grid, &terms, &caps, ImplicationOp::Min, AggregationOp::Max).unwrap();

    assert_eq!(clipped.x, vec![0., 1., 2., 3., 4.]);
    assert_eq!(clipped.y, vec![0.5, 0.5, 0., 0.25, 0.25]);

    let scaled = aggregate(&grid, &terms, &caps, ImplicationOp::Prod, AggregationOp::Sum).unwrap();

    assert_eq!(scaled.y, vec![0.5, 0.25, 0., 0.125, 0.25]);

    let nothing = aggregate(&grid, &terms, &[None, None, None], ImplicationOp::Min, AggregationOp::Max).unwrap();

    assert_eq!(nothing.len(), 5);
    assert!(nothing.y.iter().all(|&y| y == 0.));
}
