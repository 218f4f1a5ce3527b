//! Property-based tests for the inference engine.

use fuzzy_control::{
    aggregate, defuzz, AggregationOp, ConfigError, Discretization, ImplicationOp, MembershipConfig, MembershipFunction,
    Model, ModelConfig, Resolution, RuleConfig, Shape, SystemConfig, VariableConfig,
};
use proptest::prelude::*;

// ===== Strategies =====

fn arb_point() -> impl Strategy<Value = f64> {
    -100.0..100.0f64
}

/// `n` non-decreasing points
fn arb_ordered(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_point(), n).prop_map(|mut points| {
        points.sort_by(|a, b| a.total_cmp(b));
        points
    })
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let positive = 0.01..50.0f64;

    prop_oneof![
        arb_ordered(3).prop_map(|p| Shape::new("trimf", &p).unwrap()),
        arb_ordered(4).prop_map(|p| Shape::new("trapmf", &p).unwrap()),
        arb_ordered(2).prop_map(|p| Shape::new("zmf", &p).unwrap()),
        arb_ordered(2).prop_map(|p| Shape::new("smf", &p).unwrap()),
        arb_ordered(4).prop_map(|p| Shape::new("pimf", &p).unwrap()),
        (arb_point(), positive.clone()).prop_map(|(m, s)| Shape::new("gaussmf", &[m, s]).unwrap()),
        (arb_ordered(2), positive.clone(), positive.clone())
            .prop_map(|(m, s1, s2)| Shape::new("gauss2mf", &[m[0], s1, m[1], s2]).unwrap()),
        (positive.clone(), 0.1..5.0f64, arb_point()).prop_map(|(a, b, c)| Shape::new("gbellmf", &[a, b, c]).unwrap()),
        (arb_point(), -5.0..5.0f64).prop_map(|(b, c)| Shape::new("sigmf", &[b, c]).unwrap()),
        (arb_point(), -5.0..5.0f64, arb_point(), -5.0..5.0f64)
            .prop_map(|(b1, c1, b2, c2)| Shape::new("psigmf", &[b1, c1, b2, c2]).unwrap()),
        (arb_point(), -5.0..5.0f64, arb_point(), -5.0..5.0f64)
            .prop_map(|(b1, c1, b2, c2)| Shape::new("dsigmf", &[b1, c1, b2, c2]).unwrap()),
    ]
}

/// Any finite value, tiny and huge magnitudes included
fn arb_extreme() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE
        | prop::num::f64::NEGATIVE
        | prop::num::f64::NORMAL
        | prop::num::f64::SUBNORMAL
        | prop::num::f64::ZERO
}

fn arb_extreme_positive() -> impl Strategy<Value = f64> {
    prop::num::f64::POSITIVE | prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL
}

fn arb_extreme_ordered(n: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(arb_extreme(), n).prop_map(|mut points| {
        points.sort_by(|a, b| a.total_cmp(b));
        points
    })
}

fn arb_extreme_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        arb_extreme_ordered(3).prop_map(|p| Shape::new("trimf", &p).unwrap()),
        arb_extreme_ordered(4).prop_map(|p| Shape::new("trapmf", &p).unwrap()),
        arb_extreme_ordered(2).prop_map(|p| Shape::new("zmf", &p).unwrap()),
        arb_extreme_ordered(2).prop_map(|p| Shape::new("smf", &p).unwrap()),
        arb_extreme_ordered(4).prop_map(|p| Shape::new("pimf", &p).unwrap()),
        (arb_extreme(), arb_extreme_positive()).prop_map(|(m, s)| Shape::new("gaussmf", &[m, s]).unwrap()),
        (arb_extreme_ordered(2), arb_extreme_positive(), arb_extreme_positive())
            .prop_map(|(m, s1, s2)| Shape::new("gauss2mf", &[m[0], s1, m[1], s2]).unwrap()),
        (arb_extreme_positive(), arb_extreme(), arb_extreme())
            .prop_map(|(a, b, c)| Shape::new("gbellmf", &[a, b, c]).unwrap()),
        (arb_extreme(), arb_extreme()).prop_map(|(b, c)| Shape::new("sigmf", &[b, c]).unwrap()),
        (arb_extreme(), arb_extreme(), arb_extreme(), arb_extreme())
            .prop_map(|(b1, c1, b2, c2)| Shape::new("psigmf", &[b1, c1, b2, c2]).unwrap()),
        (arb_extreme(), arb_extreme(), arb_extreme(), arb_extreme())
            .prop_map(|(b1, c1, b2, c2)| Shape::new("dsigmf", &[b1, c1, b2, c2]).unwrap()),
    ]
}

fn triangle_terms() -> Vec<MembershipConfig> {
    [("low", [0., 0., 5.]), ("mid", [0., 5., 10.]), ("high", [5., 10., 10.])]
        .into_iter()
        .map(|(label, params)| MembershipConfig {
            label: label.to_owned(),
            shape: "trimf".to_owned(),
            params: params.to_vec(),
        })
        .collect()
}

/// Three identical inputs and one rule over them.
fn single_rule_model(antecedent: &[&str], conjunction: &str, and: &str, or: &str) -> Model {
    let input = |name: &str| VariableConfig {
        name: name.to_owned(),
        range: [0., 10.],
        mf: triangle_terms(),
    };
    let config = ModelConfig {
        system: SystemConfig {
            name: "commutativity".to_owned(),
            method: "mamdani".to_owned(),
            num_inputs: 3,
            num_outputs: 1,
            num_rules: Some(1),
            and_method: and.to_owned(),
            or_method: or.to_owned(),
            imp_method: "min".to_owned(),
            agg_method: "max".to_owned(),
            defuzz_method: "centroid".to_owned(),
        },
        inputs: vec![input("a"), input("b"), input("c")],
        outputs: vec![input("out")],
        rules: vec![RuleConfig {
            antecedent: antecedent.iter().map(|s| s.to_string()).collect(),
            consequent: vec!["mid".to_owned()],
            conjunction: conjunction.to_owned(),
        }],
    };

    Model::build(&config).unwrap()
}

// ===== Property Tests =====

proptest! {
    #[test]
    fn prop_membership_is_bounded(shape in arb_shape(), x in -1e4..1e4f64) {
        let degree = shape.eval(x);

        prop_assert!((0.0..=1.0).contains(&degree), "{} gave {} at {}", shape, degree, x);
    }

    #[test]
    fn prop_membership_is_bounded_at_extremes(shape in arb_extreme_shape(), x in arb_extreme()) {
        let degree = shape.eval(x);

        prop_assert!((0.0..=1.0).contains(&degree), "{:?} gave {} at {}", shape, degree, x);
    }

    #[test]
    fn prop_unordered_parameters_are_rejected(a in arb_point(), gap in 0.001..50.0f64) {
        let b = a + gap;

        for (name, params) in [
            ("trimf", vec![b, a, b]),
            ("trapmf", vec![a, b, a, b]),
            ("zmf", vec![b, a]),
            ("smf", vec![b, a]),
            ("pimf", vec![a, a, b, a]),
        ] {
            let is_invalid = matches!(Shape::new(name, &params), Err(ConfigError::InvalidParameters { .. }));
            prop_assert!(is_invalid, "{} accepted {:?}", name, params);
        }
    }

    #[test]
    fn prop_antecedent_order_is_irrelevant(
        inputs in prop::collection::vec(0.0..10.0f64, 3),
        labels in prop::collection::vec(prop_oneof![Just("low"), Just("mid"), Just("high")], 3),
        ops in prop_oneof![
            Just(("and", "min", "max")),
            Just(("and", "prod", "max")),
            Just(("or", "min", "max")),
            Just(("or", "min", "probor")),
            Just(("or", "min", "sum")),
        ],
    ) {
        let (conjunction, and, or) = ops;
        let model = single_rule_model(&labels, conjunction, and, or);
        let rotated = single_rule_model(&[labels[2], labels[0], labels[1]], conjunction, and, or);

        let strength = model.session(&inputs).unwrap().firing_strengths()[0];
        let rotated_strength = rotated
            .session(&[inputs[2], inputs[0], inputs[1]])
            .unwrap()
            .firing_strengths()[0];

        prop_assert!((strength - rotated_strength).abs() < 1e-12);
    }

    #[test]
    fn prop_aggregation_length_matches_samples(
        start in -100.0..100.0f64,
        span in 0.5..50.0f64,
        steps in 2usize..2000,
    ) {
        let step = span / steps as f64;
        let grid = Discretization::step(start, start + span, step);
        let terms = vec![MembershipFunction::new("any", Shape::new("gaussmf", &[start, span]).unwrap())];
        let curve = aggregate(&grid, &terms, &[Some(0.5)], ImplicationOp::Prod, AggregationOp::Max).unwrap();

        prop_assert_eq!(curve.x.len(), curve.y.len());
        prop_assert_eq!(curve.len(), grid.samples().unwrap().len());
        // Rounding in span / step may cost or gain at most the final sample
        prop_assert!(curve.len().abs_diff(steps + 1) <= 1);
    }

    #[test]
    fn prop_symmetric_triangle_centroid_is_its_peak(peak in arb_point(), width in 0.5..20.0f64) {
        let grid = Discretization::new(peak - width, peak + width, Resolution::Segments(400));
        let shape = Shape::new("trimf", &[peak - width, peak, peak + width]).unwrap();
        let terms = vec![MembershipFunction::new("peak", shape)];
        let curve = aggregate(&grid, &terms, &[Some(1.)], ImplicationOp::Min, AggregationOp::Max).unwrap();
        let centroid = defuzz::centroid(&curve.x, &curve.y).unwrap();

        prop_assert!((centroid - peak).abs() < 1e-9 * (1. + peak.abs() + width));
    }

    #[test]
    fn prop_empty_range_is_rejected(start in arb_point(), shrink in 0.0..10.0f64) {
        let grid = Discretization::step(start, start - shrink, 0.1);

        prop_assert!(grid.samples().is_err());
    }
}
