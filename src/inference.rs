use tracing::{debug, trace};

use crate::aggregate::{aggregate, check_uniform, Curve, Discretization};
use crate::config::{MembershipConfig, ModelConfig, VariableConfig};
use crate::error::{ConfigError, InferenceError};
use crate::membership::{Consequent, MembershipFunction, Shape};
use crate::ops::*;
use crate::rules::Rule;
use crate::variable::Variable;

/// Output variables, typed by what their terms carry.
#[derive(Clone, Debug)]
pub enum Outputs {
    Mamdani(Vec<Variable<Shape>>),
    Sugeno(Vec<Variable<Consequent>>),
}

impl Outputs {
    pub fn len(&self) -> usize {
        match self {
            Self::Mamdani(vars) => vars.len(),
            Self::Sugeno(vars) => vars.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Term count of every output, in order.
    fn term_counts(&self) -> Vec<usize> {
        match self {
            Self::Mamdani(vars) => vars.iter().map(Variable::len).collect(),
            Self::Sugeno(vars) => vars.iter().map(Variable::len).collect(),
        }
    }
}

/// An immutable fuzzy controller. Share it freely; every evaluation runs in
/// its own [`InferenceSession`].
#[derive(Clone, Debug)]
pub struct Model {
    name: String,
    and_op: AndOp,
    or_op: OrOp,
    imp_op: ImplicationOp,
    agg_op: AggregationOp,
    defuzz_op: DefuzzificationOp,
    inputs: Vec<Variable>,
    outputs: Outputs,
    rules: Vec<Rule>,
}

impl Model {
    /// Resolves every name in `config` and checks the declared cardinalities.
    pub fn build(config: &ModelConfig) -> Result<Self, ConfigError> {
        let system = &config.system;
        let method: Method = system.method.parse()?;
        let and_op: AndOp = system.and_method.parse()?;
        let or_op: OrOp = system.or_method.parse()?;
        let imp_op: ImplicationOp = system.imp_method.parse()?;
        let agg_op: AggregationOp = system.agg_method.parse()?;
        let defuzz_op: DefuzzificationOp = system.defuzz_method.parse()?;

        if defuzz_op.method() != method {
            return Err(ConfigError::IncompatibleDefuzzification {
                defuzz: defuzz_op.name(),
                method: method.name(),
            });
        }

        check_count("input", system.num_inputs, config.inputs.len())?;
        check_count("output", system.num_outputs, config.outputs.len())?;
        if let Some(num_rules) = system.num_rules {
            check_count("rule", num_rules, config.rules.len())?;
        }

        let inputs = config
            .inputs
            .iter()
            .map(curve_variable)
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = match method {
            Method::Mamdani => Outputs::Mamdani(
                config
                    .outputs
                    .iter()
                    .map(curve_variable)
                    .collect::<Result<_, _>>()?,
            ),
            Method::Sugeno => Outputs::Sugeno(
                config
                    .outputs
                    .iter()
                    .map(|var| {
                        build_variable(var, |mf| Consequent::new(&mf.shape, &mf.params, inputs.len()))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        };

        let mut rules = Vec::with_capacity(config.rules.len());

        for (i, rule) in config.rules.iter().enumerate() {
            let conjunction = rule
                .conjunction
                .parse::<Conjunction>()
                .map_err(|_| ConfigError::UnknownConjunction {
                    rule: i,
                    name: rule.conjunction.clone(),
                })?;
            let rule = match &outputs {
                Outputs::Mamdani(outs) => {
                    Rule::resolve(i, rule.antecedent.as_slice(), rule.consequent.as_slice(), conjunction, &inputs, outs)
                },
                Outputs::Sugeno(outs) => {
                    Rule::resolve(i, rule.antecedent.as_slice(), rule.consequent.as_slice(), conjunction, &inputs, outs)
                },
            }?;

            rules.push(rule);
        }

        debug!(
            name = %system.name,
            method = method.name(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            rules = rules.len(),
            "Fuzzy model built"
        );

        Ok(Self {
            name: system.name.clone(),
            and_op,
            or_op,
            imp_op,
            agg_op,
            defuzz_op,
            inputs,
            outputs,
            rules,
        })
    }

    /// Parses a JSON model document and builds it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::build(&ModelConfig::from_json(json)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> Method {
        match self.outputs {
            Outputs::Mamdani(_) => Method::Mamdani,
            Outputs::Sugeno(_) => Method::Sugeno,
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Starts a session for one input vector.
    pub fn session(&self, inputs: &[f64]) -> Result<InferenceSession<'_>, InferenceError> {
        InferenceSession::bind(self, inputs)
    }

    /// Maps crisp inputs to crisp outputs. `ranges` holds one discretization
    /// per output and is ignored by Sugeno models.
    pub fn infer(&self, inputs: &[f64], ranges: &[Discretization]) -> Result<Vec<f64>, InferenceError> {
        self.session(inputs)?.resolve(ranges)
    }
}

fn check_count(what: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected != actual {
        return Err(ConfigError::Cardinality { what, expected, actual });
    }

    Ok(())
}

fn build_variable<T>(
    config: &VariableConfig,
    term: impl Fn(&MembershipConfig) -> Result<T, ConfigError>,
) -> Result<Variable<T>, ConfigError> {
    let [min, max] = config.range;
    let terms = config
        .mf
        .iter()
        .map(|mf| Ok(MembershipFunction::new(mf.label.clone(), term(mf)?)))
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Variable::new(config.name.clone(), min..=max, terms)
}

fn curve_variable(config: &VariableConfig) -> Result<Variable, ConfigError> {
    build_variable(config, |mf| {
        if let Some(shape) = Consequent::is_sugeno_only(&mf.shape) {
            return Err(ConfigError::ConsequentShape {
                variable: config.name.clone(),
                label: mf.label.clone(),
                shape,
            });
        }

        Shape::new(&mf.shape, &mf.params)
    })
}

/// The evaluation of one input vector against a [`Model`].
///
/// Binding the inputs computes memberships, firing strengths and caps;
/// [`resolve`](Self::resolve) consumes the session, so caps never leak into
/// the next input vector.
#[derive(Debug)]
pub struct InferenceSession<'m> {
    model: &'m Model,
    inputs: Vec<f64>,
    input_membership: Vec<Vec<f64>>,
    firing_strengths: Vec<f64>,
    caps: Vec<Vec<Option<f64>>>,
}

impl<'m> InferenceSession<'m> {
    pub fn bind(model: &'m Model, inputs: &[f64]) -> Result<Self, InferenceError> {
        if inputs.len() != model.num_inputs() {
            return Err(InferenceError::InputCount {
                expected: model.num_inputs(),
                actual: inputs.len(),
            });
        }
        if let Some((index, &value)) = inputs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(InferenceError::NonFiniteInput { index, value });
        }

        let inputs: Vec<f64> = inputs
            .iter()
            .zip(&model.inputs)
            .map(|(&value, var)| var.clamp(value))
            .collect();
        let input_membership: Vec<Vec<f64>> = inputs
            .iter()
            .zip(&model.inputs)
            .map(|(&value, var)| var.memberships(value))
            .collect();
        let firing_strengths: Vec<f64> = model
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let strength = rule.firing_strength(&input_membership, model.and_op, model.or_op);
                trace!(rule = i, strength, "Rule fired");
                strength
            })
            .collect();

        let mut caps: Vec<Vec<Option<f64>>> = model
            .outputs
            .term_counts()
            .into_iter()
            .map(|n| vec![None; n])
            .collect();

        for (rule, &strength) in model.rules.iter().zip(&firing_strengths) {
            for (output_caps, &term) in caps.iter_mut().zip(rule.consequent()) {
                let cap = &mut output_caps[term];

                *cap = Some(match (*cap, model.method()) {
                    (None, _) => strength,
                    (Some(prev), Method::Mamdani) => model.agg_op.call(prev, strength),
                    (Some(prev), Method::Sugeno) => prev + strength,
                });
            }
        }

        Ok(Self {
            model,
            inputs,
            input_membership,
            firing_strengths,
            caps,
        })
    }

    /// The inputs after clamping into their variables' ranges.
    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// `input_membership()[i][t]` is the degree of term `t` of input `i`.
    pub fn input_membership(&self) -> &[Vec<f64>] {
        &self.input_membership
    }

    pub fn firing_strengths(&self) -> &[f64] {
        &self.firing_strengths
    }

    /// `caps()[o][t]` is the accumulated cap of term `t` of output `o`, or
    /// `None` when no rule concludes that term. Sugeno caps are summed
    /// firing strengths.
    pub fn caps(&self) -> &[Vec<Option<f64>>] {
        &self.caps
    }

    /// The aggregated curve of every Mamdani output. Sugeno models have no
    /// curves and yield an empty list.
    pub fn aggregate(&self, ranges: &[Discretization]) -> Result<Vec<Curve>, InferenceError> {
        let Outputs::Mamdani(outputs) = &self.model.outputs else {
            return Ok(Vec::new());
        };

        if ranges.len() != outputs.len() {
            return Err(InferenceError::DiscretizationCount {
                expected: outputs.len(),
                actual: ranges.len(),
            });
        }
        check_uniform(ranges)?;

        outputs
            .iter()
            .zip(ranges)
            .zip(&self.caps)
            .map(|((var, range), caps)| {
                let curve = aggregate(range, var.terms(), caps, self.model.imp_op, self.model.agg_op)?;
                trace!(output = var.name(), samples = curve.len(), "Output aggregated");
                Ok(curve)
            })
            .collect()
    }

    /// Defuzzifies every output and ends the session.
    pub fn resolve(self, ranges: &[Discretization]) -> Result<Vec<f64>, InferenceError> {
        let defuzz_op = self.model.defuzz_op;
        let result = match &self.model.outputs {
            Outputs::Mamdani(_) => self
                .aggregate(ranges)?
                .iter()
                .map(|curve| defuzz_op.call(&curve.x, &curve.y))
                .collect::<Result<Vec<_>, _>>()?,
            Outputs::Sugeno(outputs) => outputs
                .iter()
                .zip(&self.caps)
                .map(|(var, caps)| {
                    let (values, weights): (Vec<f64>, Vec<f64>) = var
                        .terms()
                        .iter()
                        .zip(caps)
                        .filter_map(|(term, cap)| cap.map(|cap| (term.shape.value(&self.inputs), cap)))
                        .unzip();

                    defuzz_op.call(&values, &weights)
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        debug!(model = %self.model.name, outputs = ?result, "Fuzzy inference resolved");

        Ok(result)
    }
}

#[cfg(test)]
const CONTROLLER: &str = r#"{
    "system": {
        "name": "pid-tuner",
        "method": "mamdani",
        "numInputs": 2,
        "numOutputs": 1,
        "numRules": 5,
        "andMethod": "min",
        "orMethod": "max",
        "impMethod": "min",
        "aggMethod": "max",
        "defuzzMethod": "centroid"
    },
    "input": [
        {
            "name": "e",
            "range": [-30, 30],
            "mf": [
                { "label": "NB", "type": "zmf", "params": [-28, -19.85] },
                { "label": "NS", "type": "trimf", "params": [-17.84, -9.838, -1.841] },
                { "label": "ZO", "type": "trapmf", "params": [-8, -2, 2, 8] },
                { "label": "PS", "type": "trimf", "params": [1.84, 9.84, 17.8] },
                { "label": "PB", "type": "smf", "params": [19.85, 28] }
            ]
        },
        {
            "name": "ec",
            "range": [-1, 1],
            "mf": [
                { "label": "NB", "type": "zmf", "params": [-0.9167, -0.2499] },
                { "label": "NS", "type": "trimf", "params": [-0.5892, -0.3592, -0.1302] },
                { "label": "ZO", "type": "trimf", "params": [-0.23, 0, 0.23] },
                { "label": "PS", "type": "trimf", "params": [0.1302, 0.3592, 0.5892] },
                { "label": "PB", "type": "smf", "params": [0.25, 0.9167] }
            ]
        }
    ],
    "output": [
        {
            "name": "u",
            "range": [-20, 20],
            "mf": [
                { "label": "NB", "type": "trimf", "params": [-20, -13.33, -6.67] },
                { "label": "NS", "type": "trimf", "params": [-13.33, -6.67, 0] },
                { "label": "ZO", "type": "trimf", "params": [-6.67, 0, 6.67] },
                { "label": "PS", "type": "trimf", "params": [0, 6.67, 13.33] },
                { "label": "PB", "type": "trimf", "params": [6.67, 13.33, 20] }
            ]
        }
    ],
    "rules": [
        { "antecedent": ["ZO", "ZO"], "consequent": ["ZO"], "conjunction": "and" },
        { "antecedent": ["PS", "ZO"], "consequent": ["PS"], "conjunction": "and" },
        { "antecedent": ["ZO", "PS"], "consequent": ["PS"], "conjunction": "and" },
        { "antecedent": ["PS", "PS"], "consequent": ["PB"], "conjunction": "and" },
        { "antecedent": ["NS", "NS"], "consequent": ["NS"], "conjunction": "or" }
    ]
}"#;

#[cfg(test)]
fn controller(method: &str, defuzz: &str) -> ModelConfig {
    let mut config = ModelConfig::from_json(CONTROLLER).unwrap();
    config.system.method = method.to_owned();
    config.system.defuzz_method = defuzz.to_owned();
    config
}

#[test]
fn test_mamdani_controller() {
    let model = Model::build(&controller("mamdani", "centroid")).unwrap();
    let ranges = [Discretization::step(-20., 20., 0.01)];
    let session = model.session(&[2.3, 0.1]).unwrap();

    assert_eq!(session.firing_strengths(), &[0.5652173913043478, 0.05749999999999997, 0., 0., 0.]);
    assert_eq!(
        session.caps()[0],
        vec![None, Some(0.), Some(0.5652173913043478), Some(0.05749999999999997), Some(0.)]
    );

    let curves = session.aggregate(&ranges).unwrap();

    assert_eq!(curves[0].len(), 4001);
    assert_eq!(session.resolve(&ranges), Ok(vec![0.6485166175315225]));

    let first = model.infer(&[2.3, 0.1], &ranges).unwrap();
    let second = model.infer(&[2.3, 0.1], &ranges).unwrap();

    assert_eq!(first[0].to_bits(), second[0].to_bits());
}

#[test]
fn test_single_rule_controller() {
    let mut config = controller("mamdani", "centroid");
    config.system.num_rules = Some(1);
    config.rules = vec![crate::config::RuleConfig {
        antecedent: vec!["ZO".to_owned(), "ZO".to_owned()],
        consequent: vec!["PS".to_owned()],
        conjunction: "and".to_owned(),
    }];

    let model = Model::build(&config).unwrap();
    let ranges = [Discretization::step(-20., 20., 0.01)];
    let first = model.infer(&[2.3, 0.1], &ranges).unwrap();
    let second = model.infer(&[2.3, 0.1], &ranges).unwrap();

    assert_eq!(first, vec![6.666226502785354]);
    assert_eq!(first[0].to_bits(), second[0].to_bits());

    config.system.method = "sugeno".to_owned();
    config.system.defuzz_method = "wtaver".to_owned();

    // PS contributes its first parameter
    let model = Model::build(&config).unwrap();

    assert_eq!(model.infer(&[2.3, 0.1], &[]), Ok(vec![0.]));
}

#[test]
fn test_sugeno_controller() {
    let model = Model::build(&controller("sugeno", "wtaver")).unwrap();

    assert_eq!(model.method(), Method::Sugeno);
    assert_eq!(model.infer(&[2.3, 0.1], &[]), Ok(vec![-6.054110665037528]));
    assert!(model.session(&[2.3, 0.1]).unwrap().aggregate(&[]).unwrap().is_empty());

    let model = Model::build(&controller("sugeno", "wtsum")).unwrap();
    let expected = 0. + -13.33 * 0. + -6.67 * 0.5652173913043478 + 0. * 0.05749999999999997 + 6.67 * 0.;

    assert_eq!(model.infer(&[2.3, 0.1], &[]), Ok(vec![expected]));
}

#[test]
fn test_sugeno_consequents() {
    let model = Model::from_json(
        r#"{
            "system": {
                "method": "sugeno", "numInputs": 1, "numOutputs": 1,
                "andMethod": "prod", "orMethod": "probor", "defuzzMethod": "wtaver"
            },
            "input": [{ "name": "x", "range": [0, 10], "mf": [
                { "label": "low", "type": "trimf", "params": [0, 0, 10] },
                { "label": "high", "type": "trimf", "params": [0, 10, 10] }
            ]}],
            "output": [{ "name": "y", "range": [0, 100], "mf": [
                { "label": "flat", "type": "constant", "params": [10] },
                { "label": "ramp", "type": "linear", "params": [4, 20] }
            ]}],
            "rules": [
                { "antecedent": ["low"], "consequent": ["flat"], "conjunction": "and" },
                { "antecedent": ["high"], "consequent": ["ramp"], "conjunction": "and" }
            ]
        }"#,
    )
    .unwrap();

    // low = 0.75, high = 0.25; ramp = 4 * 2.5 + 20
    assert_eq!(model.infer(&[2.5], &[]), Ok(vec![15.]));
    // Clamped to 10: only the ramp fires, at 4 * 10 + 20
    assert_eq!(model.infer(&[25.], &[]), Ok(vec![60.]));
}

#[test]
fn test_duplicate_consequents_merge_with_aggregation() {
    // Rules 2 and 3 both conclude PS, with strengths 0.0575 and 0.5652
    let (weak, strong) = (0.05749999999999997, 0.5652173913043478);

    for (agg, expected) in [
        ("max", strong),
        ("sum", weak + strong),
        ("probor", weak + strong - weak * strong),
    ] {
        let mut config = controller("mamdani", "centroid");
        config.system.agg_method = agg.to_owned();
        config.rules[2].antecedent = vec!["ZO".to_owned(), "ZO".to_owned()];

        let model = Model::build(&config).unwrap();
        let session = model.session(&[2.3, 0.1]).unwrap();

        assert_eq!(session.firing_strengths()[1..3], [weak, strong]);
        assert_eq!(session.caps()[0][3], Some(expected), "{agg}");
    }

    let mut config = controller("sugeno", "wtaver");
    config.rules[2].antecedent = vec!["ZO".to_owned(), "ZO".to_owned()];

    let model = Model::build(&config).unwrap();

    assert_eq!(model.session(&[2.3, 0.1]).unwrap().caps()[0][3], Some(weak + strong));
}

#[test]
fn test_trapezoid_centroid() {
    let var = Variable::new(
        "x",
        -10. ..=10.,
        vec![MembershipFunction::new("mid", Shape::new("trapmf", &[-10., -2., 2., 10.]).unwrap())],
    )
    .unwrap();
    let range = Discretization::over(&var, crate::aggregate::Resolution::Step(0.1));
    let curve = aggregate(&range, var.terms(), &[Some(1.)], ImplicationOp::Min, AggregationOp::Max).unwrap();

    assert_eq!(curve.len(), 201);
    assert!(DefuzzificationOp::Centroid.call(&curve.x, &curve.y).unwrap().abs() < 1e-9);
}

#[test]
fn test_zero_activation() {
    let mut config = controller("mamdani", "centroid");
    config.rules.truncate(4);
    config.system.num_rules = Some(4);

    let ranges = [Discretization::step(-20., 20., 0.5)];
    // Far from every ZO and PS term
    let inputs = [-25., -0.9];
    let model = Model::build(&config).unwrap();

    assert_eq!(model.infer(&inputs, &ranges), Err(InferenceError::DegenerateArea));

    for (defuzz, expected) in [("som", -20.), ("lom", 20.), ("mom", 0.)] {
        config.system.defuzz_method = defuzz.to_owned();

        let model = Model::build(&config).unwrap();

        assert_eq!(model.infer(&inputs, &ranges), Ok(vec![expected]));
    }

    let average = Model::build(&controller("sugeno", "wtaver")).unwrap();
    let sum = Model::build(&controller("sugeno", "wtsum")).unwrap();

    assert_eq!(average.infer(&inputs, &[]), Err(InferenceError::DegenerateArea));
    assert_eq!(sum.infer(&inputs, &[]), Ok(vec![0.]));
}

#[test]
fn test_inference_errors() {
    let model = Model::build(&controller("mamdani", "centroid")).unwrap();
    let ranges = [Discretization::step(-20., 20., 0.01)];

    assert_eq!(
        model.infer(&[1.], &ranges),
        Err(InferenceError::InputCount { expected: 2, actual: 1 })
    );
    assert!(matches!(
        model.infer(&[1., f64::NAN], &ranges),
        Err(InferenceError::NonFiniteInput { index: 1, .. })
    ));
    assert_eq!(
        model.infer(&[1., 0.], &[]),
        Err(InferenceError::DiscretizationCount { expected: 1, actual: 0 })
    );
    assert_eq!(
        model.infer(&[1., 0.], &[Discretization::step(20., -20., 0.01)]),
        Err(InferenceError::InvalidRange { start: 20., end: -20. })
    );
}

#[test]
fn test_build_errors() {
    let mut config = controller("mamdani", "wtaver");
    assert!(matches!(
        Model::build(&config),
        Err(ConfigError::IncompatibleDefuzzification { defuzz: "wtaver", method: "mamdani" })
    ));

    config = controller("mamdani", "centroid");
    config.system.and_method = "max".to_owned();
    assert!(matches!(Model::build(&config), Err(ConfigError::UnknownOperator { kind: "and", .. })));

    config = controller("mamdani", "centroid");
    config.system.num_inputs = 3;
    assert!(matches!(
        Model::build(&config),
        Err(ConfigError::Cardinality { what: "input", expected: 3, actual: 2 })
    ));

    config = controller("mamdani", "centroid");
    config.system.num_rules = Some(6);
    assert!(matches!(Model::build(&config), Err(ConfigError::Cardinality { what: "rule", .. })));

    config = controller("mamdani", "centroid");
    config.rules[1].conjunction = "xor".to_owned();
    assert!(matches!(Model::build(&config), Err(ConfigError::UnknownConjunction { rule: 1, .. })));

    config = controller("mamdani", "centroid");
    config.rules[4].consequent = vec!["ZZ".to_owned()];
    assert!(matches!(Model::build(&config), Err(ConfigError::MissingLabel { rule: 4, .. })));

    config = controller("mamdani", "centroid");
    config.outputs[0].mf[0].shape = "constant".to_owned();
    config.outputs[0].mf[0].params = vec![1.];
    assert!(matches!(Model::build(&config), Err(ConfigError::ConsequentShape { .. })));

    config = controller("mamdani", "centroid");
    config.inputs[0].mf[1].params = vec![-1.841, -9.838, -17.84];
    assert!(matches!(
        Model::build(&config),
        Err(ConfigError::InvalidParameters { shape: "trimf", .. })
    ));

    config = controller("mamdani", "centroid");
    config.inputs[1].mf[0].shape = "spline".to_owned();
    assert!(matches!(Model::build(&config), Err(ConfigError::UnknownMembershipShape { .. })));
}
