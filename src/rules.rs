use crate::error::ConfigError;
use crate::ops::{AndOp, Conjunction, OrOp};
use crate::variable::Variable;

/// An IF-THEN rule with its labels resolved to term positions.
///
/// `antecedent[i]` indexes the terms of input `i`, `consequent[o]` those of
/// output `o`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub(crate) antecedent: Vec<usize>,
    pub(crate) consequent: Vec<usize>,
    pub(crate) conjunction: Conjunction,
}

impl Rule {
    /// Resolves the labels of rule number `rule` against the model variables.
    pub fn resolve<S: AsRef<str>, T>(
        rule: usize,
        antecedent: &[S],
        consequent: &[S],
        conjunction: Conjunction,
        inputs: &[Variable],
        outputs: &[Variable<T>],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            antecedent: resolve_side(rule, "antecedent", antecedent, inputs)?,
            consequent: resolve_side(rule, "consequent", consequent, outputs)?,
            conjunction,
        })
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn antecedent(&self) -> &[usize] {
        &self.antecedent
    }

    pub fn consequent(&self) -> &[usize] {
        &self.consequent
    }

    /// Folds the antecedent degrees, starting from the identity of the
    /// rule's conjunction. `memberships[i][t]` is the degree of term `t` of
    /// input `i`.
    pub fn firing_strength(&self, memberships: &[Vec<f64>], and_op: AndOp, or_op: OrOp) -> f64 {
        let degrees = self
            .antecedent
            .iter()
            .zip(memberships)
            .map(|(&term, degrees)| degrees[term]);

        match self.conjunction {
            Conjunction::And => degrees.fold(and_op.identity(), |acc, d| and_op.call(acc, d)),
            Conjunction::Or => degrees.fold(or_op.identity(), |acc, d| or_op.call(acc, d)),
        }
    }
}

fn resolve_side<S: AsRef<str>, T>(
    rule: usize,
    side: &'static str,
    labels: &[S],
    vars: &[Variable<T>],
) -> Result<Vec<usize>, ConfigError> {
    if labels.len() != vars.len() {
        return Err(ConfigError::RuleArity {
            rule,
            side,
            expected: vars.len(),
            actual: labels.len(),
        });
    }

    labels
        .iter()
        .zip(vars)
        .map(|(label, var)| {
            let label = label.as_ref();

            var.label_index(label).ok_or_else(|| ConfigError::MissingLabel {
                rule,
                variable: var.name().to_owned(),
                label: label.to_owned(),
            })
        })
        .collect()
}

#[cfg(test)]
fn two_inputs() -> Vec<Variable> {
    use crate::membership::{MembershipFunction, Shape};

    let terms = || {
        vec![
            MembershipFunction::new("low", Shape::new("trimf", &[0., 0., 1.]).unwrap()),
            MembershipFunction::new("high", Shape::new("trimf", &[0., 1., 1.]).unwrap()),
        ]
    };

    vec![
        Variable::new("a", 0. ..=1., terms()).unwrap(),
        Variable::new("b", 0. ..=1., terms()).unwrap(),
    ]
}

#[test]
fn test_firing_strength() {
    let inputs = two_inputs();
    let memberships = vec![inputs[0].memberships(0.25), inputs[1].memberships(0.5)];
    let and_rule = Rule::resolve(0, &["low", "high"], &["low"], Conjunction::And, &inputs, &inputs[..1]).unwrap();
    let or_rule = Rule::resolve(1, &["low", "high"], &["low"], Conjunction::Or, &inputs, &inputs[..1]).unwrap();

    assert_eq!(and_rule.antecedent(), &[0, 1]);
    assert_eq!(and_rule.firing_strength(&memberships, AndOp::Min, OrOp::Max), 0.5);
    assert_eq!(and_rule.firing_strength(&memberships, AndOp::Prod, OrOp::Max), 0.375);
    assert_eq!(or_rule.firing_strength(&memberships, AndOp::Min, OrOp::Max), 0.75);
    assert_eq!(or_rule.firing_strength(&memberships, AndOp::Min, OrOp::Sum), 1.25);
    assert_eq!(or_rule.firing_strength(&memberships, AndOp::Min, OrOp::ProbOr), 0.875);
}

#[test]
fn test_resolve_errors() {
    let inputs = two_inputs();

    assert!(matches!(
        Rule::resolve(3, &["low"], &["low"], Conjunction::And, &inputs, &inputs[..1]),
        Err(ConfigError::RuleArity { rule: 3, side: "antecedent", expected: 2, actual: 1 })
    ));
    assert!(matches!(
        Rule::resolve(4, &["low", "medium"], &["low"], Conjunction::And, &inputs, &inputs[..1]),
        Err(ConfigError::MissingLabel { rule: 4, ref label, .. }) if label == "medium"
    ));
}
