use std::collections::HashMap;
use std::ops::RangeInclusive;

use crate::error::ConfigError;
use crate::membership::{MembershipFunction, Shape};

/// A named domain with an ordered set of labeled terms.
///
/// Labels are resolved once to positions in `terms`; everything computed per
/// label during inference lives in vectors indexed by that position.
#[derive(Clone, Debug)]
pub struct Variable<T = Shape> {
    name: String,
    min: f64,
    max: f64,
    terms: Vec<MembershipFunction<T>>,
    index: HashMap<String, usize>,
}

impl<T> Variable<T> {
    pub fn new(
        name: impl Into<String>,
        universe_range: RangeInclusive<f64>,
        terms: Vec<MembershipFunction<T>>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let min = *universe_range.start();
        let max = *universe_range.end();

        if !(min.is_finite() && max.is_finite() && min <= max) {
            return Err(ConfigError::InvalidDomain { variable: name, min, max });
        }
        if terms.is_empty() {
            return Err(ConfigError::EmptyVariable { variable: name });
        }

        let mut index = HashMap::with_capacity(terms.len());

        for (i, term) in terms.iter().enumerate() {
            if index.insert(term.label.clone(), i).is_some() {
                return Err(ConfigError::DuplicateLabel {
                    variable: name,
                    label: term.label.clone(),
                });
            }
        }

        Ok(Self {
            name,
            min,
            max,
            terms,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> RangeInclusive<f64> {
        self.min..=self.max
    }

    pub fn terms(&self) -> &[MembershipFunction<T>] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Position of `label` among this variable's terms.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Keeps `value` inside the variable's range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Variable<Shape> {
    /// Degree of every term at `value`, in term order. `value` is expected
    /// to be clamped already.
    pub fn memberships(&self, value: f64) -> Vec<f64> {
        self.terms.iter().map(|term| term.eval(value)).collect()
    }
}

#[cfg(test)]
fn error_sample() -> Vec<MembershipFunction> {
    vec![
        MembershipFunction::new("NB", Shape::new("zmf", &[-28., -19.85]).unwrap()),
        MembershipFunction::new("ZO", Shape::new("trapmf", &[-8., -2., 2., 8.]).unwrap()),
        MembershipFunction::new("PB", Shape::new("smf", &[19.85, 28.]).unwrap()),
    ]
}

#[test]
fn test_variable_lookup() {
    let var = Variable::new("e", -30. ..=30., error_sample()).unwrap();

    assert_eq!(var.name(), "e");
    assert_eq!(var.len(), 3);
    assert_eq!(var.label_index("ZO"), Some(1));
    assert_eq!(var.label_index("PS"), None);
    assert_eq!(var.clamp(42.), 30.);
    assert_eq!(var.clamp(-31.), -30.);
    assert_eq!(var.memberships(var.clamp(0.)), vec![0., 1., 0.]);
}

#[test]
fn test_variable_validation() {
    let mut terms = error_sample();
    terms.push(MembershipFunction::new("ZO", Shape::new("trimf", &[0., 1., 2.]).unwrap()));

    assert!(matches!(
        Variable::new("e", -30. ..=30., terms),
        Err(ConfigError::DuplicateLabel { label, .. }) if label == "ZO"
    ));
    assert!(matches!(
        Variable::new("e", 1. ..=0., error_sample()),
        Err(ConfigError::InvalidDomain { .. })
    ));
    assert!(matches!(
        Variable::<Shape>::new("e", 0. ..=1., Vec::new()),
        Err(ConfigError::EmptyVariable { .. })
    ));
}
