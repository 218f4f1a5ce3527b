//! The model description document, as produced by a configuration loader.
//!
//! Operator and shape names stay plain strings here; they are resolved, and
//! rejected when unknown, by [`Model::build`](crate::Model::build).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    pub system: SystemConfig,
    #[serde(rename = "input")]
    pub inputs: Vec<VariableConfig>,
    #[serde(rename = "output")]
    pub outputs: Vec<VariableConfig>,
    pub rules: Vec<RuleConfig>,
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    #[serde(default)]
    pub name: String,
    pub method: String,
    pub num_inputs: usize,
    pub num_outputs: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_rules: Option<usize>,
    pub and_method: String,
    pub or_method: String,
    #[serde(default = "default_imp_method")]
    pub imp_method: String,
    #[serde(default = "default_agg_method")]
    pub agg_method: String,
    pub defuzz_method: String,
}

fn default_imp_method() -> String {
    "min".to_owned()
}

fn default_agg_method() -> String {
    "max".to_owned()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VariableConfig {
    pub name: String,
    pub range: [f64; 2],
    pub mf: Vec<MembershipConfig>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MembershipConfig {
    pub label: String,
    #[serde(rename = "type")]
    pub shape: String,
    pub params: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RuleConfig {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub conjunction: String,
}

#[test]
fn test_parse_document() {
    let config = ModelConfig::from_json(
        r#"{
            "system": {
                "name": "tipper",
                "method": "mamdani",
                "numInputs": 1,
                "numOutputs": 1,
                "andMethod": "min",
                "orMethod": "max",
                "defuzzMethod": "centroid"
            },
            "input": [
                { "name": "service", "range": [0, 10],
                  "mf": [{ "label": "good", "type": "gaussmf", "params": [5, 1.5] }] }
            ],
            "output": [
                { "name": "tip", "range": [0, 30],
                  "mf": [{ "label": "average", "type": "trimf", "params": [10, 15, 20] }] }
            ],
            "rules": [
                { "antecedent": ["good"], "consequent": ["average"], "conjunction": "and" }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(config.system.name, "tipper");
    assert_eq!(config.system.num_rules, None);
    assert_eq!(config.system.imp_method, "min");
    assert_eq!(config.system.agg_method, "max");
    assert_eq!(config.inputs[0].range, [0., 10.]);
    assert_eq!(config.inputs[0].mf[0].shape, "gaussmf");
    assert_eq!(config.outputs[0].mf[0].params, vec![10., 15., 20.]);
    assert_eq!(config.rules[0].conjunction, "and");

    let round_trip = ModelConfig::from_json(&serde_json::to_string(&config).unwrap()).unwrap();

    assert_eq!(round_trip, config);
}

#[test]
fn test_malformed_document() {
    assert!(matches!(
        ModelConfig::from_json(r#"{ "system": {} }"#),
        Err(ConfigError::Json(_))
    ));
}
