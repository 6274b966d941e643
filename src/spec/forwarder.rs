//! Forwarder spec: the declarative input to the compiler.
//!
//! JSON/YAML shape:
//! {
//!   "inputs":    [ { "name": "myInput", "application": { "namespaces": ["ns1"] } } ],
//!   "outputs":   [ { "name": "es", "type": "elasticsearch", "url": "https://es:9200",
//!                    "secret": { "name": "es-secret" } } ],
//!   "pipelines": [ { "name": "apps", "inputRefs": ["myInput"], "outputRefs": ["es"] } ]
//! }
//!
//! Declaration order is significant: it drives render order and therefore the
//! exact bytes of the generated document.

use serde::{Deserialize, Serialize};

/// Reserved input name for container logs of user workloads.
pub const INPUT_NAME_APPLICATION: &str = "application";
/// Reserved input name for node journal and infra-namespace logs.
pub const INPUT_NAME_INFRASTRUCTURE: &str = "infrastructure";
/// Reserved input name for node and API-server audit logs.
pub const INPUT_NAME_AUDIT: &str = "audit";
/// Reserved output name for the externally provisioned default log store.
pub const OUTPUT_NAME_DEFAULT: &str = "default";

pub const RESERVED_INPUT_NAMES: [&str; 3] = [
    INPUT_NAME_APPLICATION,
    INPUT_NAME_INFRASTRUCTURE,
    INPUT_NAME_AUDIT,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwarderSpec {
    #[serde(default)]
    pub inputs: Vec<InputSpec>,

    #[serde(default)]
    pub outputs: Vec<OutputSpec>,

    #[serde(default)]
    pub pipelines: Vec<PipelineSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<Infrastructure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Audit>,
}

/// Application logs, optionally restricted to a set of namespaces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    /// Empty means every namespace.
    #[serde(default)]
    pub namespaces: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Infrastructure {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Audit {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,

    /// Kept as a raw string so an unknown kind is a validation error, not a
    /// parse error.
    #[serde(rename = "type")]
    pub output_type: String,

    #[serde(default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<OutputSecretSpec>,
}

/// Name of an externally provisioned secret holding TLS material.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSecretSpec {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Optional; unnamed pipelines get `pipeline_<index>_`.
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "inputRefs", alias = "inputrefs", alias = "input_refs")]
    pub input_refs: Vec<String>,

    #[serde(default, rename = "outputRefs", alias = "outputrefs", alias = "output_refs")]
    pub output_refs: Vec<String>,
}

/// Delivery kinds the output renderer knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Elasticsearch,
    Forward,
}

impl OutputType {
    /// Parse an output's `type` field. Returns None for unsupported kinds.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "elasticsearch" => Some(OutputType::Elasticsearch),
            "fluentdForward" | "forward" => Some(OutputType::Forward),
            _ => None,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            OutputType::Elasticsearch => 9200,
            OutputType::Forward => 24224,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_with_lowercase_refs() {
        let yaml = r#"
pipelines:
  - name: test-app
    inputrefs:
      - inputest
    outputrefs:
      - default
inputs:
  - name: inputest
    application:
      namespaces:
        - project1
        - project2
"#;
        let spec: ForwarderSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.pipelines[0].input_refs, vec!["inputest"]);
        assert_eq!(spec.pipelines[0].output_refs, vec!["default"]);
        let app = spec.inputs[0].application.as_ref().unwrap();
        assert_eq!(app.namespaces, vec!["project1", "project2"]);
        assert!(spec.outputs.is_empty());
    }

    #[test]
    fn parses_json_with_camel_case_refs() {
        let json = r#"{
            "outputs": [{"name": "es", "type": "elasticsearch", "url": "https://es:9200",
                         "secret": {"name": "s"}}],
            "pipelines": [{"name": "p", "inputRefs": ["audit"], "outputRefs": ["es"]}]
        }"#;
        let spec: ForwarderSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.outputs[0].output_type, "elasticsearch");
        assert_eq!(spec.outputs[0].secret.as_ref().unwrap().name, "s");
        assert_eq!(spec.pipelines[0].input_refs, vec!["audit"]);
    }

    #[test]
    fn output_type_parse() {
        assert_eq!(
            OutputType::parse("elasticsearch"),
            Some(OutputType::Elasticsearch)
        );
        assert_eq!(OutputType::parse("fluentdForward"), Some(OutputType::Forward));
        assert_eq!(OutputType::parse("forward"), Some(OutputType::Forward));
        assert_eq!(OutputType::parse("kafka"), None);
    }
}
