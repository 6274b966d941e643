//! Spec validation: raw ForwarderSpec -> ValidatedForwarder.
//!
//! We keep two representations:
//! - ForwarderSpec: raw serde input, exactly as the user wrote it
//! - ValidatedForwarder: names defaulted and checked, refs known to resolve,
//!   output kinds and endpoints parsed

use crate::error::{GenerateError, Result};
use crate::spec::endpoint::Endpoint;
use crate::spec::forwarder::{
    ForwarderSpec, InputSpec, OUTPUT_NAME_DEFAULT, OutputType, RESERVED_INPUT_NAMES,
};
use crate::spec::names;
use std::collections::{BTreeMap, BTreeSet};

/// Labels the generated document always owns; user names must not map onto them.
pub const BUILT_IN_LABELS: [&str; 7] = [
    "CONCAT",
    "INGRESS",
    "_APPLICATION",
    "_INFRASTRUCTURE",
    "_AUDIT",
    "_LEGACY_SECUREFORWARD",
    "_LEGACY_SYSLOG",
];

#[derive(Debug, Clone)]
pub struct ValidatedForwarder {
    /// Declared inputs keyed by name.
    pub inputs: BTreeMap<String, InputSpec>,
    /// Declared outputs in declaration order.
    pub outputs: Vec<ValidatedOutput>,
    /// Pipelines in declaration order.
    pub pipelines: Vec<ValidatedPipeline>,
}

#[derive(Debug, Clone)]
pub struct ValidatedOutput {
    pub name: String,
    pub output_type: OutputType,
    pub endpoint: Endpoint,
    /// Secret name; TLS material lives under its mount directory.
    pub secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidatedPipeline {
    pub name: String,
    /// Deduplicated, first-occurrence order.
    pub input_refs: Vec<String>,
    /// Deduplicated, first-occurrence order.
    pub output_refs: Vec<String>,
}

impl ValidatedForwarder {
    pub fn output(&self, name: &str) -> Option<&ValidatedOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

impl ForwarderSpec {
    /// Validate a ForwarderSpec and build a ValidatedForwarder:
    /// - non-empty, unique names per kind (unnamed pipelines are defaulted)
    /// - inputs don't shadow reserved source-type names, declare one kind
    /// - outputs have a supported type and a parseable URL
    /// - every pipeline ref resolves
    /// - no two names collapse to the same label
    pub fn validate_and_build(&self) -> Result<ValidatedForwarder> {
        // 1) Inputs.
        let mut inputs = BTreeMap::<String, InputSpec>::new();
        for (index, input) in self.inputs.iter().enumerate() {
            if input.name.is_empty() {
                return Err(GenerateError::EmptyName { kind: "input", index });
            }
            if RESERVED_INPUT_NAMES.contains(&input.name.as_str()) {
                return Err(GenerateError::ReservedInputName(input.name.clone()));
            }
            let kinds = [
                input.application.is_some(),
                input.infrastructure.is_some(),
                input.audit.is_some(),
            ];
            let bad_namespace = input
                .application
                .iter()
                .flat_map(|a| &a.namespaces)
                .find(|ns| !names::is_dns1123_label(ns));
            if let Some(bad) = bad_namespace {
                return Err(GenerateError::InvalidInput {
                    input: input.name.clone(),
                    reason: format!("namespace {:?} is not a valid DNS-1123 label", bad),
                });
            }
            if kinds.iter().filter(|k| **k).count() > 1 {
                return Err(GenerateError::InvalidInput {
                    input: input.name.clone(),
                    reason: "declares more than one of application, infrastructure, audit"
                        .to_string(),
                });
            }
            if inputs.insert(input.name.clone(), input.clone()).is_some() {
                return Err(GenerateError::DuplicateName {
                    kind: "input",
                    name: input.name.clone(),
                });
            }
        }

        // 2) Outputs.
        let mut outputs = Vec::<ValidatedOutput>::new();
        let mut output_names = BTreeSet::<&str>::new();
        for (index, output) in self.outputs.iter().enumerate() {
            if output.name.is_empty() {
                return Err(GenerateError::EmptyName { kind: "output", index });
            }
            if !output_names.insert(output.name.as_str()) {
                return Err(GenerateError::DuplicateName {
                    kind: "output",
                    name: output.name.clone(),
                });
            }
            let output_type = OutputType::parse(&output.output_type).ok_or_else(|| {
                GenerateError::UnsupportedOutputType {
                    output: output.name.clone(),
                    output_type: output.output_type.clone(),
                }
            })?;
            let endpoint = Endpoint::parse(&output.name, &output.url, output_type.default_port())?;
            if output_type == OutputType::Elasticsearch
                && !matches!(endpoint.scheme.as_str(), "http" | "https")
            {
                return Err(GenerateError::InvalidUrl {
                    output: output.name.clone(),
                    url: output.url.clone(),
                    reason: "elasticsearch requires an http or https url".to_string(),
                });
            }
            let secret = output
                .secret
                .as_ref()
                .map(|s| s.name.clone())
                .filter(|s| !s.is_empty());
            if let Some(secret) = &secret {
                if !names::is_dns1123_label(secret) {
                    return Err(GenerateError::InvalidSecret {
                        output: output.name.clone(),
                        secret: secret.clone(),
                    });
                }
            }
            outputs.push(ValidatedOutput {
                name: output.name.clone(),
                output_type,
                endpoint,
                secret,
            });
        }

        // 3) Pipelines.
        let mut pipelines = Vec::<ValidatedPipeline>::new();
        let mut pipeline_names = BTreeSet::<String>::new();
        for (index, pipeline) in self.pipelines.iter().enumerate() {
            let name = if pipeline.name.is_empty() {
                format!("pipeline_{}_", index)
            } else {
                pipeline.name.clone()
            };
            if !pipeline_names.insert(name.clone()) {
                return Err(GenerateError::DuplicateName {
                    kind: "pipeline",
                    name,
                });
            }
            if pipeline.input_refs.is_empty() {
                return Err(GenerateError::EmptyPipeline {
                    pipeline: name,
                    what: "inputRefs",
                });
            }
            if pipeline.output_refs.is_empty() {
                return Err(GenerateError::EmptyPipeline {
                    pipeline: name,
                    what: "outputRefs",
                });
            }

            let mut input_refs = Vec::new();
            for input in &pipeline.input_refs {
                let known = RESERVED_INPUT_NAMES.contains(&input.as_str())
                    || inputs.contains_key(input);
                if !known {
                    return Err(GenerateError::UnknownInput {
                        pipeline: name,
                        input: input.clone(),
                    });
                }
                if !input_refs.contains(input) {
                    input_refs.push(input.clone());
                }
            }

            let mut output_refs = Vec::new();
            for output in &pipeline.output_refs {
                let known =
                    output == OUTPUT_NAME_DEFAULT || output_names.contains(output.as_str());
                if !known {
                    return Err(GenerateError::UnknownOutput {
                        pipeline: name,
                        output: output.clone(),
                    });
                }
                if !output_refs.contains(output) {
                    output_refs.push(output.clone());
                }
            }

            pipelines.push(ValidatedPipeline {
                name,
                input_refs,
                output_refs,
            });
        }

        // 4) Label uniqueness across everything that becomes a label.
        let default_referenced = !output_names.contains(OUTPUT_NAME_DEFAULT)
            && pipelines
                .iter()
                .any(|p| p.output_refs.iter().any(|o| o == OUTPUT_NAME_DEFAULT));
        let entries = BUILT_IN_LABELS
            .iter()
            .map(|l| ("built-in label", *l))
            .chain(
                default_referenced
                    .then_some(("output", OUTPUT_NAME_DEFAULT))
                    .into_iter(),
            )
            .chain(outputs.iter().map(|o| ("output", o.name.as_str())))
            .chain(pipelines.iter().map(|p| ("pipeline", p.name.as_str())));
        names::check_distinct_labels(entries)?;

        // 5) Plugin ids and buffer directories derived from output names.
        names::check_distinct_store_ids(
            outputs
                .iter()
                .map(|o| (o.name.as_str(), o.output_type == OutputType::Elasticsearch)),
        )?;

        Ok(ValidatedForwarder {
            inputs,
            outputs,
            pipelines,
        })
    }
}
