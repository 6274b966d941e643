//! Routing graph: source type -> pipeline -> output label fan-out.
//!
//! The graph is acyclic by construction: pipelines only reference inputs
//! and outputs, never other pipelines, so edges only ever flow
//! source type -> pipeline -> output.

use crate::model::sources::{SourceSet, SourceType, pipeline_source_types};
use crate::spec::ValidatedForwarder;
use crate::spec::forwarder::OUTPUT_NAME_DEFAULT;
use crate::spec::names::label_name;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A label that copies its stream once per target label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOut {
    /// Label name without the leading `@`.
    pub label: String,
    /// Target labels, without `@`, in render order.
    pub targets: Vec<String>,
}

/// A delivery label for one output, plus the pipelines converging on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNode {
    pub name: String,
    pub label: String,
    /// Names of the pipelines that route here, in declaration order.
    pub pipelines: Vec<String>,
    /// True when the delivery block is provisioned outside this document.
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingGraph {
    /// One per active source type, in SourceType order.
    pub sources: Vec<(SourceType, FanOut)>,
    /// One per pipeline, in declaration order.
    pub pipelines: Vec<FanOut>,
    /// One per referenced output: declared outputs in declaration order,
    /// then the external default output if referenced.
    pub outputs: Vec<OutputNode>,
}

impl RoutingGraph {
    /// Outputs whose delivery block this document renders.
    pub fn delivered_outputs(&self) -> impl Iterator<Item = &OutputNode> {
        self.outputs.iter().filter(|o| !o.external)
    }
}

pub fn build_routing_graph(forwarder: &ValidatedForwarder, sources: &SourceSet) -> RoutingGraph {
    // 1) Source type -> pipelines drawing from it.
    let mut by_type: BTreeMap<SourceType, Vec<String>> = BTreeMap::new();
    for pipeline in &forwarder.pipelines {
        for source_type in pipeline_source_types(forwarder, &pipeline.input_refs) {
            by_type
                .entry(source_type)
                .or_default()
                .push(label_name(&pipeline.name));
        }
    }
    let source_labels: Vec<(SourceType, FanOut)> = sources
        .types
        .iter()
        .map(|t| {
            (
                *t,
                FanOut {
                    label: t.label().to_string(),
                    targets: by_type.remove(t).unwrap_or_default(),
                },
            )
        })
        .collect();

    // 2) Pipeline -> outputs, in OutputRefs order.
    let pipeline_labels: Vec<FanOut> = forwarder
        .pipelines
        .iter()
        .map(|p| FanOut {
            label: label_name(&p.name),
            targets: p.output_refs.iter().map(|o| label_name(o)).collect(),
        })
        .collect();

    // 3) Output <- pipelines. Each output appears once however many
    // pipelines converge on it.
    let mut feeders: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for pipeline in &forwarder.pipelines {
        for output in &pipeline.output_refs {
            feeders
                .entry(output.as_str())
                .or_default()
                .push(pipeline.name.clone());
        }
    }

    let mut outputs = Vec::new();
    for output in &forwarder.outputs {
        match feeders.remove(output.name.as_str()) {
            Some(pipelines) => outputs.push(OutputNode {
                name: output.name.clone(),
                label: label_name(&output.name),
                pipelines,
                external: false,
            }),
            None => warn!(output = %output.name, "output is not referenced by any pipeline"),
        }
    }
    if let Some(pipelines) = feeders.remove(OUTPUT_NAME_DEFAULT) {
        debug!(
            pipelines = pipelines.len(),
            "default output is provisioned externally"
        );
        outputs.push(OutputNode {
            name: OUTPUT_NAME_DEFAULT.to_string(),
            label: label_name(OUTPUT_NAME_DEFAULT),
            pipelines,
            external: true,
        });
    }

    debug!(
        sources = source_labels.len(),
        pipelines = pipeline_labels.len(),
        outputs = outputs.len(),
        "built routing graph"
    );

    RoutingGraph {
        sources: source_labels,
        pipelines: pipeline_labels,
        outputs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sources::gather_sources;
    use crate::spec::{ForwarderSpec, OutputSpec, PipelineSpec};

    fn es(name: &str) -> OutputSpec {
        OutputSpec {
            name: name.to_string(),
            output_type: "elasticsearch".to_string(),
            url: "https://es.svc:9200".to_string(),
            secret: None,
        }
    }

    fn pipeline(name: &str, inputs: &[&str], outputs: &[&str]) -> PipelineSpec {
        PipelineSpec {
            name: name.to_string(),
            input_refs: inputs.iter().map(|s| s.to_string()).collect(),
            output_refs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn build(spec: ForwarderSpec) -> RoutingGraph {
        let forwarder = spec.validate_and_build().unwrap();
        let sources = gather_sources(&forwarder);
        build_routing_graph(&forwarder, &sources)
    }

    #[test]
    fn fans_out_in_declared_order() {
        let graph = build(ForwarderSpec {
            inputs: vec![],
            outputs: vec![es("infra-es"), es("apps-es-1"), es("apps-es-2")],
            pipelines: vec![
                pipeline("infra-pipeline", &["infrastructure"], &["infra-es"]),
                pipeline("apps-pipeline", &["application"], &["apps-es-2", "apps-es-1"]),
            ],
        });

        let types: Vec<SourceType> = graph.sources.iter().map(|(t, _)| *t).collect();
        assert_eq!(types, vec![SourceType::Application, SourceType::Infrastructure]);
        assert_eq!(graph.sources[0].1.targets, vec!["APPS_PIPELINE"]);
        assert_eq!(graph.sources[1].1.targets, vec!["INFRA_PIPELINE"]);

        assert_eq!(graph.pipelines[1].label, "APPS_PIPELINE");
        assert_eq!(graph.pipelines[1].targets, vec!["APPS_ES_2", "APPS_ES_1"]);

        // Outputs render in declaration order, not reference order.
        let labels: Vec<&str> = graph.outputs.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["INFRA_ES", "APPS_ES_1", "APPS_ES_2"]);
    }

    #[test]
    fn shared_output_is_emitted_once() {
        let graph = build(ForwarderSpec {
            inputs: vec![],
            outputs: vec![es("shared")],
            pipelines: vec![
                pipeline("a", &["application"], &["shared"]),
                pipeline("b", &["audit"], &["shared"]),
            ],
        });
        assert_eq!(graph.outputs.len(), 1);
        assert_eq!(graph.outputs[0].pipelines, vec!["a", "b"]);
        assert_eq!(graph.pipelines[0].targets, vec!["SHARED"]);
        assert_eq!(graph.pipelines[1].targets, vec!["SHARED"]);
    }

    #[test]
    fn multi_type_pipeline_is_fed_by_each_type() {
        let graph = build(ForwarderSpec {
            inputs: vec![],
            outputs: vec![],
            pipelines: vec![
                pipeline("all", &["application", "audit"], &["default"]),
                pipeline("apps", &["application"], &["default"]),
            ],
        });
        assert_eq!(graph.sources[0].0, SourceType::Application);
        assert_eq!(graph.sources[0].1.targets, vec!["ALL", "APPS"]);
        assert_eq!(graph.sources[1].0, SourceType::Audit);
        assert_eq!(graph.sources[1].1.targets, vec!["ALL"]);
    }

    #[test]
    fn unreferenced_outputs_are_dropped_and_default_is_external() {
        let graph = build(ForwarderSpec {
            inputs: vec![],
            outputs: vec![es("unused")],
            pipelines: vec![pipeline("p", &["audit"], &["default"])],
        });
        assert_eq!(graph.outputs.len(), 1);
        assert_eq!(graph.outputs[0].label, "DEFAULT");
        assert!(graph.outputs[0].external);
        assert_eq!(graph.delivered_outputs().count(), 0);
    }
}
