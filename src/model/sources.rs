//! Source collection: which source types the pipelines actually consume.

use crate::spec::ValidatedForwarder;
use crate::spec::forwarder::{
    INPUT_NAME_APPLICATION, INPUT_NAME_AUDIT, INPUT_NAME_INFRASTRUCTURE, InputSpec,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Where a log record originates. Ordering is alphabetical, which is also
/// the render order of the per-type intermediary labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Application,
    Audit,
    Infrastructure,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Application => INPUT_NAME_APPLICATION,
            SourceType::Audit => INPUT_NAME_AUDIT,
            SourceType::Infrastructure => INPUT_NAME_INFRASTRUCTURE,
        }
    }

    /// Intermediary label, without the leading `@`.
    pub fn label(self) -> &'static str {
        match self {
            SourceType::Application => "_APPLICATION",
            SourceType::Audit => "_AUDIT",
            SourceType::Infrastructure => "_INFRASTRUCTURE",
        }
    }

    fn from_reserved(name: &str) -> Option<Self> {
        match name {
            INPUT_NAME_APPLICATION => Some(SourceType::Application),
            INPUT_NAME_AUDIT => Some(SourceType::Audit),
            INPUT_NAME_INFRASTRUCTURE => Some(SourceType::Infrastructure),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input ref resolved to its source type. `namespaces` is only
/// meaningful for application inputs; empty means unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInput {
    pub source_type: SourceType,
    pub namespaces: BTreeSet<String>,
}

/// Result of the source-type discovery query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSet {
    pub types: BTreeSet<SourceType>,
    /// Application namespace restriction; empty means all namespaces.
    pub namespaces: BTreeSet<String>,
}

impl SourceSet {
    pub fn contains(&self, source_type: SourceType) -> bool {
        self.types.contains(&source_type)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

fn classify_input(input: &InputSpec) -> ResolvedInput {
    if input.infrastructure.is_some() {
        return ResolvedInput {
            source_type: SourceType::Infrastructure,
            namespaces: BTreeSet::new(),
        };
    }
    if input.audit.is_some() {
        return ResolvedInput {
            source_type: SourceType::Audit,
            namespaces: BTreeSet::new(),
        };
    }
    // Application sub-spec, or no sub-spec at all.
    let namespaces = input
        .application
        .as_ref()
        .map(|a| a.namespaces.iter().cloned().collect())
        .unwrap_or_default();
    ResolvedInput {
        source_type: SourceType::Application,
        namespaces,
    }
}

/// Resolve one pipeline input ref. Refs are known to exist after
/// validation; an unknown ref yields None.
pub fn resolve_input_ref(forwarder: &ValidatedForwarder, name: &str) -> Option<ResolvedInput> {
    if let Some(source_type) = SourceType::from_reserved(name) {
        return Some(ResolvedInput {
            source_type,
            namespaces: BTreeSet::new(),
        });
    }
    forwarder.inputs.get(name).map(classify_input)
}

/// Source types a single pipeline draws from, sorted.
pub fn pipeline_source_types(
    forwarder: &ValidatedForwarder,
    input_refs: &[String],
) -> BTreeSet<SourceType> {
    input_refs
        .iter()
        .filter_map(|r| resolve_input_ref(forwarder, r))
        .map(|r| r.source_type)
        .collect()
}

/// Walk every pipeline's input refs and collect the active source types and
/// the application namespace restriction.
///
/// Namespaces are the union over all namespace-restricted application
/// inputs, unless some application ref is unrestricted: then every
/// namespace must be tailed and the restriction is dropped.
pub fn gather_sources(forwarder: &ValidatedForwarder) -> SourceSet {
    let mut types = BTreeSet::new();
    let mut namespaces = BTreeSet::new();
    let mut unrestricted_app = false;

    for pipeline in &forwarder.pipelines {
        for input in &pipeline.input_refs {
            let Some(resolved) = resolve_input_ref(forwarder, input) else {
                continue;
            };
            if resolved.source_type == SourceType::Application {
                if resolved.namespaces.is_empty() {
                    unrestricted_app = true;
                } else {
                    namespaces.extend(resolved.namespaces);
                }
            }
            types.insert(resolved.source_type);
        }
    }

    if unrestricted_app {
        namespaces.clear();
    }
    SourceSet { types, namespaces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Application, Audit, ForwarderSpec, Infrastructure, PipelineSpec};

    fn pipeline(inputs: &[&str]) -> PipelineSpec {
        PipelineSpec {
            name: String::new(),
            input_refs: inputs.iter().map(|s| s.to_string()).collect(),
            output_refs: vec!["default".to_string()],
        }
    }

    fn app_input(name: &str, namespaces: &[&str]) -> InputSpec {
        InputSpec {
            name: name.to_string(),
            application: Some(Application {
                namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
            }),
            ..Default::default()
        }
    }

    fn gather(spec: ForwarderSpec) -> SourceSet {
        gather_sources(&spec.validate_and_build().unwrap())
    }

    #[test]
    fn reserved_names_and_declared_inputs() {
        let set = gather(ForwarderSpec {
            inputs: vec![app_input("in", &[])],
            outputs: vec![],
            pipelines: vec![pipeline(&["in"]), pipeline(&["audit"])],
        });
        assert_eq!(
            set.types.into_iter().collect::<Vec<_>>(),
            vec![SourceType::Application, SourceType::Audit]
        );
        assert!(set.namespaces.is_empty());
    }

    #[test]
    fn namespaces_are_unioned_and_sorted() {
        let set = gather(ForwarderSpec {
            inputs: vec![
                app_input("a", &["project2-namespace", "project1-namespace"]),
                app_input("b", &["project1-namespace", "project0"]),
            ],
            outputs: vec![],
            pipelines: vec![pipeline(&["a"]), pipeline(&["b"])],
        });
        assert_eq!(
            set.namespaces.into_iter().collect::<Vec<_>>(),
            vec!["project0", "project1-namespace", "project2-namespace"]
        );
    }

    #[test]
    fn unrestricted_application_ref_widens_to_all_namespaces() {
        let set = gather(ForwarderSpec {
            inputs: vec![app_input("a", &["project1"])],
            outputs: vec![],
            pipelines: vec![pipeline(&["a"]), pipeline(&["application"])],
        });
        assert!(set.contains(SourceType::Application));
        assert!(set.namespaces.is_empty());
    }

    #[test]
    fn input_shapes_classify() {
        let set = gather(ForwarderSpec {
            inputs: vec![
                InputSpec {
                    name: "nodes".to_string(),
                    infrastructure: Some(Infrastructure {}),
                    ..Default::default()
                },
                InputSpec {
                    name: "sec".to_string(),
                    audit: Some(Audit {}),
                    ..Default::default()
                },
                InputSpec {
                    name: "bare".to_string(),
                    ..Default::default()
                },
            ],
            outputs: vec![],
            pipelines: vec![pipeline(&["nodes", "sec"]), pipeline(&["bare"])],
        });
        assert_eq!(set.types.len(), 3);
    }

    #[test]
    fn unreferenced_inputs_are_pruned() {
        let set = gather(ForwarderSpec {
            inputs: vec![InputSpec {
                name: "nodes".to_string(),
                infrastructure: Some(Infrastructure {}),
                ..Default::default()
            }],
            outputs: vec![],
            pipelines: vec![pipeline(&["application"])],
        });
        assert!(!set.contains(SourceType::Infrastructure));
        assert!(!set.contains(SourceType::Audit));
    }

    #[test]
    fn serializes_sorted() {
        let set = gather(ForwarderSpec {
            inputs: vec![],
            outputs: vec![],
            pipelines: vec![pipeline(&["infrastructure", "application"])],
        });
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            r#"{"types":["application","infrastructure"],"namespaces":[]}"#
        );
    }
}
