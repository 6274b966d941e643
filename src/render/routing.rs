//! Copy/relabel fan-out labels: source type -> pipelines, pipeline -> outputs.

use crate::Result;
use crate::model::{FanOut, RoutingGraph};
use crate::render::{GeneratorOptions, Templates};

pub(crate) const FAN_OUT_LABEL: &str = r##"<label @__LABEL__>
  <match **>
    @type copy
    __STORES__
  </match>
</label>
"##;

pub(crate) const RELABEL_STORE: &str = r##"<store>
  @type relabel
  @label @__TARGET__
</store>
"##;

pub(crate) const LEGACY_SECUREFORWARD_LABEL: &str = r##"<label @_LEGACY_SECUREFORWARD>
  <match **>
    @type copy
    #include legacy secure-forward.conf
    @include /etc/fluent/configs.d/secure-forward/secure-forward.conf
  </match>
</label>
"##;

pub(crate) const LEGACY_SYSLOG_LABEL: &str = r##"<label @_LEGACY_SYSLOG>
  <match **>
    @type copy
    #include legacy Syslog
    @include /etc/fluent/configs.d/syslog/syslog.conf
  </match>
</label>
"##;

const LEGACY_SECUREFORWARD: &str = "_LEGACY_SECUREFORWARD";
const LEGACY_SYSLOG: &str = "_LEGACY_SYSLOG";

fn render_fan_out(templates: &Templates, label: &str, targets: &[&str]) -> Result<String> {
    let mut stores = String::new();
    for target in targets {
        stores.push_str(&templates.relabel_store.render(&[("TARGET", *target)])?);
    }
    templates
        .fan_out
        .render(&[("LABEL", label), ("STORES", stores.as_str())])
}

/// One intermediary label per active source type. Legacy forwarding hooks,
/// when enabled, tap every source type after its pipelines.
pub fn render_source_labels(
    templates: &Templates,
    graph: &RoutingGraph,
    options: &GeneratorOptions,
) -> Result<Vec<String>> {
    graph
        .sources
        .iter()
        .map(|(_, fan_out)| {
            let mut targets: Vec<&str> = fan_out.targets.iter().map(String::as_str).collect();
            if options.include_legacy_forward {
                targets.push(LEGACY_SECUREFORWARD);
            }
            if options.include_legacy_syslog {
                targets.push(LEGACY_SYSLOG);
            }
            render_fan_out(templates, &fan_out.label, &targets)
        })
        .collect()
}

/// One label per pipeline, copying to each referenced output.
pub fn render_pipeline_labels(templates: &Templates, graph: &RoutingGraph) -> Result<Vec<String>> {
    graph
        .pipelines
        .iter()
        .map(|FanOut { label, targets }| {
            let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
            render_fan_out(templates, label, &targets)
        })
        .collect()
}

pub fn render_legacy_labels(
    templates: &Templates,
    options: &GeneratorOptions,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    if options.include_legacy_forward {
        out.push(templates.legacy_secureforward.text()?);
    }
    if options.include_legacy_syslog {
        out.push(templates.legacy_syslog.text()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceType;

    fn graph() -> RoutingGraph {
        RoutingGraph {
            sources: vec![(
                SourceType::Application,
                FanOut {
                    label: "_APPLICATION".to_string(),
                    targets: vec!["APPS_PIPELINE".to_string()],
                },
            )],
            pipelines: vec![FanOut {
                label: "APPS_PIPELINE".to_string(),
                targets: vec!["APPS_ES_1".to_string(), "APPS_ES_2".to_string()],
            }],
            outputs: vec![],
        }
    }

    #[test]
    fn pipeline_label_has_one_store_per_output_in_order() {
        let templates = Templates::load().unwrap();
        let labels = render_pipeline_labels(&templates, &graph()).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(
            labels[0],
            "<label @APPS_PIPELINE>
  <match **>
    @type copy
    <store>
      @type relabel
      @label @APPS_ES_1
    </store>
    <store>
      @type relabel
      @label @APPS_ES_2
    </store>
  </match>
</label>
"
        );
    }

    #[test]
    fn legacy_hooks_tap_source_labels() {
        let templates = Templates::load().unwrap();
        let options = GeneratorOptions {
            include_legacy_forward: true,
            include_legacy_syslog: true,
        };
        let labels = render_source_labels(&templates, &graph(), &options).unwrap();
        let pipeline = labels[0].find("@label @APPS_PIPELINE").unwrap();
        let forward = labels[0].find("@label @_LEGACY_SECUREFORWARD").unwrap();
        let syslog = labels[0].find("@label @_LEGACY_SYSLOG").unwrap();
        assert!(pipeline < forward && forward < syslog);

        let legacy = render_legacy_labels(&templates, &options).unwrap();
        assert_eq!(legacy.len(), 2);
        assert!(legacy[0].contains("@include /etc/fluent/configs.d/secure-forward/secure-forward.conf"));
        assert!(legacy[1].contains("@include /etc/fluent/configs.d/syslog/syslog.conf"));
    }

    #[test]
    fn no_legacy_hooks_by_default() {
        let templates = Templates::load().unwrap();
        let options = GeneratorOptions::default();
        let labels = render_source_labels(&templates, &graph(), &options).unwrap();
        assert!(!labels[0].contains("LEGACY"));
        assert!(render_legacy_labels(&templates, &options).unwrap().is_empty());
    }
}
