//! Document assembler.

use crate::Result;
use crate::model::{build_routing_graph, gather_sources};
use crate::render::ingress::{render_concat, render_ingress};
use crate::render::outputs::{BufferSettings, render_output};
use crate::render::routing::{render_legacy_labels, render_pipeline_labels, render_source_labels};
use crate::render::sources::render_sources;
use crate::render::{GeneratorOptions, Templates};
use crate::spec::{ForwarderSpec, GlobalDefaults};
use tracing::{debug, info};

pub(crate) const HEADER: &str = r##"## CLO GENERATED CONFIGURATION ###
# This file is a copy of the fluentd configuration entrypoint
# which should normally be supplied in a configmap.

<system>
  log_level "#{ENV['LOG_LEVEL'] || '__LOG_LEVEL__'}"
</system>

# In each section below, pre- and post- includes don't include anything initially;
# they exist to enable future additions to openshift conf as needed.

## sources
## ordered so that syslog always runs last...
"##;

const SOURCE_LABELS_COMMENT: &str =
    "# Relabel specific sources (e.g. logs.apps) to multiple pipelines\n";
const PIPELINE_LABELS_COMMENT: &str =
    "# Relabel specific pipelines to multiple, outputs (e.g. ES, kafka stores)\n";
const OUTPUT_LABELS_COMMENT: &str = "# Ship logs to specific outputs\n";

/// Compiles forwarder specs into a complete agent configuration document.
///
/// Templates are parsed once in [`ConfigGenerator::new`]; a generator can be
/// reused for any number of specs and always produces the same bytes for
/// the same input.
#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    options: GeneratorOptions,
    templates: Templates,
}

impl ConfigGenerator {
    pub fn new(options: GeneratorOptions) -> Result<Self> {
        Ok(ConfigGenerator {
            options,
            templates: Templates::load()?,
        })
    }

    pub fn generate(&self, spec: &ForwarderSpec, defaults: Option<&GlobalDefaults>) -> Result<String> {
        let fallback = GlobalDefaults::default();
        let defaults = defaults.unwrap_or(&fallback);
        defaults.validate()?;

        let forwarder = spec.validate_and_build()?;
        let sources = gather_sources(&forwarder);
        let graph = build_routing_graph(&forwarder, &sources);
        if sources.is_empty() {
            debug!("no pipeline consumes any source type; only fixed sections are rendered");
        }
        info!(
            types = ?sources.types,
            namespaces = sources.namespaces.len(),
            pipelines = graph.pipelines.len(),
            outputs = graph.outputs.len(),
            "generating forwarder configuration"
        );

        let t = &self.templates;
        let mut sections: Vec<String> = Vec::new();

        sections.push(t.header.render(&[("LOG_LEVEL", defaults.log_level())])?);
        sections.push(t.self_monitoring.text()?);
        sections.extend(render_sources(t, &sources)?);
        sections.push(render_concat(t)?);
        sections.push(render_ingress(t, &sources)?);

        let mut block = SOURCE_LABELS_COMMENT.to_string();
        block.push_str(&render_source_labels(t, &graph, &self.options)?.concat());
        sections.push(block);

        let mut block = PIPELINE_LABELS_COMMENT.to_string();
        block.push_str(&render_pipeline_labels(t, &graph)?.concat());
        sections.push(block);

        let mut block = OUTPUT_LABELS_COMMENT.to_string();
        for node in graph.delivered_outputs() {
            let Some(output) = forwarder.output(&node.name) else {
                continue;
            };
            debug!(
                output = %node.name,
                pipelines = ?node.pipelines,
                "rendering output label"
            );
            let buffer = BufferSettings::for_output(output.output_type, defaults.buffer.as_ref());
            block.push_str(&render_output(t, output, &buffer)?);
        }
        sections.push(block);

        sections.extend(render_legacy_labels(t, &self.options)?);

        let document = normalize(&sections.join("\n"));
        debug!(bytes = document.len(), "rendered document");
        Ok(document)
    }
}

/// Strip trailing whitespace, collapse runs of blank lines, and end with
/// exactly one newline.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if blank_run {
                continue;
            }
            blank_run = true;
        } else {
            blank_run = false;
        }
        out.push_str(line);
        out.push('\n');
    }
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}
