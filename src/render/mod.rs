//! Text generation: templates, per-section renderers, and the assembler.

pub mod document;
pub mod ingress;
pub mod outputs;
pub mod routing;
pub mod sources;
pub mod template;

pub use document::ConfigGenerator;
pub use outputs::BufferSettings;
pub use template::Template;

use crate::Result;

/// Construction-time switches for the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Tap every source type into the operator's legacy secure-forward config.
    pub include_legacy_forward: bool,
    /// Tap every source type into the operator's legacy syslog config.
    pub include_legacy_syslog: bool,
}

/// Every template the document is built from, parsed and checked once.
#[derive(Debug, Clone)]
pub struct Templates {
    pub header: Template,
    pub self_monitoring: Template,
    pub journal_source: Template,
    pub container_source: Template,
    pub audit_sources: Template,
    pub concat: Template,
    pub ingress: Template,
    pub source_relabel: Template,
    pub fan_out: Template,
    pub relabel_store: Template,
    pub legacy_secureforward: Template,
    pub legacy_syslog: Template,
    pub es_label: Template,
    pub es_store: Template,
    pub forward_label: Template,
}

const BUFFER_PLACEHOLDERS: [&str; 8] = [
    "BUFFER_PATH",
    "CHUNK_LIMIT_SIZE",
    "TOTAL_LIMIT_SIZE",
    "OVERFLOW_ACTION",
    "FLUSH_THREAD_COUNT",
    "FLUSH_INTERVAL",
    "RETRY_WAIT",
    "RETRY_MAX_INTERVAL",
];

fn with_buffer(extra: &[&'static str]) -> Vec<&'static str> {
    extra.iter().chain(BUFFER_PLACEHOLDERS.iter()).copied().collect()
}

impl Templates {
    pub fn load() -> Result<Self> {
        Ok(Templates {
            header: Template::parse("header", document::HEADER, &["LOG_LEVEL"])?,
            self_monitoring: Template::parse("self-monitoring", sources::SELF_MONITORING, &[])?,
            journal_source: Template::parse("journal-source", sources::JOURNAL_SOURCE, &[])?,
            container_source: Template::parse(
                "container-source",
                sources::CONTAINER_SOURCE,
                &["PATH"],
            )?,
            audit_sources: Template::parse("audit-sources", sources::AUDIT_SOURCES, &[])?,
            concat: Template::parse("concat", ingress::CONCAT_LABEL, &[])?,
            ingress: Template::parse("ingress", ingress::INGRESS_LABEL, &["RELABELS"])?,
            source_relabel: Template::parse(
                "source-relabel",
                ingress::SOURCE_RELABEL,
                &["TAGS", "LABEL"],
            )?,
            fan_out: Template::parse("fan-out", routing::FAN_OUT_LABEL, &["LABEL", "STORES"])?,
            relabel_store: Template::parse("relabel-store", routing::RELABEL_STORE, &["TARGET"])?,
            legacy_secureforward: Template::parse(
                "legacy-secureforward",
                routing::LEGACY_SECUREFORWARD_LABEL,
                &[],
            )?,
            legacy_syslog: Template::parse("legacy-syslog", routing::LEGACY_SYSLOG_LABEL, &[])?,
            es_label: Template::parse(
                "elasticsearch-label",
                outputs::ES_LABEL,
                &["LABEL", "RETRY_TAG", "RETRY_STORE", "STORE"],
            )?,
            es_store: Template::parse(
                "elasticsearch-store",
                outputs::ES_STORE,
                &with_buffer(&[
                    "STORE_ID",
                    "HOST",
                    "PORT",
                    "SCHEME",
                    "SSL_VERSION",
                    "CLIENT_CERTS",
                    "RETRY_TAG_LINE",
                ]),
            )?,
            forward_label: Template::parse(
                "forward-label",
                outputs::FORWARD_LABEL,
                &with_buffer(&["LABEL", "TLS", "HOST", "PORT"]),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_load() {
        let templates = Templates::load().unwrap();
        assert_eq!(templates.es_store.name(), "elasticsearch-store");
        assert!(templates.self_monitoring.text().unwrap().contains("@type prometheus"));
    }
}
