//! `<source>` blocks: fixed self-monitoring sources plus one ingestion
//! block per active source type.

use crate::Result;
use crate::model::{SourceSet, SourceType};
use crate::render::Templates;
use std::collections::BTreeSet;

pub(crate) const SELF_MONITORING: &str = r##"<source>
  @type prometheus
  bind ''
  <ssl>
    enable true
    certificate_path "#{ENV['METRICS_CERT'] || '/etc/fluent/metrics/tls.crt'}"
    private_key_path "#{ENV['METRICS_KEY'] || '/etc/fluent/metrics/tls.key'}"
  </ssl>
</source>

<source>
  @type prometheus_monitor
  <labels>
    hostname ${hostname}
  </labels>
</source>

# excluding prometheus_tail_monitor
# since it leaks namespace/pod info
# via file paths

# This is considered experimental by the repo
<source>
  @type prometheus_output_monitor
  <labels>
    hostname ${hostname}
  </labels>
</source>
"##;

pub(crate) const JOURNAL_SOURCE: &str = r##"#journal logs to gather node
<source>
  @type systemd
  @id systemd-input
  @label @INGRESS
  path '/run/log/journal'
  <storage>
    @type local
    persistent true
    # NOTE: if this does not end in .json, fluentd will think it
    # is the name of a directory - see fluentd storage_local.rb
    path '/var/log/journal_pos.json'
  </storage>
  matches "#{ENV['JOURNAL_FILTERS_JSON'] || '[]'}"
  tag journal
  read_from_head "#{if (val = ENV.fetch('JOURNAL_READ_FROM_HEAD','')) && (val.length > 0); val; else 'false'; end}"
</source>
"##;

pub(crate) const CONTAINER_SOURCE: &str = r##"# container logs
<source>
  @type tail
  @id container-input
  path __PATH__
  exclude_path ["/var/log/containers/fluentd-*_openshift-logging_*.log", "/var/log/containers/elasticsearch-*_openshift-logging_*.log", "/var/log/containers/kibana-*_openshift-logging_*.log"]
  pos_file "/var/log/es-containers.log.pos"
  refresh_interval 5
  rotate_wait 5
  tag kubernetes.*
  read_from_head "true"
  @label @CONCAT
  <parse>
    @type multi_format
    <pattern>
      format json
      time_format '%Y-%m-%dT%H:%M:%S.%N%Z'
      keep_time_key true
    </pattern>
    <pattern>
      format regexp
      expression /^(?<time>.+) (?<stream>stdout|stderr)( (?<logtag>.))? (?<log>.*)$/
      time_format '%Y-%m-%dT%H:%M:%S.%N%:z'
      keep_time_key true
    </pattern>
  </parse>
</source>
"##;

pub(crate) const AUDIT_SOURCES: &str = r##"# linux audit logs
<source>
  @type tail
  @id audit-input
  @label @INGRESS
  path "#{ENV['AUDIT_FILE'] || '/var/log/audit/audit.log'}"
  pos_file "#{ENV['AUDIT_POS_FILE'] || '/var/log/audit/audit.log.pos'}"
  tag linux-audit.log
  <parse>
    @type viaq_host_audit
  </parse>
</source>

# k8s audit logs
<source>
  @type tail
  @id k8s-audit-input
  @label @INGRESS
  path "#{ENV['K8S_AUDIT_FILE'] || '/var/log/kube-apiserver/audit.log'}"
  pos_file "#{ENV['K8S_AUDIT_POS_FILE'] || '/var/log/kube-apiserver/audit.log.pos'}"
  tag k8s-audit.log
  <parse>
    @type json
    time_key requestReceivedTimestamp
    # In case folks want to parse based on the requestReceivedTimestamp key
    keep_time_key true
    time_format %Y-%m-%dT%H:%M:%S.%N%z
  </parse>
</source>

# Openshift audit logs
<source>
  @type tail
  @id openshift-audit-input
  @label @INGRESS
  path /var/log/oauth-apiserver/audit.log,/var/log/openshift-apiserver/audit.log
  pos_file /var/log/oauth-apiserver.audit.log
  tag openshift-audit.log
  <parse>
    @type json
    time_key requestReceivedTimestamp
    # In case folks want to parse based on the requestReceivedTimestamp key
    keep_time_key true
    time_format %Y-%m-%dT%H:%M:%S.%N%z
  </parse>
</source>
"##;

const CONTAINER_LOG_DIR: &str = "/var/log/containers";

/// Tail path for container logs: one glob per namespace, or every log file
/// when unrestricted.
pub fn container_path(namespaces: &BTreeSet<String>) -> String {
    if namespaces.is_empty() {
        return format!("\"{}/*.log\"", CONTAINER_LOG_DIR);
    }
    namespaces
        .iter()
        .map(|ns| format!("{}/*_{}_*.log", CONTAINER_LOG_DIR, ns))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ingestion blocks for the active source types, in fixed order:
/// journal, container, audit.
pub fn render_sources(templates: &Templates, sources: &SourceSet) -> Result<Vec<String>> {
    let mut out = Vec::new();
    if sources.contains(SourceType::Infrastructure) {
        out.push(templates.journal_source.text()?);
    }
    if sources.contains(SourceType::Application) {
        let path = container_path(&sources.namespaces);
        out.push(templates.container_source.render(&[("PATH", path.as_str())])?);
    }
    if sources.contains(SourceType::Audit) {
        out.push(templates.audit_sources.text()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(types: &[SourceType], namespaces: &[&str]) -> SourceSet {
        SourceSet {
            types: types.iter().copied().collect(),
            namespaces: namespaces.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn unrestricted_path_is_single_quoted_glob() {
        assert_eq!(container_path(&BTreeSet::new()), "\"/var/log/containers/*.log\"");
    }

    #[test]
    fn namespace_globs_are_sorted_and_joined() {
        let namespaces: BTreeSet<String> = ["project2-namespace", "project1-namespace"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            container_path(&namespaces),
            "/var/log/containers/*_project1-namespace_*.log, /var/log/containers/*_project2-namespace_*.log"
        );
    }

    #[test]
    fn renders_only_active_types() {
        let templates = Templates::load().unwrap();

        let blocks = render_sources(&templates, &set(&[SourceType::Application], &[])).unwrap();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("@id container-input"));
        assert!(blocks[0].contains("path \"/var/log/containers/*.log\""));

        let blocks = render_sources(
            &templates,
            &set(
                &[
                    SourceType::Application,
                    SourceType::Audit,
                    SourceType::Infrastructure,
                ],
                &["a"],
            ),
        )
        .unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].contains("@type systemd"));
        assert!(blocks[1].contains("path /var/log/containers/*_a_*.log\n"));
        assert!(blocks[2].contains("tag linux-audit.log"));
        assert!(blocks[2].contains("tag k8s-audit.log"));
        assert!(blocks[2].contains("tag openshift-audit.log"));

        let blocks = render_sources(&templates, &SourceSet::default()).unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn exclusions_survive_namespace_restriction() {
        let templates = Templates::load().unwrap();
        let blocks = render_sources(&templates, &set(&[SourceType::Application], &["ns"])).unwrap();
        assert!(blocks[0].contains(
            "exclude_path [\"/var/log/containers/fluentd-*_openshift-logging_*.log\", \"/var/log/containers/elasticsearch-*_openshift-logging_*.log\", \"/var/log/containers/kibana-*_openshift-logging_*.log\"]"
        ));
    }
}
