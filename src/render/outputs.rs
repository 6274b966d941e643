//! Per-output delivery labels.
//!
//! elasticsearch outputs get two match blocks: a `retry_<output>` block that
//! re-ingests failed deliveries, then a catch-all whose store re-emits
//! failures under that retry tag. forward outputs are fail-stop and rely on
//! the buffer's own retry, so they get the catch-all only.

use crate::Result;
use crate::spec::names::{label_name, retry_tag, store_id};
use crate::spec::{BufferTuning, OutputType, ValidatedOutput};
use crate::render::Templates;

pub(crate) const SECRETS_DIR: &str = "/var/run/ocp-collector/secrets";
const BUFFER_DIR: &str = "/var/lib/fluentd";

pub(crate) const ES_LABEL: &str = r##"<label @__LABEL__>
  <match __RETRY_TAG__>
    @type copy
    __RETRY_STORE__
  </match>
  <match **>
    @type copy
    __STORE__
  </match>
</label>
"##;

pub(crate) const ES_STORE: &str = r##"<store>
  @type elasticsearch
  @id __STORE_ID__
  host __HOST__
  port __PORT__
  verify_es_version_at_startup false
  scheme __SCHEME__
  __SSL_VERSION__
  target_index_key viaq_index_name
  id_key viaq_msg_id
  remove_keys viaq_index_name
  user fluentd
  password changeme

  __CLIENT_CERTS__
  type_name _doc
  __RETRY_TAG_LINE__
  write_operation create
  reload_connections 'true'
  # https://github.com/uken/fluent-plugin-elasticsearch#reload-after
  reload_after '200'
  # https://github.com/uken/fluent-plugin-elasticsearch#sniffer-class-name
  sniffer_class_name 'Fluent::Plugin::ElasticsearchSimpleSniffer'
  reload_on_failure false
  # 2 ^ 31
  request_timeout 2147483648
  <buffer>
    @type file
    path '__BUFFER_PATH__'
    flush_mode interval
    flush_interval __FLUSH_INTERVAL__
    flush_thread_count __FLUSH_THREAD_COUNT__
    flush_at_shutdown true
    retry_type exponential_backoff
    retry_wait __RETRY_WAIT__
    retry_max_interval __RETRY_MAX_INTERVAL__
    retry_forever true
    queued_chunks_limit_size "#{ENV['BUFFER_QUEUE_LIMIT'] || '32' }"
    total_limit_size __TOTAL_LIMIT_SIZE__
    chunk_limit_size __CHUNK_LIMIT_SIZE__
    overflow_action __OVERFLOW_ACTION__
  </buffer>
</store>
"##;

pub(crate) const FORWARD_LABEL: &str = r##"<label @__LABEL__>
  <match **>
    # https://docs.fluentd.org/v1.0/articles/in_forward
    @type forward
    __TLS__

    <buffer>
      @type file
      path '__BUFFER_PATH__'
      queued_chunks_limit_size "#{ENV['BUFFER_QUEUE_LIMIT'] || '1024' }"
      total_limit_size __TOTAL_LIMIT_SIZE__
      chunk_limit_size __CHUNK_LIMIT_SIZE__
      flush_mode interval
      flush_interval __FLUSH_INTERVAL__
      flush_at_shutdown true
      flush_thread_count __FLUSH_THREAD_COUNT__
      retry_type exponential_backoff
      retry_wait __RETRY_WAIT__
      retry_max_interval __RETRY_MAX_INTERVAL__
      retry_forever true
      # the systemd journald 0.0.8 input plugin will just throw away records if the buffer
      # queue limit is hit - 'block' will halt further reads and keep retrying to flush the
      # buffer to the remote - default is 'block' because in_tail handles that case
      overflow_action __OVERFLOW_ACTION__
    </buffer>

    <server>
      host __HOST__
      port __PORT__
    </server>
  </match>
</label>
"##;

/// Buffer parameters shared by every store of an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSettings {
    pub chunk_limit_size: String,
    pub total_limit_size: String,
    pub overflow_action: String,
    pub flush_thread_count: String,
    pub flush_interval: String,
    pub retry_wait: String,
    pub retry_max_interval: String,
}

impl BufferSettings {
    /// Per-kind defaults with global tuning applied on top.
    pub fn for_output(output_type: OutputType, tuning: Option<&BufferTuning>) -> Self {
        let (chunk_limit_size, flush_interval) = match output_type {
            OutputType::Elasticsearch => ("\"#{ENV['BUFFER_SIZE_LIMIT'] || '8m'}\"", "1s"),
            OutputType::Forward => ("\"#{ENV['BUFFER_SIZE_LIMIT'] || '1m'}\"", "5s"),
        };
        let mut settings = BufferSettings {
            chunk_limit_size: chunk_limit_size.to_string(),
            total_limit_size: "\"#{ENV['TOTAL_LIMIT_SIZE'] ||  8589934592 }\" #8G".to_string(),
            overflow_action: "block".to_string(),
            flush_thread_count: "2".to_string(),
            flush_interval: flush_interval.to_string(),
            retry_wait: "1s".to_string(),
            retry_max_interval: "300s".to_string(),
        };

        let Some(tuning) = tuning else {
            return settings;
        };
        let overrides = [
            (&mut settings.chunk_limit_size, &tuning.chunk_limit_size),
            (&mut settings.total_limit_size, &tuning.total_limit_size),
            (&mut settings.overflow_action, &tuning.overflow_action),
            (&mut settings.flush_interval, &tuning.flush_interval),
            (&mut settings.retry_wait, &tuning.retry_wait),
            (&mut settings.retry_max_interval, &tuning.retry_max_interval),
        ];
        for (slot, value) in overrides {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        if let Some(count) = tuning.flush_thread_count {
            settings.flush_thread_count = count.to_string();
        }
        settings
    }

    fn values(&self) -> [(&'static str, &str); 7] {
        [
            ("CHUNK_LIMIT_SIZE", self.chunk_limit_size.as_str()),
            ("TOTAL_LIMIT_SIZE", self.total_limit_size.as_str()),
            ("OVERFLOW_ACTION", self.overflow_action.as_str()),
            ("FLUSH_THREAD_COUNT", self.flush_thread_count.as_str()),
            ("FLUSH_INTERVAL", self.flush_interval.as_str()),
            ("RETRY_WAIT", self.retry_wait.as_str()),
            ("RETRY_MAX_INTERVAL", self.retry_max_interval.as_str()),
        ]
    }
}

fn secret_path(secret: &str, file: &str) -> String {
    format!("{}/{}/{}", SECRETS_DIR, secret, file)
}

fn buffer_path(id: &str) -> String {
    format!("{}/{}", BUFFER_DIR, id)
}

/// Render the delivery label for one output.
pub fn render_output(
    templates: &Templates,
    output: &ValidatedOutput,
    buffer: &BufferSettings,
) -> Result<String> {
    match output.output_type {
        OutputType::Elasticsearch => render_elasticsearch(templates, output, buffer),
        OutputType::Forward => render_forward(templates, output, buffer),
    }
}

fn render_elasticsearch(
    templates: &Templates,
    output: &ValidatedOutput,
    buffer: &BufferSettings,
) -> Result<String> {
    let label = label_name(&output.name);
    let retry = retry_tag(&output.name);

    let retry_store = render_es_store(templates, output, buffer, &retry, None)?;
    let store = render_es_store(templates, output, buffer, &store_id(&output.name), Some(&retry))?;

    templates.es_label.render(&[
        ("LABEL", label.as_str()),
        ("RETRY_TAG", retry.as_str()),
        ("RETRY_STORE", retry_store.as_str()),
        ("STORE", store.as_str()),
    ])
}

/// `retry_tag` is None for the retry store itself: it IS the retry path.
fn render_es_store(
    templates: &Templates,
    output: &ValidatedOutput,
    buffer: &BufferSettings,
    id: &str,
    retry_tag: Option<&str>,
) -> Result<String> {
    let endpoint = &output.endpoint;
    let port = endpoint.port.to_string();
    let ssl_version = if endpoint.is_tls() {
        "ssl_version TLSv1_2"
    } else {
        ""
    };
    let client_certs = match &output.secret {
        Some(secret) => format!(
            "client_key '{}'\nclient_cert '{}'\nca_file '{}'\n",
            secret_path(secret, "tls.key"),
            secret_path(secret, "tls.crt"),
            secret_path(secret, "ca-bundle.crt"),
        ),
        None => String::new(),
    };
    let retry_tag_line = retry_tag
        .map(|t| format!("retry_tag {}", t))
        .unwrap_or_default();
    let path = buffer_path(id);

    let mut values: Vec<(&str, &str)> = vec![
        ("STORE_ID", id),
        ("HOST", endpoint.host.as_str()),
        ("PORT", port.as_str()),
        ("SCHEME", endpoint.scheme.as_str()),
        ("SSL_VERSION", ssl_version),
        ("CLIENT_CERTS", client_certs.as_str()),
        ("RETRY_TAG_LINE", retry_tag_line.as_str()),
        ("BUFFER_PATH", path.as_str()),
    ];
    values.extend(buffer.values());
    templates.es_store.render(&values)
}

fn render_forward(
    templates: &Templates,
    output: &ValidatedOutput,
    buffer: &BufferSettings,
) -> Result<String> {
    let endpoint = &output.endpoint;
    let label = label_name(&output.name);
    let port = endpoint.port.to_string();
    let path = buffer_path(&store_id(&output.name));

    let mut tls = String::new();
    if output.secret.is_some() || endpoint.is_tls() {
        tls.push_str("transport tls\ntls_verify_hostname false\ntls_version 'TLSv1_2'\n");
    }
    if let Some(secret) = &output.secret {
        tls.push_str(&format!(
            "tls_client_private_key_path '{}'\ntls_client_cert_path '{}'\ntls_cert_path '{}'\n",
            secret_path(secret, "tls.key"),
            secret_path(secret, "tls.crt"),
            secret_path(secret, "ca-bundle.crt"),
        ));
    }

    let mut values: Vec<(&str, &str)> = vec![
        ("LABEL", label.as_str()),
        ("TLS", tls.as_str()),
        ("BUFFER_PATH", path.as_str()),
        ("HOST", endpoint.host.as_str()),
        ("PORT", port.as_str()),
    ];
    values.extend(buffer.values());
    templates.forward_label.render(&values)
}
