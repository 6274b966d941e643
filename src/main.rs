use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use forwarder_conf_gen::render::{ConfigGenerator, GeneratorOptions};
use forwarder_conf_gen::spec::{ForwarderSpec, GlobalDefaults};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

mod diagnostics;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "forwarder-conf-gen")]
#[command(about = "Generate fluentd configuration from a log forwarder spec", long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `forwarder_conf_gen=trace`.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render fluent.conf for a forwarder spec.
    Generate {
        #[arg(long)]
        spec: String,

        /// Global defaults (log level, buffer tuning).
        #[arg(long)]
        defaults: Option<String>,

        /// Write here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,

        /// Also copy every source to the legacy secure-forward config.
        #[arg(long)]
        legacy_forward: bool,

        /// Also copy every source to the legacy syslog config.
        #[arg(long)]
        legacy_syslog: bool,
    },
    /// Print the source types and namespaces a spec needs collected, as JSON.
    Sources {
        #[arg(long)]
        spec: String,
    },
}

/// Parse a JSON or YAML file, chosen by extension.
fn read_document<T: DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "json" => serde_json::from_str(&raw).with_context(|| format!("parsing {}", path)),
        "yaml" | "yml" => serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", path)),
        other => bail!("{}: unsupported file extension {:?} (want .json, .yaml or .yml)", path, other),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init_logging(&cli.log_level)?;

    match cli.cmd {
        Commands::Generate {
            spec,
            defaults,
            out,
            legacy_forward,
            legacy_syslog,
        } => {
            let forwarder: ForwarderSpec = read_document(&spec)?;
            let defaults: Option<GlobalDefaults> =
                defaults.as_deref().map(read_document::<GlobalDefaults>).transpose()?;

            let generator = ConfigGenerator::new(GeneratorOptions {
                include_legacy_forward: legacy_forward,
                include_legacy_syslog: legacy_syslog,
            })?;
            let conf = generator
                .generate(&forwarder, defaults.as_ref())
                .with_context(|| format!("generating configuration for {}", spec))?;

            match out {
                Some(out) => {
                    std::fs::write(&out, conf).with_context(|| format!("writing {}", out))?;
                    info!("wrote {}", out);
                }
                None => print!("{}", conf),
            }
        }
        Commands::Sources { spec } => {
            let forwarder: ForwarderSpec = read_document(&spec)?;
            let sources = forwarder_conf_gen::gather_sources(&forwarder)?;
            println!("{}", serde_json::to_string_pretty(&sources)?);
        }
    }

    Ok(())
}
