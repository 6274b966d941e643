//! Compiles a cluster log forwarder spec (inputs, outputs, pipelines) into a
//! fluentd configuration document.
//!
//! The flow is spec -> validated forwarder -> source set + routing graph ->
//! rendered text:
//!
//! ```no_run
//! use forwarder_conf_gen::render::{ConfigGenerator, GeneratorOptions};
//! use forwarder_conf_gen::spec::ForwarderSpec;
//!
//! # fn main() -> forwarder_conf_gen::Result<()> {
//! let spec = ForwarderSpec::default();
//! let generator = ConfigGenerator::new(GeneratorOptions::default())?;
//! let conf = generator.generate(&spec, None)?;
//! print!("{}", conf);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod model;
pub mod render;
pub mod spec;

pub use error::{GenerateError, Result};

use crate::model::SourceSet;
use crate::render::{ConfigGenerator, GeneratorOptions};
use crate::spec::{ForwarderSpec, GlobalDefaults};

/// Render a document with default generator options.
pub fn generate(spec: &ForwarderSpec, defaults: Option<&GlobalDefaults>) -> Result<String> {
    ConfigGenerator::new(GeneratorOptions::default())?.generate(spec, defaults)
}

/// Source types and namespaces the spec needs collected.
pub fn gather_sources(spec: &ForwarderSpec) -> Result<SourceSet> {
    let forwarder = spec.validate_and_build()?;
    Ok(model::gather_sources(&forwarder))
}
