//! Input layer: serde schema plus validated in-memory structures.
//!
//! Owns:
//! - the forwarder spec (inputs, outputs, pipelines) and global defaults
//! - name sanitization for labels and store ids
//! - endpoint parsing and validation

pub mod defaults;
pub mod endpoint;
pub mod forwarder;
pub mod names;
pub mod validate;

pub use defaults::{BufferTuning, GlobalDefaults};
pub use endpoint::Endpoint;
pub use forwarder::{
    Application, Audit, ForwarderSpec, Infrastructure, InputSpec, OutputSecretSpec, OutputSpec,
    OutputType, PipelineSpec,
};
pub use validate::{ValidatedForwarder, ValidatedOutput, ValidatedPipeline};
