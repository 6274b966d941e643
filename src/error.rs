//! Errors returned by the config compiler.
//!
//! Every failure aborts the whole compilation; no partial document is ever
//! handed back alongside one of these.

/// Errors that can occur while compiling a forwarder spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("template {name} is malformed: {reason}")]
    Template { name: String, reason: String },

    #[error("output {output} has unsupported type {output_type:?}")]
    UnsupportedOutputType { output: String, output_type: String },

    #[error("pipeline {pipeline} references unknown input {input}")]
    UnknownInput { pipeline: String, input: String },

    #[error("pipeline {pipeline} references unknown output {output}")]
    UnknownOutput { pipeline: String, output: String },

    #[error("input name {0} is reserved for a built-in source type")]
    ReservedInputName(String),

    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{first} and {second} both map to label @{label}")]
    LabelCollision {
        first: String,
        second: String,
        label: String,
    },

    #[error("outputs {first} and {second} both render plugin id {id}")]
    StoreIdCollision {
        first: String,
        second: String,
        id: String,
    },

    #[error("output {output} references invalid secret name {secret:?}")]
    InvalidSecret { output: String, secret: String },

    #[error("{kind} at position {index} has an empty name")]
    EmptyName { kind: &'static str, index: usize },

    #[error("pipeline {pipeline} has no {what}")]
    EmptyPipeline {
        pipeline: String,
        what: &'static str,
    },

    #[error("input {input} is invalid: {reason}")]
    InvalidInput { input: String, reason: String },

    #[error("output {output} has invalid url {url:?}: {reason}")]
    InvalidUrl {
        output: String,
        url: String,
        reason: String,
    },

    #[error("invalid global defaults: {0}")]
    InvalidDefaults(String),
}

pub type Result<T> = std::result::Result<T, GenerateError>;
