//! Derived model: what a forwarder definition implies, independent of text rendering.

pub mod routing;
pub mod sources;

pub use routing::{FanOut, OutputNode, RoutingGraph, build_routing_graph};
pub use sources::{ResolvedInput, SourceSet, SourceType, gather_sources};
