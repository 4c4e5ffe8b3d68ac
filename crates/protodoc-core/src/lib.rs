//! # protodoc-core
//!
//! A library for turning compiled Protocol Buffer descriptors into a
//! documentation model ready for serialization or template rendering.
//!
//! This crate provides the core functionality for:
//! - Decoding `FileDescriptorSet`s and protoc plugin requests
//! - Recovering comments and line spans from source code info
//! - Merging built-in, declared and plugin-provided options
//! - Assembling files, packages and cross-reference links into a [`Model`]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`descriptor`]: Descriptor input and the reflection pool
//! - [`source`]: Path vectors and source location lookup
//! - [`types`]: Type name triples and field labels
//! - [`options`]: Option merging and the extension registry
//! - [`walker`]: Flattening of nested declarations
//! - [`parser`]: One parser per declaration kind
//! - [`builder`]: Model assembly
//! - [`model`]: The documentation model
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use protodoc_core::{DescriptorSet, ModelBuilder, ModelConfig};
//! use std::fs;
//!
//! // Produced by `protoc --include_source_info --include_imports -o docs.pb ...`
//! let data = fs::read("docs.pb")?;
//! let set = DescriptorSet::decode(data.as_slice())?;
//!
//! let model = ModelBuilder::new(ModelConfig::new().exclude_marker("@internal")).build(&set);
//! for package in model.packages() {
//!     println!("{}: {} message(s)", package.name, package.listed_messages().count());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! Custom option extensions can be mapped into the model through an
//! [`ExtensionRegistry`] of [`OptionTransform`]s.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;
pub mod source;
pub mod types;
pub mod walker;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use builder::{ModelBuilder, ModelConfig, DEFAULT_EXCLUDE_MARKER};
pub use descriptor::{DescriptorSet, ProtoSyntax};
pub use error::{Error, Result};
pub use model::{
    Enum, EnumValue, Extension, Field, File, Link, LinkTable, Message, MessageExtension, Model,
    OneOf, OptionLookup, Package, PackageDescription, ScalarValue, Service, ServiceMethod,
};
pub use options::{ExtensionRegistry, OptionMap, OptionTransform};
pub use source::Source;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
