//! Model assembly.
//!
//! [`ModelBuilder`] parses every target file of a [`DescriptorSet`], sorts
//! each file's declarations, resolves map fields against their synthesized
//! entry messages and groups the files into packages.

use crate::descriptor::DescriptorSet;
use crate::model::{File, Model, Package, PackageDescription};
use crate::options::{Declaration, ExtensionRegistry, OptionCarrier, OptionResolver};
use crate::parser::ParseContext;
use crate::source::{child_path, PathKind, SYNTAX_PATH};
use crate::walker::walk;
use prost_types::FileDescriptorProto;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace, warn};

/// Comment prefix hiding a declaration's description
pub const DEFAULT_EXCLUDE_MARKER: &str = "@exclude";

/// Configuration for model assembly
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Comments starting with this text produce an empty description
    pub exclude_marker: String,
    /// Transforms for plugin-provided options
    pub extensions: ExtensionRegistry,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            exclude_marker: DEFAULT_EXCLUDE_MARKER.to_string(),
            extensions: ExtensionRegistry::default(),
        }
    }
}

impl ModelConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exclusion marker; an empty marker disables exclusion
    pub fn exclude_marker(mut self, marker: impl Into<String>) -> Self {
        self.exclude_marker = marker.into();
        self
    }

    /// Sets the plugin option transforms
    pub fn extensions(mut self, registry: ExtensionRegistry) -> Self {
        self.extensions = registry;
        self
    }
}

/// Builds [`Model`]s from descriptor sets
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    config: ModelConfig,
}

impl ModelBuilder {
    /// Creates a builder with the given configuration
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// The builder's configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Builds the model for every target file of `set`
    pub fn build(&self, set: &DescriptorSet) -> Model {
        let resolver = OptionResolver::new(set.pool(), &self.config.extensions);
        let mut files: Vec<File> = set
            .targets()
            .map(|proto| self.parse_file(proto, resolver))
            .collect();

        resolve_maps(&mut files);
        let packages = assemble_packages(&files);
        debug!(
            "assembled {} file(s) into {} package(s)",
            files.len(),
            packages.len()
        );

        Model::new(files, packages)
    }

    fn parse_file(&self, proto: &FileDescriptorProto, resolver: OptionResolver<'_>) -> File {
        let ctx = ParseContext::new(proto, resolver, &self.config.exclude_marker);
        let walked = walk(proto);

        let mut enums: Vec<_> = walked.enums.iter().map(|e| ctx.parse_enum(e)).collect();
        let mut messages: Vec<_> = walked.messages.iter().map(|m| ctx.parse_message(m)).collect();
        let mut extensions: Vec<_> = proto
            .extension
            .iter()
            .enumerate()
            .map(|(i, ext)| {
                ctx.parse_extension(&child_path(&[], PathKind::FileExtension, i), "", ext)
            })
            .collect();
        let mut services: Vec<_> = proto
            .service
            .iter()
            .enumerate()
            .map(|(i, service)| ctx.parse_service(i, service))
            .collect();

        enums.sort_by(|a, b| a.long_name.cmp(&b.long_name));
        messages.sort_by(|a, b| a.long_name.cmp(&b.long_name));
        extensions.sort_by(|a, b| a.long_name.cmp(&b.long_name));
        services.sort_by(|a, b| a.long_name.cmp(&b.long_name));

        debug!(
            "parsed {}: {} message(s), {} enum(s), {} service(s), {} extension(s)",
            proto.name(),
            messages.len(),
            enums.len(),
            services.len(),
            extensions.len()
        );

        File {
            name: proto.name().to_string(),
            description: ctx
                .locator()
                .match_location(SYNTAX_PATH)
                .map(|source| ctx.describe(&source))
                .unwrap_or_default(),
            package: ctx.package().to_string(),
            has_enums: !proto.enum_type.is_empty(),
            has_extensions: !proto.extension.is_empty(),
            has_messages: !proto.message_type.is_empty(),
            has_services: !proto.service.is_empty(),
            enums,
            extensions,
            messages,
            services,
            options: ctx.options().resolve(
                OptionCarrier::File(proto.options.as_ref()),
                Declaration::File(proto.name()),
            ),
        }
    }
}

/// Fills in key and value types of map fields and hides their entry messages
fn resolve_maps(files: &mut [File]) {
    // entry full name -> (key type, value type)
    let entries: BTreeMap<String, (String, String)> = files
        .iter()
        .flat_map(|f| f.messages.iter())
        .filter_map(|m| {
            let key = m.field("key")?;
            let value = m.field("value")?;
            Some((m.full_name.clone(), (key.full_type.clone(), value.full_type.clone())))
        })
        .collect();

    let mut used = BTreeSet::new();
    for message in files.iter_mut().flat_map(|f| f.messages.iter_mut()) {
        let fields = message
            .fields
            .iter_mut()
            .chain(message.one_ofs.iter_mut().flat_map(|o| o.fields.iter_mut()));
        for field in fields.filter(|f| f.is_map) {
            match entries.get(&field.full_type) {
                Some((key, value)) => {
                    trace!("map field {} uses entry {}", field.name, field.full_type);
                    field.map_key_type = Some(key.clone());
                    field.map_value_type = Some(value.clone());
                    used.insert(field.full_type.clone());
                }
                None => warn!(
                    "map entry {} of field {} not found, key and value types left unset",
                    field.full_type, field.name
                ),
            }
        }
    }

    for message in files.iter_mut().flat_map(|f| f.messages.iter_mut()) {
        if used.contains(&message.full_name) {
            message.internal = true;
        }
    }
}

/// Groups files by package name, packages ordered by name
fn assemble_packages(files: &[File]) -> Vec<Package> {
    let mut packages: BTreeMap<&str, Package> = BTreeMap::new();
    for file in files {
        let pkg = packages.entry(file.package.as_str()).or_insert_with(|| Package {
            name: file.package.clone(),
            ..Package::default()
        });
        let description = file.description.trim();
        if !description.is_empty() {
            pkg.descriptions.push(PackageDescription {
                file: file.name.clone(),
                description: description.to_string(),
            });
        }
        pkg.services.extend(file.services.iter().cloned());
        pkg.messages.extend(file.messages.iter().cloned());
        pkg.enums.extend(file.enums.iter().cloned());
    }

    packages
        .into_values()
        .map(|mut pkg| {
            pkg.services.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            pkg.messages.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            pkg.enums.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            debug!(
                "package {:?}: {} message(s), {} enum(s), {} service(s)",
                pkg.name,
                pkg.messages.len(),
                pkg.enums.len(),
                pkg.services.len()
            );
            pkg
        })
        .collect()
}
