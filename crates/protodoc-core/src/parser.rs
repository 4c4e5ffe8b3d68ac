//! Declaration parsers.
//!
//! One method per schema construct, each turning a single descriptor into
//! its model node. A [`ParseContext`] carries everything that is fixed for
//! the file being parsed: package, syntax, source locations and option
//! resolution.

use crate::descriptor::ProtoSyntax;
use crate::model::{
    Enum, EnumValue, Extension, Field, Message, MessageExtension, OneOf, Service, ServiceMethod,
};
use crate::options::{Declaration, OptionCarrier, OptionResolver};
use crate::source::{child_path, PathKind, Source, SourceLocator};
use crate::types::{label_name, qualify, TypeRef};
use crate::walker::{WalkedEnum, WalkedMessage};
use prost_types::field_descriptor_proto::Label;
use prost_types::{
    EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};

/// Cleans a comment for display.
///
/// Leading `*`, `/`, newline and space characters are dropped. A comment
/// starting with `exclude_marker` yields an empty description.
pub fn description(comment: &str, exclude_marker: &str) -> String {
    let text = comment.trim_start_matches(['*', '/', '\n', ' ']);
    if !exclude_marker.is_empty() && text.starts_with(exclude_marker) {
        return String::new();
    }
    text.to_string()
}

/// Per-file parsing state
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    package: &'a str,
    syntax: ProtoSyntax,
    locator: SourceLocator<'a>,
    options: OptionResolver<'a>,
    exclude_marker: &'a str,
}

impl<'a> ParseContext<'a> {
    /// Creates the context for one file
    pub fn new(
        file: &'a FileDescriptorProto,
        options: OptionResolver<'a>,
        exclude_marker: &'a str,
    ) -> Self {
        Self {
            package: file.package(),
            syntax: ProtoSyntax::of(file),
            locator: SourceLocator::new(file),
            options,
            exclude_marker,
        }
    }

    /// Package of the file, empty when none
    pub fn package(&self) -> &'a str {
        self.package
    }

    /// Source locator of the file
    pub fn locator(&self) -> &SourceLocator<'a> {
        &self.locator
    }

    /// Option resolver of the file
    pub fn options(&self) -> &OptionResolver<'a> {
        &self.options
    }

    /// Fully-qualified name of a package-relative name
    pub fn full_name(&self, long_name: &str) -> String {
        qualify(self.package, long_name)
    }

    /// Description of the declaration at `source`
    pub fn describe(&self, source: &Source) -> String {
        description(&source.joined_comments("\n"), self.exclude_marker)
    }

    fn describe_path(&self, path: &[i32]) -> String {
        self.locator
            .match_location(path)
            .map(|source| self.describe(&source))
            .unwrap_or_default()
    }

    /// Parses an enum and its values
    pub fn parse_enum(&self, walked: &WalkedEnum<'_>) -> Enum {
        let desc = walked.descriptor;
        let long_name = walked.long_name();
        let full_name = self.full_name(&long_name);
        let source = self.locator.locate(walked.path.clone());

        let values = desc
            .value
            .iter()
            .enumerate()
            .map(|(i, value)| self.parse_enum_value(&full_name, &walked.path, i, value))
            .collect();

        Enum {
            name: desc.name().to_string(),
            description: self.describe(&source),
            options: self.options.resolve(
                OptionCarrier::Enum(desc.options.as_ref()),
                Declaration::Enum(&full_name),
            ),
            long_name,
            full_name,
            values,
            source,
        }
    }

    /// Parses one enum value
    pub fn parse_enum_value(
        &self,
        enum_full_name: &str,
        enum_path: &[i32],
        index: usize,
        value: &EnumValueDescriptorProto,
    ) -> EnumValue {
        EnumValue {
            name: value.name().to_string(),
            number: value.number().to_string(),
            description: self.describe_path(&child_path(enum_path, PathKind::EnumValue, index)),
            options: self.options.resolve(
                OptionCarrier::EnumValue(value.options.as_ref()),
                Declaration::EnumValue {
                    enumeration: enum_full_name,
                    name: value.name(),
                },
            ),
        }
    }

    /// Parses a message, splitting oneof members from plain fields
    pub fn parse_message(&self, walked: &WalkedMessage<'_>) -> Message {
        let desc = walked.descriptor;
        let long_name = walked.long_name();
        let full_name = self.full_name(&long_name);
        let source = self.locator.locate(walked.path.clone());

        let extensions: Vec<_> = desc
            .extension
            .iter()
            .enumerate()
            .map(|(i, ext)| self.parse_message_extension(walked, i, ext))
            .collect();

        let mut fields = Vec::new();
        // (oneof index, members) in first-seen order
        let mut groups: Vec<(i32, Vec<Field>)> = Vec::new();
        for (i, fd) in desc.field.iter().enumerate() {
            let field = self.parse_field(&full_name, &walked.path, i, fd, &desc.oneof_decl);
            match oneof_membership(fd) {
                Some(index) => match groups.iter_mut().find(|(seen, _)| *seen == index) {
                    Some((_, members)) => members.push(field),
                    None => groups.push((index, vec![field])),
                },
                None => fields.push(field),
            }
        }

        let one_ofs: Vec<_> = groups
            .into_iter()
            .map(|(index, members)| {
                self.parse_oneof(&walked.path, index, &desc.oneof_decl, members)
            })
            .collect();

        Message {
            name: desc.name().to_string(),
            description: self.describe(&source),
            has_extensions: !extensions.is_empty(),
            has_fields: !desc.field.is_empty(),
            has_oneofs: !one_ofs.is_empty(),
            extensions,
            fields,
            one_ofs,
            options: self.options.resolve(
                OptionCarrier::Message(desc.options.as_ref()),
                Declaration::Message(&full_name),
            ),
            long_name,
            full_name,
            source,
            internal: false,
        }
    }

    fn parse_oneof(
        &self,
        message_path: &[i32],
        index: i32,
        decls: &[OneofDescriptorProto],
        fields: Vec<Field>,
    ) -> OneOf {
        let source = self
            .locator
            .locate(child_path(message_path, PathKind::Oneof, index as usize));
        OneOf {
            name: oneof_name(decls, index),
            description: source.joined_comments("\n\n"),
            fields,
            source,
        }
    }

    /// Parses one message field
    pub fn parse_field(
        &self,
        message_full_name: &str,
        message_path: &[i32],
        index: usize,
        fd: &FieldDescriptorProto,
        oneof_decls: &[OneofDescriptorProto],
    ) -> Field {
        let ty = TypeRef::resolve(fd.type_name(), fd.r#type(), self.package);
        let label = label_name(fd.label(), self.syntax, fd.proto3_optional());
        let oneof = oneof_membership(fd);

        Field {
            number: fd.number(),
            name: fd.name().to_string(),
            description: self.describe_path(&child_path(message_path, PathKind::Field, index)),
            is_map: fd.label() == Label::Repeated && ty.looks_like_map_entry(),
            label,
            type_name: ty.short,
            long_type: ty.long,
            full_type: ty.full,
            map_key_type: None,
            map_value_type: None,
            is_oneof: oneof.is_some(),
            oneof_decl: oneof.map(|i| oneof_name(oneof_decls, i)).unwrap_or_default(),
            default_value: fd.default_value().to_string(),
            options: self.options.resolve(
                OptionCarrier::Field(fd.options.as_ref()),
                Declaration::Field {
                    message: message_full_name,
                    name: fd.name(),
                },
            ),
        }
    }

    /// Parses an extension declared at `path` inside `scope` (empty at file level)
    pub fn parse_extension(
        &self,
        path: &[i32],
        scope: &str,
        fd: &FieldDescriptorProto,
    ) -> Extension {
        let ty = TypeRef::resolve(fd.type_name(), fd.r#type(), self.package);
        let extendee = TypeRef::named(fd.extendee().trim_start_matches('.'), self.package);
        let long_name = qualify(scope, fd.name());
        let full_name = self.full_name(&long_name);

        Extension {
            name: fd.name().to_string(),
            description: self.describe_path(path),
            label: label_name(fd.label(), self.syntax, fd.proto3_optional()),
            type_name: ty.short,
            long_type: ty.long,
            full_type: ty.full,
            number: fd.number(),
            default_value: fd.default_value().to_string(),
            containing_type: extendee.short,
            containing_long_type: extendee.long,
            containing_full_type: extendee.full,
            options: self.options.resolve(
                OptionCarrier::Field(fd.options.as_ref()),
                Declaration::Extension(&full_name),
            ),
            long_name,
            full_name,
        }
    }

    /// Parses the `index`th extension declared inside a message
    pub fn parse_message_extension(
        &self,
        scope: &WalkedMessage<'_>,
        index: usize,
        fd: &FieldDescriptorProto,
    ) -> MessageExtension {
        let path = child_path(&scope.path, PathKind::MessageExtension, index);
        let scope_long = scope.long_name();
        MessageExtension {
            extension: self.parse_extension(&path, &scope_long, fd),
            scope_type: scope.descriptor.name().to_string(),
            scope_full_type: self.full_name(&scope_long),
            scope_long_type: scope_long,
        }
    }

    /// Parses the `index`th service of the file
    pub fn parse_service(&self, index: usize, desc: &ServiceDescriptorProto) -> Service {
        let path = child_path(&[], PathKind::FileService, index);
        let full_name = self.full_name(desc.name());

        let methods = desc
            .method
            .iter()
            .enumerate()
            .map(|(i, method)| self.parse_method(&full_name, &path, i, method))
            .collect();

        let source = self.locator.locate(path);
        Service {
            name: desc.name().to_string(),
            long_name: desc.name().to_string(),
            description: self.describe(&source),
            methods,
            options: self.options.resolve(
                OptionCarrier::Service(desc.options.as_ref()),
                Declaration::Service(&full_name),
            ),
            full_name,
            source,
        }
    }

    /// Parses one service method
    pub fn parse_method(
        &self,
        service_full_name: &str,
        service_path: &[i32],
        index: usize,
        desc: &MethodDescriptorProto,
    ) -> ServiceMethod {
        let request = TypeRef::named(desc.input_type().trim_start_matches('.'), self.package);
        let response = TypeRef::named(desc.output_type().trim_start_matches('.'), self.package);

        ServiceMethod {
            name: desc.name().to_string(),
            description: self.describe_path(&child_path(service_path, PathKind::Method, index)),
            request_type: request.short,
            request_long_type: request.long,
            request_full_type: request.full,
            request_streaming: desc.client_streaming(),
            response_type: response.short,
            response_long_type: response.long,
            response_full_type: response.full,
            response_streaming: desc.server_streaming(),
            options: self.options.resolve(
                OptionCarrier::Method(desc.options.as_ref()),
                Declaration::Method {
                    service: service_full_name,
                    name: desc.name(),
                },
            ),
        }
    }
}

/// Index of the oneof a field belongs to; proto3 `optional` fields are plain
fn oneof_membership(fd: &FieldDescriptorProto) -> Option<i32> {
    fd.oneof_index.filter(|_| !fd.proto3_optional())
}

fn oneof_name(decls: &[OneofDescriptorProto], index: i32) -> String {
    usize::try_from(index)
        .ok()
        .and_then(|i| decls.get(i))
        .map(|d| d.name().to_string())
        .unwrap_or_default()
}
