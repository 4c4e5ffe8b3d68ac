//! Descriptor fixtures for unit tests.

use prost::encoding::{encode_key, encode_varint, WireType};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::source_code_info::Location;
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto, SourceCodeInfo,
};

pub(crate) fn file(name: &str, package: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: (!package.is_empty()).then(|| package.to_string()),
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

pub(crate) fn proto2_file(name: &str, package: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        syntax: Some("proto2".to_string()),
        ..file(name, package)
    }
}

pub(crate) fn with_locations(
    mut f: FileDescriptorProto,
    locations: Vec<Location>,
) -> FileDescriptorProto {
    f.source_code_info = Some(SourceCodeInfo { location: locations });
    f
}

pub(crate) fn location(path: &[i32], span: &[i32], leading: &str, trailing: &str) -> Location {
    Location {
        path: path.to_vec(),
        span: span.to_vec(),
        leading_comments: (!leading.is_empty()).then(|| leading.to_string()),
        trailing_comments: (!trailing.is_empty()).then(|| trailing.to_string()),
        leading_detached_comments: Vec::new(),
    }
}

pub(crate) fn comment(path: &[i32], leading: &str) -> Location {
    location(path, &[0, 0, 1], leading, "")
}

pub(crate) fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub(crate) fn map_entry(name: &str, key: Type, value: Type) -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..message(
            name,
            vec![
                scalar("key", 1, Label::Optional, key),
                scalar("value", 2, Label::Optional, value),
            ],
        )
    }
}

pub(crate) fn scalar(name: &str, number: i32, label: Label, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        json_name: Some(name.to_string()),
        ..Default::default()
    }
}

pub(crate) fn named(
    name: &str,
    number: i32,
    label: Label,
    ty: Type,
    type_name: &str,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, label, ty)
    }
}

pub(crate) fn in_oneof(mut field: FieldDescriptorProto, index: i32) -> FieldDescriptorProto {
    field.oneof_index = Some(index);
    field
}

pub(crate) fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_string()),
        options: None,
    }
}

pub(crate) fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(value, number)| EnumValueDescriptorProto {
                name: Some(value.to_string()),
                number: Some(*number),
                options: None,
            })
            .collect(),
        ..Default::default()
    }
}

pub(crate) fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method: methods,
        options: None,
    }
}

pub(crate) fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

fn length_delimited(tag: u32, payload: &[u8], buf: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(payload.len() as u64, buf);
    buf.extend_from_slice(payload);
}

/// Encoded `FileDescriptorSet` holding `google/protobuf/descriptor.proto` and
/// `acme/audit.proto`, which declares
/// `extend google.protobuf.MessageOptions { optional bool audit = 50001; }`
/// and the messages `Plain` and `Audited`, the latter with `audit = true`.
///
/// The extension is written as raw wire bytes since `prost_types` has no
/// field for it.
pub(crate) fn audited_descriptor_set() -> Vec<u8> {
    let descriptor_proto = DescriptorPool::global()
        .get_file_by_name("google/protobuf/descriptor.proto")
        .expect("descriptor.proto in the global pool")
        .file_descriptor_proto()
        .encode_to_vec();

    let mut audit = scalar("audit", 50001, Label::Optional, Type::Bool);
    audit.extendee = Some(".google.protobuf.MessageOptions".to_string());
    let mut f = proto2_file("acme/audit.proto", "acme");
    f.dependency.push("google/protobuf/descriptor.proto".to_string());
    f.extension.push(audit);
    f.message_type.push(message("Plain", vec![]));
    let mut file_bytes = f.encode_to_vec();

    let mut options = Vec::new();
    encode_key(50001, WireType::Varint, &mut options);
    encode_varint(1, &mut options);
    let mut audited = message("Audited", vec![]).encode_to_vec();
    // DescriptorProto.options
    length_delimited(7, &options, &mut audited);
    // FileDescriptorProto.message_type
    length_delimited(4, &audited, &mut file_bytes);

    let mut set = Vec::new();
    length_delimited(1, &descriptor_proto, &mut set);
    length_delimited(1, &file_bytes, &mut set);
    set
}
