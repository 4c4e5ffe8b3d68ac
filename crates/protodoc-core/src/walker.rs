//! Nested declaration traversal.
//!
//! Flattens a file's message tree into pre-order lists of messages and
//! enums, computing each declaration's path vector and enclosing scope on
//! the way down.

use crate::source::{child_path, PathKind};
use crate::types::qualify;
use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};

/// A message reached by the walk
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedMessage<'a> {
    /// Path vector relative to the file root
    pub path: Vec<i32>,
    /// Dotted long name of the enclosing message, empty at top level
    pub scope: String,
    /// The declaration
    pub descriptor: &'a DescriptorProto,
}

impl WalkedMessage<'_> {
    /// Name within the package, e.g. `Outer.Inner`
    pub fn long_name(&self) -> String {
        qualify(&self.scope, self.descriptor.name())
    }
}

/// An enum reached by the walk
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedEnum<'a> {
    /// Path vector relative to the file root
    pub path: Vec<i32>,
    /// Dotted long name of the enclosing message, empty at top level
    pub scope: String,
    /// The declaration
    pub descriptor: &'a EnumDescriptorProto,
}

impl WalkedEnum<'_> {
    /// Name within the package
    pub fn long_name(&self) -> String {
        qualify(&self.scope, self.descriptor.name())
    }
}

/// Flattened declarations of one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Walk<'a> {
    /// Every message, each before its nested messages
    pub messages: Vec<WalkedMessage<'a>>,
    /// Top-level enums followed by nested enums in message pre-order
    pub enums: Vec<WalkedEnum<'a>>,
}

/// Walks every message of `file`, nested ones included
pub fn walk(file: &FileDescriptorProto) -> Walk<'_> {
    let mut out = Walk {
        messages: Vec::new(),
        enums: file
            .enum_type
            .iter()
            .enumerate()
            .map(|(i, descriptor)| WalkedEnum {
                path: child_path(&[], PathKind::FileEnum, i),
                scope: String::new(),
                descriptor,
            })
            .collect(),
    };

    // pushed in reverse so siblings pop in declaration order
    let mut stack: Vec<WalkedMessage<'_>> = file
        .message_type
        .iter()
        .enumerate()
        .rev()
        .map(|(i, descriptor)| WalkedMessage {
            path: child_path(&[], PathKind::FileMessage, i),
            scope: String::new(),
            descriptor,
        })
        .collect();

    while let Some(current) = stack.pop() {
        let scope = current.long_name();
        for (j, descriptor) in current.descriptor.enum_type.iter().enumerate() {
            out.enums.push(WalkedEnum {
                path: child_path(&current.path, PathKind::NestedEnum, j),
                scope: scope.clone(),
                descriptor,
            });
        }
        for (j, descriptor) in current.descriptor.nested_type.iter().enumerate().rev() {
            stack.push(WalkedMessage {
                path: child_path(&current.path, PathKind::NestedMessage, j),
                scope: scope.clone(),
                descriptor,
            });
        }
        out.messages.push(current);
    }

    out
}
