//! Source location lookup.
//!
//! A file's `SourceCodeInfo` is a flat list of locations, each addressed by a
//! path vector: pairs of `(field number, index)` walking from the
//! `FileDescriptorProto` root down to the declaration. Comments and line
//! spans are recovered by matching a declaration's path exactly against
//! that list.

use prost_types::source_code_info::Location;
use prost_types::FileDescriptorProto;
use serde::Serialize;
use tracing::trace;

/// Declaration kinds that contribute a step to a path vector.
///
/// Each kind maps to the field number of the repeated field holding that
/// declaration in its parent descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `FileDescriptorProto.message_type`
    FileMessage,
    /// `FileDescriptorProto.enum_type`
    FileEnum,
    /// `FileDescriptorProto.service`
    FileService,
    /// `FileDescriptorProto.extension`
    FileExtension,
    /// `DescriptorProto.field`
    Field,
    /// `DescriptorProto.nested_type`
    NestedMessage,
    /// `DescriptorProto.enum_type`
    NestedEnum,
    /// `DescriptorProto.extension`
    MessageExtension,
    /// `DescriptorProto.oneof_decl`
    Oneof,
    /// `EnumDescriptorProto.value`
    EnumValue,
    /// `ServiceDescriptorProto.method`
    Method,
}

impl PathKind {
    /// Returns the descriptor field number for this kind
    pub const fn field_number(self) -> i32 {
        match self {
            PathKind::FileMessage => 4,
            PathKind::FileEnum => 5,
            PathKind::FileService => 6,
            PathKind::FileExtension => 7,
            PathKind::Field => 2,
            PathKind::NestedMessage => 3,
            PathKind::NestedEnum => 4,
            PathKind::MessageExtension => 6,
            PathKind::Oneof => 8,
            PathKind::EnumValue => 2,
            PathKind::Method => 2,
        }
    }
}

/// Path of the `syntax` statement, which carries the file-level comment
pub const SYNTAX_PATH: &[i32] = &[12];

/// Extends `parent` with one `[field number, index]` step
pub fn child_path(parent: &[i32], kind: PathKind, index: usize) -> Vec<i32> {
    let mut path = Vec::with_capacity(parent.len() + 2);
    path.extend_from_slice(parent);
    path.push(kind.field_number());
    path.push(index as i32);
    path
}

/// Returns the first location whose path equals `path` element-wise
pub fn match_location<'a>(locations: &'a [Location], path: &[i32]) -> Option<&'a Location> {
    locations.iter().find(|loc| loc.path.as_slice() == path)
}

/// Where a declaration lives in its file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Name of the file containing the declaration
    pub file: String,
    /// Path vector of the declaration
    pub path: Vec<i32>,
    /// 1-based first line, 0 when unknown
    pub start: i32,
    /// 1-based last line, 0 when unknown.
    ///
    /// A three-element span covers a single line, so `end` equals `start`
    /// there; the third element is the end column, not a line.
    pub end: i32,
    #[serde(skip)]
    leading_comments: String,
    #[serde(skip)]
    trailing_comments: String,
}

impl Source {
    /// Leading comment text, trimmed
    pub fn leading_comments(&self) -> &str {
        &self.leading_comments
    }

    /// Trailing comment text, trimmed
    pub fn trailing_comments(&self) -> &str {
        &self.trailing_comments
    }

    /// Joins the non-empty leading and trailing comments with `separator`
    pub fn joined_comments(&self, separator: &str) -> String {
        [self.leading_comments.as_str(), self.trailing_comments.as_str()]
            .iter()
            .filter(|c| !c.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Returns true if no location record matched this declaration
    pub fn is_unmatched(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// Looks up source locations for one file.
#[derive(Debug, Clone, Copy)]
pub struct SourceLocator<'a> {
    file: &'a str,
    locations: &'a [Location],
}

impl<'a> SourceLocator<'a> {
    /// Creates a locator over the file's source code info
    pub fn new(file: &'a FileDescriptorProto) -> Self {
        let locations = file
            .source_code_info
            .as_ref()
            .map(|info| info.location.as_slice())
            .unwrap_or(&[]);
        Self {
            file: file.name(),
            locations,
        }
    }

    /// Returns the source for `path`, or `None` if no location matches
    pub fn match_location(&self, path: &[i32]) -> Option<Source> {
        let loc = match_location(self.locations, path)?;
        let (start, end) = line_span(&loc.span);
        Some(Source {
            file: self.file.to_string(),
            path: path.to_vec(),
            start,
            end,
            leading_comments: loc.leading_comments().trim().to_string(),
            trailing_comments: loc.trailing_comments().trim().to_string(),
        })
    }

    /// Returns the source for `path`, empty apart from file and path when unmatched
    pub fn locate(&self, path: Vec<i32>) -> Source {
        match self.match_location(&path) {
            Some(source) => source,
            None => {
                trace!("no source location for {:?} in {}", path, self.file);
                Source {
                    file: self.file.to_string(),
                    path,
                    ..Source::default()
                }
            }
        }
    }
}

/// Converts a location span into 1-based start and end lines.
///
/// Spans are `[start line, start col, end line, end col]`, or three elements
/// when the declaration starts and ends on the same line.
fn line_span(span: &[i32]) -> (i32, i32) {
    match *span {
        [start, _, end, _] => (start + 1, end + 1),
        [start, _, _] => (start + 1, start + 1),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{file, location};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_child_path() {
        let message = child_path(&[], PathKind::FileMessage, 1);
        assert_eq!(message, vec![4, 1]);
        let nested = child_path(&message, PathKind::NestedMessage, 0);
        assert_eq!(nested, vec![4, 1, 3, 0]);
        assert_eq!(child_path(&nested, PathKind::Oneof, 2), vec![4, 1, 3, 0, 8, 2]);
    }

    #[test]
    fn test_match_location_is_exact() {
        let mut f = file("a.proto", "pkg");
        f.source_code_info = Some(prost_types::SourceCodeInfo {
            location: vec![
                location(&[4, 0], &[3, 0, 9, 1], "outer", ""),
                location(&[4, 0, 2, 0], &[4, 2, 20], "field", "trailing"),
            ],
        });
        let locator = SourceLocator::new(&f);

        let field = locator.match_location(&[4, 0, 2, 0]).unwrap();
        assert_eq!(field.start, 5);
        assert_eq!(field.end, 5);
        assert_eq!(field.leading_comments(), "field");
        assert_eq!(field.trailing_comments(), "trailing");

        let outer = locator.match_location(&[4, 0]).unwrap();
        assert_eq!((outer.start, outer.end), (4, 10));

        assert!(locator.match_location(&[4]).is_none());
        assert!(locator.match_location(&[4, 0, 2]).is_none());
    }

    #[test]
    fn test_locate_without_source_info() {
        let f = file("empty.proto", "");
        let source = SourceLocator::new(&f).locate(vec![5, 0]);
        assert_eq!(source.file, "empty.proto");
        assert_eq!(source.path, vec![5, 0]);
        assert!(source.is_unmatched());
        assert_eq!(source.joined_comments("\n\n"), "");
    }

    #[test]
    fn test_joined_comments() {
        let mut f = file("a.proto", "");
        f.source_code_info = Some(prost_types::SourceCodeInfo {
            location: vec![
                location(&[4, 0, 8, 0], &[1, 0, 5, 1], " lead\n", " trail "),
                location(&[4, 0, 8, 1], &[6, 0, 7, 1], "", " only trail\n"),
            ],
        });
        let locator = SourceLocator::new(&f);
        assert_eq!(locator.locate(vec![4, 0, 8, 0]).joined_comments("\n\n"), "lead\n\ntrail");
        assert_eq!(locator.locate(vec![4, 0, 8, 1]).joined_comments("\n\n"), "only trail");
    }
}
