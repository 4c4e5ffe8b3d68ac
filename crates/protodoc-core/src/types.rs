//! Type name resolution and field labels.

use crate::descriptor::ProtoSyntax;
use prost_types::field_descriptor_proto::{Label, Type};

/// Suffix protoc gives to synthesized map entry messages
pub const MAP_ENTRY_SUFFIX: &str = "Entry";

/// The three spellings of a referenced type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRef {
    /// Last dot-delimited segment, e.g. `Entry`
    pub short: String,
    /// Name relative to the enclosing package, e.g. `Outer.Entry`
    pub long: String,
    /// Fully-qualified name without the leading dot, e.g. `pkg.Outer.Entry`
    pub full: String,
}

impl TypeRef {
    /// Resolves a declared type reference.
    ///
    /// Names starting with `.` are fully-qualified message or enum
    /// references; anything else is described by its scalar `kind`.
    pub fn resolve(type_name: &str, kind: Type, package: &str) -> Self {
        match type_name.strip_prefix('.') {
            Some(full) => Self::named(full, package),
            None => Self::scalar(kind),
        }
    }

    /// Builds the triple for a fully-qualified name (no leading dot)
    pub fn named(full: &str, package: &str) -> Self {
        let long = if package.is_empty() {
            full
        } else {
            full.strip_prefix(package)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(full)
        };
        Self {
            short: base_name(full).to_string(),
            long: long.to_string(),
            full: full.to_string(),
        }
    }

    /// Builds the triple for a scalar kind, e.g. `int32` three times
    pub fn scalar(kind: Type) -> Self {
        let name = scalar_name(kind);
        Self {
            short: name.clone(),
            long: name.clone(),
            full: name,
        }
    }

    /// Returns true if all three spellings look like a synthesized map entry
    pub fn looks_like_map_entry(&self) -> bool {
        self.long.contains('.')
            && self.short.ends_with(MAP_ENTRY_SUFFIX)
            && self.long.ends_with(MAP_ENTRY_SUFFIX)
            && self.full.ends_with(MAP_ENTRY_SUFFIX)
    }
}

/// Returns the last dot-delimited segment of a name
pub fn base_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Joins a scope and a name with a dot, skipping an empty scope
pub fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

/// Lower-cased scalar keyword for a field type, e.g. `TYPE_INT32` -> `int32`
pub fn scalar_name(kind: Type) -> String {
    let name = kind.as_str_name();
    name.strip_prefix("TYPE_").unwrap_or(name).to_ascii_lowercase()
}

/// Computes the documented label of a field or extension.
///
/// Proto3 fields only show `repeated`, or `optional` when they track
/// presence explicitly. Other syntaxes always show the wire label.
pub fn label_name(label: Label, syntax: ProtoSyntax, proto3_optional: bool) -> String {
    if syntax == ProtoSyntax::Proto3 && !proto3_optional && label != Label::Repeated {
        return String::new();
    }
    let name = label.as_str_name();
    name.strip_prefix("LABEL_").unwrap_or(name).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_named_type() {
        let t = TypeRef::resolve(".pkg.sub.Outer.Inner", Type::Message, "pkg.sub");
        assert_eq!(t.short, "Inner");
        assert_eq!(t.long, "Outer.Inner");
        assert_eq!(t.full, "pkg.sub.Outer.Inner");
    }

    #[test]
    fn test_resolve_type_from_other_package() {
        let t = TypeRef::resolve(".google.protobuf.Timestamp", Type::Message, "pkg");
        assert_eq!(t.short, "Timestamp");
        assert_eq!(t.long, "google.protobuf.Timestamp");
        assert_eq!(t.full, "google.protobuf.Timestamp");
    }

    #[test]
    fn test_resolve_does_not_strip_partial_package_segment() {
        let t = TypeRef::resolve(".pkgextra.Thing", Type::Enum, "pkg");
        assert_eq!(t.long, "pkgextra.Thing");
    }

    #[test]
    fn test_resolve_without_package() {
        let t = TypeRef::resolve(".Thing", Type::Message, "");
        assert_eq!(t, TypeRef::named("Thing", ""));
        assert_eq!(t.long, "Thing");
        assert_eq!(t.full, "Thing");
    }

    #[test]
    fn test_resolve_scalar() {
        for (kind, name) in [(Type::Int32, "int32"), (Type::Bool, "bool"), (Type::Bytes, "bytes")] {
            let t = TypeRef::resolve("", kind, "pkg");
            assert_eq!(t.short, name);
            assert_eq!(t.long, name);
            assert_eq!(t.full, name);
        }
    }

    #[test]
    fn test_looks_like_map_entry() {
        assert!(TypeRef::named("pkg.M.EntriesEntry", "pkg").looks_like_map_entry());
        // top-level messages never count, there is no nesting separator
        assert!(!TypeRef::named("pkg.LogEntry", "pkg").looks_like_map_entry());
        assert!(!TypeRef::named("pkg.M.Entries", "pkg").looks_like_map_entry());
    }

    #[test]
    fn test_label_name() {
        assert_eq!(label_name(Label::Optional, ProtoSyntax::Proto3, false), "");
        assert_eq!(label_name(Label::Optional, ProtoSyntax::Proto3, true), "optional");
        assert_eq!(label_name(Label::Repeated, ProtoSyntax::Proto3, false), "repeated");
        assert_eq!(label_name(Label::Optional, ProtoSyntax::Proto2, false), "optional");
        assert_eq!(label_name(Label::Required, ProtoSyntax::Proto2, false), "required");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("", "M"), "M");
        assert_eq!(qualify("pkg", "M"), "pkg.M");
    }
}
