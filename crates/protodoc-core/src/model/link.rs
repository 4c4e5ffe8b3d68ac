//! Cross-reference links between type mentions and their definitions.

use super::Package;
use crate::types::base_name;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Reference page for the `google.protobuf` well-known types
const WELL_KNOWN_TYPES_HREF: &str = "https://protobuf.dev/reference/protobuf/google.protobuf/";

/// Well-known type name to its anchor on the reference page
const WELL_KNOWN_TYPES: &[(&str, &str)] = &[
    ("Any", "any"),
    ("Api", "api"),
    ("BoolValue", "bool-value"),
    ("BytesValue", "bytes-value"),
    ("Cardinality", "cardinality"),
    ("DoubleValue", "double-value"),
    ("Duration", "duration"),
    ("Empty", "empty"),
    ("Enum", "enum"),
    ("EnumValue", "enum-value"),
    ("Field", "field"),
    ("FieldMask", "field-mask"),
    ("FloatValue", "float-value"),
    ("Int32Value", "int32-value"),
    ("Int64Value", "int64-value"),
    ("Kind", "kind"),
    ("ListValue", "list-value"),
    ("Method", "method"),
    ("Mixin", "mixin"),
    ("NullValue", "null-value"),
    ("Option", "option"),
    ("SourceContext", "source-context"),
    ("StringValue", "string-value"),
    ("Struct", "struct"),
    ("Syntax", "syntax"),
    ("Timestamp", "timestamp"),
    ("Type", "type"),
    ("UInt32Value", "uint32-value"),
    ("UInt64Value", "uint64-value"),
    ("Value", "value"),
];

/// Where a type mention should point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Package defining the type, empty for external links
    pub package: String,
    /// Fully-qualified type name
    pub full_name: String,
    /// True if the type is documented outside the model
    pub external: bool,
    /// Target of an external link
    #[serde(rename = "externalHREF")]
    pub external_href: String,
}

impl Link {
    /// Link to a type defined in the model
    pub fn internal(package: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            full_name: full_name.into(),
            external: false,
            external_href: String::new(),
        }
    }

    /// Link to a type documented elsewhere
    pub fn external(full_name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            package: String::new(),
            full_name: full_name.into(),
            external: true,
            external_href: href.into(),
        }
    }
}

/// Fully-qualified message and enum names to their defining package.
///
/// Built once from the assembled packages and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: BTreeMap<String, Link>,
}

impl LinkTable {
    /// Registers every message and enum of the given packages
    pub(crate) fn from_packages(packages: &[Package]) -> Self {
        let mut links = BTreeMap::new();
        for pkg in packages {
            let names = pkg
                .messages
                .iter()
                .map(|m| &m.full_name)
                .chain(pkg.enums.iter().map(|e| &e.full_name));
            for full_name in names {
                if links.contains_key(full_name) {
                    warn!("duplicate definition of {}, keeping the first", full_name);
                    continue;
                }
                links.insert(full_name.clone(), Link::internal(&pkg.name, full_name));
            }
        }
        Self { links }
    }

    /// Returns the link registered for a fully-qualified name
    pub fn get(&self, full_name: &str) -> Option<&Link> {
        self.links.get(full_name)
    }

    /// Returns the registered link, or an external one for well-known types
    pub fn resolve(&self, full_name: &str) -> Option<Link> {
        if let Some(link) = self.get(full_name) {
            return Some(link.clone());
        }
        let name = full_name.strip_prefix("google.protobuf.")?;
        let anchor = WELL_KNOWN_TYPES
            .iter()
            .find(|(wkt, _)| *wkt == base_name(name))
            .map(|(_, anchor)| *anchor)?;
        Some(Link::external(
            full_name,
            format!("{}#{}", WELL_KNOWN_TYPES_HREF, anchor),
        ))
    }

    /// Returns true if the name is registered
    pub fn contains(&self, full_name: &str) -> bool {
        self.links.contains_key(full_name)
    }

    /// Registered links, ordered by full name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Link)> + '_ {
        self.links.iter().map(|(name, link)| (name.as_str(), link))
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_well_known_type() {
        let table = LinkTable::default();
        let link = table.resolve("google.protobuf.Timestamp").unwrap();
        assert!(link.external);
        assert_eq!(
            link.external_href,
            "https://protobuf.dev/reference/protobuf/google.protobuf/#timestamp"
        );
        let nested = table.resolve("google.protobuf.Field.Cardinality").unwrap();
        assert!(nested.external_href.ends_with("#cardinality"));

        assert_eq!(table.resolve("google.protobuf.NotAType"), None);
        assert_eq!(table.resolve("pkg.Timestamp"), None);
    }

    #[test]
    fn test_registered_link_wins() {
        let pkg = Package {
            name: "google.protobuf".to_string(),
            ..Default::default()
        };
        let mut table = LinkTable::from_packages(&[pkg]);
        assert!(table.is_empty());
        table.links.insert(
            "google.protobuf.Empty".to_string(),
            Link::internal("google.protobuf", "google.protobuf.Empty"),
        );
        assert_eq!(
            table.resolve("google.protobuf.Empty"),
            Some(Link::internal("google.protobuf", "google.protobuf.Empty"))
        );
    }
}
