//! The documentation model.
//!
//! Files guarantee that their top-level enums, extensions, messages and
//! services are sorted by long name; packages sort their aggregates by full
//! name. Enum values, fields, oneof members and methods keep declaration
//! order.
//!
//! Serialized key names are stable and consumed by output templates.

mod link;
mod scalar;

pub use link::{Link, LinkTable};
pub use scalar::{scalar_values, ScalarValue};

use crate::builder::ModelBuilder;
use crate::descriptor::DescriptorSet;
use crate::options::OptionMap;
use crate::source::Source;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Option lookup shared by every model node
pub trait OptionLookup {
    /// The merged options, `None` when no option applies
    fn options(&self) -> Option<&OptionMap>;

    /// Returns the named option
    fn option(&self, name: &str) -> Option<&Value> {
        self.options()?.get(name)
    }

    /// Returns true if the named option is set
    fn has_option(&self, name: &str) -> bool {
        self.option(name).is_some()
    }
}

macro_rules! impl_option_lookup {
    ($($node:ty),* $(,)?) => {
        $(
            impl OptionLookup for $node {
                fn options(&self) -> Option<&OptionMap> {
                    self.options.as_ref()
                }
            }
        )*
    };
}

impl_option_lookup!(File, Message, Field, Enum, EnumValue, Service, ServiceMethod, Extension);

impl OptionLookup for MessageExtension {
    fn options(&self) -> Option<&OptionMap> {
        self.extension.options.as_ref()
    }
}

/// Sorted, de-duplicated option names used across `items`
fn option_names<'a, T: OptionLookup + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<&'a str> {
    items
        .into_iter()
        .filter_map(|item| item.options())
        .flat_map(|options| options.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The members of `items` carrying the named option
fn with_option<'a, T: OptionLookup>(items: &'a [T], name: &str) -> Vec<&'a T> {
    items.iter().filter(|item| item.has_option(name)).collect()
}

/// The finished documentation model.
///
/// Built once from a descriptor set and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    files: Vec<File>,
    #[serde(rename = "scalarValueTypes")]
    scalars: Vec<ScalarValue>,
    packages: Vec<Package>,
    #[serde(skip)]
    links: LinkTable,
}

impl Model {
    /// Builds a model from every target of `set` with the default configuration
    pub fn from_descriptor_set(set: &DescriptorSet) -> Self {
        ModelBuilder::default().build(set)
    }

    pub(crate) fn new(files: Vec<File>, packages: Vec<Package>) -> Self {
        let links = LinkTable::from_packages(&packages);
        Self {
            files,
            scalars: scalar_values(),
            packages,
            links,
        }
    }

    /// Documented files, in input order
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Returns the documented file with the given name
    pub fn file(&self, name: &str) -> Option<&File> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Packages sorted by name
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Returns the package with the given name; the empty name is valid
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// The protobuf scalar types
    pub fn scalars(&self) -> &[ScalarValue] {
        &self.scalars
    }

    /// Cross-reference link of a message or enum defined in the model
    pub fn link(&self, full_name: &str) -> Option<&Link> {
        self.links.get(full_name)
    }

    /// Like [`Model::link`], falling back to external well-known type links
    pub fn resolve_link(&self, full_name: &str) -> Option<Link> {
        self.links.resolve(full_name)
    }

    /// The whole cross-reference table
    pub fn links(&self) -> &LinkTable {
        &self.links
    }
}

fn listed<S: Serializer>(messages: &[Message], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(messages.iter().filter(|m| !m.internal))
}

/// A documented `.proto` file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// File name as given to protoc, e.g. `acme/v1/orders.proto`
    pub name: String,
    /// Comment attached to the syntax statement
    pub description: String,
    /// Declared package, empty when none
    pub package: String,

    /// True if the file declares top-level enums
    pub has_enums: bool,
    /// True if the file declares top-level extensions
    pub has_extensions: bool,
    /// True if the file declares top-level messages
    pub has_messages: bool,
    /// True if the file declares services
    pub has_services: bool,

    /// Every enum in the file, nested ones included
    pub enums: Vec<Enum>,
    /// Top-level extensions
    pub extensions: Vec<Extension>,
    /// Every message in the file, nested and map entries included
    #[serde(serialize_with = "listed")]
    pub messages: Vec<Message>,
    /// Services
    pub services: Vec<Service>,

    /// File options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

impl File {
    /// Messages to document on their own, skipping synthesized map entries
    pub fn listed_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(|m| !m.internal)
    }
}

/// Declarations of every file sharing one package name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    /// Package name, empty for files without a package
    pub name: String,
    /// Services sorted by full name
    pub services: Vec<Service>,
    /// Messages sorted by full name
    #[serde(serialize_with = "listed")]
    pub messages: Vec<Message>,
    /// Enums sorted by full name
    pub enums: Vec<Enum>,
    /// Descriptions of the contributing files that have one
    pub descriptions: Vec<PackageDescription>,
}

impl Package {
    /// Messages to document on their own, skipping synthesized map entries
    pub fn listed_messages(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(|m| !m.internal)
    }
}

/// One file's contribution to a package description
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescription {
    /// Contributing file
    pub file: String,
    /// Its description
    pub description: String,
}

/// A message declaration.
///
/// In proto3 files `has_extensions` is always false.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Declared name
    pub name: String,
    /// Name within the package, e.g. `Outer.Inner`
    pub long_name: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Leading and trailing comments
    pub description: String,

    /// True if the message declares extensions
    pub has_extensions: bool,
    /// True if the message declares any field, oneof members included
    pub has_fields: bool,
    /// True if the message has at least one oneof
    pub has_oneofs: bool,

    /// Extensions declared inside the message
    pub extensions: Vec<MessageExtension>,
    /// Fields outside any oneof, in declaration order
    pub fields: Vec<Field>,
    /// Oneofs in first-seen order
    #[serde(rename = "oneofs")]
    pub one_ofs: Vec<OneOf>,

    /// Message options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,

    /// Location in the file
    pub source: Source,

    /// Set on synthesized map entries, which are not documented on their own
    #[serde(skip)]
    pub internal: bool,
}

impl Message {
    /// Sorted names of every option set on the message's plain fields
    pub fn field_options(&self) -> Vec<&str> {
        option_names(&self.fields)
    }

    /// Plain fields carrying the named option
    pub fn fields_with_option(&self, name: &str) -> Vec<&Field> {
        with_option(&self.fields, name)
    }

    /// Plain fields followed by every oneof member
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.fields
            .iter()
            .chain(self.one_ofs.iter().flat_map(|o| o.fields.iter()))
    }

    /// Returns the named field, searching oneof members too
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.all_fields().find(|f| f.name == name)
    }
}

/// A message field.
///
/// In proto3 files the label is empty unless the field is repeated or
/// declared `optional`, and the default value is always empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Field number
    pub number: i32,
    /// Declared name
    pub name: String,
    /// Leading and trailing comments
    pub description: String,
    /// `repeated`, `optional`, `required` or empty
    pub label: String,
    /// Short type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Package-relative type name
    pub long_type: String,
    /// Fully-qualified type name
    pub full_type: String,
    /// True if the field is a map
    #[serde(rename = "ismap")]
    pub is_map: bool,
    /// Full type of the map key, set once the entry message is resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_key_type: Option<String>,
    /// Full type of the map value, set once the entry message is resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_value_type: Option<String>,
    /// True if the field is a member of a oneof
    #[serde(rename = "isoneof")]
    pub is_oneof: bool,
    /// Name of the owning oneof, empty otherwise
    #[serde(rename = "oneofdecl")]
    pub oneof_decl: String,
    /// Proto2 default value
    pub default_value: String,

    /// Field options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// A oneof and its members
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OneOf {
    /// Declared name
    pub name: String,
    /// Leading and trailing comments, separated by a blank line
    pub description: String,
    /// Members in declaration order
    pub fields: Vec<Field>,
    /// Location in the file
    pub source: Source,
}

/// An enum, top-level or nested
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enum {
    /// Declared name
    pub name: String,
    /// Name within the package
    pub long_name: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Leading and trailing comments
    pub description: String,
    /// Values in declaration order
    pub values: Vec<EnumValue>,

    /// Enum options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,

    /// Location in the file
    pub source: Source,
}

impl Enum {
    /// Sorted names of every option set on the enum's values
    pub fn value_options(&self) -> Vec<&str> {
        option_names(&self.values)
    }

    /// Values carrying the named option
    pub fn values_with_option(&self, name: &str) -> Vec<&EnumValue> {
        with_option(&self.values, name)
    }
}

/// One value of an enum
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    /// Declared name
    pub name: String,
    /// Signed number rendered as a string
    pub number: String,
    /// Leading and trailing comments
    pub description: String,

    /// Value options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// A service declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Declared name
    pub name: String,
    /// Name within the package
    pub long_name: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Leading and trailing comments
    pub description: String,
    /// Methods in declaration order
    pub methods: Vec<ServiceMethod>,

    /// Service options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,

    /// Location in the file
    pub source: Source,
}

impl Service {
    /// Sorted names of every option set on the service's methods
    pub fn method_options(&self) -> Vec<&str> {
        option_names(&self.methods)
    }

    /// Methods carrying the named option
    pub fn methods_with_option(&self, name: &str) -> Vec<&ServiceMethod> {
        with_option(&self.methods, name)
    }
}

/// An RPC method
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMethod {
    /// Declared name
    pub name: String,
    /// Leading and trailing comments
    pub description: String,
    /// Short request type name
    pub request_type: String,
    /// Package-relative request type name
    pub request_long_type: String,
    /// Fully-qualified request type name
    pub request_full_type: String,
    /// True for client streaming
    pub request_streaming: bool,
    /// Short response type name
    pub response_type: String,
    /// Package-relative response type name
    pub response_long_type: String,
    /// Fully-qualified response type name
    pub response_full_type: String,
    /// True for server streaming
    pub response_streaming: bool,

    /// Method options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// A file-scoped (proto2) extension
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    /// Declared name
    pub name: String,
    /// Name within the package
    pub long_name: String,
    /// Fully-qualified name
    pub full_name: String,
    /// Leading and trailing comments
    pub description: String,
    /// Documented label
    pub label: String,
    /// Short type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Package-relative type name
    pub long_type: String,
    /// Fully-qualified type name
    pub full_type: String,
    /// Extension field number
    pub number: i32,
    /// Proto2 default value
    pub default_value: String,
    /// Short name of the extended message
    pub containing_type: String,
    /// Package-relative name of the extended message
    pub containing_long_type: String,
    /// Fully-qualified name of the extended message
    pub containing_full_type: String,

    /// Extension field options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionMap>,
}

/// An extension declared inside a message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageExtension {
    /// The extension itself
    #[serde(flatten)]
    pub extension: Extension,
    /// Short name of the scoping message
    pub scope_type: String,
    /// Package-relative name of the scoping message
    pub scope_long_type: String,
    /// Fully-qualified name of the scoping message
    pub scope_full_type: String,
}
