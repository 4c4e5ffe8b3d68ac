//! Option merging.
//!
//! Every documented element carries a single option map assembled from up
//! to three sources, in precedence order:
//!
//! 1. derived built-ins (`deprecated`, method `idempotency_level`)
//! 2. the raw options message projected to JSON through reflection, with
//!    extension keys such as `[acme.audit]` reduced to `acme.audit`
//! 3. values produced by transforms in the [`ExtensionRegistry`]
//!
//! For a key present in several sources the first one wins. An element
//! without any option gets `None`, never an empty map.

mod registry;

pub use registry::{ExtensionRegistry, OptionTransform};

use prost_reflect::{DescriptorPool, DynamicMessage, ReflectMessage};
use prost_types::method_options::IdempotencyLevel;
use prost_types::{
    EnumOptions, EnumValueOptions, FieldOptions, FileOptions, MessageOptions, MethodOptions,
    ServiceOptions,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Option name to value, ordered by name
pub type OptionMap = BTreeMap<String, Value>;

/// Merges option sources; earlier sources win on duplicate keys.
///
/// Returns `None` when no source contributes anything.
pub fn merge_options<I>(sources: I) -> Option<OptionMap>
where
    I: IntoIterator<Item = OptionMap>,
{
    let mut merged = OptionMap::new();
    for source in sources {
        for (key, value) in source {
            merged.entry(key).or_insert(value);
        }
    }
    (!merged.is_empty()).then_some(merged)
}

/// Options messages exposing the common `deprecated` flag
pub trait HasDeprecatedFlag {
    /// Returns true if the element is marked deprecated
    fn is_deprecated(&self) -> bool;
}

macro_rules! impl_has_deprecated_flag {
    ($($options:ty),* $(,)?) => {
        $(
            impl HasDeprecatedFlag for $options {
                fn is_deprecated(&self) -> bool {
                    self.deprecated()
                }
            }
        )*
    };
}

impl_has_deprecated_flag!(
    FileOptions,
    MessageOptions,
    FieldOptions,
    EnumOptions,
    EnumValueOptions,
    ServiceOptions,
    MethodOptions,
);

/// The declared options of one element, keyed by declaration kind
#[derive(Debug, Clone, Copy)]
pub enum OptionCarrier<'a> {
    /// File options
    File(Option<&'a FileOptions>),
    /// Message options
    Message(Option<&'a MessageOptions>),
    /// Field and extension options
    Field(Option<&'a FieldOptions>),
    /// Enum options
    Enum(Option<&'a EnumOptions>),
    /// Enum value options
    EnumValue(Option<&'a EnumValueOptions>),
    /// Service options
    Service(Option<&'a ServiceOptions>),
    /// Method options
    Method(Option<&'a MethodOptions>),
}

impl OptionCarrier<'_> {
    fn is_deprecated(&self) -> bool {
        fn flag<T: HasDeprecatedFlag>(options: Option<&T>) -> bool {
            options.map_or(false, HasDeprecatedFlag::is_deprecated)
        }

        match *self {
            OptionCarrier::File(o) => flag(o),
            OptionCarrier::Message(o) => flag(o),
            OptionCarrier::Field(o) => flag(o),
            OptionCarrier::Enum(o) => flag(o),
            OptionCarrier::EnumValue(o) => flag(o),
            OptionCarrier::Service(o) => flag(o),
            OptionCarrier::Method(o) => flag(o),
        }
    }

    /// Options derived from well-known fields of the options message
    pub fn builtin_options(&self) -> OptionMap {
        let mut out = OptionMap::new();
        if self.is_deprecated() {
            out.insert("deprecated".to_string(), Value::Bool(true));
        }
        if let OptionCarrier::Method(Some(options)) = *self {
            let level = options
                .idempotency_level
                .and_then(|level| IdempotencyLevel::try_from(level).ok());
            if let Some(level) = level {
                out.insert(
                    "idempotency_level".to_string(),
                    Value::String(level.as_str_name().to_string()),
                );
            }
        }
        out
    }
}

/// Addresses an element in the reflection pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration<'a> {
    /// A file, by name
    File(&'a str),
    /// A message, by full name
    Message(&'a str),
    /// A field of a message
    Field {
        /// Full name of the containing message
        message: &'a str,
        /// Field name
        name: &'a str,
    },
    /// An extension, by full name
    Extension(&'a str),
    /// An enum, by full name
    Enum(&'a str),
    /// A value of an enum
    EnumValue {
        /// Full name of the enum
        enumeration: &'a str,
        /// Value name
        name: &'a str,
    },
    /// A service, by full name
    Service(&'a str),
    /// A method of a service
    Method {
        /// Full name of the service
        service: &'a str,
        /// Method name
        name: &'a str,
    },
}

impl Declaration<'_> {
    /// Looks up the element's options message, including extensions
    pub fn options(&self, pool: &DescriptorPool) -> Option<DynamicMessage> {
        match *self {
            Declaration::File(name) => pool.get_file_by_name(name).map(|f| f.options()),
            Declaration::Message(name) => pool.get_message_by_name(name).map(|m| m.options()),
            Declaration::Field { message, name } => pool
                .get_message_by_name(message)?
                .get_field_by_name(name)
                .map(|f| f.options()),
            Declaration::Extension(name) => pool.get_extension_by_name(name).map(|e| e.options()),
            Declaration::Enum(name) => pool.get_enum_by_name(name).map(|e| e.options()),
            Declaration::EnumValue { enumeration, name } => pool
                .get_enum_by_name(enumeration)?
                .get_value_by_name(name)
                .map(|v| v.options()),
            Declaration::Service(name) => pool.get_service_by_name(name).map(|s| s.options()),
            Declaration::Method { service, name } => pool
                .get_service_by_name(service)?
                .methods()
                .find(|m| m.name() == name)
                .map(|m| m.options()),
        }
    }
}

/// Projects an options message to JSON, stripping brackets from extension keys.
///
/// A message that cannot be projected contributes nothing.
pub fn raw_options(options: &DynamicMessage) -> OptionMap {
    match serde_json::to_value(options) {
        Ok(Value::Object(fields)) => fields
            .into_iter()
            .map(|(key, value)| (key.trim_matches(|c| c == '[' || c == ']').to_string(), value))
            .collect(),
        Ok(other) => {
            debug!(
                "options of type {} projected to non-object {}",
                options.descriptor().full_name(),
                other
            );
            OptionMap::new()
        }
        Err(e) => {
            debug!(
                "failed to project options of type {}: {}",
                options.descriptor().full_name(),
                e
            );
            OptionMap::new()
        }
    }
}

/// Computes merged option maps for declarations of one descriptor set
#[derive(Debug, Clone, Copy)]
pub struct OptionResolver<'a> {
    pool: Option<&'a DescriptorPool>,
    registry: &'a ExtensionRegistry,
}

impl<'a> OptionResolver<'a> {
    /// Creates a resolver; without a pool only built-in options are produced
    pub fn new(pool: Option<&'a DescriptorPool>, registry: &'a ExtensionRegistry) -> Self {
        Self { pool, registry }
    }

    /// Merges built-in, raw and plugin-provided options for one element
    pub fn resolve(
        &self,
        carrier: OptionCarrier<'_>,
        declaration: Declaration<'_>,
    ) -> Option<OptionMap> {
        let (raw, plugin) = match self.pool.and_then(|pool| declaration.options(pool)) {
            Some(options) => (raw_options(&options), self.registry.apply(&options)),
            None => (OptionMap::new(), OptionMap::new()),
        };
        merge_options([carrier.builtin_options(), raw, plugin])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorSet;
    use crate::testing::{audited_descriptor_set, file, message, method, scalar, service};
    use pretty_assertions::assert_eq;
    use prost_types::field_descriptor_proto::{Label, Type};
    use serde_json::json;

    fn map(entries: &[(&str, Value)]) -> OptionMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_first_source_wins() {
        let merged = merge_options([
            map(&[("deprecated", json!(true))]),
            map(&[("deprecated", json!(false)), ("custom", json!("raw"))]),
            map(&[("custom", json!("plugin")), ("plugin.only", json!(1))]),
        ])
        .unwrap();
        assert_eq!(
            merged,
            map(&[
                ("custom", json!("raw")),
                ("deprecated", json!(true)),
                ("plugin.only", json!(1)),
            ])
        );
    }

    #[test]
    fn test_merge_empty_is_none() {
        assert_eq!(merge_options([OptionMap::new(), OptionMap::new()]), None);
        assert_eq!(merge_options(Vec::<OptionMap>::new()), None);
    }

    #[test]
    fn test_builtin_deprecated() {
        let options = MessageOptions {
            deprecated: Some(true),
            ..Default::default()
        };
        assert_eq!(
            OptionCarrier::Message(Some(&options)).builtin_options(),
            map(&[("deprecated", json!(true))])
        );
        assert!(OptionCarrier::Message(None).builtin_options().is_empty());
        assert!(OptionCarrier::Field(Some(&FieldOptions::default()))
            .builtin_options()
            .is_empty());
    }

    #[test]
    fn test_builtin_method_idempotency() {
        let options = MethodOptions {
            idempotency_level: Some(IdempotencyLevel::NoSideEffects as i32),
            ..Default::default()
        };
        assert_eq!(
            OptionCarrier::Method(Some(&options)).builtin_options(),
            map(&[("idempotency_level", json!("NO_SIDE_EFFECTS"))])
        );
    }

    #[test]
    fn test_resolve_projects_raw_options() {
        let mut f = file("o.proto", "pkg");
        let mut repeated = scalar("ids", 1, Label::Repeated, Type::Int32);
        repeated.options = Some(FieldOptions {
            packed: Some(true),
            ..Default::default()
        });
        let mut m = message("M", vec![repeated]);
        m.options = Some(MessageOptions {
            deprecated: Some(true),
            ..Default::default()
        });
        f.message_type.push(m);
        let set = DescriptorSet::from_files(vec![f]);
        let registry = ExtensionRegistry::new();
        let resolver = OptionResolver::new(set.pool(), &registry);

        let message_options = set.files()[0].message_type[0].options.as_ref();
        let resolved = resolver
            .resolve(OptionCarrier::Message(message_options), Declaration::Message("pkg.M"))
            .unwrap();
        assert_eq!(resolved, map(&[("deprecated", json!(true))]));

        let field_options = set.files()[0].message_type[0].field[0].options.as_ref();
        let resolved = resolver
            .resolve(
                OptionCarrier::Field(field_options),
                Declaration::Field {
                    message: "pkg.M",
                    name: "ids",
                },
            )
            .unwrap();
        assert_eq!(resolved.get("packed"), Some(&json!(true)));
        assert!(!resolved.contains_key("deprecated"));
    }

    #[test]
    fn test_resolve_without_options_is_none() {
        let mut f = file("o.proto", "pkg");
        f.service.push(service("S", vec![method("Call", ".pkg.M", ".pkg.M")]));
        f.message_type.push(message("M", vec![]));
        let set = DescriptorSet::from_files(vec![f]);
        let registry = ExtensionRegistry::new();
        let resolver = OptionResolver::new(set.pool(), &registry);

        assert_eq!(
            resolver.resolve(
                OptionCarrier::Method(None),
                Declaration::Method {
                    service: "pkg.S",
                    name: "Call",
                },
            ),
            None
        );
        assert_eq!(
            resolver.resolve(OptionCarrier::Service(None), Declaration::Service("pkg.Missing")),
            None
        );
    }

    #[test]
    fn test_resolve_without_pool_keeps_builtins() {
        let registry = ExtensionRegistry::new();
        let resolver = OptionResolver::new(None, &registry);
        let options = EnumValueOptions {
            deprecated: Some(true),
            ..Default::default()
        };
        let resolved = resolver.resolve(
            OptionCarrier::EnumValue(Some(&options)),
            Declaration::EnumValue {
                enumeration: "pkg.E",
                name: "A",
            },
        );
        assert_eq!(resolved, Some(map(&[("deprecated", json!(true))])));
    }

    #[test]
    fn test_resolve_extension_option() {
        let set = DescriptorSet::decode(audited_descriptor_set().as_slice()).unwrap();
        let pool = set.pool().unwrap();
        let registry =
            ExtensionRegistry::new().register("acme.audit", |value: &prost_reflect::Value| {
                value.as_bool().map(|b| json!(format!("plugin:{}", b)))
            });

        let options = pool.get_message_by_name("acme.Audited").unwrap().options();
        assert_eq!(raw_options(&options), map(&[("acme.audit", json!(true))]));
        let plugin = registry.apply(&options);
        assert_eq!(plugin, map(&[("acme.audit", json!("plugin:true"))]));

        // the raw value masks the plugin value for the same key
        let resolver = OptionResolver::new(set.pool(), &registry);
        assert_eq!(
            resolver.resolve(OptionCarrier::Message(None), Declaration::Message("acme.Audited")),
            Some(map(&[("acme.audit", json!(true))]))
        );
        // without a raw value the plugin value comes through
        assert_eq!(
            merge_options([OptionMap::new(), OptionMap::new(), plugin]),
            Some(map(&[("acme.audit", json!("plugin:true"))]))
        );

        assert_eq!(
            resolver.resolve(OptionCarrier::Message(None), Declaration::Message("acme.Plain")),
            None
        );
    }

    #[test]
    fn test_builtin_wins_over_raw_option() {
        let set = DescriptorSet::decode(audited_descriptor_set().as_slice()).unwrap();
        let registry = ExtensionRegistry::new();
        let resolver = OptionResolver::new(set.pool(), &registry);
        let deprecated = MessageOptions {
            deprecated: Some(true),
            ..Default::default()
        };
        let resolved = resolver
            .resolve(
                OptionCarrier::Message(Some(&deprecated)),
                Declaration::Message("acme.Audited"),
            )
            .unwrap();
        assert_eq!(
            resolved,
            map(&[("acme.audit", json!(true)), ("deprecated", json!(true))])
        );
    }
}
